//! Core types and trait definitions for the ReFURRM rescue dashboard.
//!
//! This crate is deliberately free of HTTP and database dependencies. It holds
//! the rescue lifecycle, the compliance clocks, the entitlement gate and the
//! collaborator traits; every other crate depends on it.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod auction;
pub mod backend;
pub mod badges;
pub mod compliance;
pub mod entitlement;
pub mod error;
pub mod item;
pub mod lifecycle;
pub mod payment;
pub mod session;
pub mod stats;
pub mod valuation;

pub use error::{Error, Result};
