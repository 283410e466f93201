//! SQLite backend for the ReFURRM dashboard.
//!
//! Implements [`refurrm_core::backend::RescueBackend`] over a single SQLite
//! file. Wraps [`tokio_rusqlite`] so all database access runs on a dedicated
//! thread without blocking the async runtime.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;

#[cfg(test)]
mod tests;
