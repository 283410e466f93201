//! Error types for `refurrm-core`.

use thiserror::Error;
use uuid::Uuid;

use crate::item::ItemStatus;

#[derive(Debug, Error)]
pub enum Error {
  #[error("rescued item not found: {0}")]
  ItemNotFound(Uuid),

  #[error("user not found: {0}")]
  UserNotFound(Uuid),

  #[error("saved auction not found: {0}")]
  SavedAuctionNotFound(Uuid),

  #[error("auction not found: {0}")]
  AuctionNotFound(Uuid),

  #[error("cannot move item from {from} to {to}")]
  InvalidTransition { from: ItemStatus, to: ItemStatus },

  #[error("no scans remaining on the free tier")]
  ScanQuotaExhausted,

  #[error("an upgrade is already pending (checkout {0})")]
  UpgradeAlreadyPending(String),

  #[error("no pending upgrade matches checkout {0}")]
  UpgradeNotPending(String),

  #[error("profile changed while the request was in flight; try again")]
  ProfileChanged(Uuid),

  #[error("terms of use have not been accepted")]
  TermsNotAccepted,

  #[error("drop-off location is required")]
  MissingDropOffLocation,

  #[error("description is required")]
  MissingDescription,

  #[error("unknown {kind} discriminant: {value:?}")]
  UnknownDiscriminant { kind: &'static str, value: String },

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
