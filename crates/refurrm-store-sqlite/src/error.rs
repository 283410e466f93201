//! Error type for `refurrm-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] refurrm_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),
}

impl Error {
  /// Whether this is a missing-record error rather than a storage failure.
  pub fn is_not_found(&self) -> bool {
    matches!(
      self,
      Self::Core(
        refurrm_core::Error::ItemNotFound(_)
          | refurrm_core::Error::UserNotFound(_)
          | refurrm_core::Error::SavedAuctionNotFound(_)
          | refurrm_core::Error::AuctionNotFound(_)
      )
    )
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
