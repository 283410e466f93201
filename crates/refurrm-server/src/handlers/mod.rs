//! Route handlers, one module per dashboard area.
//!
//! | Area | Paths |
//! |------|-------|
//! | [`profile`] | `/profile`, `/profile/terms` |
//! | [`items`] | `/items`, `/items/export`, `/items/{id}/…` |
//! | [`compliance`] | `/compliance`, `/compliance/fine` |
//! | [`stats`] | `/stats`, `/badges` |
//! | [`estimate`] | `/estimate` |
//! | [`auctions`] | `/auctions`, `/saved-auctions[/{id}]` |
//! | [`billing`] | `/billing/upgrade`, `/billing/webhook` |

pub mod auctions;
pub mod billing;
pub mod compliance;
pub mod estimate;
pub mod items;
pub mod profile;
pub mod stats;

use std::{future::Future, time::Duration};

use crate::error::ApiError;

/// Await a collaborator call for at most `limit`.
pub(crate) async fn within<T, E>(
  limit: Duration,
  what:  &'static str,
  fut:   impl Future<Output = Result<T, E>>,
) -> Result<T, ApiError>
where
  E: std::error::Error + Send + Sync + 'static,
{
  match tokio::time::timeout(limit, fut).await {
    Ok(Ok(value)) => Ok(value),
    Ok(Err(e)) => {
      tracing::warn!(collaborator = what, error = %e, "collaborator call failed");
      Err(ApiError::Collaborator(what, Box::new(e)))
    }
    Err(_) => {
      tracing::warn!(collaborator = what, ?limit, "collaborator call timed out");
      Err(ApiError::Timeout(what))
    }
  }
}
