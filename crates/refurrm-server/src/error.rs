//! API error type and its JSON rendering.
//!
//! Every error body is `{"error": .., "retryable": .., "blocking": ..}` so the
//! dashboard can decide between a retry button and a hard stop.

use axum::{
  Json,
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use refurrm_core::session::SessionError;
use serde_json::json;
use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum ApiError {
  #[error("unauthorized")]
  Unauthorized,

  #[error("webhook signature mismatch")]
  BadSignature,

  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("terms of use must be accepted first")]
  TermsRequired,

  #[error("no scans remaining; upgrade to premium for unlimited scans")]
  QuotaExhausted,

  #[error("conflict: {0}")]
  Conflict(String),

  #[error("{0} timed out")]
  Timeout(&'static str),

  /// Persisting the terms acceptance failed. The dashboard must not proceed.
  #[error("could not record terms acceptance: {0}")]
  TermsNotSaved(#[source] BoxError),

  #[error("backend error: {0}")]
  Backend(#[source] BoxError),

  #[error("{0} failed: {1}")]
  Collaborator(&'static str, #[source] BoxError),
}

impl ApiError {
  pub fn backend<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Backend(Box::new(e))
  }

  pub fn status(&self) -> StatusCode {
    match self {
      Self::Unauthorized | Self::BadSignature => StatusCode::UNAUTHORIZED,
      Self::NotFound(_) => StatusCode::NOT_FOUND,
      Self::BadRequest(_) => StatusCode::BAD_REQUEST,
      Self::TermsRequired => StatusCode::FORBIDDEN,
      Self::QuotaExhausted => StatusCode::PAYMENT_REQUIRED,
      Self::Conflict(_) => StatusCode::CONFLICT,
      Self::Timeout(_) => StatusCode::REQUEST_TIMEOUT,
      Self::TermsNotSaved(_) | Self::Backend(_) => StatusCode::INTERNAL_SERVER_ERROR,
      Self::Collaborator(..) => StatusCode::BAD_GATEWAY,
    }
  }

  /// Transient failures the user may simply try again.
  pub fn retryable(&self) -> bool {
    matches!(
      self,
      Self::Timeout(_) | Self::TermsNotSaved(_) | Self::Backend(_) | Self::Collaborator(..)
    )
  }

  pub fn blocking(&self) -> bool { matches!(self, Self::TermsNotSaved(_)) }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = self.status();
    if status.is_server_error() {
      tracing::warn!(error = %self, "request failed");
    }

    let body = json!({
      "error":     self.to_string(),
      "retryable": self.retryable(),
      "blocking":  self.blocking(),
    });
    let mut res = (status, Json(body)).into_response();
    if matches!(self, Self::Unauthorized) {
      res.headers_mut().insert(
        header::WWW_AUTHENTICATE,
        HeaderValue::from_static("Basic realm=\"refurrm\""),
      );
    }
    res
  }
}

impl From<refurrm_core::Error> for ApiError {
  fn from(e: refurrm_core::Error) -> Self {
    use refurrm_core::Error as E;
    match e {
      E::ItemNotFound(_) | E::UserNotFound(_) | E::SavedAuctionNotFound(_) | E::AuctionNotFound(_) => {
        Self::NotFound(e.to_string())
      }
      E::InvalidTransition { .. }
      | E::UpgradeAlreadyPending(_)
      | E::UpgradeNotPending(_)
      | E::ProfileChanged(_) => {
        Self::Conflict(e.to_string())
      }
      E::ScanQuotaExhausted => Self::QuotaExhausted,
      E::TermsNotAccepted => Self::TermsRequired,
      E::MissingDropOffLocation | E::MissingDescription | E::UnknownDiscriminant { .. } => {
        Self::BadRequest(e.to_string())
      }
      E::Serialization(_) => Self::BadRequest(e.to_string()),
    }
  }
}

impl<E> From<SessionError<E>> for ApiError
where
  E: std::error::Error + Send + Sync + 'static,
{
  fn from(e: SessionError<E>) -> Self {
    match e {
      SessionError::Backend(e) => Self::Backend(Box::new(e)),
      SessionError::Domain(e) => e.into(),
    }
  }
}
