//! `POST /estimate`: the gated valuation flow.
//!
//! The quota is checked before the estimator runs and charged only after it
//! returns, so a failed or timed-out estimate costs nothing.

use axum::{Json, extract::State};
use refurrm_core::{
  backend::RescueBackend,
  payment::PaymentGateway,
  valuation::{ValuationEstimator, ValuationRequest, ValuationResult},
};
use serde::Serialize;

use super::within;
use crate::{AppState, auth::AgreedSession, error::ApiError};

#[derive(Debug, Serialize)]
pub struct EstimateResponse {
  pub result:          ValuationResult,
  pub scans_remaining: u32,
  pub quota_display:   String,
}

pub async fn handler<B, G>(
  State(state): State<AppState<B, G>>,
  AgreedSession(mut session): AgreedSession,
  Json(request): Json<ValuationRequest>,
) -> Result<Json<EstimateResponse>, ApiError>
where
  B: RescueBackend + 'static,
  G: PaymentGateway + 'static,
{
  session.user.ensure_can_estimate()?;

  let result = within(
    state.config.collaborator_timeout(),
    "valuation",
    state.estimator.estimate(&request),
  )
  .await?;

  session.consume_scan(state.backend.as_ref()).await?;
  tracing::info!(
    user_id = %session.identity.user_id,
    irreplaceable = result.is_irreplaceable,
    scans_remaining = session.user.scans_remaining,
    "estimate produced"
  );

  Ok(Json(EstimateResponse {
    result,
    scans_remaining: session.user.scans_remaining,
    quota_display: session.user.quota_display(),
  }))
}
