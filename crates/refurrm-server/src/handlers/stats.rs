//! Handlers for `/stats` and `/badges`.

use axum::{Json, extract::State};
use chrono::Utc;
use refurrm_core::{
  backend::RescueBackend,
  badges::{self, BadgeStatus},
  item::ItemQuery,
  payment::PaymentGateway,
  session::Session,
  stats::RescueStats,
};

use crate::{AppState, auth::AgreedSession, error::ApiError};

async fn compute<B: RescueBackend>(backend: &B, session: &Session) -> Result<RescueStats, ApiError> {
  let items = backend
    .list_items(session.identity.user_id, &ItemQuery::default())
    .await
    .map_err(ApiError::backend)?;
  Ok(RescueStats::compute(&items, Utc::now()))
}

/// `GET /stats`
pub async fn show<B, G>(
  State(state): State<AppState<B, G>>,
  AgreedSession(session): AgreedSession,
) -> Result<Json<RescueStats>, ApiError>
where
  B: RescueBackend + 'static,
  G: PaymentGateway + 'static,
{
  Ok(Json(compute(state.backend.as_ref(), &session).await?))
}

/// `GET /badges`: the whole catalog, each flagged earned or not.
pub async fn badges<B, G>(
  State(state): State<AppState<B, G>>,
  AgreedSession(session): AgreedSession,
) -> Result<Json<Vec<BadgeStatus>>, ApiError>
where
  B: RescueBackend + 'static,
  G: PaymentGateway + 'static,
{
  let stats = compute(state.backend.as_ref(), &session).await?;
  Ok(Json(badges::catalog_status(stats.total_rescues, stats.current_streak)))
}
