//! Handlers for `/auctions` and `/saved-auctions`.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/auctions` | Public listings, soonest first |
//! | `GET`    | `/saved-auctions` | Optional `?risk=low\|medium\|high&sort=date\|risk\|created` |
//! | `POST`   | `/saved-auctions` | 201 with the stored record |
//! | `PUT`    | `/saved-auctions/:id` | Whole-record replace |
//! | `DELETE` | `/saved-auctions/:id` | 204, or 404 if absent |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use chrono::Utc;
use refurrm_core::{
  auction::{Auction, NewSavedAuction, SavedAuction, SavedAuctionQuery},
  backend::RescueBackend,
  payment::PaymentGateway,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{AppState, auth::AgreedSession, error::ApiError};

/// `GET /auctions`
pub async fn listings<B, G>(
  State(state): State<AppState<B, G>>,
  AgreedSession(_): AgreedSession,
) -> Result<Json<Vec<Auction>>, ApiError>
where
  B: RescueBackend + 'static,
  G: PaymentGateway + 'static,
{
  let auctions = state.backend.list_auctions().await.map_err(ApiError::backend)?;
  Ok(Json(auctions))
}

// ─── Saved auctions ───────────────────────────────────────────────────────────

/// `GET /saved-auctions[?risk=<risk>&sort=<sort>]`
pub async fn list_saved<B, G>(
  State(state): State<AppState<B, G>>,
  AgreedSession(session): AgreedSession,
  Query(query): Query<SavedAuctionQuery>,
) -> Result<Json<Vec<SavedAuction>>, ApiError>
where
  B: RescueBackend + 'static,
  G: PaymentGateway + 'static,
{
  let saved = state
    .backend
    .list_saved_auctions(session.identity.user_id, &query)
    .await
    .map_err(ApiError::backend)?;
  Ok(Json(saved))
}

/// `POST /saved-auctions`
pub async fn save<B, G>(
  State(state): State<AppState<B, G>>,
  AgreedSession(session): AgreedSession,
  Json(input): Json<NewSavedAuction>,
) -> Result<impl IntoResponse, ApiError>
where
  B: RescueBackend + 'static,
  G: PaymentGateway + 'static,
{
  if input.title.trim().is_empty() {
    return Err(ApiError::BadRequest("title is required".to_string()));
  }
  let saved = state
    .backend
    .save_auction(session.identity.user_id, input)
    .await
    .map_err(ApiError::backend)?;
  Ok((StatusCode::CREATED, Json(saved)))
}

#[derive(Debug, Deserialize)]
pub struct UpdateBody {
  #[serde(flatten)]
  pub fields:        NewSavedAuction,
  #[serde(default = "bookmarked")]
  pub is_bookmarked: bool,
}

fn bookmarked() -> bool { true }

/// `PUT /saved-auctions/:id`
pub async fn update_saved<B, G>(
  State(state): State<AppState<B, G>>,
  AgreedSession(session): AgreedSession,
  Path(id): Path<Uuid>,
  Json(body): Json<UpdateBody>,
) -> Result<Json<SavedAuction>, ApiError>
where
  B: RescueBackend + 'static,
  G: PaymentGateway + 'static,
{
  if body.fields.title.trim().is_empty() {
    return Err(ApiError::BadRequest("title is required".to_string()));
  }
  let user_id = session.identity.user_id;
  let existing = state
    .backend
    .get_saved_auction(user_id, id)
    .await
    .map_err(ApiError::backend)?
    .ok_or_else(|| ApiError::NotFound(format!("saved auction {id} not found")))?;

  let mut updated = body.fields.into_saved(id, user_id, existing.created_at);
  updated.is_bookmarked = body.is_bookmarked;
  state
    .backend
    .update_saved_auction(&updated)
    .await
    .map_err(ApiError::backend)?;
  Ok(Json(updated))
}

/// `DELETE /saved-auctions/:id`
pub async fn delete_saved<B, G>(
  State(state): State<AppState<B, G>>,
  AgreedSession(session): AgreedSession,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError>
where
  B: RescueBackend + 'static,
  G: PaymentGateway + 'static,
{
  let deleted = state
    .backend
    .delete_saved_auction(session.identity.user_id, id)
    .await
    .map_err(ApiError::backend)?;
  if deleted {
    Ok(StatusCode::NO_CONTENT)
  } else {
    Err(ApiError::NotFound(format!("saved auction {id} not found")))
  }
}
