//! Handlers for `/items` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/items` | Optional `?status=holding\|dropped_off\|returned\|verified` |
//! | `POST` | `/items` | Report a rescue; starts a 30-day hold |
//! | `GET`  | `/items/export` | CSV of every item |
//! | `GET`  | `/items/:id` | 404 if not found |
//! | `POST` | `/items/:id/status` | Body: `{"status":"dropped_off","location":"…"}` |
//! | `POST` | `/items/:id/verification` | Body: `{"verification_status":"verified"}` |
//! | `POST` | `/items/:id/contact-attempts` | Appends; never edits |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::{StatusCode, header},
  response::IntoResponse,
};
use chrono::Utc;
use refurrm_core::{
  backend::RescueBackend,
  item::{ItemQuery, ItemStatus, NewContactAttempt, NewRescuedItem, RescuedItem, VerificationStatus},
  lifecycle::{HoldClock, Transition},
  payment::PaymentGateway,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{AppState, auth::AgreedSession, digest::content_sha256, error::ApiError};

const TRANSITION_ATTEMPTS: usize = 3;

/// An item as the dashboard shows it: the record plus its hold clock while
/// the item is still holding.
#[derive(Debug, Serialize)]
pub struct ItemView {
  #[serde(flatten)]
  pub item:       RescuedItem,
  pub hold_clock: Option<HoldClock>,
  pub hold_label: Option<String>,
}

impl From<RescuedItem> for ItemView {
  fn from(item: RescuedItem) -> Self {
    let clock = (item.status == ItemStatus::Holding).then(|| item.hold_clock(Utc::now()));
    Self {
      hold_label: clock.as_ref().map(HoldClock::label),
      hold_clock: clock,
      item,
    }
  }
}

async fn find_item<B: RescueBackend>(
  backend: &B,
  user_id: Uuid,
  id: Uuid,
) -> Result<RescuedItem, ApiError> {
  backend
    .get_item(user_id, id)
    .await
    .map_err(ApiError::backend)?
    .ok_or_else(|| ApiError::NotFound(format!("item {id} not found")))
}

// ─── List / create ────────────────────────────────────────────────────────────

/// `GET /items[?status=<status>]`
pub async fn list<B, G>(
  State(state): State<AppState<B, G>>,
  AgreedSession(session): AgreedSession,
  Query(query): Query<ItemQuery>,
) -> Result<Json<Vec<ItemView>>, ApiError>
where
  B: RescueBackend + 'static,
  G: PaymentGateway + 'static,
{
  let items = state
    .backend
    .list_items(session.identity.user_id, &query)
    .await
    .map_err(ApiError::backend)?;
  Ok(Json(items.into_iter().map(ItemView::from).collect()))
}

/// `POST /items`
pub async fn create<B, G>(
  State(state): State<AppState<B, G>>,
  AgreedSession(session): AgreedSession,
  Json(input): Json<NewRescuedItem>,
) -> Result<impl IntoResponse, ApiError>
where
  B: RescueBackend + 'static,
  G: PaymentGateway + 'static,
{
  if input.description.trim().is_empty() {
    return Err(refurrm_core::Error::MissingDescription.into());
  }
  let item = state
    .backend
    .add_item(session.identity.user_id, input)
    .await
    .map_err(ApiError::backend)?;
  tracing::info!(item_id = %item.id, item_type = %item.item_type, "rescue reported");
  Ok((StatusCode::CREATED, Json(ItemView::from(item))))
}

// ─── Single item ──────────────────────────────────────────────────────────────

/// `GET /items/:id`
pub async fn get_one<B, G>(
  State(state): State<AppState<B, G>>,
  AgreedSession(session): AgreedSession,
  Path(id): Path<Uuid>,
) -> Result<Json<ItemView>, ApiError>
where
  B: RescueBackend + 'static,
  G: PaymentGateway + 'static,
{
  let item = find_item(state.backend.as_ref(), session.identity.user_id, id).await?;
  Ok(Json(item.into()))
}

/// `POST /items/:id/status`
pub async fn transition<B, G>(
  State(state): State<AppState<B, G>>,
  AgreedSession(session): AgreedSession,
  Path(id): Path<Uuid>,
  Json(transition): Json<Transition>,
) -> Result<Json<ItemView>, ApiError>
where
  B: RescueBackend + 'static,
  G: PaymentGateway + 'static,
{
  let user_id = session.identity.user_id;
  let to = transition.target();
  let mut from = to;
  for _ in 0..TRANSITION_ATTEMPTS {
    let mut item = find_item(state.backend.as_ref(), user_id, id).await?;
    let status = item.status;
    from = status;
    item.transition(transition.clone(), Utc::now())?;

    let stored = state
      .backend
      .update_item_status(&item, status)
      .await
      .map_err(ApiError::backend)?;
    if stored {
      tracing::info!(item_id = %id, from = %status, to = %item.status, "item status changed");
      return Ok(Json(item.into()));
    }
    tracing::debug!(item_id = %id, from = %status, "item status moved underneath; retrying");
  }

  // The status kept moving on every attempt.
  Err(refurrm_core::Error::InvalidTransition { from, to }.into())
}

#[derive(Debug, Deserialize)]
pub struct VerificationBody {
  pub verification_status: VerificationStatus,
}

/// `POST /items/:id/verification`
pub async fn verification<B, G>(
  State(state): State<AppState<B, G>>,
  AgreedSession(session): AgreedSession,
  Path(id): Path<Uuid>,
  Json(body): Json<VerificationBody>,
) -> Result<Json<ItemView>, ApiError>
where
  B: RescueBackend + 'static,
  G: PaymentGateway + 'static,
{
  let user_id = session.identity.user_id;
  let mut item = find_item(state.backend.as_ref(), user_id, id).await?;
  let stored = state
    .backend
    .set_item_verification(user_id, id, body.verification_status)
    .await
    .map_err(ApiError::backend)?;
  if !stored {
    return Err(ApiError::NotFound(format!("item {id} not found")));
  }
  item.set_verification(body.verification_status);
  Ok(Json(item.into()))
}

/// `POST /items/:id/contact-attempts`
pub async fn contact_attempt<B, G>(
  State(state): State<AppState<B, G>>,
  AgreedSession(session): AgreedSession,
  Path(id): Path<Uuid>,
  Json(input): Json<NewContactAttempt>,
) -> Result<impl IntoResponse, ApiError>
where
  B: RescueBackend + 'static,
  G: PaymentGateway + 'static,
{
  let user_id = session.identity.user_id;
  find_item(state.backend.as_ref(), user_id, id).await?;
  let attempt = state
    .backend
    .add_contact_attempt(user_id, id, input)
    .await
    .map_err(ApiError::backend)?;
  Ok((StatusCode::CREATED, Json(attempt)))
}

// ─── Export ───────────────────────────────────────────────────────────────────

/// `GET /items/export`
pub async fn export<B, G>(
  State(state): State<AppState<B, G>>,
  AgreedSession(session): AgreedSession,
) -> Result<impl IntoResponse, ApiError>
where
  B: RescueBackend + 'static,
  G: PaymentGateway + 'static,
{
  let items = state
    .backend
    .list_items(session.identity.user_id, &ItemQuery::default())
    .await
    .map_err(ApiError::backend)?;

  let csv = refurrm_csv::export_rescues(&items);
  let filename = refurrm_csv::export_filename(Utc::now().date_naive());
  let headers = [
    (header::CONTENT_TYPE, format!("{}; charset=utf-8", refurrm_csv::CSV_MIME)),
    (header::CONTENT_DISPOSITION, format!("attachment; filename=\"{filename}\"")),
    (header::HeaderName::from_static("x-content-sha256"), content_sha256(csv.as_bytes())),
  ];
  Ok((headers, csv))
}
