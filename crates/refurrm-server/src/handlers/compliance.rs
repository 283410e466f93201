//! Handlers for `/compliance` endpoints.
//!
//! The report is computed on read from the user's items; nothing about it is
//! stored. Paying a fine only starts a checkout.

use axum::{Json, extract::State};
use chrono::Utc;
use refurrm_core::{
  backend::RescueBackend,
  compliance::{ComplianceItem, ComplianceReport, FINE_AMOUNT_CENTS, FINE_DESCRIPTION},
  item::ItemQuery,
  payment::{Charge, CheckoutRequest, CheckoutSession, PaymentGateway, PaymentKind},
};
use serde::Deserialize;
use uuid::Uuid;

use super::within;
use crate::{AppState, auth::AgreedSession, error::ApiError};

/// `GET /compliance`
pub async fn report<B, G>(
  State(state): State<AppState<B, G>>,
  AgreedSession(session): AgreedSession,
) -> Result<Json<ComplianceReport>, ApiError>
where
  B: RescueBackend + 'static,
  G: PaymentGateway + 'static,
{
  let items = state
    .backend
    .list_items(session.identity.user_id, &ItemQuery::default())
    .await
    .map_err(ApiError::backend)?;
  Ok(Json(ComplianceReport::build(&items, Utc::now())))
}

#[derive(Debug, Deserialize)]
pub struct FineBody {
  pub item_id: Uuid,
}

/// `POST /compliance/fine`: body `{"item_id":"…"}`. Only items in violation
/// can be fined.
pub async fn pay_fine<B, G>(
  State(state): State<AppState<B, G>>,
  AgreedSession(session): AgreedSession,
  Json(body): Json<FineBody>,
) -> Result<Json<CheckoutSession>, ApiError>
where
  B: RescueBackend + 'static,
  G: PaymentGateway + 'static,
{
  let user_id = session.identity.user_id;
  let item = state
    .backend
    .get_item(user_id, body.item_id)
    .await
    .map_err(ApiError::backend)?
    .ok_or_else(|| ApiError::NotFound(format!("item {} not found", body.item_id)))?;

  let row = ComplianceItem::from_item(&item, Utc::now());
  if !row.fine_eligible {
    return Err(ApiError::Conflict(format!(
      "item {} is {} and owes no fine",
      item.id, row.status
    )));
  }

  let request = CheckoutRequest {
    user_id,
    kind: PaymentKind::Fine,
    charge: Charge::AmountCents(FINE_AMOUNT_CENTS),
    description: FINE_DESCRIPTION.to_string(),
  };
  let checkout = within(
    state.config.collaborator_timeout(),
    "payment gateway",
    state.payments.create_checkout(&request),
  )
  .await?;
  tracing::info!(item_id = %item.id, checkout_id = %checkout.checkout_id, "fine checkout started");
  Ok(Json(checkout))
}
