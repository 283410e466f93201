//! Handlers for `/billing` endpoints.
//!
//! Upgrading is two-phase. `POST /billing/upgrade` starts a checkout and
//! grants premium tentatively, remembering the previous entitlement. The
//! gateway later calls `POST /billing/webhook`, which either keeps the grant
//! or rolls it back. The webhook is authenticated by its body signature, not
//! by Basic auth.

use axum::{
  Json,
  body::Bytes,
  extract::State,
  http::{HeaderMap, StatusCode},
};
use chrono::Utc;
use refurrm_core::{
  backend::{Identity, RescueBackend},
  entitlement::{Plan, User},
  payment::{
    Charge, CheckoutEvent, CheckoutOutcome, CheckoutRequest, PaymentGateway, PaymentKind,
  },
  session::{Session, SessionError},
};
use serde::{Deserialize, Serialize};

use super::within;
use crate::{AppState, auth::AgreedSession, digest::verify_webhook_signature, error::ApiError};

/// Header carrying the hex HMAC-SHA256 of the body, keyed with the shared secret.
pub const SIGNATURE_HEADER: &str = "x-refurrm-signature";

#[derive(Debug, Deserialize)]
pub struct UpgradeBody {
  pub plan: Plan,
}

#[derive(Debug, Serialize)]
pub struct UpgradeResponse {
  pub checkout_id:  String,
  pub checkout_url: String,
  pub user:         User,
}

/// `POST /billing/upgrade`: body `{"plan":"weekly"|"yearly"}`.
pub async fn upgrade<B, G>(
  State(state): State<AppState<B, G>>,
  AgreedSession(mut session): AgreedSession,
  Json(body): Json<UpgradeBody>,
) -> Result<Json<UpgradeResponse>, ApiError>
where
  B: RescueBackend + 'static,
  G: PaymentGateway + 'static,
{
  if let Some(pending) = &session.user.pending_upgrade {
    return Err(refurrm_core::Error::UpgradeAlreadyPending(pending.checkout_id.clone()).into());
  }
  if session.user.is_premium() {
    return Err(ApiError::Conflict("account is already premium".to_string()));
  }

  let request = CheckoutRequest {
    user_id:     session.identity.user_id,
    kind:        PaymentKind::Subscription,
    charge:      Charge::PriceId(state.config.prices.price_id(body.plan).to_string()),
    description: format!("ReFURRM Premium ({})", body.plan.price_label()),
  };
  let checkout = within(
    state.config.collaborator_timeout(),
    "payment gateway",
    state.payments.create_checkout(&request),
  )
  .await?;

  session
    .begin_upgrade(state.backend.as_ref(), &checkout.checkout_id, body.plan, Utc::now())
    .await?;
  tracing::info!(
    user_id = %session.identity.user_id,
    checkout_id = %checkout.checkout_id,
    plan = %body.plan,
    "upgrade pending"
  );

  Ok(Json(UpgradeResponse {
    checkout_id:  checkout.checkout_id,
    checkout_url: checkout.url,
    user:         session.user,
  }))
}

/// `POST /billing/webhook`
pub async fn webhook<B, G>(
  State(state): State<AppState<B, G>>,
  headers: HeaderMap,
  body: Bytes,
) -> Result<StatusCode, ApiError>
where
  B: RescueBackend + 'static,
  G: PaymentGateway + 'static,
{
  let signature = headers
    .get(SIGNATURE_HEADER)
    .and_then(|v| v.to_str().ok())
    .ok_or(ApiError::BadSignature)?;
  if !verify_webhook_signature(&state.config.webhook_secret, &body, signature) {
    return Err(ApiError::BadSignature);
  }

  let event: CheckoutEvent = serde_json::from_slice(&body)
    .map_err(|e| ApiError::BadRequest(format!("malformed checkout event: {e}")))?;
  let completed = event.outcome == CheckoutOutcome::Completed;

  match event.kind {
    PaymentKind::Subscription => {
      let user = state
        .backend
        .read_profile(event.user_id)
        .await
        .map_err(ApiError::backend)?
        .ok_or_else(|| ApiError::NotFound(format!("user {} not found", event.user_id)))?;
      let identity = Identity { user_id: user.id, email: user.email.clone() };
      let mut session = Session { identity, user };
      match session
        .settle_upgrade(state.backend.as_ref(), &event.checkout_id, completed)
        .await
      {
        Ok(()) => {}
        // Gateways redeliver; a settled checkout whose outcome the profile
        // already reflects is acknowledged again.
        Err(SessionError::Domain(refurrm_core::Error::UpgradeNotPending(_)))
          if session.user.pending_upgrade.is_none() && session.user.is_premium() == completed =>
        {
          tracing::info!(
            user_id = %event.user_id,
            checkout_id = %event.checkout_id,
            "checkout already settled"
          );
          return Ok(StatusCode::NO_CONTENT);
        }
        Err(e) => return Err(e.into()),
      }
      tracing::info!(
        user_id = %event.user_id,
        checkout_id = %event.checkout_id,
        tier = %session.user.tier,
        "upgrade settled"
      );
    }
    PaymentKind::Fine => {
      tracing::info!(
        user_id = %event.user_id,
        checkout_id = %event.checkout_id,
        completed,
        "fine checkout finished"
      );
    }
  }

  Ok(StatusCode::NO_CONTENT)
}
