//! Handlers for `/profile` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/profile` | Allowed before the terms are accepted |
//! | `POST` | `/profile/terms` | Failure is reported as blocking |

use axum::{Json, extract::State};
use refurrm_core::{
  backend::RescueBackend,
  entitlement::{Plan, User},
  payment::PaymentGateway,
  session::{Session, SessionError},
};
use serde::Serialize;

use crate::{AppState, auth::CurrentSession, error::ApiError};

#[derive(Debug, Serialize)]
pub struct PlanOffer {
  pub plan:     Plan,
  pub price:    &'static str,
  pub price_id: String,
}

/// The signed-in user plus what the header and upgrade prompt display.
#[derive(Debug, Serialize)]
pub struct ProfileView {
  pub user:                 User,
  pub quota_display:        String,
  pub shows_upgrade_prompt: bool,
  pub plans:                Vec<PlanOffer>,
}

impl ProfileView {
  fn of<B, G>(session: Session, state: &AppState<B, G>) -> Self {
    let plans = [Plan::Weekly, Plan::Yearly]
      .into_iter()
      .map(|plan| PlanOffer {
        plan,
        price: plan.price_label(),
        price_id: state.config.prices.price_id(plan).to_string(),
      })
      .collect();
    Self {
      quota_display: session.user.quota_display(),
      shows_upgrade_prompt: session.user.shows_upgrade_prompt(),
      user: session.user,
      plans,
    }
  }
}

/// `GET /profile`
pub async fn show<B, G>(
  State(state): State<AppState<B, G>>,
  CurrentSession(session): CurrentSession,
) -> Json<ProfileView>
where
  B: RescueBackend + 'static,
  G: PaymentGateway + 'static,
{
  Json(ProfileView::of(session, &state))
}

/// `POST /profile/terms`
pub async fn accept_terms<B, G>(
  State(state): State<AppState<B, G>>,
  CurrentSession(mut session): CurrentSession,
) -> Result<Json<ProfileView>, ApiError>
where
  B: RescueBackend + 'static,
  G: PaymentGateway + 'static,
{
  session
    .accept_terms(state.backend.as_ref())
    .await
    .map_err(|e| match e {
      SessionError::Backend(e) => ApiError::TermsNotSaved(Box::new(e)),
      SessionError::Domain(e) => e.into(),
    })?;
  tracing::info!(user_id = %session.identity.user_id, "terms accepted");
  Ok(Json(ProfileView::of(session, &state)))
}
