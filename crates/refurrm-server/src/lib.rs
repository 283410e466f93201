//! HTTP surface of the ReFURRM rescue dashboard.
//!
//! Exposes an axum [`Router`] under `/api`, backed by any [`RescueBackend`]
//! and [`PaymentGateway`]. Every route except the payment webhook requires
//! HTTP Basic auth.

pub mod auth;
pub mod digest;
pub mod error;
pub mod gateway;
pub mod handlers;

pub use error::ApiError;

use std::{path::PathBuf, sync::Arc, time::Duration};

use axum::{
  Router,
  extract::{Request, State},
  middleware::{self, Next},
  response::{IntoResponse, Response},
  routing::{get, post, put},
};
use refurrm_core::{
  backend::RescueBackend,
  entitlement::PlanPrices,
  payment::PaymentGateway,
  valuation::{KeywordClassifier, StubEstimator},
};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

use auth::AuthConfig;
use handlers::{auctions, billing, compliance, estimate, items, profile, stats};

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `REFURRM_*` environment variables.
#[derive(Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:                      String,
  #[serde(default = "default_port")]
  pub port:                      u16,
  pub store_path:                PathBuf,
  /// The operator account; also the Basic-auth username.
  pub auth_email:                String,
  pub auth_password_hash:        String,
  #[serde(default = "default_request_timeout")]
  pub request_timeout_secs:      u64,
  #[serde(default = "default_collaborator_timeout")]
  pub collaborator_timeout_secs: u64,
  #[serde(default = "default_estimator_delay")]
  pub estimator_delay_ms:        u64,
  pub payment_gateway_url:       String,
  #[serde(default)]
  pub payment_gateway_key:       String,
  pub webhook_secret:            String,
  #[serde(default)]
  pub prices:                    PlanPrices,
}

fn default_host() -> String { "127.0.0.1".to_string() }
fn default_port() -> u16 { 8080 }
fn default_request_timeout() -> u64 { 30 }
fn default_collaborator_timeout() -> u64 { 15 }
fn default_estimator_delay() -> u64 { 2000 }

impl ServerConfig {
  pub fn request_timeout(&self) -> Duration { Duration::from_secs(self.request_timeout_secs) }

  pub fn collaborator_timeout(&self) -> Duration {
    Duration::from_secs(self.collaborator_timeout_secs)
  }
}

// ─── Application state ────────────────────────────────────────────────────────

pub type Estimator = StubEstimator<KeywordClassifier>;

/// Shared state threaded through all axum handlers.
pub struct AppState<B, G> {
  pub backend:   Arc<B>,
  pub payments:  Arc<G>,
  pub estimator: Arc<Estimator>,
  pub config:    Arc<ServerConfig>,
  pub auth:      Arc<AuthConfig>,
}

// Derived `Clone` would demand `B: Clone` and `G: Clone`.
impl<B, G> Clone for AppState<B, G> {
  fn clone(&self) -> Self {
    Self {
      backend:   Arc::clone(&self.backend),
      payments:  Arc::clone(&self.payments),
      estimator: Arc::clone(&self.estimator),
      config:    Arc::clone(&self.config),
      auth:      Arc::clone(&self.auth),
    }
  }
}

impl<B, G> AppState<B, G> {
  pub fn new(backend: B, payments: G, config: ServerConfig) -> Self {
    let estimator = StubEstimator::new(
      KeywordClassifier,
      Duration::from_millis(config.estimator_delay_ms),
    );
    let auth = AuthConfig {
      email:         config.auth_email.clone(),
      password_hash: config.auth_password_hash.clone(),
    };
    Self {
      backend:   Arc::new(backend),
      payments:  Arc::new(payments),
      estimator: Arc::new(estimator),
      config:    Arc::new(config),
      auth:      Arc::new(auth),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the dashboard [`Router`].
pub fn router<B, G>(state: AppState<B, G>) -> Router
where
  B: RescueBackend + 'static,
  G: PaymentGateway + 'static,
{
  let limit = state.config.request_timeout();

  let api = Router::new()
    // Profile
    .route("/profile", get(profile::show::<B, G>))
    .route("/profile/terms", post(profile::accept_terms::<B, G>))
    // Rescued items
    .route("/items", get(items::list::<B, G>).post(items::create::<B, G>))
    .route("/items/export", get(items::export::<B, G>))
    .route("/items/{id}", get(items::get_one::<B, G>))
    .route("/items/{id}/status", post(items::transition::<B, G>))
    .route("/items/{id}/verification", post(items::verification::<B, G>))
    .route("/items/{id}/contact-attempts", post(items::contact_attempt::<B, G>))
    // Compliance
    .route("/compliance", get(compliance::report::<B, G>))
    .route("/compliance/fine", post(compliance::pay_fine::<B, G>))
    // Achievements
    .route("/stats", get(stats::show::<B, G>))
    .route("/badges", get(stats::badges::<B, G>))
    // Valuation
    .route("/estimate", post(estimate::handler::<B, G>))
    // Auctions
    .route("/auctions", get(auctions::listings::<B, G>))
    .route("/saved-auctions", get(auctions::list_saved::<B, G>).post(auctions::save::<B, G>))
    .route(
      "/saved-auctions/{id}",
      put(auctions::update_saved::<B, G>).delete(auctions::delete_saved::<B, G>),
    )
    // Billing
    .route("/billing/upgrade", post(billing::upgrade::<B, G>))
    .route("/billing/webhook", post(billing::webhook::<B, G>))
    .with_state(state);

  Router::new()
    .nest("/api", api)
    .layer(middleware::from_fn_with_state(limit, bounded))
    .layer(TraceLayer::new_for_http())
}

/// Abort a request that runs past the configured limit with a retryable 408.
async fn bounded(State(limit): State<Duration>, req: Request, next: Next) -> Response {
  match tokio::time::timeout(limit, next.run(req)).await {
    Ok(res) => res,
    Err(_) => {
      tracing::warn!(?limit, "request timed out");
      ApiError::Timeout("request").into_response()
    }
  }
}
