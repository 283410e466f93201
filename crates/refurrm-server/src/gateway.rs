//! A [`PaymentGateway`] that talks to a hosted checkout service over HTTP.

use std::time::Duration;

use refurrm_core::payment::{CheckoutRequest, CheckoutSession, PaymentGateway};
use reqwest::{Client, StatusCode};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatewayError {
  #[error("payment gateway request failed: {0}")]
  Http(#[from] reqwest::Error),

  #[error("payment gateway rejected checkout ({status}): {body}")]
  Rejected { status: StatusCode, body: String },
}

/// HTTP client for the checkout service.
///
/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct HttpGateway {
  client:   Client,
  base_url: String,
  api_key:  String,
}

impl HttpGateway {
  pub fn new(
    base_url: impl Into<String>,
    api_key: impl Into<String>,
    timeout: Duration,
  ) -> Result<Self, GatewayError> {
    let client = Client::builder().timeout(timeout).build()?;
    Ok(Self { client, base_url: base_url.into(), api_key: api_key.into() })
  }

  fn url(&self, path: &str) -> String {
    format!("{}{}", self.base_url.trim_end_matches('/'), path)
  }
}

impl PaymentGateway for HttpGateway {
  type Error = GatewayError;

  /// `POST {base}/checkout/sessions`
  async fn create_checkout(
    &self,
    request: &CheckoutRequest,
  ) -> Result<CheckoutSession, Self::Error> {
    let mut req = self.client.post(self.url("/checkout/sessions")).json(request);
    if !self.api_key.is_empty() {
      req = req.bearer_auth(&self.api_key);
    }

    let resp = req.send().await?;
    let status = resp.status();
    if !status.is_success() {
      let body = resp.text().await.unwrap_or_default();
      return Err(GatewayError::Rejected { status, body });
    }

    let session: CheckoutSession = resp.json().await?;
    tracing::info!(
      checkout_id = %session.checkout_id,
      kind = %request.kind,
      "checkout started"
    );
    Ok(session)
  }
}
