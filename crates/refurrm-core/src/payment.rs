//! The payment collaborator interface.
//!
//! Only checkout initiation is modelled. Completion arrives out-of-band as a
//! [`CheckoutEvent`] and is reconciled against the user's pending upgrade.

use std::future::Future;

use serde::{Deserialize, Serialize};
use strum::{Display, IntoStaticStr};
use uuid::Uuid;

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PaymentKind {
  Subscription,
  Fine,
}

/// What is being charged: a fixed amount or a catalogued price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Charge {
  AmountCents(u64),
  PriceId(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutRequest {
  pub user_id:      Uuid,
  pub kind:         PaymentKind,
  pub charge:       Charge,
  pub description:  String,
}

/// A started checkout. The browser is sent to `url` to complete it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutSession {
  pub checkout_id: String,
  pub url:         String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckoutOutcome {
  Completed,
  Failed,
}

/// Notification from the payment collaborator that a checkout finished.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutEvent {
  pub checkout_id: String,
  pub user_id:     Uuid,
  pub kind:        PaymentKind,
  pub outcome:     CheckoutOutcome,
}

/// Abstraction over a hosted payment gateway.
pub trait PaymentGateway: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Start a checkout and return where to send the user.
  fn create_checkout<'a>(
    &'a self,
    request: &'a CheckoutRequest,
  ) -> impl Future<Output = Result<CheckoutSession, Self::Error>> + Send + 'a;
}
