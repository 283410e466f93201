//! Subscription tiers and what they unlock.
//!
//! The free tier carries a scan counter that each estimate consumes; premium
//! is unlimited. Upgrading is two-phase: the tier flips tentatively when a
//! checkout starts and is either confirmed or rolled back once the payment
//! collaborator reports the outcome.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};
use uuid::Uuid;

use crate::{Error, Result};

/// Scans a new free account starts with.
pub const FREE_SCAN_ALLOWANCE: u32 = 7;

/// Stand-in quota for premium accounts, which never decrement.
pub const PREMIUM_SCAN_SENTINEL: u32 = 999;

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Default,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Tier {
  #[default]
  Free,
  Premium,
}

impl Tier {
  pub fn as_str(self) -> &'static str { self.into() }
}

/// Subscription plans offered on the upgrade screen.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Plan {
  Weekly,
  Yearly,
}

impl Plan {
  pub fn as_str(self) -> &'static str { self.into() }

  /// Price as shown on the upgrade button.
  pub fn price_label(self) -> &'static str {
    match self {
      Self::Weekly => "$1.99/week",
      Self::Yearly => "$89.99/year",
    }
  }
}

/// Payment-gateway price references for each plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanPrices {
  pub weekly: String,
  pub yearly: String,
}

impl Default for PlanPrices {
  fn default() -> Self {
    Self {
      weekly: "price_weekly_199".to_string(),
      yearly: "price_yearly_8999".to_string(),
    }
  }
}

impl PlanPrices {
  pub fn price_id(&self, plan: Plan) -> &str {
    match plan {
      Plan::Weekly => &self.weekly,
      Plan::Yearly => &self.yearly,
    }
  }
}

/// An upgrade whose checkout has started but not completed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingUpgrade {
  pub checkout_id:    String,
  pub plan:           Plan,
  pub started_at:     DateTime<Utc>,
  /// Entitlement to restore if the checkout fails.
  pub previous_tier:  Tier,
  pub previous_scans: u32,
}

// ─── User ────────────────────────────────────────────────────────────────────

/// A dashboard account together with its profile fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
  pub id:              Uuid,
  pub email:           String,
  pub tier:            Tier,
  pub scans_remaining: u32,
  /// Recorded for the backend's enforcement; nothing in this layer
  /// increments it.
  pub violations:      u32,
  pub agreed_to_terms: bool,
  pub pending_upgrade: Option<PendingUpgrade>,
}

impl User {
  /// A new free-tier account that has not yet accepted the terms.
  pub fn new(id: Uuid, email: impl Into<String>) -> Self {
    Self {
      id,
      email: email.into(),
      tier: Tier::Free,
      scans_remaining: FREE_SCAN_ALLOWANCE,
      violations: 0,
      agreed_to_terms: false,
      pending_upgrade: None,
    }
  }

  pub fn is_premium(&self) -> bool { self.tier == Tier::Premium }

  /// `∞` for premium, otherwise the remaining counter.
  pub fn quota_display(&self) -> String {
    if self.is_premium() {
      "∞".to_string()
    } else {
      self.scans_remaining.to_string()
    }
  }

  /// Upgrade prompts are only shown to the free tier.
  pub fn shows_upgrade_prompt(&self) -> bool { !self.is_premium() }

  pub fn can_estimate(&self) -> bool { self.is_premium() || self.scans_remaining > 0 }

  /// Fail with [`Error::ScanQuotaExhausted`] if another estimate is not
  /// allowed.
  pub fn ensure_can_estimate(&self) -> Result<()> {
    if self.can_estimate() { Ok(()) } else { Err(Error::ScanQuotaExhausted) }
  }

  /// Charge one scan. Premium is never charged; free never goes below zero.
  pub fn consume_scan(&mut self) -> Result<()> {
    self.ensure_can_estimate()?;
    if !self.is_premium() {
      self.scans_remaining -= 1;
    }
    Ok(())
  }

  /// Tentatively grant premium while checkout `checkout_id` is in flight.
  pub fn begin_upgrade(
    &mut self,
    checkout_id: impl Into<String>,
    plan: Plan,
    now: DateTime<Utc>,
  ) -> Result<()> {
    if let Some(pending) = &self.pending_upgrade {
      return Err(Error::UpgradeAlreadyPending(pending.checkout_id.clone()));
    }

    self.pending_upgrade = Some(PendingUpgrade {
      checkout_id: checkout_id.into(),
      plan,
      started_at: now,
      previous_tier: self.tier,
      previous_scans: self.scans_remaining,
    });
    self.tier = Tier::Premium;
    self.scans_remaining = PREMIUM_SCAN_SENTINEL;
    Ok(())
  }

  /// Keep the tentative premium grant.
  pub fn confirm_upgrade(&mut self, checkout_id: &str) -> Result<PendingUpgrade> {
    let pending = self.take_pending(checkout_id)?;
    self.tier = Tier::Premium;
    self.scans_remaining = PREMIUM_SCAN_SENTINEL;
    Ok(pending)
  }

  /// Roll the tentative grant back to what the account had before.
  pub fn fail_upgrade(&mut self, checkout_id: &str) -> Result<PendingUpgrade> {
    let pending = self.take_pending(checkout_id)?;
    self.tier = pending.previous_tier;
    self.scans_remaining = pending.previous_scans;
    Ok(pending)
  }

  fn take_pending(&mut self, checkout_id: &str) -> Result<PendingUpgrade> {
    match self.pending_upgrade.take() {
      Some(p) if p.checkout_id == checkout_id => Ok(p),
      other => {
        self.pending_upgrade = other;
        Err(Error::UpgradeNotPending(checkout_id.to_string()))
      }
    }
  }
}

/// The fields that decide what a user may do, compared and replaced as one
/// unit by [`crate::backend::RescueBackend::swap_entitlement`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entitlement {
  pub tier:            Tier,
  pub scans_remaining: u32,
  pub pending_upgrade: Option<PendingUpgrade>,
}

impl User {
  pub fn entitlement(&self) -> Entitlement {
    Entitlement {
      tier:            self.tier,
      scans_remaining: self.scans_remaining,
      pending_upgrade: self.pending_upgrade.clone(),
    }
  }
}

/// Partial profile write accepted by
/// [`crate::backend::RescueBackend::update_profile`]. `None` leaves a field
/// as it is.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
  pub agreed_to_terms: Option<bool>,
  pub tier:            Option<Tier>,
  pub scans_remaining: Option<u32>,
  pub pending_upgrade: Option<Option<PendingUpgrade>>,
}

impl ProfileUpdate {
  pub fn accept_terms() -> Self {
    Self { agreed_to_terms: Some(true), ..Self::default() }
  }
}
