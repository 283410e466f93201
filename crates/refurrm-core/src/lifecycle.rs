//! The hold lifecycle of a rescued item.
//!
//! Two concerns live here: the hold clock (how many whole days remain before
//! the 30-day hold ends) and the status state machine. Verification status is
//! deliberately kept out of the state machine; it is an orthogonal audit flag.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  item::{ItemStatus, RescuedItem, VerificationStatus},
};

/// Items with this many days or fewer left on hold are urgent.
pub const URGENT_WINDOW_DAYS: i64 = 7;

const SECONDS_PER_DAY: i64 = 86_400;

// ─── Hold clock ──────────────────────────────────────────────────────────────

/// Where an item stands against its hold deadline at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HoldClock {
  /// `floor((hold_deadline - now) / 1 day)`.
  pub days_remaining: i64,
  /// Still holding with a week or less to go.
  pub urgent:         bool,
  pub overdue:        bool,
}

/// Whole days between `now` and `deadline`, rounded towards negative infinity.
pub fn whole_days_until(deadline: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
  (deadline - now).num_seconds().div_euclid(SECONDS_PER_DAY)
}

impl HoldClock {
  pub fn of(item: &RescuedItem, now: DateTime<Utc>) -> Self {
    let days_remaining = whole_days_until(item.hold_deadline, now);
    Self {
      days_remaining,
      urgent: days_remaining <= URGENT_WINDOW_DAYS
        && item.status == ItemStatus::Holding,
      overdue: days_remaining <= 0,
    }
  }

  /// Short label shown on an item card while it is holding.
  pub fn label(&self) -> String {
    if self.days_remaining > 0 {
      format!("{} days remaining", self.days_remaining)
    } else {
      "Overdue".to_string()
    }
  }
}

// ─── Status transitions ──────────────────────────────────────────────────────

impl ItemStatus {
  /// Whether `self -> to` is an allowed edge.
  ///
  /// `verified` is reachable from any state. Re-entering the current state
  /// is not a transition and is rejected.
  pub fn can_transition_to(self, to: ItemStatus) -> bool {
    use ItemStatus::*;
    match (self, to) {
      (_, Verified) => self != Verified,
      (Holding, DroppedOff) => true,
      (Holding, Returned) | (DroppedOff, Returned) => true,
      _ => false,
    }
  }
}

/// A requested change of physical disposition.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Transition {
  /// Surrendered to a collection point.
  DroppedOff {
    location: String,
    /// Defaults to the time the transition is applied.
    #[serde(default)]
    date:     Option<DateTime<Utc>>,
  },
  /// Handed back to the original owner.
  Returned,
  /// An auditor confirmed the rescue.
  Verified,
}

impl Transition {
  pub fn target(&self) -> ItemStatus {
    match self {
      Self::DroppedOff { .. } => ItemStatus::DroppedOff,
      Self::Returned => ItemStatus::Returned,
      Self::Verified => ItemStatus::Verified,
    }
  }
}

impl RescuedItem {
  /// Apply `transition` at `now`, or return
  /// [`Error::InvalidTransition`] and leave the item untouched.
  pub fn transition(&mut self, transition: Transition, now: DateTime<Utc>) -> Result<()> {
    let to = transition.target();
    if !self.status.can_transition_to(to) {
      return Err(Error::InvalidTransition { from: self.status, to });
    }

    if let Transition::DroppedOff { location, date } = transition {
      if location.trim().is_empty() {
        return Err(Error::MissingDropOffLocation);
      }
      self.drop_off_location = Some(location);
      self.drop_off_date = Some(date.unwrap_or(now));
    }

    self.status = to;
    Ok(())
  }

  /// Record the auditor's verdict. Independent of [`ItemStatus`].
  pub fn set_verification(&mut self, status: VerificationStatus) {
    self.verification_status = status;
  }

  pub fn hold_clock(&self, now: DateTime<Utc>) -> HoldClock { HoldClock::of(self, now) }
}
