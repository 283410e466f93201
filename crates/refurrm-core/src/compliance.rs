//! Compliance clocks for flagged irreplaceable items.
//!
//! Two windows run from the flag date: the 7-day report window and the
//! 30-day resolve window. An item with proof of disposition is compliant
//! regardless of either clock. Once the resolve window lapses without proof
//! the item is fine-eligible; account termination for repeat violations is
//! enforced by the backend, not here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, IntoStaticStr};
use uuid::Uuid;

use crate::{
  item::{ItemStatus, RescuedItem, VerificationStatus},
  lifecycle::whole_days_until,
};

pub const REPORT_WINDOW_DAYS: i64 = 7;
pub const RESOLVE_WINDOW_DAYS: i64 = 30;

/// The flat fine for a lapsed resolve window, in US cents.
pub const FINE_AMOUNT_CENTS: u64 = 10_000;
pub const FINE_DESCRIPTION: &str =
  "Compliance Fine - Violation of Irreplaceable Items Policy";

/// Where a flagged item stands against both policy clocks.
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
  EnumIter,
  IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ComplianceStatus {
  /// Proof of disposition is on file.
  Compliant,
  /// Inside the report window.
  Pending,
  /// Past the report window but inside the resolve window.
  Grace,
  /// Resolve window lapsed without proof; the fine applies.
  Violation,
}

/// The outcome of evaluating one flagged item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assessment {
  pub status:         ComplianceStatus,
  /// Days left in the resolve window; negative once it has lapsed.
  pub days_remaining: i64,
}

impl Assessment {
  pub fn fine_eligible(&self) -> bool { self.status == ComplianceStatus::Violation }
}

/// Evaluate the two policy clocks for an item flagged at `flag_date`.
pub fn assess(
  flag_date: DateTime<Utc>,
  now: DateTime<Utc>,
  proof_uploaded: bool,
) -> Assessment {
  // Whole days since the flag.
  let elapsed = whole_days_until(now, flag_date);
  let days_remaining = RESOLVE_WINDOW_DAYS - elapsed;

  let status = if proof_uploaded {
    ComplianceStatus::Compliant
  } else if elapsed <= REPORT_WINDOW_DAYS {
    ComplianceStatus::Pending
  } else if elapsed <= RESOLVE_WINDOW_DAYS {
    ComplianceStatus::Grace
  } else {
    ComplianceStatus::Violation
  };

  Assessment { status, days_remaining }
}

/// Whether the item's record counts as proof of disposition.
///
/// A drop-off, return or verification counts, as does any contact attempt
/// with an evidence document attached.
pub fn has_proof(item: &RescuedItem) -> bool {
  item.status != ItemStatus::Holding
    || item.verification_status == VerificationStatus::Verified
    || item.has_contact_evidence()
}

/// One row of the compliance tracker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComplianceItem {
  pub item_id:        Uuid,
  pub item_name:      String,
  pub flag_date:      DateTime<Utc>,
  pub proof_uploaded: bool,
  pub status:         ComplianceStatus,
  pub days_remaining: i64,
  pub fine_eligible:  bool,
}

impl ComplianceItem {
  /// The flag date of a rescued item is the day it was found.
  pub fn from_item(item: &RescuedItem, now: DateTime<Utc>) -> Self {
    let proof_uploaded = has_proof(item);
    let assessment = assess(item.date_found, now, proof_uploaded);
    Self {
      item_id: item.id,
      item_name: item.description.clone(),
      flag_date: item.date_found,
      proof_uploaded,
      status: assessment.status,
      days_remaining: assessment.days_remaining,
      fine_eligible: assessment.fine_eligible(),
    }
  }
}

/// Totals across a user's flagged items.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplianceSummary {
  pub active_items:        usize,
  pub compliant:           usize,
  pub pending:             usize,
  pub grace:               usize,
  pub violations:          usize,
  /// Sum of outstanding fines, in cents.
  pub fine_exposure_cents: u64,
}

impl ComplianceSummary {
  pub fn from_rows(rows: &[ComplianceItem]) -> Self {
    let mut summary = Self { active_items: rows.len(), ..Self::default() };
    for row in rows {
      match row.status {
        ComplianceStatus::Compliant => summary.compliant += 1,
        ComplianceStatus::Pending => summary.pending += 1,
        ComplianceStatus::Grace => summary.grace += 1,
        ComplianceStatus::Violation => {
          summary.violations += 1;
          summary.fine_exposure_cents += FINE_AMOUNT_CENTS;
        }
      }
    }
    summary
  }
}

/// Full compliance report for a set of items.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComplianceReport {
  pub items:   Vec<ComplianceItem>,
  pub summary: ComplianceSummary,
}

impl ComplianceReport {
  pub fn build(items: &[RescuedItem], now: DateTime<Utc>) -> Self {
    let items: Vec<_> = items
      .iter()
      .map(|item| ComplianceItem::from_item(item, now))
      .collect();
    let summary = ComplianceSummary::from_rows(&items);
    Self { items, summary }
  }
}
