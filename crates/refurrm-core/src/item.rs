//! Rescued items: the physical objects recovered from an auction lot.
//!
//! An item is reported once and then moves through the hold lifecycle (see
//! [`crate::lifecycle`]). Contact attempts hang off the item in the order they
//! were logged and are never edited afterwards.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};
use uuid::Uuid;

use crate::{Error, Result};

/// Days an irreplaceable item must be held after it was reported.
pub const HOLD_PERIOD_DAYS: i64 = 30;

/// The hold deadline for an item reported at `date_reported`.
pub fn hold_deadline_for(date_reported: DateTime<Utc>) -> DateTime<Utc> {
  date_reported + Duration::days(HOLD_PERIOD_DAYS)
}

// ─── Enumerations ────────────────────────────────────────────────────────────

/// What kind of sentimental object was found.
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
  EnumIter,
  IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ItemType {
  Photo,
  Letter,
  Jewelry,
  Document,
  Ashes,
  Heirloom,
  Other,
}

/// Physical disposition of an item.
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
  EnumIter,
  IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ItemStatus {
  #[default]
  Holding,
  DroppedOff,
  Returned,
  Verified,
}

/// Whether an auditor has confirmed the rescue. Tracked independently of
/// [`ItemStatus`].
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
  EnumIter,
  IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum VerificationStatus {
  #[default]
  Pending,
  Verified,
  Rejected,
}

/// How the reseller tried to reach the original owner.
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
  EnumIter,
  IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ContactMethod {
  Phone,
  Email,
  Mail,
  InPerson,
}

macro_rules! impl_as_str {
  ($($ty:ty),* $(,)?) => {
    $(
      impl $ty {
        /// The snake_case discriminant used in JSON and in storage columns.
        pub fn as_str(self) -> &'static str { self.into() }
      }
    )*
  };
}

impl_as_str!(ItemType, ItemStatus, VerificationStatus, ContactMethod);

// ─── Contact attempts ────────────────────────────────────────────────────────

/// A logged attempt to reach the original owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactAttempt {
  pub id:           Uuid,
  pub date:         DateTime<Utc>,
  pub method:       ContactMethod,
  pub notes:        String,
  /// Evidence of the attempt (a scanned letter, a call log screenshot).
  pub document_url: Option<String>,
}

/// Input to [`crate::backend::RescueBackend::add_contact_attempt`].
#[derive(Debug, Clone, Deserialize)]
pub struct NewContactAttempt {
  pub date:         DateTime<Utc>,
  pub method:       ContactMethod,
  #[serde(default)]
  pub notes:        String,
  pub document_url: Option<String>,
}

impl NewContactAttempt {
  pub fn into_attempt(self, id: Uuid) -> ContactAttempt {
    ContactAttempt {
      id,
      date: self.date,
      method: self.method,
      notes: self.notes,
      document_url: self.document_url,
    }
  }
}

// ─── RescuedItem ─────────────────────────────────────────────────────────────

/// One physical item recovered from an auction lot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RescuedItem {
  pub id:                  Uuid,
  pub user_id:             Uuid,
  pub item_type:           ItemType,
  pub description:         String,
  pub date_found:          DateTime<Utc>,
  pub date_reported:       DateTime<Utc>,
  /// Always `date_reported + 30 days`.
  pub hold_deadline:       DateTime<Utc>,
  pub status:              ItemStatus,
  pub verification_status: VerificationStatus,
  pub drop_off_location:   Option<String>,
  pub drop_off_date:       Option<DateTime<Utc>>,
  pub photo_url:           Option<String>,
  pub auction_id:          Option<Uuid>,
  pub auction_address:     Option<String>,
  pub contact_attempts:    Vec<ContactAttempt>,
}

impl RescuedItem {
  /// Build a freshly reported item. The item starts out `holding` with a
  /// pending verification.
  pub fn report(
    id: Uuid,
    user_id: Uuid,
    input: NewRescuedItem,
    reported_at: DateTime<Utc>,
  ) -> Result<Self> {
    if input.description.trim().is_empty() {
      return Err(Error::MissingDescription);
    }

    Ok(Self {
      id,
      user_id,
      item_type: input.item_type,
      description: input.description,
      date_found: input.date_found,
      date_reported: reported_at,
      hold_deadline: hold_deadline_for(reported_at),
      status: ItemStatus::Holding,
      verification_status: VerificationStatus::Pending,
      drop_off_location: None,
      drop_off_date: None,
      photo_url: input.photo_url,
      auction_id: input.auction_id,
      auction_address: input.auction_address,
      contact_attempts: Vec::new(),
    })
  }

  /// Change the reported date, keeping the hold deadline in step.
  pub fn set_date_reported(&mut self, date_reported: DateTime<Utc>) {
    self.date_reported = date_reported;
    self.hold_deadline = hold_deadline_for(date_reported);
  }

  /// Whether any logged contact attempt carries evidence.
  pub fn has_contact_evidence(&self) -> bool {
    self
      .contact_attempts
      .iter()
      .any(|a| a.document_url.as_deref().is_some_and(|u| !u.is_empty()))
  }
}

/// Input for reporting a new rescue.
///
/// `date_reported` and `hold_deadline` are always set by the caller's clock;
/// they are not accepted here.
#[derive(Debug, Clone, Deserialize)]
pub struct NewRescuedItem {
  pub item_type:       ItemType,
  pub description:     String,
  pub date_found:      DateTime<Utc>,
  pub photo_url:       Option<String>,
  pub auction_id:      Option<Uuid>,
  /// Free-text address; filled from the auction listing when `auction_id`
  /// resolves and this is empty.
  pub auction_address: Option<String>,
}

impl NewRescuedItem {
  pub fn new(
    item_type: ItemType,
    description: impl Into<String>,
    date_found: DateTime<Utc>,
  ) -> Self {
    Self {
      item_type,
      description: description.into(),
      date_found,
      photo_url: None,
      auction_id: None,
      auction_address: None,
    }
  }
}

/// Filter for [`crate::backend::RescueBackend::list_items`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ItemQuery {
  pub status: Option<ItemStatus>,
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
  }

  #[test]
  fn reported_item_holds_for_thirty_days() {
    let input = NewRescuedItem::new(ItemType::Photo, "Family photo album", at(2025, 9, 25));
    let item = RescuedItem::report(Uuid::new_v4(), Uuid::new_v4(), input, at(2025, 9, 26)).unwrap();

    assert_eq!(item.status, ItemStatus::Holding);
    assert_eq!(item.verification_status, VerificationStatus::Pending);
    assert_eq!(item.hold_deadline, at(2025, 10, 26));
    assert_eq!(item.hold_deadline - item.date_reported, Duration::days(30));
  }

  #[test]
  fn changing_reported_date_moves_deadline() {
    let input = NewRescuedItem::new(ItemType::Letter, "Love letters", at(2025, 9, 20));
    let mut item = RescuedItem::report(Uuid::new_v4(), Uuid::new_v4(), input, at(2025, 9, 21)).unwrap();

    item.set_date_reported(at(2025, 12, 31));
    assert_eq!(item.hold_deadline, at(2026, 1, 30));
  }

  #[test]
  fn blank_description_is_rejected() {
    let input = NewRescuedItem::new(ItemType::Other, "   ", at(2025, 9, 20));
    let err = RescuedItem::report(Uuid::new_v4(), Uuid::new_v4(), input, at(2025, 9, 21));
    assert!(matches!(err, Err(Error::MissingDescription)));
  }

  #[test]
  fn discriminants_are_snake_case() {
    assert_eq!(ItemStatus::DroppedOff.as_str(), "dropped_off");
    assert_eq!(ContactMethod::InPerson.as_str(), "in_person");
    assert_eq!("heirloom".parse::<ItemType>().unwrap(), ItemType::Heirloom);
    assert_eq!(
      serde_json::to_string(&VerificationStatus::Rejected).unwrap(),
      "\"rejected\""
    );
  }
}
