//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are RFC 3339 strings and calendar dates are `YYYY-MM-DD`.
//! Enumerations are stored as their snake_case discriminant. The pending
//! upgrade and the scanner's analysis are compact JSON. UUIDs are hyphenated
//! lowercase strings.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use refurrm_core::{
  auction::{Auction, SavedAuction},
  entitlement::{PendingUpgrade, User},
  item::{ContactAttempt, RescuedItem},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Scalars ─────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| Error::DateParse(e.to_string()))
}

/// Parse a stored discriminant, naming the column kind on failure.
pub fn decode_enum<T: FromStr>(kind: &'static str, s: &str) -> Result<T> {
  s.parse().map_err(|_| {
    Error::Core(refurrm_core::Error::UnknownDiscriminant { kind, value: s.to_owned() })
  })
}

pub fn encode_pending(p: Option<&PendingUpgrade>) -> Result<Option<String>> {
  Ok(p.map(serde_json::to_string).transpose()?)
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values from `users` joined with `profiles`.
pub struct RawUser {
  pub user_id:         String,
  pub email:           String,
  pub tier:            String,
  pub scans_remaining: u32,
  pub violations:      u32,
  pub agreed_to_terms: bool,
  pub pending_upgrade: Option<String>,
}

impl RawUser {
  pub fn into_user(self) -> Result<User> {
    Ok(User {
      id:              decode_uuid(&self.user_id)?,
      email:           self.email,
      tier:            decode_enum("tier", &self.tier)?,
      scans_remaining: self.scans_remaining,
      violations:      self.violations,
      agreed_to_terms: self.agreed_to_terms,
      pending_upgrade: self
        .pending_upgrade
        .as_deref()
        .map(serde_json::from_str)
        .transpose()?,
    })
  }
}

/// Raw strings read directly from a `rescued_items` row.
pub struct RawItem {
  pub item_id:             String,
  pub user_id:             String,
  pub item_type:           String,
  pub description:         String,
  pub date_found:          String,
  pub date_reported:       String,
  pub hold_deadline:       String,
  pub status:              String,
  pub verification_status: String,
  pub drop_off_location:   Option<String>,
  pub drop_off_date:       Option<String>,
  pub photo_url:           Option<String>,
  pub auction_id:          Option<String>,
  pub auction_address:     Option<String>,
}

/// Column list matching the field order of [`RawItem`].
pub const ITEM_COLUMNS: &str = "item_id, user_id, item_type, description, date_found, \
   date_reported, hold_deadline, status, verification_status, drop_off_location, \
   drop_off_date, photo_url, auction_id, auction_address";

impl RawItem {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      item_id:             row.get(0)?,
      user_id:             row.get(1)?,
      item_type:           row.get(2)?,
      description:         row.get(3)?,
      date_found:          row.get(4)?,
      date_reported:       row.get(5)?,
      hold_deadline:       row.get(6)?,
      status:              row.get(7)?,
      verification_status: row.get(8)?,
      drop_off_location:   row.get(9)?,
      drop_off_date:       row.get(10)?,
      photo_url:           row.get(11)?,
      auction_id:          row.get(12)?,
      auction_address:     row.get(13)?,
    })
  }

  /// Decode the row; contact attempts are attached by the caller.
  pub fn into_item(self, contact_attempts: Vec<ContactAttempt>) -> Result<RescuedItem> {
    Ok(RescuedItem {
      id: decode_uuid(&self.item_id)?,
      user_id: decode_uuid(&self.user_id)?,
      item_type: decode_enum("item_type", &self.item_type)?,
      description: self.description,
      date_found: decode_dt(&self.date_found)?,
      date_reported: decode_dt(&self.date_reported)?,
      hold_deadline: decode_dt(&self.hold_deadline)?,
      status: decode_enum("status", &self.status)?,
      verification_status: decode_enum("verification_status", &self.verification_status)?,
      drop_off_location: self.drop_off_location,
      drop_off_date: self.drop_off_date.as_deref().map(decode_dt).transpose()?,
      photo_url: self.photo_url,
      auction_id: self.auction_id.as_deref().map(decode_uuid).transpose()?,
      auction_address: self.auction_address,
      contact_attempts,
    })
  }
}

/// Raw strings read from a `contact_attempts` row.
pub struct RawAttempt {
  pub attempt_id:   String,
  pub item_id:      String,
  pub date:         String,
  pub method:       String,
  pub notes:        String,
  pub document_url: Option<String>,
}

impl RawAttempt {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      attempt_id:   row.get(0)?,
      item_id:      row.get(1)?,
      date:         row.get(2)?,
      method:       row.get(3)?,
      notes:        row.get(4)?,
      document_url: row.get(5)?,
    })
  }

  pub fn into_attempt(self) -> Result<(Uuid, ContactAttempt)> {
    let attempt = ContactAttempt {
      id:           decode_uuid(&self.attempt_id)?,
      date:         decode_dt(&self.date)?,
      method:       decode_enum("contact_method", &self.method)?,
      notes:        self.notes,
      document_url: self.document_url,
    };
    Ok((decode_uuid(&self.item_id)?, attempt))
  }
}

pub struct RawAuction {
  pub auction_id:    String,
  pub facility_name: String,
  pub address:       String,
  pub city:          String,
  pub state:         String,
  pub auction_date:  String,
  pub time:          String,
  pub lien_amount:   f64,
  pub distance:      f64,
  pub lat:           f64,
  pub lng:           f64,
  pub unit_number:   String,
  pub description:   String,
}

pub const AUCTION_COLUMNS: &str = "auction_id, facility_name, address, city, state, \
   auction_date, time, lien_amount, distance, lat, lng, unit_number, description";

impl RawAuction {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      auction_id:    row.get(0)?,
      facility_name: row.get(1)?,
      address:       row.get(2)?,
      city:          row.get(3)?,
      state:         row.get(4)?,
      auction_date:  row.get(5)?,
      time:          row.get(6)?,
      lien_amount:   row.get(7)?,
      distance:      row.get(8)?,
      lat:           row.get(9)?,
      lng:           row.get(10)?,
      unit_number:   row.get(11)?,
      description:   row.get(12)?,
    })
  }

  pub fn into_auction(self) -> Result<Auction> {
    Ok(Auction {
      id:            decode_uuid(&self.auction_id)?,
      facility_name: self.facility_name,
      address:       self.address,
      city:          self.city,
      state:         self.state,
      auction_date:  decode_date(&self.auction_date)?,
      time:          self.time,
      lien_amount:   self.lien_amount,
      distance:      self.distance,
      lat:           self.lat,
      lng:           self.lng,
      unit_number:   self.unit_number,
      description:   self.description,
    })
  }
}

pub struct RawSavedAuction {
  pub saved_id:        String,
  pub user_id:         String,
  pub title:           String,
  pub location:        String,
  pub auction_date:    Option<String>,
  pub image_url:       Option<String>,
  pub analysis_result: String,
  pub overall_risk:    String,
  pub notes:           String,
  pub is_bookmarked:   bool,
  pub reminder_date:   Option<String>,
  pub created_at:      String,
}

pub const SAVED_COLUMNS: &str = "saved_id, user_id, title, location, auction_date, \
   image_url, analysis_result, overall_risk, notes, is_bookmarked, reminder_date, created_at";

impl RawSavedAuction {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      saved_id:        row.get(0)?,
      user_id:         row.get(1)?,
      title:           row.get(2)?,
      location:        row.get(3)?,
      auction_date:    row.get(4)?,
      image_url:       row.get(5)?,
      analysis_result: row.get(6)?,
      overall_risk:    row.get(7)?,
      notes:           row.get(8)?,
      is_bookmarked:   row.get(9)?,
      reminder_date:   row.get(10)?,
      created_at:      row.get(11)?,
    })
  }

  pub fn into_saved(self) -> Result<SavedAuction> {
    Ok(SavedAuction {
      id:              decode_uuid(&self.saved_id)?,
      user_id:         decode_uuid(&self.user_id)?,
      title:           self.title,
      location:        self.location,
      auction_date:    self.auction_date.as_deref().map(decode_date).transpose()?,
      image_url:       self.image_url,
      analysis_result: serde_json::from_str(&self.analysis_result)?,
      overall_risk:    decode_enum("risk_level", &self.overall_risk)?,
      notes:           self.notes,
      is_bookmarked:   self.is_bookmarked,
      reminder_date:   self.reminder_date.as_deref().map(decode_dt).transpose()?,
      created_at:      decode_dt(&self.created_at)?,
    })
  }
}
