//! Auction listings and the user's saved (bookmarked) auctions.

use std::cmp::Ordering;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};
use uuid::Uuid;

// ─── Listings ────────────────────────────────────────────────────────────────

/// A public storage-unit auction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Auction {
  pub id:            Uuid,
  pub facility_name: String,
  pub address:       String,
  pub city:          String,
  pub state:         String,
  pub auction_date:  NaiveDate,
  /// Local start time as listed, e.g. "10:00 AM".
  pub time:          String,
  pub lien_amount:   f64,
  /// Miles from the user's search origin.
  pub distance:      f64,
  pub lat:           f64,
  pub lng:           f64,
  pub unit_number:   String,
  pub description:   String,
}

impl Auction {
  /// `address, city, state` as shown on rescue records.
  pub fn full_address(&self) -> String {
    format!("{}, {}, {}", self.address, self.city, self.state)
  }
}

// ─── Saved auctions ──────────────────────────────────────────────────────────

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
pub enum RiskLevel {
  #[default]
  Low,
  Medium,
  High,
}

impl RiskLevel {
  pub fn as_str(self) -> &'static str { self.into() }

  fn rank(self) -> u8 {
    match self {
      Self::Low => 1,
      Self::Medium => 2,
      Self::High => 3,
    }
  }
}

/// A bookmarked auction with the user's annotations. Always read and
/// written as a whole record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedAuction {
  pub id:              Uuid,
  pub user_id:         Uuid,
  pub title:           String,
  pub location:        String,
  pub auction_date:    Option<NaiveDate>,
  pub image_url:       Option<String>,
  /// Opaque output of the photo scanner.
  pub analysis_result: serde_json::Value,
  pub overall_risk:    RiskLevel,
  pub notes:           String,
  pub is_bookmarked:   bool,
  pub reminder_date:   Option<DateTime<Utc>>,
  pub created_at:      DateTime<Utc>,
}

/// Input to [`crate::backend::RescueBackend::save_auction`].
#[derive(Debug, Clone, Deserialize)]
pub struct NewSavedAuction {
  pub title:           String,
  #[serde(default)]
  pub location:        String,
  pub auction_date:    Option<NaiveDate>,
  pub image_url:       Option<String>,
  #[serde(default)]
  pub analysis_result: serde_json::Value,
  #[serde(default)]
  pub overall_risk:    RiskLevel,
  #[serde(default)]
  pub notes:           String,
  pub reminder_date:   Option<DateTime<Utc>>,
}

impl NewSavedAuction {
  pub fn into_saved(self, id: Uuid, user_id: Uuid, created_at: DateTime<Utc>) -> SavedAuction {
    SavedAuction {
      id,
      user_id,
      title: self.title,
      location: self.location,
      auction_date: self.auction_date,
      image_url: self.image_url,
      analysis_result: self.analysis_result,
      overall_risk: self.overall_risk,
      notes: self.notes,
      is_bookmarked: true,
      reminder_date: self.reminder_date,
      created_at,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuctionSort {
  /// Soonest auction first; undated last.
  #[default]
  Date,
  /// Highest risk first.
  Risk,
  /// Most recently saved first.
  Created,
}

/// Filter and ordering for the saved-auctions view.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SavedAuctionQuery {
  pub risk: Option<RiskLevel>,
  #[serde(default)]
  pub sort: AuctionSort,
}

impl SavedAuctionQuery {
  /// Apply the risk filter and sort order in place.
  pub fn apply(&self, auctions: &mut Vec<SavedAuction>) {
    if let Some(risk) = self.risk {
      auctions.retain(|a| a.overall_risk == risk);
    }

    match self.sort {
      AuctionSort::Date => auctions.sort_by(|a, b| {
        match (a.auction_date, b.auction_date) {
          (Some(x), Some(y)) => x.cmp(&y),
          (Some(_), None) => Ordering::Less,
          (None, Some(_)) => Ordering::Greater,
          (None, None) => Ordering::Equal,
        }
      }),
      AuctionSort::Risk => {
        auctions.sort_by(|a, b| b.overall_risk.rank().cmp(&a.overall_risk.rank()))
      }
      AuctionSort::Created => auctions.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
    }
  }
}
