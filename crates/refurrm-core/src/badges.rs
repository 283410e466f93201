//! Rescue achievements.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, IntoStaticStr};

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum BadgeKind {
  /// Threshold on total rescues.
  Rescues,
  /// Threshold on consecutive rescue days.
  Streak,
  /// Awarded by hand; never earned automatically.
  Special,
}

/// An entry in the badge catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BadgeDefinition {
  pub id:          &'static str,
  pub name:        &'static str,
  pub description: &'static str,
  pub icon:        &'static str,
  pub requirement: u32,
  #[serde(rename = "type")]
  pub kind:        BadgeKind,
}

/// A catalog badge the user has earned.
#[derive(Debug, Clone, Serialize)]
pub struct EarnedBadge {
  #[serde(flatten)]
  pub badge:     BadgeDefinition,
  pub earned_at: DateTime<Utc>,
}

/// A catalog badge annotated for display.
#[derive(Debug, Clone, Serialize)]
pub struct BadgeStatus {
  #[serde(flatten)]
  pub badge:  BadgeDefinition,
  pub earned: bool,
}

pub static CATALOG: [BadgeDefinition; 6] = [
  BadgeDefinition {
    id:          "first_rescue",
    name:        "First Rescue",
    description: "Complete your first rescue",
    icon:        "🎯",
    requirement: 1,
    kind:        BadgeKind::Rescues,
  },
  BadgeDefinition {
    id:          "ten_rescues",
    name:        "Rescue Hero",
    description: "Rescue 10 items",
    icon:        "🦸",
    requirement: 10,
    kind:        BadgeKind::Rescues,
  },
  BadgeDefinition {
    id:          "fifty_rescues",
    name:        "Guardian Angel",
    description: "Rescue 50 items",
    icon:        "👼",
    requirement: 50,
    kind:        BadgeKind::Rescues,
  },
  BadgeDefinition {
    id:          "hundred_rescues",
    name:        "Rescue Legend",
    description: "Rescue 100 items",
    icon:        "🏆",
    requirement: 100,
    kind:        BadgeKind::Rescues,
  },
  BadgeDefinition {
    id:          "week_streak",
    name:        "Week Warrior",
    description: "7-day rescue streak",
    icon:        "🔥",
    requirement: 7,
    kind:        BadgeKind::Streak,
  },
  BadgeDefinition {
    id:          "month_streak",
    name:        "Monthly Master",
    description: "30-day rescue streak",
    icon:        "⚡",
    requirement: 30,
    kind:        BadgeKind::Streak,
  },
];

impl BadgeDefinition {
  pub fn is_earned(&self, total_rescues: u32, current_streak: u32) -> bool {
    match self.kind {
      BadgeKind::Rescues => total_rescues >= self.requirement,
      BadgeKind::Streak => current_streak >= self.requirement,
      BadgeKind::Special => false,
    }
  }
}

/// Catalog badges earned at the given totals, in catalog order.
pub fn earned(total_rescues: u32, current_streak: u32) -> impl Iterator<Item = &'static BadgeDefinition> {
  CATALOG
    .iter()
    .filter(move |b| b.is_earned(total_rescues, current_streak))
}

/// The whole catalog with an earned flag per badge.
pub fn catalog_status(total_rescues: u32, current_streak: u32) -> Vec<BadgeStatus> {
  CATALOG
    .iter()
    .map(|b| BadgeStatus {
      badge:  b.clone(),
      earned: b.is_earned(total_rescues, current_streak),
    })
    .collect()
}

pub fn find(id: &str) -> Option<&'static BadgeDefinition> { CATALOG.iter().find(|b| b.id == id) }
