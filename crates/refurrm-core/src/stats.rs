//! Rescue statistics, derived from a user's items on every read.

use std::collections::BTreeSet;

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use serde::Serialize;

use crate::{
  badges::{self, BadgeKind, EarnedBadge},
  item::{ItemStatus, RescuedItem, VerificationStatus},
};

pub const POINTS_PER_RESCUE: u32 = 50;
pub const POINTS_PER_VERIFIED_RETURN: u32 = 30;
pub const POINTS_PER_DROP_OFF: u32 = 20;

#[derive(Debug, Clone, Serialize)]
pub struct RescueStats {
  pub total_rescues:    u32,
  pub active_holds:     u32,
  pub verified_returns: u32,
  pub drop_offs:        u32,
  pub impact_score:     u32,
  /// Consecutive calendar days, ending today or yesterday, with at least one
  /// reported rescue.
  pub current_streak:   u32,
  pub badges:           Vec<EarnedBadge>,
}

impl RescueStats {
  pub fn compute(items: &[RescuedItem], now: DateTime<Utc>) -> Self {
    let total_rescues = items.len() as u32;
    let active_holds = count(items, |i| i.status == ItemStatus::Holding);
    let verified_returns =
      count(items, |i| i.verification_status == VerificationStatus::Verified);
    let drop_offs = count(items, |i| i.status == ItemStatus::DroppedOff);

    let impact_score = total_rescues * POINTS_PER_RESCUE
      + verified_returns * POINTS_PER_VERIFIED_RETURN
      + drop_offs * POINTS_PER_DROP_OFF;

    let (current_streak, streak_start) = current_streak(items, now.date_naive());

    let mut reported: Vec<DateTime<Utc>> =
      items.iter().map(|i| i.date_reported).collect();
    reported.sort();

    let badges = badges::earned(total_rescues, current_streak)
      .filter_map(|badge| {
        let earned_at = match badge.kind {
          // The rescue that crossed the threshold.
          BadgeKind::Rescues => reported
            .get(badge.requirement.saturating_sub(1) as usize)
            .copied(),
          // The day the running streak reached the requirement.
          BadgeKind::Streak => streak_start
            .map(|start| start + Duration::days(i64::from(badge.requirement) - 1))
            .map(|day| Utc.from_utc_datetime(&day.and_time(chrono::NaiveTime::MIN))),
          BadgeKind::Special => None,
        }?;
        Some(EarnedBadge { badge: badge.clone(), earned_at })
      })
      .collect();

    Self {
      total_rescues,
      active_holds,
      verified_returns,
      drop_offs,
      impact_score,
      current_streak,
      badges,
    }
  }
}

fn count(items: &[RescuedItem], pred: impl Fn(&RescuedItem) -> bool) -> u32 {
  items.iter().filter(|i| pred(*i)).count() as u32
}

/// Length and first day of the run of consecutive reporting days that ends
/// on `today` or the day before.
fn current_streak(items: &[RescuedItem], today: NaiveDate) -> (u32, Option<NaiveDate>) {
  let days: BTreeSet<NaiveDate> =
    items.iter().map(|i| i.date_reported.date_naive()).collect();

  let yesterday = today - Duration::days(1);
  let mut day = if days.contains(&today) {
    today
  } else if days.contains(&yesterday) {
    yesterday
  } else {
    return (0, None);
  };

  let mut streak = 0;
  let mut start = day;
  while days.contains(&day) {
    streak += 1;
    start = day;
    day -= Duration::days(1);
  }
  (streak, Some(start))
}

#[cfg(test)]
mod tests {
  use uuid::Uuid;

  use super::*;
  use crate::{
    item::{ItemType, NewRescuedItem},
    lifecycle::Transition,
  };

  fn noon(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
  }

  fn reported_on(at: DateTime<Utc>) -> RescuedItem {
    let input = NewRescuedItem::new(ItemType::Heirloom, "Pocket watch", at);
    RescuedItem::report(Uuid::new_v4(), Uuid::nil(), input, at).unwrap()
  }

  #[test]
  fn twelve_rescues_mix() {
    // 12 items over the first twelve days of October.
    let mut items: Vec<_> = (1..=12).map(|d| reported_on(noon(2025, 10, d))).collect();
    for item in items.iter_mut().take(7) {
      item.set_verification(VerificationStatus::Verified);
      item.transition(Transition::Returned, noon(2025, 10, 20)).unwrap();
    }
    for item in items.iter_mut().skip(7).take(2) {
      item
        .transition(
          Transition::DroppedOff { location: "Unit 42".into(), date: None },
          noon(2025, 10, 20),
        )
        .unwrap();
    }

    let stats = RescueStats::compute(&items, noon(2025, 10, 12));
    assert_eq!(stats.total_rescues, 12);
    assert_eq!(stats.active_holds, 3);
    assert_eq!(stats.verified_returns, 7);
    assert_eq!(stats.drop_offs, 2);
    assert_eq!(stats.impact_score, 850);
    assert_eq!(stats.current_streak, 12);

    let ids: Vec<_> = stats.badges.iter().map(|b| b.badge.id).collect();
    assert_eq!(ids, ["first_rescue", "ten_rescues", "week_streak"]);
    assert_eq!(stats.badges[0].earned_at, noon(2025, 10, 1));
    assert_eq!(stats.badges[1].earned_at, noon(2025, 10, 10));
    assert_eq!(
      stats.badges[2].earned_at,
      Utc.with_ymd_and_hms(2025, 10, 7, 0, 0, 0).unwrap()
    );
  }

  #[test]
  fn streak_survives_until_end_of_next_day() {
    let items = vec![reported_on(noon(2025, 10, 1)), reported_on(noon(2025, 10, 2))];
    assert_eq!(RescueStats::compute(&items, noon(2025, 10, 3)).current_streak, 2);
    assert_eq!(RescueStats::compute(&items, noon(2025, 10, 4)).current_streak, 0);
  }

  #[test]
  fn gap_breaks_the_streak() {
    let items = vec![
      reported_on(noon(2025, 10, 1)),
      reported_on(noon(2025, 10, 3)),
      reported_on(noon(2025, 10, 3)),
    ];
    assert_eq!(RescueStats::compute(&items, noon(2025, 10, 3)).current_streak, 1);
  }

  #[test]
  fn empty_history() {
    let stats = RescueStats::compute(&[], noon(2025, 10, 3));
    assert_eq!(stats.total_rescues, 0);
    assert_eq!(stats.impact_score, 0);
    assert!(stats.badges.is_empty());
  }
}
