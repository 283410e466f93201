//! Integration tests for `SqliteStore` against an in-memory database.

use chrono::{Duration, NaiveDate, TimeZone, Utc};
use refurrm_core::{
  auction::{Auction, AuctionSort, NewSavedAuction, RiskLevel, SavedAuctionQuery},
  backend::RescueBackend,
  entitlement::{FREE_SCAN_ALLOWANCE, PREMIUM_SCAN_SENTINEL, Plan, ProfileUpdate, Tier},
  item::{
    ContactMethod, ItemQuery, ItemStatus, ItemType, NewContactAttempt, NewRescuedItem,
    VerificationStatus,
  },
  lifecycle::Transition,
  session::{Session, SessionError},
};
use uuid::Uuid;

use crate::{Error, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

async fn user(s: &SqliteStore, email: &str) -> Uuid {
  s.register_user(email).await.unwrap().user_id
}

fn found() -> chrono::DateTime<Utc> { Utc.with_ymd_and_hms(2025, 9, 25, 12, 0, 0).unwrap() }

fn springfield_auction() -> Auction {
  Auction {
    id:            Uuid::new_v4(),
    facility_name: "Public Storage".into(),
    address:       "123 Main St".into(),
    city:          "Springfield".into(),
    state:         "IL".into(),
    auction_date:  NaiveDate::from_ymd_opt(2025, 10, 15).unwrap(),
    time:          "10:00 AM".into(),
    lien_amount:   450.0,
    distance:      2.3,
    lat:           39.7817,
    lng:           -89.6501,
    unit_number:   "A-113".into(),
    description:   "10x10 unit, furniture and boxes".into(),
  }
}

// ─── Identity & profile ──────────────────────────────────────────────────────

#[tokio::test]
async fn register_creates_free_profile() {
  let s = store().await;
  let id = s.register_user("reseller@example.com").await.unwrap();

  let profile = s.read_profile(id.user_id).await.unwrap().unwrap();
  assert_eq!(profile.email, "reseller@example.com");
  assert_eq!(profile.tier, Tier::Free);
  assert_eq!(profile.scans_remaining, FREE_SCAN_ALLOWANCE);
  assert!(!profile.agreed_to_terms);
  assert!(profile.pending_upgrade.is_none());
}

#[tokio::test]
async fn register_is_idempotent_per_email() {
  let s = store().await;
  let a = s.register_user("reseller@example.com").await.unwrap();
  let b = s.register_user("reseller@example.com").await.unwrap();
  assert_eq!(a, b);

  assert_eq!(s.current_user("reseller@example.com").await.unwrap(), Some(a));
  assert!(s.current_user("nobody@example.com").await.unwrap().is_none());
}

#[tokio::test]
async fn update_profile_only_touches_set_fields() {
  let s = store().await;
  let id = user(&s, "reseller@example.com").await;

  let p = s.update_profile(id, ProfileUpdate::accept_terms()).await.unwrap();
  assert!(p.agreed_to_terms);
  assert_eq!(p.scans_remaining, FREE_SCAN_ALLOWANCE);

  let p = s
    .update_profile(id, ProfileUpdate { scans_remaining: Some(3), ..Default::default() })
    .await
    .unwrap();
  assert!(p.agreed_to_terms);
  assert_eq!(p.scans_remaining, 3);
}

#[tokio::test]
async fn update_profile_for_unknown_user() {
  let s = store().await;
  let err = s.update_profile(Uuid::new_v4(), ProfileUpdate::accept_terms()).await.unwrap_err();
  assert!(err.is_not_found());
}

// ─── Session over the store ──────────────────────────────────────────────────

#[tokio::test]
async fn session_accepts_terms_and_consumes_scans() {
  let s = store().await;
  let identity = s.register_user("reseller@example.com").await.unwrap();
  let mut session = Session::load(&s, identity).await.unwrap();

  assert!(session.require_terms().is_err());
  session.accept_terms(&s).await.unwrap();
  session.require_terms().unwrap();

  session.consume_scan(&s).await.unwrap();
  assert_eq!(session.user.scans_remaining, FREE_SCAN_ALLOWANCE - 1);

  session.refresh(&s).await.unwrap();
  assert_eq!(session.user.scans_remaining, FREE_SCAN_ALLOWANCE - 1);
  assert!(session.user.agreed_to_terms);
}

#[tokio::test]
async fn exhausted_quota_is_a_domain_error() {
  let s = store().await;
  let identity = s.register_user("reseller@example.com").await.unwrap();
  s.update_profile(identity.user_id, ProfileUpdate { scans_remaining: Some(0), ..Default::default() })
    .await
    .unwrap();

  let mut session = Session::load(&s, identity).await.unwrap();
  let err = session.consume_scan(&s).await.unwrap_err();
  assert!(matches!(
    err,
    SessionError::Domain(refurrm_core::Error::ScanQuotaExhausted)
  ));
  assert_eq!(session.user.scans_remaining, 0);
}

#[tokio::test]
async fn failed_upgrade_rolls_back_persisted_tier() {
  let s = store().await;
  let identity = s.register_user("reseller@example.com").await.unwrap();
  let mut session = Session::load(&s, identity.clone()).await.unwrap();

  session.begin_upgrade(&s, "cs_test_1", Plan::Weekly, Utc::now()).await.unwrap();
  let stored = s.read_profile(identity.user_id).await.unwrap().unwrap();
  assert_eq!(stored.tier, Tier::Premium);
  assert_eq!(stored.scans_remaining, PREMIUM_SCAN_SENTINEL);
  assert_eq!(stored.pending_upgrade.as_ref().map(|p| p.checkout_id.as_str()), Some("cs_test_1"));

  session.settle_upgrade(&s, "cs_test_1", false).await.unwrap();
  let stored = s.read_profile(identity.user_id).await.unwrap().unwrap();
  assert_eq!(stored.tier, Tier::Free);
  assert_eq!(stored.scans_remaining, FREE_SCAN_ALLOWANCE);
  assert!(stored.pending_upgrade.is_none());
}

#[tokio::test]
async fn confirmed_upgrade_sticks() {
  let s = store().await;
  let identity = s.register_user("reseller@example.com").await.unwrap();
  let mut session = Session::load(&s, identity.clone()).await.unwrap();

  session.begin_upgrade(&s, "cs_test_2", Plan::Yearly, Utc::now()).await.unwrap();
  session.settle_upgrade(&s, "cs_test_2", true).await.unwrap();

  let stored = s.read_profile(identity.user_id).await.unwrap().unwrap();
  assert_eq!(stored.tier, Tier::Premium);
  assert!(stored.pending_upgrade.is_none());
}

#[tokio::test]
async fn consume_scan_never_goes_below_zero() {
  let s = store().await;
  let id = user(&s, "reseller@example.com").await;
  s.update_profile(id, ProfileUpdate { scans_remaining: Some(1), ..Default::default() })
    .await
    .unwrap();

  let charged = s.consume_scan(id).await.unwrap().unwrap();
  assert_eq!(charged.scans_remaining, 0);
  assert!(s.consume_scan(id).await.unwrap().is_none());
  assert_eq!(s.read_profile(id).await.unwrap().unwrap().scans_remaining, 0);
}

#[tokio::test]
async fn consume_scan_is_free_for_premium() {
  let s = store().await;
  let identity = s.register_user("reseller@example.com").await.unwrap();
  let mut session = Session::load(&s, identity.clone()).await.unwrap();
  session.begin_upgrade(&s, "cs_test_3", Plan::Weekly, Utc::now()).await.unwrap();

  let user = s.consume_scan(identity.user_id).await.unwrap().unwrap();
  assert_eq!(user.tier, Tier::Premium);
  assert_eq!(user.scans_remaining, PREMIUM_SCAN_SENTINEL);
  assert_eq!(user.pending_upgrade.as_ref().map(|p| p.checkout_id.as_str()), Some("cs_test_3"));
}

#[tokio::test]
async fn swap_entitlement_refuses_a_stale_expectation() {
  let s = store().await;
  let id = user(&s, "reseller@example.com").await;
  let before = s.read_profile(id).await.unwrap().unwrap();
  s.consume_scan(id).await.unwrap();

  let stale = before.entitlement();
  let mut next = stale.clone();
  next.tier = Tier::Premium;
  assert!(s.swap_entitlement(id, &stale, &next).await.unwrap().is_none());

  let stored = s.read_profile(id).await.unwrap().unwrap();
  assert_eq!(stored.tier, Tier::Free);
  assert_eq!(stored.scans_remaining, FREE_SCAN_ALLOWANCE - 1);
}

#[tokio::test]
async fn stale_session_upgrade_retries_against_fresh_profile() {
  let s = store().await;
  let identity = s.register_user("reseller@example.com").await.unwrap();
  let mut stale = Session::load(&s, identity.clone()).await.unwrap();

  // Another request spends a scan after `stale` was loaded.
  let mut other = Session::load(&s, identity.clone()).await.unwrap();
  other.consume_scan(&s).await.unwrap();

  stale.begin_upgrade(&s, "cs_test_4", Plan::Weekly, Utc::now()).await.unwrap();
  let pending = stale.user.pending_upgrade.clone().unwrap();
  assert_eq!(pending.previous_scans, FREE_SCAN_ALLOWANCE - 1);

  // The spender's stale view charging again leaves the upgrade in place.
  other.consume_scan(&s).await.unwrap();
  assert!(other.user.is_premium());

  stale.settle_upgrade(&s, "cs_test_4", false).await.unwrap();
  let stored = s.read_profile(identity.user_id).await.unwrap().unwrap();
  assert_eq!(stored.tier, Tier::Free);
  assert_eq!(stored.scans_remaining, FREE_SCAN_ALLOWANCE - 1);
}

// ─── Rescued items ───────────────────────────────────────────────────────────

#[tokio::test]
async fn add_and_get_item() {
  let s = store().await;
  let owner = user(&s, "reseller@example.com").await;

  let input = NewRescuedItem::new(ItemType::Photo, "Family photo album from 1960s", found());
  let item = s.add_item(owner, input).await.unwrap();
  assert_eq!(item.status, ItemStatus::Holding);
  assert_eq!(item.hold_deadline - item.date_reported, Duration::days(30));

  let fetched = s.get_item(owner, item.id).await.unwrap().unwrap();
  assert_eq!(fetched, item);
}

#[tokio::test]
async fn items_are_scoped_to_their_owner() {
  let s = store().await;
  let alice = user(&s, "alice@example.com").await;
  let bob = user(&s, "bob@example.com").await;

  let item = s
    .add_item(alice, NewRescuedItem::new(ItemType::Letter, "Love letters", found()))
    .await
    .unwrap();

  assert!(s.get_item(bob, item.id).await.unwrap().is_none());
  assert!(s.list_items(bob, &ItemQuery::default()).await.unwrap().is_empty());

  let mut stolen = item.clone();
  stolen.user_id = bob;
  let err = s.update_item(&stolen).await.unwrap_err();
  assert!(err.is_not_found());
}

#[tokio::test]
async fn blank_description_is_rejected() {
  let s = store().await;
  let owner = user(&s, "reseller@example.com").await;
  let err = s
    .add_item(owner, NewRescuedItem::new(ItemType::Other, "  ", found()))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Core(refurrm_core::Error::MissingDescription)));
}

#[tokio::test]
async fn auction_address_is_filled_from_listing() {
  let s = store().await;
  let owner = user(&s, "reseller@example.com").await;
  let auction = s.add_auction(springfield_auction()).await.unwrap();

  let mut input = NewRescuedItem::new(ItemType::Heirloom, "Pocket watch", found());
  input.auction_id = Some(auction.id);
  let item = s.add_item(owner, input).await.unwrap();

  assert_eq!(item.auction_address.as_deref(), Some("123 Main St, Springfield, IL"));
}

#[tokio::test]
async fn transitions_and_backdating_persist() {
  let s = store().await;
  let owner = user(&s, "reseller@example.com").await;
  let mut item = s
    .add_item(owner, NewRescuedItem::new(ItemType::Ashes, "Urn", found()))
    .await
    .unwrap();

  let reported = Utc.with_ymd_and_hms(2025, 9, 26, 9, 0, 0).unwrap();
  item.set_date_reported(reported);
  item
    .transition(
      Transition::DroppedOff { location: "ReFURRM hub".into(), date: None },
      reported + Duration::days(3),
    )
    .unwrap();
  item.set_verification(VerificationStatus::Verified);
  s.update_item(&item).await.unwrap();

  let fetched = s.get_item(owner, item.id).await.unwrap().unwrap();
  assert_eq!(fetched.status, ItemStatus::DroppedOff);
  assert_eq!(fetched.verification_status, VerificationStatus::Verified);
  assert_eq!(fetched.drop_off_location.as_deref(), Some("ReFURRM hub"));
  assert_eq!(fetched.drop_off_date, Some(reported + Duration::days(3)));
  assert_eq!(fetched.date_reported, reported);
  assert_eq!(fetched.hold_deadline, reported + Duration::days(30));
}

#[tokio::test]
async fn status_write_is_guarded_by_the_previous_status() {
  let s = store().await;
  let owner = user(&s, "reseller@example.com").await;
  let item = s
    .add_item(owner, NewRescuedItem::new(ItemType::Photo, "Albums", found()))
    .await
    .unwrap();

  let mut returned = item.clone();
  returned.transition(Transition::Returned, Utc::now()).unwrap();
  assert!(s.update_item_status(&returned, ItemStatus::Holding).await.unwrap());

  let mut dropped = item.clone();
  dropped
    .transition(Transition::DroppedOff { location: "Hub".into(), date: None }, Utc::now())
    .unwrap();
  assert!(!s.update_item_status(&dropped, ItemStatus::Holding).await.unwrap());

  let fetched = s.get_item(owner, item.id).await.unwrap().unwrap();
  assert_eq!(fetched.status, ItemStatus::Returned);
  assert!(fetched.drop_off_location.is_none());
}

#[tokio::test]
async fn verification_write_leaves_status_alone() {
  let s = store().await;
  let owner = user(&s, "reseller@example.com").await;
  let stranger = user(&s, "stranger@example.com").await;
  let item = s
    .add_item(owner, NewRescuedItem::new(ItemType::Heirloom, "Medals", found()))
    .await
    .unwrap();

  let mut returned = item.clone();
  returned.transition(Transition::Returned, Utc::now()).unwrap();
  s.update_item_status(&returned, ItemStatus::Holding).await.unwrap();

  assert!(!s.set_item_verification(stranger, item.id, VerificationStatus::Verified).await.unwrap());
  assert!(s.set_item_verification(owner, item.id, VerificationStatus::Verified).await.unwrap());

  let fetched = s.get_item(owner, item.id).await.unwrap().unwrap();
  assert_eq!(fetched.status, ItemStatus::Returned);
  assert_eq!(fetched.verification_status, VerificationStatus::Verified);
}

#[tokio::test]
async fn list_items_filters_by_status() {
  let s = store().await;
  let owner = user(&s, "reseller@example.com").await;

  for desc in ["Photos", "Letters", "Documents"] {
    s.add_item(owner, NewRescuedItem::new(ItemType::Document, desc, found())).await.unwrap();
  }
  let mut returned = s.list_items(owner, &ItemQuery::default()).await.unwrap().remove(1);
  returned.transition(Transition::Returned, Utc::now()).unwrap();
  s.update_item(&returned).await.unwrap();

  let all = s.list_items(owner, &ItemQuery::default()).await.unwrap();
  assert_eq!(all.len(), 3);
  assert!(all.windows(2).all(|w| w[0].date_reported <= w[1].date_reported));

  let holding = s
    .list_items(owner, &ItemQuery { status: Some(ItemStatus::Holding) })
    .await
    .unwrap();
  assert_eq!(holding.len(), 2);

  let done = s
    .list_items(owner, &ItemQuery { status: Some(ItemStatus::Returned) })
    .await
    .unwrap();
  assert_eq!(done.len(), 1);
  assert_eq!(done[0].id, returned.id);
}

#[tokio::test]
async fn contact_attempts_keep_logging_order() {
  let s = store().await;
  let owner = user(&s, "reseller@example.com").await;
  let item = s
    .add_item(owner, NewRescuedItem::new(ItemType::Photo, "Wedding album", found()))
    .await
    .unwrap();

  for (method, doc) in [
    (ContactMethod::Phone, None),
    (ContactMethod::Mail, Some("https://files.example/letter.pdf")),
  ] {
    s.add_contact_attempt(owner, item.id, NewContactAttempt {
      date:         Utc::now(),
      method,
      notes:        "Tried the number on the lease".into(),
      document_url: doc.map(str::to_string),
    })
    .await
    .unwrap();
  }

  let fetched = s.get_item(owner, item.id).await.unwrap().unwrap();
  let methods: Vec<_> = fetched.contact_attempts.iter().map(|a| a.method).collect();
  assert_eq!(methods, [ContactMethod::Phone, ContactMethod::Mail]);
  assert!(fetched.has_contact_evidence());

  let listed = s.list_items(owner, &ItemQuery::default()).await.unwrap();
  assert_eq!(listed[0].contact_attempts.len(), 2);
}

#[tokio::test]
async fn contact_attempt_on_foreign_item() {
  let s = store().await;
  let alice = user(&s, "alice@example.com").await;
  let bob = user(&s, "bob@example.com").await;
  let item = s
    .add_item(alice, NewRescuedItem::new(ItemType::Photo, "Album", found()))
    .await
    .unwrap();

  let err = s
    .add_contact_attempt(bob, item.id, NewContactAttempt {
      date:         Utc::now(),
      method:       ContactMethod::Email,
      notes:        String::new(),
      document_url: None,
    })
    .await
    .unwrap_err();
  assert!(err.is_not_found());
}

// ─── Auctions ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn auctions_list_by_date() {
  let s = store().await;
  let mut later = springfield_auction();
  later.auction_date = NaiveDate::from_ymd_opt(2025, 11, 2).unwrap();
  s.add_auction(later.clone()).await.unwrap();
  let sooner = s.add_auction(springfield_auction()).await.unwrap();

  let listed = s.list_auctions().await.unwrap();
  assert_eq!(listed.iter().map(|a| a.id).collect::<Vec<_>>(), [sooner.id, later.id]);
  assert_eq!(s.get_auction(later.id).await.unwrap(), Some(later));
  assert!(s.get_auction(Uuid::new_v4()).await.unwrap().is_none());
}

fn bookmark(title: &str, risk: RiskLevel) -> NewSavedAuction {
  NewSavedAuction {
    title:           title.into(),
    location:        "Springfield, IL".into(),
    auction_date:    None,
    image_url:       None,
    analysis_result: serde_json::json!({ "items": ["photo album"], "risk": risk.as_str() }),
    overall_risk:    risk,
    notes:           String::new(),
    reminder_date:   None,
  }
}

#[tokio::test]
async fn saved_auctions_crud() {
  let s = store().await;
  let owner = user(&s, "reseller@example.com").await;

  let mut saved = s.save_auction(owner, bookmark("Unit A-113", RiskLevel::High)).await.unwrap();
  s.save_auction(owner, bookmark("Unit B-7", RiskLevel::Low)).await.unwrap();

  saved.notes = "Bring a dolly".into();
  saved.is_bookmarked = false;
  saved.reminder_date = Some(Utc.with_ymd_and_hms(2025, 10, 14, 8, 0, 0).unwrap());
  s.update_saved_auction(&saved).await.unwrap();

  let high = s
    .list_saved_auctions(owner, &SavedAuctionQuery { risk: Some(RiskLevel::High), sort: AuctionSort::Risk })
    .await
    .unwrap();
  assert_eq!(high.len(), 1);
  assert_eq!(high[0].notes, "Bring a dolly");
  assert!(!high[0].is_bookmarked);
  assert_eq!(high[0].reminder_date, saved.reminder_date);
  assert_eq!(high[0].analysis_result["items"][0], "photo album");

  assert!(s.delete_saved_auction(owner, saved.id).await.unwrap());
  assert!(!s.delete_saved_auction(owner, saved.id).await.unwrap());
  assert_eq!(s.list_saved_auctions(owner, &SavedAuctionQuery::default()).await.unwrap().len(), 1);
}

#[tokio::test]
async fn updating_missing_saved_auction() {
  let s = store().await;
  let owner = user(&s, "reseller@example.com").await;
  let saved = bookmark("Ghost", RiskLevel::Medium).into_saved(Uuid::new_v4(), owner, Utc::now());
  let err = s.update_saved_auction(&saved).await.unwrap_err();
  assert!(err.is_not_found());
}

#[tokio::test]
async fn get_saved_auction_is_owner_scoped() {
  let s = store().await;
  let owner = user(&s, "reseller@example.com").await;
  let stranger = user(&s, "stranger@example.com").await;
  let saved = s.save_auction(owner, bookmark("Unit C-2", RiskLevel::Low)).await.unwrap();

  let fetched = s.get_saved_auction(owner, saved.id).await.unwrap().unwrap();
  assert_eq!(fetched.title, "Unit C-2");
  assert_eq!(fetched.created_at, saved.created_at);
  assert!(s.get_saved_auction(stranger, saved.id).await.unwrap().is_none());
  assert!(s.get_saved_auction(owner, Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn undated_saved_auctions_list_newest_first() {
  let s = store().await;
  let owner = user(&s, "reseller@example.com").await;
  for title in ["first", "second", "third"] {
    s.save_auction(owner, bookmark(title, RiskLevel::Medium)).await.unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
  }

  let listed = s.list_saved_auctions(owner, &SavedAuctionQuery::default()).await.unwrap();
  let titles: Vec<_> = listed.iter().map(|a| a.title.as_str()).collect();
  assert_eq!(titles, ["third", "second", "first"]);
}
