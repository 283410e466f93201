//! The `RescueBackend` trait: the identity & persistence collaborator.
//!
//! The hosted backend owns all durable state. This trait is what the
//! dashboard needs from it; `refurrm-store-sqlite` implements it for local
//! use and tests. Higher layers depend on this abstraction only.

use std::future::Future;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  auction::{Auction, NewSavedAuction, SavedAuction, SavedAuctionQuery},
  entitlement::{Entitlement, ProfileUpdate, User},
  item::{
    ContactAttempt, ItemQuery, ItemStatus, NewContactAttempt, NewRescuedItem, RescuedItem,
    VerificationStatus,
  },
};

/// The signed-in account, as the identity service knows it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
  pub user_id: Uuid,
  pub email:   String,
}

/// Abstraction over the identity & persistence service.
///
/// Every read and write is scoped to a user; an id that belongs to another
/// user behaves as if it did not exist.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait RescueBackend: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Identity & profile ────────────────────────────────────────────────

  /// Create an account with a fresh free-tier profile, or return the
  /// existing account for `email`.
  fn register_user<'a>(
    &'a self,
    email: &'a str,
  ) -> impl Future<Output = Result<Identity, Self::Error>> + Send + 'a;

  /// Resolve an authenticated email to its account. `None` if unknown.
  fn current_user<'a>(
    &'a self,
    email: &'a str,
  ) -> impl Future<Output = Result<Option<Identity>, Self::Error>> + Send + 'a;

  fn read_profile(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  /// Write the fields set in `update` and return the resulting profile.
  fn update_profile(
    &self,
    user_id: Uuid,
    update: ProfileUpdate,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + '_;

  /// Charge one scan in a single step.
  ///
  /// Free accounts lose one scan; premium accounts are left as they are.
  /// Returns `None` when a free account has no scans left.
  fn consume_scan(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  /// Replace the entitlement with `next` only if the stored one still
  /// equals `expected`. Returns `None`, writing nothing, when it does not.
  fn swap_entitlement<'a>(
    &'a self,
    user_id: Uuid,
    expected: &'a Entitlement,
    next: &'a Entitlement,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + 'a;

  // ── Rescued items ─────────────────────────────────────────────────────

  /// Persist a newly reported item. The backend assigns the id and the
  /// report timestamp.
  fn add_item(
    &self,
    user_id: Uuid,
    input: NewRescuedItem,
  ) -> impl Future<Output = Result<RescuedItem, Self::Error>> + Send + '_;

  fn get_item(
    &self,
    user_id: Uuid,
    item_id: Uuid,
  ) -> impl Future<Output = Result<Option<RescuedItem>, Self::Error>> + Send + '_;

  /// Items ordered by report date, oldest first.
  fn list_items<'a>(
    &'a self,
    user_id: Uuid,
    query: &'a ItemQuery,
  ) -> impl Future<Output = Result<Vec<RescuedItem>, Self::Error>> + Send + 'a;

  /// Overwrite the item's mutable fields with `item`. Contact attempts are
  /// not touched; use [`RescueBackend::add_contact_attempt`].
  fn update_item<'a>(
    &'a self,
    item: &'a RescuedItem,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Write the status and drop-off fields of `item` if the stored status is
  /// still `from`. Returns `false`, writing nothing, otherwise.
  fn update_item_status<'a>(
    &'a self,
    item: &'a RescuedItem,
    from: ItemStatus,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  /// Set only the verification status. Returns `false` if the item does not
  /// exist for this user.
  fn set_item_verification(
    &self,
    user_id: Uuid,
    item_id: Uuid,
    status: VerificationStatus,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  fn add_contact_attempt(
    &self,
    user_id: Uuid,
    item_id: Uuid,
    input: NewContactAttempt,
  ) -> impl Future<Output = Result<ContactAttempt, Self::Error>> + Send + '_;

  // ── Auction listings ──────────────────────────────────────────────────

  fn add_auction(
    &self,
    auction: Auction,
  ) -> impl Future<Output = Result<Auction, Self::Error>> + Send + '_;

  /// Listings ordered by auction date.
  fn list_auctions(
    &self,
  ) -> impl Future<Output = Result<Vec<Auction>, Self::Error>> + Send + '_;

  fn get_auction(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Auction>, Self::Error>> + Send + '_;

  // ── Saved auctions ────────────────────────────────────────────────────

  fn save_auction(
    &self,
    user_id: Uuid,
    input: NewSavedAuction,
  ) -> impl Future<Output = Result<SavedAuction, Self::Error>> + Send + '_;

  fn get_saved_auction(
    &self,
    user_id: Uuid,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<SavedAuction>, Self::Error>> + Send + '_;

  /// Saved auctions filtered and sorted by `query`. Ties keep the newest
  /// saved first.
  fn list_saved_auctions<'a>(
    &'a self,
    user_id: Uuid,
    query: &'a SavedAuctionQuery,
  ) -> impl Future<Output = Result<Vec<SavedAuction>, Self::Error>> + Send + 'a;

  /// Replace the stored record with `auction`, matched on id and owner.
  fn update_saved_auction<'a>(
    &'a self,
    auction: &'a SavedAuction,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Returns `false` if there was nothing to delete.
  fn delete_saved_auction(
    &self,
    user_id: Uuid,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;
}
