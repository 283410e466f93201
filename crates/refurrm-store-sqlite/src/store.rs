//! [`SqliteStore`]: the SQLite implementation of [`RescueBackend`].

use std::{collections::HashMap, path::Path};

use chrono::Utc;
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use refurrm_core::{
  auction::{Auction, NewSavedAuction, SavedAuction, SavedAuctionQuery},
  backend::{Identity, RescueBackend},
  entitlement::{Entitlement, ProfileUpdate, Tier, User},
  item::{
    ContactAttempt, ItemQuery, ItemStatus, NewContactAttempt, NewRescuedItem, RescuedItem,
    VerificationStatus,
  },
};

use crate::{
  encode::{
    AUCTION_COLUMNS, ITEM_COLUMNS, RawAttempt, RawAuction, RawItem, RawSavedAuction, RawUser,
    SAVED_COLUMNS, decode_uuid, encode_date, encode_dt, encode_pending, encode_uuid,
  },
  schema::SCHEMA,
  Error, Result,
};

const USER_SELECT: &str = "SELECT u.user_id, u.email, p.tier, p.scans_remaining, \
   p.violations, p.agreed_to_terms, p.pending_upgrade
   FROM users u JOIN profiles p ON p.user_id = u.user_id";

// ─── Store ───────────────────────────────────────────────────────────────────

/// A ReFURRM backend stored in a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    tracing::debug!("sqlite schema ready");
    Ok(())
  }

  async fn user_where(&self, clause: &'static str, value: String) -> Result<Option<User>> {
    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(&format!("{USER_SELECT} WHERE {clause} = ?1"), [value], |row| {
            Ok(RawUser {
              user_id:         row.get(0)?,
              email:           row.get(1)?,
              tier:            row.get(2)?,
              scans_remaining: row.get(3)?,
              violations:      row.get(4)?,
              agreed_to_terms: row.get(5)?,
              pending_upgrade: row.get(6)?,
            })
          })
          .optional()?)
      })
      .await?;

    raw.map(RawUser::into_user).transpose()
  }

  /// Contact attempts for the given items, in logging order.
  async fn attempts_for(
    &self,
    user_id: Uuid,
    item_id: Option<Uuid>,
  ) -> Result<HashMap<Uuid, Vec<ContactAttempt>>> {
    let user_str = encode_uuid(user_id);
    let item_str = item_id.map(encode_uuid);

    let raws: Vec<RawAttempt> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT a.attempt_id, a.item_id, a.date, a.method, a.notes, a.document_url
           FROM contact_attempts a
           JOIN rescued_items i ON i.item_id = a.item_id
           WHERE i.user_id = ?1 AND (?2 IS NULL OR a.item_id = ?2)
           ORDER BY a.rowid",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![user_str, item_str], RawAttempt::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    let mut by_item: HashMap<Uuid, Vec<ContactAttempt>> = HashMap::new();
    for raw in raws {
      let (item_id, attempt) = raw.into_attempt()?;
      by_item.entry(item_id).or_default().push(attempt);
    }
    Ok(by_item)
  }

  /// Write the columns of `item` that may change after it is reported.
  async fn write_item(&self, item: &RescuedItem, insert: bool) -> Result<usize> {
    let id_str        = encode_uuid(item.id);
    let user_str      = encode_uuid(item.user_id);
    let item_type     = item.item_type.as_str();
    let description   = item.description.clone();
    let found_str     = encode_dt(item.date_found);
    let reported_str  = encode_dt(item.date_reported);
    let deadline_str  = encode_dt(item.hold_deadline);
    let status        = item.status.as_str();
    let verification  = item.verification_status.as_str();
    let location      = item.drop_off_location.clone();
    let drop_off_str  = item.drop_off_date.map(encode_dt);
    let photo_url     = item.photo_url.clone();
    let auction_str   = item.auction_id.map(encode_uuid);
    let address       = item.auction_address.clone();

    let sql = if insert {
      "INSERT INTO rescued_items (
         item_id, user_id, item_type, description, date_found, date_reported,
         hold_deadline, status, verification_status, drop_off_location,
         drop_off_date, photo_url, auction_id, auction_address
       ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)"
    } else {
      "UPDATE rescued_items SET
         item_type = ?3, description = ?4, date_found = ?5, date_reported = ?6,
         hold_deadline = ?7, status = ?8, verification_status = ?9,
         drop_off_location = ?10, drop_off_date = ?11, photo_url = ?12,
         auction_id = ?13, auction_address = ?14
       WHERE item_id = ?1 AND user_id = ?2"
    };

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          sql,
          rusqlite::params![
            id_str,
            user_str,
            item_type,
            description,
            found_str,
            reported_str,
            deadline_str,
            status,
            verification,
            location,
            drop_off_str,
            photo_url,
            auction_str,
            address,
          ],
        )?)
      })
      .await?;
    Ok(changed)
  }

  async fn write_saved(&self, saved: &SavedAuction, insert: bool) -> Result<usize> {
    let id_str       = encode_uuid(saved.id);
    let user_str     = encode_uuid(saved.user_id);
    let title        = saved.title.clone();
    let location     = saved.location.clone();
    let date_str     = saved.auction_date.map(encode_date);
    let image_url    = saved.image_url.clone();
    let analysis     = serde_json::to_string(&saved.analysis_result)?;
    let risk         = saved.overall_risk.as_str();
    let notes        = saved.notes.clone();
    let bookmarked   = saved.is_bookmarked;
    let reminder_str = saved.reminder_date.map(encode_dt);
    let created_str  = encode_dt(saved.created_at);

    let sql = if insert {
      "INSERT INTO saved_auctions (
         saved_id, user_id, title, location, auction_date, image_url,
         analysis_result, overall_risk, notes, is_bookmarked, reminder_date, created_at
       ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)"
    } else {
      // created_at is fixed at save time.
      "UPDATE saved_auctions SET
         title = ?3, location = ?4, auction_date = ?5, image_url = ?6,
         analysis_result = ?7, overall_risk = ?8, notes = ?9,
         is_bookmarked = ?10, reminder_date = ?11,
         created_at = COALESCE(created_at, ?12)
       WHERE saved_id = ?1 AND user_id = ?2"
    };

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          sql,
          rusqlite::params![
            id_str,
            user_str,
            title,
            location,
            date_str,
            image_url,
            analysis,
            risk,
            notes,
            bookmarked,
            reminder_str,
            created_str,
          ],
        )?)
      })
      .await?;
    Ok(changed)
  }
}

// ─── RescueBackend impl ──────────────────────────────────────────────────────

impl RescueBackend for SqliteStore {
  type Error = Error;

  // ── Identity & profile ────────────────────────────────────────────────────

  async fn register_user(&self, email: &str) -> Result<Identity> {
    if let Some(existing) = self.current_user(email).await? {
      return Ok(existing);
    }

    let user = User::new(Uuid::new_v4(), email);
    let id_str = encode_uuid(user.id);
    let email = user.email.clone();
    let at_str = encode_dt(Utc::now());
    let tier = user.tier.as_str();
    let scans = user.scans_remaining;

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
          "INSERT INTO users (user_id, email, created_at) VALUES (?1, ?2, ?3)",
          rusqlite::params![id_str, email, at_str],
        )?;
        tx.execute(
          "INSERT INTO profiles (user_id, tier, scans_remaining) VALUES (?1, ?2, ?3)",
          rusqlite::params![id_str, tier, scans],
        )?;
        tx.commit()?;
        Ok(())
      })
      .await?;

    tracing::info!(user_id = %user.id, "registered user");
    Ok(Identity { user_id: user.id, email: user.email })
  }

  async fn current_user(&self, email: &str) -> Result<Option<Identity>> {
    let user = self.user_where("u.email", email.to_owned()).await?;
    Ok(user.map(|u| Identity { user_id: u.id, email: u.email }))
  }

  async fn read_profile(&self, user_id: Uuid) -> Result<Option<User>> {
    self.user_where("u.user_id", encode_uuid(user_id)).await
  }

  async fn update_profile(&self, user_id: Uuid, update: ProfileUpdate) -> Result<User> {
    let id_str        = encode_uuid(user_id);
    let terms         = update.agreed_to_terms;
    let tier          = update.tier.map(|t| t.as_str());
    let scans         = update.scans_remaining;
    let set_pending   = update.pending_upgrade.is_some();
    let pending_str   = encode_pending(update.pending_upgrade.flatten().as_ref())?;

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE profiles SET
             agreed_to_terms = COALESCE(?2, agreed_to_terms),
             tier            = COALESCE(?3, tier),
             scans_remaining = COALESCE(?4, scans_remaining),
             pending_upgrade = CASE WHEN ?5 THEN ?6 ELSE pending_upgrade END
           WHERE user_id = ?1",
          rusqlite::params![id_str, terms, tier, scans, set_pending, pending_str],
        )?)
      })
      .await?;

    if changed == 0 {
      return Err(refurrm_core::Error::UserNotFound(user_id).into());
    }
    self
      .read_profile(user_id)
      .await?
      .ok_or_else(|| refurrm_core::Error::UserNotFound(user_id).into())
  }

  async fn consume_scan(&self, user_id: Uuid) -> Result<Option<User>> {
    let id_str = encode_uuid(user_id);
    let free = Tier::Free.as_str();

    let charged = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE profiles SET scans_remaining = scans_remaining - 1
           WHERE user_id = ?1 AND tier = ?2 AND scans_remaining > 0",
          rusqlite::params![id_str, free],
        )?)
      })
      .await?;

    let user = self
      .read_profile(user_id)
      .await?
      .ok_or(refurrm_core::Error::UserNotFound(user_id))?;
    // Nothing charged: premium is never charged, free has run out.
    Ok((charged > 0 || user.is_premium()).then_some(user))
  }

  async fn swap_entitlement(
    &self,
    user_id: Uuid,
    expected: &Entitlement,
    next: &Entitlement,
  ) -> Result<Option<User>> {
    let id_str         = encode_uuid(user_id);
    let expected_tier  = expected.tier.as_str();
    let expected_scans = expected.scans_remaining;
    let expected_cs    = expected.pending_upgrade.as_ref().map(|p| p.checkout_id.clone());
    let tier           = next.tier.as_str();
    let scans          = next.scans_remaining;
    let pending_str    = encode_pending(next.pending_upgrade.as_ref())?;

    let swapped = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE profiles SET
             tier = ?5, scans_remaining = ?6, pending_upgrade = ?7
           WHERE user_id = ?1 AND tier = ?2 AND scans_remaining = ?3
             AND json_extract(pending_upgrade, '$.checkout_id') IS ?4",
          rusqlite::params![
            id_str,
            expected_tier,
            expected_scans,
            expected_cs,
            tier,
            scans,
            pending_str,
          ],
        )?)
      })
      .await?;

    let user = self
      .read_profile(user_id)
      .await?
      .ok_or(refurrm_core::Error::UserNotFound(user_id))?;
    if swapped == 0 {
      tracing::debug!(%user_id, "entitlement changed underneath swap");
      return Ok(None);
    }
    Ok(Some(user))
  }

  // ── Rescued items ─────────────────────────────────────────────────────────

  async fn add_item(&self, user_id: Uuid, mut input: NewRescuedItem) -> Result<RescuedItem> {
    let address_missing = input.auction_address.as_deref().is_none_or(|a| a.trim().is_empty());
    if address_missing {
      if let Some(auction_id) = input.auction_id {
        if let Some(auction) = self.get_auction(auction_id).await? {
          input.auction_address = Some(auction.full_address());
        }
      }
    }

    let item = RescuedItem::report(Uuid::new_v4(), user_id, input, Utc::now())?;
    self.write_item(&item, true).await?;
    Ok(item)
  }

  async fn get_item(&self, user_id: Uuid, item_id: Uuid) -> Result<Option<RescuedItem>> {
    let user_str = encode_uuid(user_id);
    let item_str = encode_uuid(item_id);

    let raw: Option<RawItem> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {ITEM_COLUMNS} FROM rescued_items WHERE item_id = ?1 AND user_id = ?2"),
            rusqlite::params![item_str, user_str],
            RawItem::from_row,
          )
          .optional()?)
      })
      .await?;

    let Some(raw) = raw else { return Ok(None) };
    let mut attempts = self.attempts_for(user_id, Some(item_id)).await?;
    raw.into_item(attempts.remove(&item_id).unwrap_or_default()).map(Some)
  }

  async fn list_items(&self, user_id: Uuid, query: &ItemQuery) -> Result<Vec<RescuedItem>> {
    let user_str   = encode_uuid(user_id);
    let status_str = query.status.map(|s| s.as_str());

    let raws: Vec<RawItem> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {ITEM_COLUMNS} FROM rescued_items
           WHERE user_id = ?1 AND (?2 IS NULL OR status = ?2)"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![user_str, status_str], RawItem::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    let mut attempts = self.attempts_for(user_id, None).await?;
    let mut items = raws
      .into_iter()
      .map(|raw| {
        let id = decode_uuid(&raw.item_id)?;
        raw.into_item(attempts.remove(&id).unwrap_or_default())
      })
      .collect::<Result<Vec<_>>>()?;

    items.sort_by_key(|i| i.date_reported);
    Ok(items)
  }

  async fn update_item(&self, item: &RescuedItem) -> Result<()> {
    if self.write_item(item, false).await? == 0 {
      return Err(refurrm_core::Error::ItemNotFound(item.id).into());
    }
    Ok(())
  }

  async fn update_item_status(&self, item: &RescuedItem, from: ItemStatus) -> Result<bool> {
    let id_str       = encode_uuid(item.id);
    let user_str     = encode_uuid(item.user_id);
    let from_str     = from.as_str();
    let status       = item.status.as_str();
    let location     = item.drop_off_location.clone();
    let drop_off_str = item.drop_off_date.map(encode_dt);

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE rescued_items SET
             status = ?4, drop_off_location = ?5, drop_off_date = ?6
           WHERE item_id = ?1 AND user_id = ?2 AND status = ?3",
          rusqlite::params![id_str, user_str, from_str, status, location, drop_off_str],
        )?)
      })
      .await?;
    Ok(changed > 0)
  }

  async fn set_item_verification(
    &self,
    user_id: Uuid,
    item_id: Uuid,
    status: VerificationStatus,
  ) -> Result<bool> {
    let id_str   = encode_uuid(item_id);
    let user_str = encode_uuid(user_id);
    let status   = status.as_str();

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE rescued_items SET verification_status = ?3
           WHERE item_id = ?1 AND user_id = ?2",
          rusqlite::params![id_str, user_str, status],
        )?)
      })
      .await?;
    Ok(changed > 0)
  }

  async fn add_contact_attempt(
    &self,
    user_id: Uuid,
    item_id: Uuid,
    input: NewContactAttempt,
  ) -> Result<ContactAttempt> {
    let user_str = encode_uuid(user_id);
    let item_str = encode_uuid(item_id);

    let owned: bool = self
      .conn
      .call({
        let (user_str, item_str) = (user_str.clone(), item_str.clone());
        move |conn| {
          Ok(conn
            .query_row(
              "SELECT 1 FROM rescued_items WHERE item_id = ?1 AND user_id = ?2",
              rusqlite::params![item_str, user_str],
              |_| Ok(true),
            )
            .optional()?
            .unwrap_or(false))
        }
      })
      .await?;

    if !owned {
      return Err(refurrm_core::Error::ItemNotFound(item_id).into());
    }

    let attempt = input.into_attempt(Uuid::new_v4());
    let id_str   = encode_uuid(attempt.id);
    let date_str = encode_dt(attempt.date);
    let method   = attempt.method.as_str();
    let notes    = attempt.notes.clone();
    let doc_url  = attempt.document_url.clone();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO contact_attempts (attempt_id, item_id, date, method, notes, document_url)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![id_str, item_str, date_str, method, notes, doc_url],
        )?;
        Ok(())
      })
      .await?;

    Ok(attempt)
  }

  // ── Auction listings ──────────────────────────────────────────────────────

  async fn add_auction(&self, auction: Auction) -> Result<Auction> {
    let a = auction.clone();
    self
      .conn
      .call(move |conn| {
        conn.execute(
          &format!(
            "INSERT INTO auctions ({AUCTION_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)"
          ),
          rusqlite::params![
            encode_uuid(a.id),
            a.facility_name,
            a.address,
            a.city,
            a.state,
            encode_date(a.auction_date),
            a.time,
            a.lien_amount,
            a.distance,
            a.lat,
            a.lng,
            a.unit_number,
            a.description,
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(auction)
  }

  async fn list_auctions(&self) -> Result<Vec<Auction>> {
    let raws: Vec<RawAuction> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {AUCTION_COLUMNS} FROM auctions ORDER BY auction_date, time"
        ))?;
        let rows = stmt
          .query_map([], RawAuction::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawAuction::into_auction).collect()
  }

  async fn get_auction(&self, id: Uuid) -> Result<Option<Auction>> {
    let id_str = encode_uuid(id);
    let raw: Option<RawAuction> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {AUCTION_COLUMNS} FROM auctions WHERE auction_id = ?1"),
            [id_str],
            RawAuction::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawAuction::into_auction).transpose()
  }

  // ── Saved auctions ────────────────────────────────────────────────────────

  async fn save_auction(&self, user_id: Uuid, input: NewSavedAuction) -> Result<SavedAuction> {
    let saved = input.into_saved(Uuid::new_v4(), user_id, Utc::now());
    self.write_saved(&saved, true).await?;
    Ok(saved)
  }

  async fn get_saved_auction(&self, user_id: Uuid, id: Uuid) -> Result<Option<SavedAuction>> {
    let id_str   = encode_uuid(id);
    let user_str = encode_uuid(user_id);

    let raw: Option<RawSavedAuction> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {SAVED_COLUMNS} FROM saved_auctions WHERE saved_id = ?1 AND user_id = ?2"),
            rusqlite::params![id_str, user_str],
            RawSavedAuction::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawSavedAuction::into_saved).transpose()
  }

  async fn list_saved_auctions(
    &self,
    user_id: Uuid,
    query: &SavedAuctionQuery,
  ) -> Result<Vec<SavedAuction>> {
    let user_str = encode_uuid(user_id);

    let raws: Vec<RawSavedAuction> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {SAVED_COLUMNS} FROM saved_auctions WHERE user_id = ?1"
        ))?;
        let rows = stmt
          .query_map([user_str], RawSavedAuction::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    let mut saved = raws
      .into_iter()
      .map(RawSavedAuction::into_saved)
      .collect::<Result<Vec<_>>>()?;
    // Newest first; `apply` sorts stably on top of this.
    saved.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    query.apply(&mut saved);
    Ok(saved)
  }

  async fn update_saved_auction(&self, auction: &SavedAuction) -> Result<()> {
    if self.write_saved(auction, false).await? == 0 {
      return Err(refurrm_core::Error::SavedAuctionNotFound(auction.id).into());
    }
    Ok(())
  }

  async fn delete_saved_auction(&self, user_id: Uuid, id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(id);
    let user_str = encode_uuid(user_id);

    let deleted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM saved_auctions WHERE saved_id = ?1 AND user_id = ?2",
          rusqlite::params![id_str, user_str],
        )?)
      })
      .await?;

    Ok(deleted > 0)
  }
}
