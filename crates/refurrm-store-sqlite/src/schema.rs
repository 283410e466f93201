//! SQL schema for the ReFURRM SQLite store.
//!
//! Executed once at connection startup. `PRAGMA user_version` records the
//! layout so later migrations can be gated on it.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS users (
    user_id    TEXT PRIMARY KEY,
    email      TEXT NOT NULL UNIQUE,
    created_at TEXT NOT NULL
);

-- One row per user; entitlement and terms state.
CREATE TABLE IF NOT EXISTS profiles (
    user_id         TEXT PRIMARY KEY REFERENCES users(user_id),
    tier            TEXT    NOT NULL DEFAULT 'free',   -- 'free' | 'premium'
    scans_remaining INTEGER NOT NULL,
    violations      INTEGER NOT NULL DEFAULT 0,
    agreed_to_terms INTEGER NOT NULL DEFAULT 0,
    pending_upgrade TEXT                               -- JSON PendingUpgrade or NULL
);

CREATE TABLE IF NOT EXISTS auctions (
    auction_id    TEXT PRIMARY KEY,
    facility_name TEXT NOT NULL,
    address       TEXT NOT NULL,
    city          TEXT NOT NULL,
    state         TEXT NOT NULL,
    auction_date  TEXT NOT NULL,   -- YYYY-MM-DD
    time          TEXT NOT NULL,
    lien_amount   REAL NOT NULL,
    distance      REAL NOT NULL,
    lat           REAL NOT NULL,
    lng           REAL NOT NULL,
    unit_number   TEXT NOT NULL,
    description   TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS rescued_items (
    item_id             TEXT PRIMARY KEY,
    user_id             TEXT NOT NULL REFERENCES users(user_id),
    item_type           TEXT NOT NULL,
    description         TEXT NOT NULL,
    date_found          TEXT NOT NULL,
    date_reported       TEXT NOT NULL,
    hold_deadline       TEXT NOT NULL,   -- always date_reported + 30 days
    status              TEXT NOT NULL DEFAULT 'holding',
    verification_status TEXT NOT NULL DEFAULT 'pending',
    drop_off_location   TEXT,
    drop_off_date       TEXT,
    photo_url           TEXT,
    auction_id          TEXT,
    auction_address     TEXT
);

-- Append-only; rowid preserves logging order.
CREATE TABLE IF NOT EXISTS contact_attempts (
    attempt_id   TEXT PRIMARY KEY,
    item_id      TEXT NOT NULL REFERENCES rescued_items(item_id),
    date         TEXT NOT NULL,
    method       TEXT NOT NULL,
    notes        TEXT NOT NULL DEFAULT '',
    document_url TEXT
);

CREATE TABLE IF NOT EXISTS saved_auctions (
    saved_id        TEXT PRIMARY KEY,
    user_id         TEXT NOT NULL REFERENCES users(user_id),
    title           TEXT NOT NULL,
    location        TEXT NOT NULL DEFAULT '',
    auction_date    TEXT,
    image_url       TEXT,
    analysis_result TEXT NOT NULL DEFAULT 'null',
    overall_risk    TEXT NOT NULL DEFAULT 'low',
    notes           TEXT NOT NULL DEFAULT '',
    is_bookmarked   INTEGER NOT NULL DEFAULT 1,
    reminder_date   TEXT,
    created_at      TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS items_user_idx      ON rescued_items(user_id);
CREATE INDEX IF NOT EXISTS attempts_item_idx   ON contact_attempts(item_id);
CREATE INDEX IF NOT EXISTS saved_user_idx      ON saved_auctions(user_id);

PRAGMA user_version = 1;
";
