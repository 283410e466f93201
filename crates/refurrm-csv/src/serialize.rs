//! Rescue-history serializer.
//!
//! One header line followed by one line per item, joined with `\n` and no
//! trailing newline.

use chrono::{DateTime, Utc};
use refurrm_core::item::RescuedItem;

use crate::{HEADER, MISSING};

// ─── Field escaping ──────────────────────────────────────────────────────────

fn needs_quoting(s: &str) -> bool { s.contains([',', '"', '\r', '\n']) }

/// Wrap in quotes and double any internal quote.
fn quoted(s: &str) -> String { format!("\"{}\"", s.replace('"', "\"\"")) }

/// Quote only when the value would otherwise break the record.
fn field(s: &str) -> String {
  if needs_quoting(s) { quoted(s) } else { s.to_string() }
}

fn date(dt: DateTime<Utc>) -> String { dt.format("%Y-%m-%d").to_string() }

// ─── Rows ────────────────────────────────────────────────────────────────────

fn row(item: &RescuedItem) -> String {
  let fields = [
    date(item.date_found),
    date(item.date_reported),
    item.item_type.as_str().to_string(),
    quoted(&item.description),
    item.status.as_str().to_string(),
    item.verification_status.as_str().to_string(),
    quoted(item.auction_address.as_deref().unwrap_or(MISSING)),
    date(item.hold_deadline),
    field(
      item
        .drop_off_location
        .as_deref()
        .filter(|s| !s.is_empty())
        .unwrap_or(MISSING),
    ),
    item.drop_off_date.map(date).unwrap_or_else(|| MISSING.to_string()),
    item.contact_attempts.len().to_string(),
  ];
  fields.join(",")
}

pub(crate) fn serialize(items: &[RescuedItem]) -> String {
  let mut lines = Vec::with_capacity(items.len() + 1);
  lines.push(HEADER.join(","));
  lines.extend(items.iter().map(row));
  lines.join("\n")
}
