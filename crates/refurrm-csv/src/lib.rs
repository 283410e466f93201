//! Rescue-history CSV codec for ReFURRM.
//!
//! Flattens [`refurrm_core`] rescued items into the downloadable export and
//! reads exports back for auditing. Pure synchronous; no HTTP or database
//! dependencies.
//!
//! # Quick start
//!
//! ```no_run
//! use refurrm_csv::{export_rescues, parse_export};
//!
//! let csv = export_rescues(&[]);
//! let rows = parse_export(&csv).unwrap();
//! assert!(rows.is_empty());
//! ```

pub mod error;
mod parse;
mod serialize;

use chrono::NaiveDate;
pub use error::{Error, Result};
use refurrm_core::item::RescuedItem;

// ─── Layout ──────────────────────────────────────────────────────────────────

/// Column titles, in export order.
pub const HEADER: [&str; 11] = [
  "Date Found",
  "Date Reported",
  "Item Type",
  "Description",
  "Status",
  "Verification Status",
  "Auction Address",
  "Hold Deadline",
  "Drop-Off Location",
  "Drop-Off Date",
  "Contact Attempts",
];

/// Placeholder for absent optional values.
pub const MISSING: &str = "N/A";

pub const CSV_MIME: &str = "text/csv";

/// `rescue-history-<YYYY-MM-DD>.csv` for the day the export was taken.
pub fn export_filename(on: NaiveDate) -> String {
  format!("rescue-history-{}.csv", on.format("%Y-%m-%d"))
}

// ─── Public API ──────────────────────────────────────────────────────────────

/// Serialize `items`, in the given order, as the rescue-history export.
pub fn export_rescues(items: &[RescuedItem]) -> String { serialize::serialize(items) }

/// Split RFC 4180 text into records of unescaped fields.
pub fn parse_records(input: &str) -> Result<Vec<Vec<String>>> { parse::parse_records(input) }

/// One data row of an export, as text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportRow {
  pub date_found:          String,
  pub date_reported:       String,
  pub item_type:           String,
  pub description:         String,
  pub status:              String,
  pub verification_status: String,
  pub auction_address:     String,
  pub hold_deadline:       String,
  pub drop_off_location:   String,
  pub drop_off_date:       String,
  pub contact_attempts:    String,
}

impl ExportRow {
  fn from_record(record: Vec<String>) -> Option<Self> {
    let [
      date_found,
      date_reported,
      item_type,
      description,
      status,
      verification_status,
      auction_address,
      hold_deadline,
      drop_off_location,
      drop_off_date,
      contact_attempts,
    ]: [String; 11] = record.try_into().ok()?;

    Some(Self {
      date_found,
      date_reported,
      item_type,
      description,
      status,
      verification_status,
      auction_address,
      hold_deadline,
      drop_off_location,
      drop_off_date,
      contact_attempts,
    })
  }
}

/// Read an export produced by [`export_rescues`], checking the header and
/// that every row has exactly eleven fields.
pub fn parse_export(input: &str) -> Result<Vec<ExportRow>> {
  let mut records = parse::parse_records(input)?.into_iter();

  let header = records.next().ok_or(Error::HeaderMismatch)?;
  if header.iter().map(String::as_str).ne(HEADER) {
    return Err(Error::HeaderMismatch);
  }

  records
    .enumerate()
    .map(|(i, record)| {
      let found = record.len();
      ExportRow::from_record(record).ok_or(Error::FieldCount {
        record: i + 1,
        found,
        expected: HEADER.len(),
      })
    })
    .collect()
}

#[cfg(test)]
mod tests {
  use chrono::{DateTime, TimeZone, Utc};
  use refurrm_core::{
    item::{ContactMethod, ItemType, NewContactAttempt, NewRescuedItem},
    lifecycle::Transition,
  };
  use uuid::Uuid;

  use super::*;

  fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 15, 30, 0).unwrap()
  }

  fn item(description: &str, address: Option<&str>) -> RescuedItem {
    let mut input = NewRescuedItem::new(ItemType::Photo, description, at(2025, 9, 25));
    input.auction_address = address.map(str::to_string);
    RescuedItem::report(Uuid::new_v4(), Uuid::nil(), input, at(2025, 9, 26)).unwrap()
  }

  #[test]
  fn header_only_for_no_items() {
    assert_eq!(
      export_rescues(&[]),
      "Date Found,Date Reported,Item Type,Description,Status,Verification Status,\
       Auction Address,Hold Deadline,Drop-Off Location,Drop-Off Date,Contact Attempts"
    );
  }

  #[test]
  fn one_line_per_item_plus_header() {
    let items = vec![
      item("Family photo album from 1960s", Some("123 Main St, Springfield")),
      item("Love letters from WWII era", None),
      item("Grandfather's pocket watch", Some("456 Oak Ave, Springfield")),
    ];
    let csv = export_rescues(&items);

    assert_eq!(csv.lines().count(), 4);
    assert!(!csv.ends_with('\n'));

    let rows = parse_export(&csv).unwrap();
    assert_eq!(rows.len(), 3);
    for record in parse_records(&csv).unwrap() {
      assert_eq!(record.len(), 11);
    }
  }

  #[test]
  fn holding_item_row() {
    let csv = export_rescues(&[item("Family photo album", Some("123 Main St, Springfield"))]);
    let line = csv.lines().nth(1).unwrap();
    assert_eq!(
      line,
      "2025-09-25,2025-09-26,photo,\"Family photo album\",holding,pending,\
       \"123 Main St, Springfield\",2025-10-26,N/A,N/A,0"
    );
  }

  #[test]
  fn embedded_quotes_are_doubled() {
    let csv = export_rescues(&[item("He said \"wow\"", None)]);
    let line = csv.lines().nth(1).unwrap();
    assert!(line.contains(",\"He said \"\"wow\"\"\","));

    let rows = parse_export(&csv).unwrap();
    assert_eq!(rows[0].description, "He said \"wow\"");
  }

  #[test]
  fn missing_address_renders_placeholder() {
    let rows = parse_export(&export_rescues(&[item("Urn", None)])).unwrap();
    assert_eq!(rows[0].auction_address, MISSING);
    assert_eq!(rows[0].drop_off_location, MISSING);
    assert_eq!(rows[0].drop_off_date, MISSING);
  }

  #[test]
  fn drop_off_and_contact_attempts() {
    let mut it = item("Box of documents", Some("9 Elm St"));
    it.transition(
      Transition::DroppedOff { location: "ReFURRM hub, Bay 2".into(), date: Some(at(2025, 10, 3)) },
      at(2025, 10, 4),
    )
    .unwrap();
    for _ in 0..2 {
      let attempt = NewContactAttempt {
        date:         at(2025, 9, 27),
        method:       ContactMethod::Phone,
        notes:        "No answer".into(),
        document_url: None,
      };
      it.contact_attempts.push(attempt.into_attempt(Uuid::new_v4()));
    }

    let csv = export_rescues(&[it]);
    assert!(csv.ends_with(",\"ReFURRM hub, Bay 2\",2025-10-03,2"));

    let row = &parse_export(&csv).unwrap()[0];
    assert_eq!(row.status, "dropped_off");
    assert_eq!(row.drop_off_location, "ReFURRM hub, Bay 2");
    assert_eq!(row.drop_off_date, "2025-10-03");
    assert_eq!(row.contact_attempts, "2");
  }

  #[test]
  fn filename_uses_iso_date() {
    let on = NaiveDate::from_ymd_opt(2025, 10, 3).unwrap();
    assert_eq!(export_filename(on), "rescue-history-2025-10-03.csv");
  }

  #[test]
  fn foreign_header_is_rejected() {
    assert!(matches!(parse_export("a,b,c\n1,2,3"), Err(Error::HeaderMismatch)));
  }

  #[test]
  fn short_row_is_rejected() {
    let csv = format!("{}\n1,2,3", HEADER.join(","));
    assert!(matches!(
      parse_export(&csv),
      Err(Error::FieldCount { record: 1, found: 3, expected: 11 })
    ));
  }
}
