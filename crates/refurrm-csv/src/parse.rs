//! RFC 4180 reader, used to audit exported files.

use crate::error::{Error, Result};

/// Split `input` into records of unescaped fields.
///
/// Accepts `\n` and `\r\n` record separators. A trailing separator does not
/// produce an empty record.
pub(crate) fn parse_records(input: &str) -> Result<Vec<Vec<String>>> {
  let mut records = Vec::new();
  let mut record = Vec::new();
  let mut field = String::new();
  let mut in_quotes = false;
  // Set once a quoted field closes; only a delimiter may follow.
  let mut closed = false;
  let mut chars = input.chars().peekable();

  while let Some(c) = chars.next() {
    if in_quotes {
      match c {
        '"' if chars.peek() == Some(&'"') => {
          chars.next();
          field.push('"');
        }
        '"' => {
          in_quotes = false;
          closed = true;
        }
        _ => field.push(c),
      }
      continue;
    }

    match c {
      '"' if field.is_empty() && !closed => in_quotes = true,
      '"' => {
        return Err(Error::StrayQuote { record: records.len(), field: record.len() });
      }
      ',' => {
        record.push(std::mem::take(&mut field));
        closed = false;
      }
      '\r' if chars.peek() == Some(&'\n') => {}
      '\n' => {
        record.push(std::mem::take(&mut field));
        records.push(std::mem::take(&mut record));
        closed = false;
      }
      _ if closed => {
        return Err(Error::StrayQuote { record: records.len(), field: record.len() });
      }
      _ => field.push(c),
    }
  }

  if in_quotes {
    return Err(Error::UnterminatedQuote { record: records.len() });
  }
  if closed || !field.is_empty() || !record.is_empty() {
    record.push(field);
    records.push(record);
  }

  Ok(records)
}
