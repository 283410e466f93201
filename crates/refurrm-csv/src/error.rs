//! Error types for the refurrm-csv codec.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("unterminated quoted field in record {record}")]
  UnterminatedQuote { record: usize },

  #[error("stray quote in record {record}, field {field}")]
  StrayQuote { record: usize, field: usize },

  #[error("record {record} has {found} fields, expected {expected}")]
  FieldCount { record: usize, found: usize, expected: usize },

  #[error("header does not match the rescue export layout")]
  HeaderMismatch,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
