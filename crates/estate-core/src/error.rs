//! Error types for `estate-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// A statistic was requested over a filter that matched nothing.
  #[error("no data available for the given query parameters")]
  EmptyResultSet,

  #[error("invalid range for {field}: min {min} is greater than max {max}")]
  InvalidRange {
    field: &'static str,
    min:   f64,
    max:   f64,
  },

  #[error("invalid page request: {0}")]
  InvalidPage(String),

  #[error("missing required field: {0}")]
  MissingRequiredField(&'static str),

  #[error("invalid timestamp: {0:?}")]
  InvalidTimestamp(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
