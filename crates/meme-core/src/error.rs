//! Error types for `meme-core`.

use chrono::NaiveDate;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("missing required field: {0}")]
  MissingField(&'static str),

  /// IDs double as file names, so they may not contain path syntax.
  #[error("invalid id {0:?}")]
  InvalidId(String),

  #[error("title is {len} characters long; the limit is {max}")]
  TitleTooLong { len: usize, max: usize },

  #[error("heat score {0} is outside 0-100")]
  HeatScoreOutOfRange(i32),

  #[error("event date {date} is later than today ({today})")]
  FutureDate { date: NaiveDate, today: NaiveDate },

  /// `has_literature` was set without a file to back it.
  #[error("event is marked as having literature but no literature file was given")]
  LiteratureMissing,

  #[error("literature file not found: {0}")]
  LiteratureFileNotFound(String),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
