//! Error type for `meme-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("{0}")]
  Core(#[from] meme_core::Error),

  #[error("database error: {0}")]
  Database(#[from] rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("io error: {0}")]
  Io(#[from] std::io::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("stored {column} value {value} does not fit in 32 bits")]
  IntegerOutOfRange { column: &'static str, value: i64 },

  /// No session could be opened.
  #[error("database connection failed: {0}")]
  Connection(String),

  /// A literature path that is empty, absolute or leaves the root.
  #[error("literature path {0:?} is not below the literature root")]
  InvalidLiteraturePath(String),

  #[error("figure not found: {0}")]
  FigureNotFound(String),

  #[error("{table}: id {id} already exists")]
  DuplicateId { table: &'static str, id: String },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
