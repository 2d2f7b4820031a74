//! Construction parameters for [`crate::Calendar`].

use std::path::{Path, PathBuf};

use meme_core::event::DEFAULT_LIMIT;
use serde::{Deserialize, Serialize};

use crate::literature::{DEFAULT_EXTENSION, LiteratureStore};

/// `store_path` value that selects an in-memory database.
pub const MEMORY_PATH: &str = ":memory:";

/// Where the events database lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageTarget {
  File(PathBuf),
  /// Private to one connection; the data is gone once it closes.
  Memory,
}

impl StorageTarget {
  pub fn from_path(path: &Path) -> Self {
    if path.as_os_str() == MEMORY_PATH {
      Self::Memory
    } else {
      Self::File(path.to_path_buf())
    }
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CalendarConfig {
  /// SQLite database file, or `:memory:`.
  pub store_path:           PathBuf,
  /// Root directory for literature files.
  pub literature_dir:       PathBuf,
  pub literature_extension: String,
  /// Add missing event columns when the calendar is opened.
  pub reconcile_on_open:    bool,
  /// Row cap for searches that do not give one.
  pub default_limit:        usize,
}

impl Default for CalendarConfig {
  fn default() -> Self {
    Self {
      store_path:           PathBuf::from("meme_calendar.db"),
      literature_dir:       PathBuf::from("literature"),
      literature_extension: DEFAULT_EXTENSION.to_owned(),
      reconcile_on_open:    true,
      default_limit:        DEFAULT_LIMIT,
    }
  }
}

impl CalendarConfig {
  /// A database file at `store_path` with literature under `literature_dir`.
  pub fn at(store_path: impl Into<PathBuf>, literature_dir: impl Into<PathBuf>) -> Self {
    Self {
      store_path: store_path.into(),
      literature_dir: literature_dir.into(),
      ..Self::default()
    }
  }

  pub fn target(&self) -> StorageTarget { StorageTarget::from_path(&self.store_path) }

  pub fn literature_store(&self) -> LiteratureStore {
    LiteratureStore::new(&self.literature_dir, &self.literature_extension)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn memory_path_selects_memory_target() {
    let config = CalendarConfig::at(MEMORY_PATH, "lit");
    assert_eq!(config.target(), StorageTarget::Memory);
    let config = CalendarConfig::at("data/meme.db", "lit");
    assert_eq!(config.target(), StorageTarget::File("data/meme.db".into()));
  }

  #[test]
  fn missing_keys_take_defaults() {
    let config: CalendarConfig =
      serde_json::from_value(serde_json::json!({ "store_path": "x.db" })).unwrap();
    assert_eq!(config.store_path, PathBuf::from("x.db"));
    assert_eq!(config.literature_extension, ".txt");
    assert!(config.reconcile_on_open);
    assert_eq!(config.default_limit, 100);
  }
}
