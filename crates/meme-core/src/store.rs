//! The `EventStore` trait: the contract between the data-access façade and
//! its callers.
//!
//! Implementations own a single storage session and absorb storage failures:
//! reads degrade to an empty result (or to reduced-fidelity
//! [`EventRecord::Degraded`] rows), writes report `false`. Only
//! [`EventStore::add_event`] surfaces a reason, since callers show it to the
//! user.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{
  event::{Event, EventPatch, EventRecord, NewEvent},
  query::EventFilter,
};

/// Result of [`EventStore::check_database_health`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Health {
  pub ok:        bool,
  pub message:   String,
  pub row_count: Option<u64>,
}

impl Health {
  pub fn healthy(row_count: u64) -> Self {
    Self {
      ok:        true,
      message:   format!("database ok, {row_count} events"),
      row_count: Some(row_count),
    }
  }

  pub fn unhealthy(reason: impl Into<String>) -> Self {
    Self { ok: false, message: reason.into(), row_count: None }
  }
}

/// Operations the calendar exposes to front ends.
///
/// Every method connects on demand when the store is disconnected.
pub trait EventStore {
  /// Failure reported by [`EventStore::add_event`].
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Session ───────────────────────────────────────────────────────────

  /// Open the session if there is none. Returns whether a session is open.
  fn connect(&mut self) -> bool;

  /// Release the session. Safe to call when already disconnected.
  fn disconnect(&mut self);

  fn is_connected(&self) -> bool;

  // ── Reads ─────────────────────────────────────────────────────────────

  /// Newest events first, at most `limit`.
  fn get_all_events(&mut self, limit: usize) -> Vec<EventRecord>;

  /// Events dated within `start..=end`, newest first.
  fn get_events_by_date_range(&mut self, start: NaiveDate, end: NaiveDate) -> Vec<EventRecord>;

  /// Keyword over title/description and category containment. Blank
  /// arguments are ignored.
  fn search_events(&mut self, keyword: Option<&str>, category: Option<&str>) -> Vec<EventRecord>;

  /// Arbitrary filtered search.
  fn search(&mut self, filter: &EventFilter) -> Vec<EventRecord>;

  /// The event and, if it has literature, the literature text.
  /// `(None, None)` when the event does not exist or cannot be read.
  fn get_event_with_literature(&mut self, id: &str) -> (Option<Event>, Option<String>);

  // ── Writes ────────────────────────────────────────────────────────────

  /// Validate and persist a new event, returning it as stored.
  fn add_event(&mut self, input: NewEvent) -> Result<Event, Self::Error>;

  /// Apply a partial update. `false` if the event does not exist or the
  /// update failed.
  fn update_event(&mut self, id: &str, patch: EventPatch) -> bool;

  /// Delete the event and its literature file. `false` if it does not exist
  /// or the delete failed.
  fn delete_event(&mut self, id: &str) -> bool;

  /// Store `content` as the event's literature.
  fn save_literature(&mut self, id: &str, content: &str) -> bool;

  // ── Diagnostics ───────────────────────────────────────────────────────

  fn check_database_health(&mut self) -> Health;
}
