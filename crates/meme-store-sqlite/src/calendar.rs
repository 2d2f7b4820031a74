//! [`Calendar`]: the SQLite implementation of [`EventStore`].

use chrono::{Days, NaiveDate};
use rusqlite::{Connection, OptionalExtension as _, params_from_iter, types::Value};

use meme_core::{
  analysis::{self, DEFAULT_TOP_KEYWORDS, HeatPoint, KeywordCount},
  event::{Event, EventPatch, EventRecord, NewEvent},
  id::{self, EVENT_PREFIX},
  query::EventFilter,
  store::{EventStore, Health},
  validate::{today, validate_event, validate_new_event},
};

use crate::{
  Error, Result,
  config::{CalendarConfig, StorageTarget},
  encode::{RawEvent, bump, encode_date, encode_dt, encode_list, now},
  literature::LiteratureStore,
  migration::{self, ReconcileReport},
  query::{BuiltQuery, EventQueryBuilder},
  schema::{EVENT_COLUMNS, EVENTS_TABLE, FIGURES_TABLE, SCHEMA, event_select_list},
};

/// Look-back window for [`Calendar::daily_keyword_trends`] when the caller
/// has no preference.
pub const DEFAULT_TREND_DAYS: u32 = 7;

// ─── Calendar ────────────────────────────────────────────────────────────────

/// The meme calendar's data-access façade.
///
/// Owns at most one SQLite connection, opened on demand by every operation.
/// Storage failures never escape: reads come back empty or degraded and
/// writes report `false`, with the cause logged. [`EventStore::add_event`]
/// is the exception and returns the reason to the caller.
pub struct Calendar {
  conn:          Option<Connection>,
  target:        StorageTarget,
  literature:    LiteratureStore,
  default_limit: usize,
}

impl Calendar {
  /// Build the façade, connect, and reconcile the events table when
  /// `config.reconcile_on_open` is set. A failed connect is logged and
  /// retried by the next operation.
  pub fn open(config: &CalendarConfig) -> Self {
    let mut calendar = Self {
      conn:          None,
      target:        config.target(),
      literature:    config.literature_store(),
      default_limit: config.default_limit,
    };
    if calendar.connect() && config.reconcile_on_open && !calendar.reconcile_schema() {
      tracing::warn!("schema reconciliation incomplete, reads may be degraded");
    }
    calendar
  }

  pub fn target(&self) -> &StorageTarget { &self.target }

  pub fn literature(&self) -> &LiteratureStore { &self.literature }

  /// The open connection, connecting first if needed.
  pub(crate) fn session(&mut self) -> Result<&mut Connection> {
    connection(&mut self.conn, &self.target)
  }

  // ── Schema ────────────────────────────────────────────────────────────────

  /// Add any missing event columns. Returns whether the table now has all of
  /// them; never fails.
  pub fn reconcile_schema(&mut self) -> bool {
    match self.reconcile() {
      Ok(report) => report.is_complete(),
      Err(e) => {
        tracing::error!(error = %e, "schema reconciliation failed");
        false
      }
    }
  }

  /// As [`Self::reconcile_schema`], returning the full report.
  pub fn reconcile(&mut self) -> Result<ReconcileReport> {
    let mut report = migration::reconcile(self.session()?)?;

    // A file-backed connection is reopened so no cached statement sees the
    // old column list. Reopening an in-memory database would lose it.
    if !report.added.is_empty() && matches!(self.target, StorageTarget::File(_)) {
      tracing::info!(added = report.added.len(), "reopening connection after schema change");
      self.disconnect();
      report.columns = migration::table_columns(self.session()?, EVENTS_TABLE)?
        .into_iter()
        .collect();
    }

    Ok(report)
  }

  // ── Analysis ──────────────────────────────────────────────────────────────

  /// Most frequent keywords among events of the last `days` days.
  pub fn daily_keyword_trends(&mut self, days: u32) -> Vec<KeywordCount> {
    let end = today();
    let start = end
      .checked_sub_days(Days::new(u64::from(days)))
      .unwrap_or(NaiveDate::MIN);
    let records = self.get_events_by_date_range(start, end);
    analysis::keyword_trends(&records, DEFAULT_TOP_KEYWORDS)
  }

  /// Heat score of each event dated within `start..=end`, earliest first.
  pub fn heat_trend(&mut self, start: NaiveDate, end: NaiveDate) -> Vec<HeatPoint> {
    analysis::heat_trend(&self.get_events_by_date_range(start, end))
  }

  // ── Internals ─────────────────────────────────────────────────────────────

  /// Run `query` on the full columns, falling back to the safe columns.
  fn read(&mut self, op: &'static str, query: &BuiltQuery) -> Vec<EventRecord> {
    let conn = match self.session() {
      Ok(conn) => conn,
      Err(e) => {
        tracing::error!(op, error = %e, "no database session");
        return Vec::new();
      }
    };

    match query.fetch_full(conn) {
      Ok(events) => events.into_iter().map(EventRecord::Full).collect(),
      Err(e) => {
        tracing::warn!(op, error = %e, "rich query failed, falling back to safe columns");
        query.fetch_safe(conn).unwrap_or_else(|e| {
          tracing::error!(op, error = %e, "safe query failed");
          Vec::new()
        })
      }
    }
  }

  fn insert(&mut self, input: NewEvent) -> Result<Event> {
    validate_new_event(&input, today())?;

    let literature = &self.literature;
    let conn = connection(&mut self.conn, &self.target)?;
    let tx = conn.transaction()?;

    let id = match input.id.as_deref().map(str::trim) {
      Some(id) if !id.is_empty() => id.to_owned(),
      _ => next_id_in(&tx, EVENTS_TABLE, EVENT_PREFIX, today())?,
    };
    if row_exists(&tx, EVENTS_TABLE, &id)? {
      return Err(Error::DuplicateId { table: EVENTS_TABLE, id });
    }
    if let Some(figure_id) = &input.figure_id
      && !row_exists(&tx, FIGURES_TABLE, figure_id)?
    {
      return Err(Error::FigureNotFound(figure_id.clone()));
    }

    let mut event = input.to_event(id, now());
    let mut written = None;
    match &input.literature_content {
      Some(content) => match literature.write(&event.id, content) {
        Ok(rel) => {
          event.has_literature = true;
          event.literature_path = Some(rel.clone());
          written = Some(rel);
        }
        Err(e) => {
          tracing::warn!(id = %event.id, error = %e, "literature not saved, storing event without it");
          event.has_literature = false;
          event.literature_path = None;
        }
      },
      None => check_literature(literature, &event)?,
    }

    let stored = insert_event(&tx, &event).and_then(|()| Ok(tx.commit()?));
    if let Err(e) = stored {
      if let Some(rel) = written
        && let Err(cleanup) = literature.remove(&rel)
      {
        tracing::warn!(file = %rel, error = %cleanup, "failed to remove orphaned literature");
      }
      return Err(e);
    }

    tracing::info!(id = %event.id, "added event");
    Ok(event)
  }

  fn update(&mut self, id: &str, patch: EventPatch) -> Result<bool> {
    let literature = &self.literature;
    let conn = connection(&mut self.conn, &self.target)?;
    let tx = conn.transaction()?;
    let Some(before) = fetch_event(&tx, id)? else {
      return Ok(false);
    };

    let touches_literature = patch.has_literature.is_some() || patch.literature_path.is_some();
    let mut event = before.clone();
    patch.apply_to(&mut event);
    validate_event(&event, today())?;
    if touches_literature {
      check_literature(literature, &event)?;
    }
    event.updated_at = Some(bump(before.updated_at));

    write_changes(&tx, &before, &event)?;
    tx.commit()?;
    Ok(true)
  }

  fn delete(&mut self, id: &str) -> Result<bool> {
    let literature = &self.literature;
    let conn = connection(&mut self.conn, &self.target)?;
    let tx = conn.transaction()?;

    let literature_path = match fetch_event(&tx, id) {
      Ok(Some(event)) if event.has_literature => event.literature_path,
      Ok(Some(_)) => None,
      Ok(None) => return Ok(false),
      Err(e) => {
        tracing::warn!(id, error = %e, "rich read failed, deleting without literature lookup");
        if !row_exists(&tx, EVENTS_TABLE, id)? {
          return Ok(false);
        }
        None
      }
    };

    if let Some(rel) = literature_path {
      match literature.remove(&rel) {
        Ok(removed) => tracing::debug!(file = %rel, removed, "literature cleanup"),
        Err(e) => tracing::warn!(file = %rel, error = %e, "failed to remove literature file"),
      }
    }

    tx.execute(&format!("DELETE FROM {EVENTS_TABLE} WHERE id = ?1"), [id])?;
    tx.commit()?;
    Ok(true)
  }

  fn store_literature(&mut self, id: &str, content: &str) -> Result<bool> {
    let literature = &self.literature;
    let conn = connection(&mut self.conn, &self.target)?;
    let tx = conn.transaction()?;
    let Some(before) = fetch_event(&tx, id)? else {
      return Ok(false);
    };

    let rel = literature.write(id, content)?;
    let event = Event {
      has_literature: true,
      literature_path: Some(rel),
      updated_at: Some(bump(before.updated_at)),
      ..before.clone()
    };

    write_changes(&tx, &before, &event)?;
    tx.commit()?;
    Ok(true)
  }

  fn health(&mut self) -> Result<Health> {
    let conn = self.session()?;
    let tables: i64 = conn.query_row(
      "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
      [EVENTS_TABLE],
      |r| r.get(0),
    )?;
    if tables == 0 {
      return Ok(Health::unhealthy(format!("table {EVENTS_TABLE} does not exist")));
    }
    let rows: i64 =
      conn.query_row(&format!("SELECT COUNT(*) FROM {EVENTS_TABLE}"), [], |r| r.get(0))?;
    Ok(Health::healthy(u64::try_from(rows).unwrap_or(0)))
  }
}

// ─── EventStore impl ─────────────────────────────────────────────────────────

impl EventStore for Calendar {
  type Error = Error;

  fn connect(&mut self) -> bool {
    match self.session() {
      Ok(_) => true,
      Err(e) => {
        tracing::error!(error = %e, "failed to connect");
        false
      }
    }
  }

  fn disconnect(&mut self) {
    if let Some(conn) = self.conn.take()
      && let Err((_, e)) = conn.close()
    {
      tracing::warn!(error = %e, "error while closing connection");
    }
  }

  fn is_connected(&self) -> bool { self.conn.is_some() }

  // ── Reads ─────────────────────────────────────────────────────────────────

  fn get_all_events(&mut self, limit: usize) -> Vec<EventRecord> {
    let query = EventQueryBuilder::new().limit(limit).build();
    self.read("get_all_events", &query)
  }

  fn get_events_by_date_range(&mut self, start: NaiveDate, end: NaiveDate) -> Vec<EventRecord> {
    let query = EventQueryBuilder::new()
      .date_range(Some(start), Some(end))
      .unbounded()
      .build();
    self.read("get_events_by_date_range", &query)
  }

  fn search_events(&mut self, keyword: Option<&str>, category: Option<&str>) -> Vec<EventRecord> {
    let query = EventQueryBuilder::new()
      .keyword(keyword)
      .category(category)
      .limit(self.default_limit)
      .build();
    self.read("search_events", &query)
  }

  fn search(&mut self, filter: &EventFilter) -> Vec<EventRecord> {
    let query = EventQueryBuilder::from_filter(filter.clone()).build();
    self.read("search", &query)
  }

  fn get_event_with_literature(&mut self, id: &str) -> (Option<Event>, Option<String>) {
    let literature = &self.literature;
    let event = match connection(&mut self.conn, &self.target).and_then(|c| fetch_event(c, id)) {
      Ok(Some(event)) => event,
      Ok(None) => return (None, None),
      Err(e) => {
        tracing::warn!(id, error = %e, "failed to load event");
        return (None, None);
      }
    };

    let content = match (event.has_literature, event.literature_path.as_deref()) {
      (true, Some(rel)) => literature.read(rel),
      _ => None,
    };
    (Some(event), content)
  }

  // ── Writes ────────────────────────────────────────────────────────────────

  fn add_event(&mut self, input: NewEvent) -> Result<Event> {
    self
      .insert(input)
      .inspect_err(|e| tracing::warn!(error = %e, "add_event rejected or rolled back"))
  }

  fn update_event(&mut self, id: &str, patch: EventPatch) -> bool {
    match self.update(id, patch) {
      Ok(found) => {
        if !found {
          tracing::debug!(id, "update_event: no such event");
        }
        found
      }
      Err(e) => {
        tracing::warn!(id, error = %e, "update_event rolled back");
        false
      }
    }
  }

  fn delete_event(&mut self, id: &str) -> bool {
    match self.delete(id) {
      Ok(found) => found,
      Err(e) => {
        tracing::warn!(id, error = %e, "delete_event rolled back");
        false
      }
    }
  }

  fn save_literature(&mut self, id: &str, content: &str) -> bool {
    match self.store_literature(id, content) {
      Ok(found) => found,
      Err(e) => {
        tracing::warn!(id, error = %e, "save_literature failed");
        false
      }
    }
  }

  fn check_database_health(&mut self) -> Health {
    self.health().unwrap_or_else(|e| Health::unhealthy(e.to_string()))
  }
}

impl Drop for Calendar {
  fn drop(&mut self) { self.disconnect(); }
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

fn open_connection(target: &StorageTarget) -> Result<Connection> {
  let conn = match target {
    StorageTarget::File(path) => {
      if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
      {
        std::fs::create_dir_all(parent)?;
      }
      Connection::open(path)
    }
    StorageTarget::Memory => Connection::open_in_memory(),
  }
  .map_err(|e| Error::Connection(e.to_string()))?;

  conn.execute_batch(SCHEMA)?;
  tracing::debug!(?target, "opened database session");
  Ok(conn)
}

/// Free function over the two fields it needs, so callers can keep borrowing
/// the literature store alongside the connection.
fn connection<'a>(
  slot:   &'a mut Option<Connection>,
  target: &StorageTarget,
) -> Result<&'a mut Connection> {
  if slot.is_none() {
    *slot = Some(open_connection(target)?);
  }
  slot
    .as_mut()
    .ok_or_else(|| Error::Connection("session unavailable".into()))
}

pub(crate) fn row_exists(conn: &Connection, table: &str, id: &str) -> Result<bool> {
  Ok(
    conn
      .query_row(&format!("SELECT 1 FROM {table} WHERE id = ?1"), [id], |_| Ok(()))
      .optional()?
      .is_some(),
  )
}

/// The next free `<prefix><date><NNN>` ID in `table`.
pub(crate) fn next_id_in(
  conn:   &Connection,
  table:  &str,
  prefix: &str,
  date:   NaiveDate,
) -> Result<String> {
  let stem = id::stem(prefix, date);
  let mut stmt =
    conn.prepare(&format!("SELECT id FROM {table} WHERE substr(id, 1, length(?1)) = ?1"))?;
  let existing = stmt
    .query_map([&stem], |r| r.get::<_, String>(0))?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(id::next_id(prefix, date, existing.iter().map(String::as_str)))
}

pub(crate) fn fetch_event(conn: &Connection, id: &str) -> Result<Option<Event>> {
  conn
    .query_row(
      &format!("SELECT {} FROM {EVENTS_TABLE} WHERE id = ?1", event_select_list()),
      [id],
      RawEvent::from_row,
    )
    .optional()?
    .map(RawEvent::into_event)
    .transpose()
}

/// Column values of `event` in [`EVENT_COLUMNS`] order.
fn event_row(event: &Event) -> Result<Vec<Value>> {
  Ok(vec![
    Value::from(event.id.clone()),
    Value::from(encode_date(event.date)),
    Value::from(event.title.clone()),
    Value::from(event.description.clone()),
    Value::from(event.event_type.clone()),
    Value::from(encode_list(&event.categories)?),
    Value::from(encode_list(&event.keywords)?),
    Value::from(event.heat_level.clone()),
    Value::from(event.heat_score),
    Value::from(encode_list(&event.sources)?),
    Value::from(encode_list(&event.media_urls)?),
    Value::from(event.created_at.map(encode_dt)),
    Value::from(event.updated_at.map(encode_dt)),
    Value::from(event.has_literature),
    Value::from(event.literature_path.clone()),
    Value::from(event.meme_image_url.clone()),
    Value::from(event.detailed_overview.clone()),
    Value::from(event.figure_id.clone()),
  ])
}

fn insert_event(conn: &Connection, event: &Event) -> Result<()> {
  let placeholders = vec!["?"; EVENT_COLUMNS.len()].join(", ");
  conn.execute(
    &format!(
      "INSERT INTO {EVENTS_TABLE} ({}) VALUES ({placeholders})",
      event_select_list()
    ),
    params_from_iter(event_row(event)?),
  )?;
  Ok(())
}

/// Update the columns whose encoded value differs between `before` and
/// `after`. Untouched columns keep their stored text, legacy formats included.
fn write_changes(conn: &Connection, before: &Event, after: &Event) -> Result<()> {
  let mut assignments = Vec::new();
  let mut params = vec![Value::from(after.id.clone())];
  let columns = EVENT_COLUMNS.iter().zip(event_row(before)?).zip(event_row(after)?);
  for ((column, old), new) in columns.skip(1) {
    if old != new {
      params.push(new);
      assignments.push(format!("{column} = ?{}", params.len()));
    }
  }
  if assignments.is_empty() {
    return Ok(());
  }
  conn.execute(
    &format!("UPDATE {EVENTS_TABLE} SET {} WHERE id = ?1", assignments.join(", ")),
    params_from_iter(params),
  )?;
  Ok(())
}

/// A literature path must stay under the root, and must name an existing
/// file when the event claims literature.
fn check_literature(literature: &LiteratureStore, event: &Event) -> Result<()> {
  let Some(rel) = event.literature_path.as_deref() else {
    return Ok(());
  };
  literature.path_for(rel)?;
  if event.has_literature && !literature.exists(rel) {
    return Err(meme_core::Error::LiteratureFileNotFound(rel.to_owned()).into());
  }
  Ok(())
}
