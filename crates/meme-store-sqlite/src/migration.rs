//! Additive reconciliation of the live `internet_events` table.
//!
//! The events row grew over time, so deployed databases may lack newer
//! optional columns. [`COLUMN_MIGRATIONS`] lists every addition in the order
//! it was introduced; [`reconcile`] adds whichever are missing. Columns are
//! never dropped or narrowed, and one failed `ALTER` does not stop the rest.
//!
//! The migration list is also the column contract for external tools that
//! read the table directly.

use std::collections::BTreeSet;

use rusqlite::Connection;
use serde::Serialize;

use crate::{Result, schema::EVENTS_TABLE};

/// One additive column change.
#[derive(Debug, Clone, Copy)]
pub struct ColumnMigration {
  pub version:    u32,
  pub column:     &'static str,
  /// Column definition as it appears after `ADD COLUMN <name>`.
  pub definition: &'static str,
}

/// Ordered additions to `internet_events`. Append only.
///
/// SQLite rejects non-constant defaults in `ADD COLUMN`, so the timestamp
/// columns arrive without one and stay NULL for rows that predate them.
pub static COLUMN_MIGRATIONS: &[ColumnMigration] = &[
  ColumnMigration { version: 1,  column: "event_type",        definition: "TEXT DEFAULT 'meme'" },
  ColumnMigration { version: 2,  column: "sources",           definition: "TEXT" },
  ColumnMigration { version: 3,  column: "media_urls",        definition: "TEXT" },
  ColumnMigration { version: 4,  column: "heat_level",        definition: "TEXT" },
  ColumnMigration { version: 5,  column: "has_literature",    definition: "INTEGER DEFAULT 0" },
  ColumnMigration { version: 6,  column: "literature_path",   definition: "TEXT" },
  ColumnMigration { version: 7,  column: "created_at",        definition: "TEXT" },
  ColumnMigration { version: 8,  column: "updated_at",        definition: "TEXT" },
  ColumnMigration { version: 9,  column: "meme_image_url",    definition: "TEXT" },
  ColumnMigration { version: 10, column: "detailed_overview", definition: "TEXT" },
  ColumnMigration {
    version:    11,
    column:     "figure_id",
    definition: "TEXT REFERENCES pantheon_figures(id)",
  },
];

/// The version a fully reconciled table reports via `PRAGMA user_version`.
pub fn latest_version() -> u32 {
  COLUMN_MIGRATIONS.last().map_or(0, |m| m.version)
}

/// Outcome of a [`reconcile`] pass.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReconcileReport {
  /// Columns added during this pass.
  pub added:   Vec<&'static str>,
  /// Columns whose `ALTER` failed, with the error text.
  pub failed:  Vec<(&'static str, String)>,
  /// Live column names after the pass.
  pub columns: Vec<String>,
  /// `PRAGMA user_version` after the pass.
  pub version: u32,
}

impl ReconcileReport {
  pub fn is_complete(&self) -> bool { self.failed.is_empty() }
}

/// Live column names of `table`, empty if the table does not exist.
pub fn table_columns(conn: &Connection, table: &str) -> Result<BTreeSet<String>> {
  let mut stmt = conn.prepare(&format!("PRAGMA table_info({table})"))?;
  let names = stmt
    .query_map([], |row| row.get::<_, String>(1))?
    .collect::<rusqlite::Result<BTreeSet<_>>>()?;
  Ok(names)
}

/// Manifest columns the live events table lacks.
pub fn missing_columns(conn: &Connection) -> Result<Vec<&'static ColumnMigration>> {
  let live = table_columns(conn, EVENTS_TABLE)?;
  Ok(
    COLUMN_MIGRATIONS
      .iter()
      .filter(|m| !live.contains(m.column))
      .collect(),
  )
}

/// Add every missing manifest column to `internet_events`.
///
/// Only errors from inspecting the table are returned; a failing `ALTER` is
/// logged and recorded in the report.
pub fn reconcile(conn: &Connection) -> Result<ReconcileReport> {
  let mut report = ReconcileReport::default();

  let missing = missing_columns(conn)?;
  if missing.is_empty() {
    tracing::debug!("{EVENTS_TABLE} already has every expected column");
  }

  for m in missing {
    let sql = format!(
      "ALTER TABLE {EVENTS_TABLE} ADD COLUMN {} {}",
      m.column, m.definition
    );
    match conn.execute_batch(&sql) {
      Ok(()) => {
        tracing::info!(column = m.column, version = m.version, "added missing column");
        report.added.push(m.column);
      }
      Err(e) => {
        tracing::warn!(column = m.column, error = %e, "failed to add column");
        report.failed.push((m.column, e.to_string()));
      }
    }
  }

  report.columns = table_columns(conn, EVENTS_TABLE)?.into_iter().collect();
  if missing_columns(conn)?.is_empty() {
    conn.pragma_update(None, "user_version", latest_version())?;
  }
  report.version = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;

  Ok(report)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::schema::SCHEMA;

  /// The events table as first deployed.
  const LEGACY_EVENTS: &str = "
    CREATE TABLE internet_events (
      id          TEXT PRIMARY KEY,
      date        TEXT NOT NULL,
      title       TEXT NOT NULL,
      description TEXT,
      heat_score  INTEGER DEFAULT 0,
      categories  TEXT,
      keywords    TEXT
    );
  ";

  #[test]
  fn versions_are_strictly_increasing() {
    let versions: Vec<u32> = COLUMN_MIGRATIONS.iter().map(|m| m.version).collect();
    assert!(versions.windows(2).all(|w| w[0] < w[1]));
    assert_eq!(latest_version(), 11);
  }

  #[test]
  fn fresh_schema_needs_nothing() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(SCHEMA).unwrap();

    let report = reconcile(&conn).unwrap();
    assert!(report.added.is_empty());
    assert!(report.is_complete());
    assert_eq!(report.version, latest_version());
  }

  #[test]
  fn legacy_table_gains_every_column() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(LEGACY_EVENTS).unwrap();
    conn.execute_batch(SCHEMA).unwrap();
    assert_eq!(missing_columns(&conn).unwrap().len(), COLUMN_MIGRATIONS.len());

    let report = reconcile(&conn).unwrap();
    assert_eq!(report.added.len(), COLUMN_MIGRATIONS.len());
    assert!(report.is_complete());
    assert!(missing_columns(&conn).unwrap().is_empty());
    assert!(report.columns.iter().any(|c| c == "figure_id"));
    assert_eq!(report.version, latest_version());
  }

  #[test]
  fn reconcile_is_idempotent() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(LEGACY_EVENTS).unwrap();
    conn.execute_batch(SCHEMA).unwrap();

    reconcile(&conn).unwrap();
    let second = reconcile(&conn).unwrap();
    assert!(second.added.is_empty());
    assert!(second.failed.is_empty());
  }

  #[test]
  fn existing_rows_survive_and_pick_up_defaults() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(LEGACY_EVENTS).unwrap();
    conn
      .execute(
        "INSERT INTO internet_events (id, date, title) VALUES ('e1', '2021-02-15', 'X')",
        [],
      )
      .unwrap();
    conn.execute_batch(SCHEMA).unwrap();
    reconcile(&conn).unwrap();

    let (title, kind, lit): (String, String, i64) = conn
      .query_row(
        "SELECT title, event_type, has_literature FROM internet_events WHERE id = 'e1'",
        [],
        |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)),
      )
      .unwrap();
    assert_eq!(title, "X");
    assert_eq!(kind, "meme");
    assert_eq!(lit, 0);
  }
}
