//! Figure, artifact, timeline and historical-event operations on
//! [`Calendar`].
//!
//! Inserts return the reason on failure. Reads come back empty or `None`
//! with the cause logged, as the event operations do.

use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension as _, params, params_from_iter, types::Value};

use meme_core::{
  event::Event,
  id::{ARTIFACT_PREFIX, FIGURE_PREFIX, HISTORY_PREFIX, TIMELINE_PREFIX},
  pantheon::{
    Artifact, Figure, FigureProfile, HistoricalEvent, NewArtifact, NewFigure,
    NewHistoricalEvent, NewTimelineEntry, TimelineEntry,
  },
  validate::{today, validate_date, validate_id, validate_title},
};

use crate::{
  Calendar, Error, Result,
  calendar::{next_id_in, row_exists},
  encode::{
    ARTIFACT_COLUMNS, FIGURE_COLUMNS, HISTORY_COLUMNS, RawArtifact, RawEvent, RawFigure,
    RawHistoricalEvent, RawTimelineEntry, TIMELINE_COLUMNS, encode_date, encode_dt,
    encode_list, now,
  },
  migration::table_columns,
  schema::{
    ARTIFACTS_TABLE, EVENTS_TABLE, FIGURES_TABLE, HISTORY_TABLE, TIMELINES_TABLE,
    event_select_list,
  },
};

impl Calendar {
  // ── Figures ───────────────────────────────────────────────────────────────

  pub fn add_figure(&mut self, input: NewFigure) -> Result<Figure> {
    if input.name.trim().is_empty() {
      return Err(meme_core::Error::MissingField("name").into());
    }
    let tx = self.session()?.transaction()?;
    let id = resolve_id(&tx, input.id.as_deref(), FIGURES_TABLE, FIGURE_PREFIX)?;
    let figure = input.into_figure(id, now());

    tx.execute(
      &format!("INSERT INTO {FIGURES_TABLE} ({FIGURE_COLUMNS}) VALUES ({})", placeholders(16)),
      params![
        figure.id,
        figure.name,
        encode_list(&figure.alias)?,
        figure.birth_date.map(encode_date),
        figure.birth_place,
        figure.description,
        figure.bio,
        encode_list(&figure.categories)?,
        encode_list(&figure.tags)?,
        figure.influence_score,
        figure.popularity_level,
        figure.avatar_url,
        encode_list(&figure.media_urls)?,
        figure.is_active,
        figure.created_at.map(encode_dt),
        figure.updated_at.map(encode_dt),
      ],
    )?;
    tx.commit()?;

    tracing::info!(id = %figure.id, name = %figure.name, "added figure");
    Ok(figure)
  }

  pub fn get_figure(&mut self, id: &str) -> Option<Figure> {
    self
      .session()
      .and_then(|conn| fetch_figure(conn, id))
      .unwrap_or_else(|e| {
        tracing::warn!(id, error = %e, "failed to load figure");
        None
      })
  }

  /// The figure with its artifacts and its timeline ordered by year.
  pub fn get_figure_profile(&mut self, id: &str) -> Option<FigureProfile> {
    self.load_profile(id).unwrap_or_else(|e| {
      tracing::warn!(id, error = %e, "failed to load figure profile");
      None
    })
  }

  fn load_profile(&mut self, id: &str) -> Result<Option<FigureProfile>> {
    let conn = self.session()?;
    let Some(figure) = fetch_figure(conn, id)? else {
      return Ok(None);
    };
    Ok(Some(FigureProfile {
      artifacts: fetch_artifacts(conn, id)?,
      timeline: fetch_timeline(conn, id)?,
      figure,
    }))
  }

  /// Every figure, most influential first.
  pub fn list_figures(&mut self) -> Vec<Figure> {
    let list = |conn: &mut Connection| -> Result<Vec<Figure>> {
      let mut stmt = conn.prepare(&format!(
        "SELECT {FIGURE_COLUMNS} FROM {FIGURES_TABLE} ORDER BY influence_score DESC, name"
      ))?;
      let raws = stmt
        .query_map([], RawFigure::from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
      raws.into_iter().map(RawFigure::into_figure).collect()
    };
    self.session().and_then(list).unwrap_or_else(|e| {
      tracing::warn!(error = %e, "failed to list figures");
      Vec::new()
    })
  }

  /// Delete a figure together with the artifacts and timeline entries it
  /// owns. Events that pointed at it keep existing with the link cleared.
  /// Historical events' related-figure lists are not touched.
  pub fn delete_figure(&mut self, id: &str) -> bool {
    match self.remove_figure(id) {
      Ok(found) => found,
      Err(e) => {
        tracing::warn!(id, error = %e, "delete_figure rolled back");
        false
      }
    }
  }

  fn remove_figure(&mut self, id: &str) -> Result<bool> {
    let tx = self.session()?.transaction()?;
    if !row_exists(&tx, FIGURES_TABLE, id)? {
      return Ok(false);
    }

    let artifacts =
      tx.execute(&format!("DELETE FROM {ARTIFACTS_TABLE} WHERE figure_id = ?1"), [id])?;
    let timeline =
      tx.execute(&format!("DELETE FROM {TIMELINES_TABLE} WHERE figure_id = ?1"), [id])?;
    let unlinked = if table_columns(&tx, EVENTS_TABLE)?.contains("figure_id") {
      tx.execute(
        &format!("UPDATE {EVENTS_TABLE} SET figure_id = NULL WHERE figure_id = ?1"),
        [id],
      )?
    } else {
      0
    };
    tx.execute(&format!("DELETE FROM {FIGURES_TABLE} WHERE id = ?1"), [id])?;
    tx.commit()?;

    tracing::info!(id, artifacts, timeline, unlinked, "deleted figure");
    Ok(true)
  }

  // ── Owned records ─────────────────────────────────────────────────────────

  pub fn add_artifact(&mut self, input: NewArtifact) -> Result<Artifact> {
    if input.name.trim().is_empty() {
      return Err(meme_core::Error::MissingField("name").into());
    }
    let tx = self.session()?.transaction()?;
    if !row_exists(&tx, FIGURES_TABLE, &input.figure_id)? {
      return Err(Error::FigureNotFound(input.figure_id));
    }
    let id = resolve_id(&tx, input.id.as_deref(), ARTIFACTS_TABLE, ARTIFACT_PREFIX)?;
    let artifact = input.into_artifact(id, now());

    tx.execute(
      &format!(
        "INSERT INTO {ARTIFACTS_TABLE} ({ARTIFACT_COLUMNS}) VALUES ({})",
        placeholders(13)
      ),
      params![
        artifact.id,
        artifact.figure_id,
        artifact.name,
        artifact.artifact_type,
        artifact.content,
        artifact.occurrence_date.map(encode_date),
        artifact.date_accuracy,
        artifact.source,
        artifact.is_verified,
        artifact.significance_level,
        artifact.impact_description,
        encode_list(&artifact.media_urls)?,
        artifact.created_at.map(encode_dt),
      ],
    )?;
    tx.commit()?;
    Ok(artifact)
  }

  pub fn add_timeline_entry(&mut self, input: NewTimelineEntry) -> Result<TimelineEntry> {
    if input.event_title.trim().is_empty() {
      return Err(meme_core::Error::MissingField("event_title").into());
    }
    let tx = self.session()?.transaction()?;
    if !row_exists(&tx, FIGURES_TABLE, &input.figure_id)? {
      return Err(Error::FigureNotFound(input.figure_id));
    }
    let id = resolve_id(&tx, input.id.as_deref(), TIMELINES_TABLE, TIMELINE_PREFIX)?;
    let entry = input.into_entry(id, now());

    tx.execute(
      &format!(
        "INSERT INTO {TIMELINES_TABLE} ({TIMELINE_COLUMNS}) VALUES ({})",
        placeholders(9)
      ),
      params![
        entry.id,
        entry.figure_id,
        entry.year,
        entry.event_title,
        entry.event_description,
        entry.importance,
        entry.event_type,
        entry.source,
        entry.created_at.map(encode_dt),
      ],
    )?;
    tx.commit()?;
    Ok(entry)
  }

  /// Events linked to `figure_id`, newest first. Only full-fidelity rows can
  /// carry the link, so there is no degraded fallback.
  pub fn events_for_figure(&mut self, figure_id: &str) -> Vec<Event> {
    let linked = |conn: &mut Connection| -> Result<Vec<Event>> {
      let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM {EVENTS_TABLE} WHERE figure_id = ?1 ORDER BY date DESC, heat_score DESC",
        event_select_list()
      ))?;
      let raws = stmt
        .query_map([figure_id], RawEvent::from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
      raws.into_iter().map(RawEvent::into_event).collect()
    };
    self.session().and_then(linked).unwrap_or_else(|e| {
      tracing::warn!(figure_id, error = %e, "failed to load linked events");
      Vec::new()
    })
  }

  // ── Historical events ─────────────────────────────────────────────────────

  pub fn add_historical_event(&mut self, input: NewHistoricalEvent) -> Result<HistoricalEvent> {
    validate_title(&input.title)?;
    validate_date(input.date, today())?;

    let tx = self.session()?.transaction()?;
    let id = resolve_id(&tx, input.id.as_deref(), HISTORY_TABLE, HISTORY_PREFIX)?;
    let event = input.into_historical_event(id, now());

    tx.execute(
      &format!("INSERT INTO {HISTORY_TABLE} ({HISTORY_COLUMNS}) VALUES ({})", placeholders(15)),
      params![
        event.id,
        encode_date(event.date),
        event.title,
        event.description,
        event.event_type,
        encode_list(&event.categories)?,
        event.importance_level,
        event.location,
        event.source,
        event.is_verified,
        encode_list(&event.related_figure_ids)?,
        encode_list(&event.related_event_ids)?,
        encode_list(&event.media_urls)?,
        event.created_at.map(encode_dt),
        event.updated_at.map(encode_dt),
      ],
    )?;
    tx.commit()?;
    Ok(event)
  }

  /// Historical events within the inclusive bounds, earliest first.
  pub fn list_historical_events(
    &mut self,
    start: Option<NaiveDate>,
    end:   Option<NaiveDate>,
  ) -> Vec<HistoricalEvent> {
    let list = |conn: &mut Connection| -> Result<Vec<HistoricalEvent>> {
      let mut conds = Vec::new();
      let mut values = Vec::new();
      if let Some(start) = start {
        conds.push("date >= ?");
        values.push(Value::from(encode_date(start)));
      }
      if let Some(end) = end {
        conds.push("date <= ?");
        values.push(Value::from(encode_date(end)));
      }
      let where_clause = if conds.is_empty() {
        String::new()
      } else {
        format!("WHERE {}", conds.join(" AND "))
      };

      let mut stmt = conn.prepare(&format!(
        "SELECT {HISTORY_COLUMNS} FROM {HISTORY_TABLE} {where_clause} ORDER BY date, id"
      ))?;
      let raws = stmt
        .query_map(params_from_iter(values), RawHistoricalEvent::from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
      raws
        .into_iter()
        .map(RawHistoricalEvent::into_historical_event)
        .collect()
    };
    self.session().and_then(list).unwrap_or_else(|e| {
      tracing::warn!(error = %e, "failed to list historical events");
      Vec::new()
    })
  }
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

fn placeholders(n: usize) -> String { vec!["?"; n].join(", ") }

/// The caller's ID if given and free, otherwise the next generated one.
fn resolve_id(
  conn:      &Connection,
  requested: Option<&str>,
  table:     &'static str,
  prefix:    &str,
) -> Result<String> {
  let requested = requested.map(str::trim).filter(|id| !id.is_empty());
  if let Some(id) = requested {
    validate_id(id)?;
  }
  match requested {
    Some(id) if row_exists(conn, table, id)? => {
      Err(Error::DuplicateId { table, id: id.to_owned() })
    }
    Some(id) => Ok(id.to_owned()),
    None => next_id_in(conn, table, prefix, today()),
  }
}

fn fetch_figure(conn: &Connection, id: &str) -> Result<Option<Figure>> {
  conn
    .query_row(
      &format!("SELECT {FIGURE_COLUMNS} FROM {FIGURES_TABLE} WHERE id = ?1"),
      [id],
      RawFigure::from_row,
    )
    .optional()?
    .map(RawFigure::into_figure)
    .transpose()
}

fn fetch_artifacts(conn: &Connection, figure_id: &str) -> Result<Vec<Artifact>> {
  let mut stmt = conn.prepare(&format!(
    "SELECT {ARTIFACT_COLUMNS} FROM {ARTIFACTS_TABLE} WHERE figure_id = ?1
     ORDER BY occurrence_date, id"
  ))?;
  let raws = stmt
    .query_map([figure_id], RawArtifact::from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  raws.into_iter().map(RawArtifact::into_artifact).collect()
}

fn fetch_timeline(conn: &Connection, figure_id: &str) -> Result<Vec<TimelineEntry>> {
  let mut stmt = conn.prepare(&format!(
    "SELECT {TIMELINE_COLUMNS} FROM {TIMELINES_TABLE} WHERE figure_id = ?1 ORDER BY year, id"
  ))?;
  let raws = stmt
    .query_map([figure_id], RawTimelineEntry::from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  raws.into_iter().map(RawTimelineEntry::into_entry).collect()
}
