//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are RFC 3339 with microsecond precision; rows written by older
//! tooling as `YYYY-MM-DD HH:MM:SS` are accepted on read. Dates are
//! `YYYY-MM-DD`. List columns are compact JSON arrays.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, SubsecRound, TimeDelta, Utc};
use meme_core::{
  event::{DEFAULT_EVENT_TYPE, DEFAULT_HEAT_SCORE, Event, SafeEvent},
  pantheon::{Artifact, Figure, HistoricalEvent, TimelineEntry},
};
use rusqlite::Row;

use crate::{Error, Result};

// ─── Time ────────────────────────────────────────────────────────────────────

/// Current time truncated to the precision the store keeps, so a value
/// handed back to the caller compares equal to the one read later.
pub fn now() -> DateTime<Utc> { Utc::now().trunc_subsecs(6) }

/// A fresh `updated_at` that is strictly later than `prev`.
pub fn bump(prev: Option<DateTime<Utc>>) -> DateTime<Utc> {
  let now = now();
  match prev {
    Some(p) if now <= p => p + TimeDelta::microseconds(1),
    _ => now,
  }
}

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
    return Ok(dt.with_timezone(&Utc));
  }
  NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f")
    .map(|naive| naive.and_utc())
    .map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  // Some writers stored a full datetime in the date column.
  let head = s.get(..10).unwrap_or(s);
  NaiveDate::parse_from_str(head, "%Y-%m-%d")
    .map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

fn decode_opt_dt(s: Option<String>) -> Result<Option<DateTime<Utc>>> {
  s.as_deref().map(decode_dt).transpose()
}

fn decode_opt_date(s: Option<String>) -> Result<Option<NaiveDate>> {
  s.as_deref().map(decode_date).transpose()
}

/// Narrow a stored integer, refusing values that do not fit.
fn decode_i32(column: &'static str, value: i64) -> Result<i32> {
  i32::try_from(value).map_err(|_| Error::IntegerOutOfRange { column, value })
}

// ─── Lists ───────────────────────────────────────────────────────────────────

pub fn encode_list(items: &[String]) -> Result<String> {
  Ok(serde_json::to_string(items)?)
}

/// Strict decode used by the full read path; NULL means empty.
pub fn decode_list(s: Option<&str>) -> Result<Vec<String>> {
  match s {
    None | Some("") => Ok(Vec::new()),
    Some(s) => Ok(serde_json::from_str(s)?),
  }
}

/// Lenient decode used by the degraded read path; anything unparseable is
/// treated as an empty list.
pub fn decode_list_lenient(s: Option<&str>) -> Vec<String> {
  decode_list(s).unwrap_or_else(|e| {
    tracing::debug!(error = %e, "unparseable list column, using empty list");
    Vec::new()
  })
}

// ─── Events ──────────────────────────────────────────────────────────────────

/// Raw values read from a full `internet_events` row, in
/// [`crate::schema::EVENT_COLUMNS`] order.
pub struct RawEvent {
  pub id:                String,
  pub date:              String,
  pub title:             String,
  pub description:       Option<String>,
  pub event_type:        Option<String>,
  pub categories:        Option<String>,
  pub keywords:          Option<String>,
  pub heat_level:        Option<String>,
  pub heat_score:        Option<i64>,
  pub sources:           Option<String>,
  pub media_urls:        Option<String>,
  pub created_at:        Option<String>,
  pub updated_at:        Option<String>,
  pub has_literature:    Option<bool>,
  pub literature_path:   Option<String>,
  pub meme_image_url:    Option<String>,
  pub detailed_overview: Option<String>,
  pub figure_id:         Option<String>,
}

impl RawEvent {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:                row.get(0)?,
      date:              row.get(1)?,
      title:             row.get(2)?,
      description:       row.get(3)?,
      event_type:        row.get(4)?,
      categories:        row.get(5)?,
      keywords:          row.get(6)?,
      heat_level:        row.get(7)?,
      heat_score:        row.get(8)?,
      sources:           row.get(9)?,
      media_urls:        row.get(10)?,
      created_at:        row.get(11)?,
      updated_at:        row.get(12)?,
      has_literature:    row.get(13)?,
      literature_path:   row.get(14)?,
      meme_image_url:    row.get(15)?,
      detailed_overview: row.get(16)?,
      figure_id:         row.get(17)?,
    })
  }

  pub fn into_event(self) -> Result<Event> {
    Ok(Event {
      date:              decode_date(&self.date)?,
      categories:        decode_list(self.categories.as_deref())?,
      keywords:          decode_list(self.keywords.as_deref())?,
      sources:           decode_list(self.sources.as_deref())?,
      media_urls:        decode_list(self.media_urls.as_deref())?,
      created_at:        decode_opt_dt(self.created_at)?,
      updated_at:        decode_opt_dt(self.updated_at)?,
      event_type:        self
        .event_type
        .unwrap_or_else(|| DEFAULT_EVENT_TYPE.to_owned()),
      heat_score:        decode_i32("heat_score", self.heat_score.unwrap_or(0))?,
      has_literature:    self.has_literature.unwrap_or(false),
      id:                self.id,
      title:             self.title,
      description:       self.description,
      heat_level:        self.heat_level,
      literature_path:   self.literature_path,
      meme_image_url:    self.meme_image_url,
      detailed_overview: self.detailed_overview,
      figure_id:         self.figure_id,
    })
  }
}

/// Raw values read from the safe column subset, in
/// [`crate::schema::SAFE_EVENT_COLUMNS`] order.
pub struct RawSafeEvent {
  pub id:          String,
  pub date:        String,
  pub title:       String,
  pub description: Option<String>,
  pub heat_score:  Option<i64>,
  pub categories:  Option<String>,
  pub keywords:    Option<String>,
}

impl RawSafeEvent {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:          row.get(0)?,
      date:        row.get(1)?,
      title:       row.get(2)?,
      description: row.get(3)?,
      heat_score:  row.get(4)?,
      categories:  row.get(5)?,
      keywords:    row.get(6)?,
    })
  }

  /// Only the date must parse; everything else degrades to its default.
  pub fn into_safe(self) -> Result<SafeEvent> {
    Ok(SafeEvent {
      date:        decode_date(&self.date)?,
      categories:  decode_list_lenient(self.categories.as_deref()),
      keywords:    decode_list_lenient(self.keywords.as_deref()),
      description: self.description.unwrap_or_default(),
      heat_score:  self
        .heat_score
        .and_then(|h| i32::try_from(h).ok())
        .unwrap_or(DEFAULT_HEAT_SCORE),
      id:          self.id,
      title:       self.title,
    })
  }
}

// ─── Pantheon ────────────────────────────────────────────────────────────────

pub const FIGURE_COLUMNS: &str = "id, name, alias, birth_date, birth_place, description, bio,
  categories, tags, influence_score, popularity_level, avatar_url, media_urls, is_active,
  created_at, updated_at";

pub struct RawFigure {
  pub id:               String,
  pub name:             String,
  pub alias:            Option<String>,
  pub birth_date:       Option<String>,
  pub birth_place:      Option<String>,
  pub description:      Option<String>,
  pub bio:              Option<String>,
  pub categories:       Option<String>,
  pub tags:             Option<String>,
  pub influence_score:  Option<i64>,
  pub popularity_level: Option<String>,
  pub avatar_url:       Option<String>,
  pub media_urls:       Option<String>,
  pub is_active:        Option<bool>,
  pub created_at:       Option<String>,
  pub updated_at:       Option<String>,
}

impl RawFigure {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:               row.get(0)?,
      name:             row.get(1)?,
      alias:            row.get(2)?,
      birth_date:       row.get(3)?,
      birth_place:      row.get(4)?,
      description:      row.get(5)?,
      bio:              row.get(6)?,
      categories:       row.get(7)?,
      tags:             row.get(8)?,
      influence_score:  row.get(9)?,
      popularity_level: row.get(10)?,
      avatar_url:       row.get(11)?,
      media_urls:       row.get(12)?,
      is_active:        row.get(13)?,
      created_at:       row.get(14)?,
      updated_at:       row.get(15)?,
    })
  }

  pub fn into_figure(self) -> Result<Figure> {
    Ok(Figure {
      alias:            decode_list(self.alias.as_deref())?,
      birth_date:       decode_opt_date(self.birth_date)?,
      categories:       decode_list(self.categories.as_deref())?,
      tags:             decode_list(self.tags.as_deref())?,
      media_urls:       decode_list(self.media_urls.as_deref())?,
      influence_score:  decode_i32("influence_score", self.influence_score.unwrap_or(0))?,
      is_active:        self.is_active.unwrap_or(true),
      created_at:       decode_opt_dt(self.created_at)?,
      updated_at:       decode_opt_dt(self.updated_at)?,
      id:               self.id,
      name:             self.name,
      birth_place:      self.birth_place,
      description:      self.description,
      bio:              self.bio,
      popularity_level: self.popularity_level,
      avatar_url:       self.avatar_url,
    })
  }
}

pub const ARTIFACT_COLUMNS: &str = "id, figure_id, name, artifact_type, content,
  occurrence_date, date_accuracy, source, is_verified, significance_level,
  impact_description, media_urls, created_at";

pub struct RawArtifact {
  pub id:                 String,
  pub figure_id:          String,
  pub name:               String,
  pub artifact_type:      Option<String>,
  pub content:            Option<String>,
  pub occurrence_date:    Option<String>,
  pub date_accuracy:      Option<String>,
  pub source:             Option<String>,
  pub is_verified:        Option<bool>,
  pub significance_level: Option<String>,
  pub impact_description: Option<String>,
  pub media_urls:         Option<String>,
  pub created_at:         Option<String>,
}

impl RawArtifact {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:                 row.get(0)?,
      figure_id:          row.get(1)?,
      name:               row.get(2)?,
      artifact_type:      row.get(3)?,
      content:            row.get(4)?,
      occurrence_date:    row.get(5)?,
      date_accuracy:      row.get(6)?,
      source:             row.get(7)?,
      is_verified:        row.get(8)?,
      significance_level: row.get(9)?,
      impact_description: row.get(10)?,
      media_urls:         row.get(11)?,
      created_at:         row.get(12)?,
    })
  }

  pub fn into_artifact(self) -> Result<Artifact> {
    Ok(Artifact {
      occurrence_date:    decode_opt_date(self.occurrence_date)?,
      media_urls:         decode_list(self.media_urls.as_deref())?,
      created_at:         decode_opt_dt(self.created_at)?,
      is_verified:        self.is_verified.unwrap_or(false),
      id:                 self.id,
      figure_id:          self.figure_id,
      name:               self.name,
      artifact_type:      self.artifact_type,
      content:            self.content,
      date_accuracy:      self.date_accuracy,
      source:             self.source,
      significance_level: self.significance_level,
      impact_description: self.impact_description,
    })
  }
}

pub const TIMELINE_COLUMNS: &str = "id, figure_id, year, event_title, event_description,
  importance, event_type, source, created_at";

pub struct RawTimelineEntry {
  pub id:                String,
  pub figure_id:         String,
  pub year:              i64,
  pub event_title:       String,
  pub event_description: Option<String>,
  pub importance:        Option<String>,
  pub event_type:        Option<String>,
  pub source:            Option<String>,
  pub created_at:        Option<String>,
}

impl RawTimelineEntry {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:                row.get(0)?,
      figure_id:         row.get(1)?,
      year:              row.get(2)?,
      event_title:       row.get(3)?,
      event_description: row.get(4)?,
      importance:        row.get(5)?,
      event_type:        row.get(6)?,
      source:            row.get(7)?,
      created_at:        row.get(8)?,
    })
  }

  pub fn into_entry(self) -> Result<TimelineEntry> {
    Ok(TimelineEntry {
      created_at:        decode_opt_dt(self.created_at)?,
      year:              decode_i32("year", self.year)?,
      id:                self.id,
      figure_id:         self.figure_id,
      event_title:       self.event_title,
      event_description: self.event_description,
      importance:        self.importance,
      event_type:        self.event_type,
      source:            self.source,
    })
  }
}

pub const HISTORY_COLUMNS: &str = "id, date, title, description, event_type, categories,
  importance_level, location, source, is_verified, related_figure_ids, related_event_ids,
  media_urls, created_at, updated_at";

pub struct RawHistoricalEvent {
  pub id:                 String,
  pub date:               String,
  pub title:              String,
  pub description:        Option<String>,
  pub event_type:         Option<String>,
  pub categories:         Option<String>,
  pub importance_level:   Option<String>,
  pub location:           Option<String>,
  pub source:             Option<String>,
  pub is_verified:        Option<bool>,
  pub related_figure_ids: Option<String>,
  pub related_event_ids:  Option<String>,
  pub media_urls:         Option<String>,
  pub created_at:         Option<String>,
  pub updated_at:         Option<String>,
}

impl RawHistoricalEvent {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:                 row.get(0)?,
      date:               row.get(1)?,
      title:              row.get(2)?,
      description:        row.get(3)?,
      event_type:         row.get(4)?,
      categories:         row.get(5)?,
      importance_level:   row.get(6)?,
      location:           row.get(7)?,
      source:             row.get(8)?,
      is_verified:        row.get(9)?,
      related_figure_ids: row.get(10)?,
      related_event_ids:  row.get(11)?,
      media_urls:         row.get(12)?,
      created_at:         row.get(13)?,
      updated_at:         row.get(14)?,
    })
  }

  pub fn into_historical_event(self) -> Result<HistoricalEvent> {
    Ok(HistoricalEvent {
      date:               decode_date(&self.date)?,
      categories:         decode_list(self.categories.as_deref())?,
      related_figure_ids: decode_list(self.related_figure_ids.as_deref())?,
      related_event_ids:  decode_list(self.related_event_ids.as_deref())?,
      media_urls:         decode_list(self.media_urls.as_deref())?,
      created_at:         decode_opt_dt(self.created_at)?,
      updated_at:         decode_opt_dt(self.updated_at)?,
      is_verified:        self.is_verified.unwrap_or(true),
      id:                 self.id,
      title:              self.title,
      description:        self.description,
      event_type:         self.event_type,
      importance_level:   self.importance_level,
      location:           self.location,
      source:             self.source,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn timestamps_roundtrip_at_stored_precision() {
    let t = now();
    assert_eq!(decode_dt(&encode_dt(t)).unwrap(), t);
  }

  #[test]
  fn legacy_timestamp_format_is_accepted() {
    let t = decode_dt("2025-01-15 08:30:00").unwrap();
    assert_eq!(encode_dt(t), "2025-01-15T08:30:00.000000Z");
  }

  #[test]
  fn bump_is_strictly_increasing() {
    let future = now() + TimeDelta::seconds(60);
    assert!(bump(Some(future)) > future);
    assert!(bump(None) <= now());
  }

  #[test]
  fn oversized_integers_are_refused_not_wrapped() {
    assert_eq!(decode_i32("year", 2021).unwrap(), 2021);
    assert!(matches!(
      decode_i32("heat_score", i64::from(i32::MAX) + 1),
      Err(Error::IntegerOutOfRange { column: "heat_score", .. })
    ));

    let raw = RawSafeEvent {
      id:          "e1".into(),
      date:        "2021-02-15".into(),
      title:       "X".into(),
      description: None,
      heat_score:  Some(1 << 40),
      categories:  None,
      keywords:    None,
    };
    assert_eq!(raw.into_safe().unwrap().heat_score, DEFAULT_HEAT_SCORE);
  }

  #[test]
  fn date_column_tolerates_trailing_time() {
    let d = NaiveDate::from_ymd_opt(2021, 2, 15).unwrap();
    assert_eq!(decode_date("2021-02-15").unwrap(), d);
    assert_eq!(decode_date("2021-02-15 00:00:00").unwrap(), d);
    assert!(decode_date("15/02/2021").is_err());
  }

  #[test]
  fn list_decoding() {
    assert!(decode_list(None).unwrap().is_empty());
    assert_eq!(decode_list(Some(r#"["a","b"]"#)).unwrap(), vec!["a", "b"]);
    assert!(decode_list(Some("not json")).is_err());
    assert!(decode_list_lenient(Some("not json")).is_empty());
  }
}
