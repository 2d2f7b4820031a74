//! Event types: the dated, classified occurrences the calendar is built on.
//!
//! A stored event is read back in one of two fidelities. The rich path yields
//! a full [`Event`]; when that query cannot run (typically because the live
//! table predates some optional column) the store falls back to a raw read of
//! the baseline columns and yields a [`SafeEvent`]. [`EventRecord`] carries
//! either, so callers can always tell which path produced a row.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::Result;

// ─── Defaults ────────────────────────────────────────────────────────────────

pub const DEFAULT_EVENT_TYPE: &str = "meme";
pub const DEFAULT_HEAT_LEVEL: &str = "medium";
pub const DEFAULT_HEAT_SCORE: i32 = 50;
/// Row cap applied when the caller does not give one.
pub const DEFAULT_LIMIT: usize = 100;
pub const MAX_TITLE_LEN: usize = 200;
/// Source recorded for events entered by hand when none is supplied.
pub const MANUAL_SOURCE: &str = "manual entry";

// ─── Event ───────────────────────────────────────────────────────────────────

/// A full-fidelity event row.
///
/// `created_at` and `updated_at` are optional because tables patched by the
/// schema reconciliation gain those columns without a value for older rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
  pub id:                String,
  pub date:              NaiveDate,
  pub title:             String,
  pub description:       Option<String>,
  pub event_type:        String,
  pub categories:        Vec<String>,
  pub keywords:          Vec<String>,
  pub heat_level:        Option<String>,
  pub heat_score:        i32,
  pub sources:           Vec<String>,
  pub media_urls:        Vec<String>,
  pub created_at:        Option<DateTime<Utc>>,
  pub updated_at:        Option<DateTime<Utc>>,
  pub has_literature:    bool,
  /// Filename relative to the literature root.
  pub literature_path:   Option<String>,
  pub meme_image_url:    Option<String>,
  pub detailed_overview: Option<String>,
  pub figure_id:         Option<String>,
}

// ─── SafeEvent ───────────────────────────────────────────────────────────────

/// A reduced-fidelity event read from the baseline columns only.
///
/// Everything not selected by the degraded query is reported through the
/// accessor methods with its documented default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafeEvent {
  pub id:          String,
  pub date:        NaiveDate,
  pub title:       String,
  pub description: String,
  pub heat_score:  i32,
  pub categories:  Vec<String>,
  pub keywords:    Vec<String>,
}

impl SafeEvent {
  pub fn event_type(&self) -> &'static str { DEFAULT_EVENT_TYPE }

  pub fn heat_level(&self) -> &'static str { DEFAULT_HEAT_LEVEL }

  pub fn sources(&self) -> &'static [String] { &[] }

  pub fn media_urls(&self) -> &'static [String] { &[] }

  pub fn has_literature(&self) -> bool { false }

  pub fn literature_path(&self) -> Option<&str> { None }
}

// ─── EventRecord ─────────────────────────────────────────────────────────────

/// An event as returned by a listing or search, tagged with the path that
/// produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "fidelity", rename_all = "snake_case")]
pub enum EventRecord {
  Full(Event),
  Degraded(SafeEvent),
}

impl EventRecord {
  pub fn is_degraded(&self) -> bool { matches!(self, Self::Degraded(_)) }

  pub fn as_full(&self) -> Option<&Event> {
    match self {
      Self::Full(e) => Some(e),
      Self::Degraded(_) => None,
    }
  }

  pub fn into_full(self) -> Option<Event> {
    match self {
      Self::Full(e) => Some(e),
      Self::Degraded(_) => None,
    }
  }

  pub fn id(&self) -> &str {
    match self {
      Self::Full(e) => &e.id,
      Self::Degraded(s) => &s.id,
    }
  }

  pub fn date(&self) -> NaiveDate {
    match self {
      Self::Full(e) => e.date,
      Self::Degraded(s) => s.date,
    }
  }

  pub fn title(&self) -> &str {
    match self {
      Self::Full(e) => &e.title,
      Self::Degraded(s) => &s.title,
    }
  }

  pub fn description(&self) -> Option<&str> {
    match self {
      Self::Full(e) => e.description.as_deref(),
      Self::Degraded(s) => Some(&s.description),
    }
  }

  pub fn event_type(&self) -> &str {
    match self {
      Self::Full(e) => &e.event_type,
      Self::Degraded(s) => s.event_type(),
    }
  }

  pub fn heat_score(&self) -> i32 {
    match self {
      Self::Full(e) => e.heat_score,
      Self::Degraded(s) => s.heat_score,
    }
  }

  pub fn heat_level(&self) -> Option<&str> {
    match self {
      Self::Full(e) => e.heat_level.as_deref(),
      Self::Degraded(s) => Some(s.heat_level()),
    }
  }

  pub fn categories(&self) -> &[String] {
    match self {
      Self::Full(e) => &e.categories,
      Self::Degraded(s) => &s.categories,
    }
  }

  pub fn keywords(&self) -> &[String] {
    match self {
      Self::Full(e) => &e.keywords,
      Self::Degraded(s) => &s.keywords,
    }
  }

  pub fn sources(&self) -> &[String] {
    match self {
      Self::Full(e) => &e.sources,
      Self::Degraded(s) => s.sources(),
    }
  }

  pub fn media_urls(&self) -> &[String] {
    match self {
      Self::Full(e) => &e.media_urls,
      Self::Degraded(s) => s.media_urls(),
    }
  }

  pub fn has_literature(&self) -> bool {
    match self {
      Self::Full(e) => e.has_literature,
      Self::Degraded(s) => s.has_literature(),
    }
  }

  pub fn literature_path(&self) -> Option<&str> {
    match self {
      Self::Full(e) => e.literature_path.as_deref(),
      Self::Degraded(s) => s.literature_path(),
    }
  }
}

impl From<Event> for EventRecord {
  fn from(e: Event) -> Self { Self::Full(e) }
}

impl From<SafeEvent> for EventRecord {
  fn from(s: SafeEvent) -> Self { Self::Degraded(s) }
}

// ─── NewEvent ────────────────────────────────────────────────────────────────

/// Input to [`crate::store::EventStore::add_event`].
///
/// Only `title` and `date` are required. When `id` is absent the store
/// generates one; timestamps are always set by the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewEvent {
  #[serde(default)]
  pub id:                 Option<String>,
  pub date:               NaiveDate,
  pub title:              String,
  #[serde(default)]
  pub description:        Option<String>,
  #[serde(default)]
  pub event_type:         Option<String>,
  #[serde(default)]
  pub categories:         Option<Vec<String>>,
  #[serde(default)]
  pub keywords:           Option<Vec<String>>,
  #[serde(default)]
  pub heat_level:         Option<String>,
  #[serde(default)]
  pub heat_score:         Option<i32>,
  #[serde(default)]
  pub sources:            Option<Vec<String>>,
  #[serde(default)]
  pub media_urls:         Option<Vec<String>>,
  #[serde(default)]
  pub has_literature:     bool,
  #[serde(default)]
  pub literature_path:    Option<String>,
  #[serde(default)]
  pub meme_image_url:     Option<String>,
  #[serde(default)]
  pub detailed_overview:  Option<String>,
  #[serde(default)]
  pub figure_id:          Option<String>,
  /// Literature text written to the literature store on insert.
  #[serde(default)]
  pub literature_content: Option<String>,
}

impl NewEvent {
  /// Convenience constructor with all optional fields unset.
  pub fn new(title: impl Into<String>, date: NaiveDate) -> Self {
    Self {
      id: None,
      date,
      title: title.into(),
      description: None,
      event_type: None,
      categories: None,
      keywords: None,
      heat_level: None,
      heat_score: None,
      sources: None,
      media_urls: None,
      has_literature: false,
      literature_path: None,
      meme_image_url: None,
      detailed_overview: None,
      figure_id: None,
      literature_content: None,
    }
  }

  /// Build the row to insert, filling every unset field with its default.
  /// `literature_content` is not part of the row and is left for the caller.
  pub fn to_event(&self, id: String, now: DateTime<Utc>) -> Event {
    Event {
      id,
      date:              self.date,
      title:             self.title.clone(),
      description:       Some(self.description.clone().unwrap_or_default()),
      event_type:        self
        .event_type
        .clone()
        .unwrap_or_else(|| DEFAULT_EVENT_TYPE.to_owned()),
      categories:        self.categories.clone().unwrap_or_default(),
      keywords:          self.keywords.clone().unwrap_or_default(),
      heat_level:        Some(
        self
          .heat_level
          .clone()
          .unwrap_or_else(|| DEFAULT_HEAT_LEVEL.to_owned()),
      ),
      heat_score:        self.heat_score.unwrap_or(DEFAULT_HEAT_SCORE),
      sources:           self
        .sources
        .clone()
        .unwrap_or_else(|| vec![MANUAL_SOURCE.to_owned()]),
      media_urls:        self.media_urls.clone().unwrap_or_default(),
      created_at:        Some(now),
      updated_at:        Some(now),
      has_literature:    self.has_literature,
      literature_path:   self.literature_path.clone(),
      meme_image_url:    self.meme_image_url.clone(),
      detailed_overview: self.detailed_overview.clone(),
      figure_id:         self.figure_id.clone(),
    }
  }
}

// ─── EventPatch ──────────────────────────────────────────────────────────────

/// A partial update. Absent fields are left untouched; nullable columns use
/// a nested `Option` so that `Some(None)` clears the stored value.
///
/// Deserialising from a JSON object ignores keys that do not name a known
/// attribute.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventPatch {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub date:              Option<NaiveDate>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub title:             Option<String>,
  #[serde(deserialize_with = "present", skip_serializing_if = "Option::is_none")]
  pub description:       Option<Option<String>>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub event_type:        Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub categories:        Option<Vec<String>>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub keywords:          Option<Vec<String>>,
  #[serde(deserialize_with = "present", skip_serializing_if = "Option::is_none")]
  pub heat_level:        Option<Option<String>>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub heat_score:        Option<i32>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub sources:           Option<Vec<String>>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub media_urls:        Option<Vec<String>>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub has_literature:    Option<bool>,
  #[serde(deserialize_with = "present", skip_serializing_if = "Option::is_none")]
  pub literature_path:   Option<Option<String>>,
  #[serde(deserialize_with = "present", skip_serializing_if = "Option::is_none")]
  pub meme_image_url:    Option<Option<String>>,
  #[serde(deserialize_with = "present", skip_serializing_if = "Option::is_none")]
  pub detailed_overview: Option<Option<String>>,
  #[serde(deserialize_with = "present", skip_serializing_if = "Option::is_none")]
  pub figure_id:         Option<Option<String>>,
}

/// Maps a present key (even an explicit `null`) to `Some`, so that absence
/// and `null` stay distinguishable.
fn present<'de, D, T>(d: D) -> std::result::Result<Option<Option<T>>, D::Error>
where
  D: Deserializer<'de>,
  T: Deserialize<'de>,
{
  Option::<T>::deserialize(d).map(Some)
}

impl EventPatch {
  /// Parse a patch from an arbitrary JSON object.
  pub fn from_json(value: serde_json::Value) -> Result<Self> {
    Ok(serde_json::from_value(value)?)
  }

  pub fn is_empty(&self) -> bool { *self == Self::default() }

  /// Merge the present fields into `event`. Timestamps are not touched.
  pub fn apply_to(self, event: &mut Event) {
    if let Some(v) = self.date {
      event.date = v;
    }
    if let Some(v) = self.title {
      event.title = v;
    }
    if let Some(v) = self.description {
      event.description = v;
    }
    if let Some(v) = self.event_type {
      event.event_type = v;
    }
    if let Some(v) = self.categories {
      event.categories = v;
    }
    if let Some(v) = self.keywords {
      event.keywords = v;
    }
    if let Some(v) = self.heat_level {
      event.heat_level = v;
    }
    if let Some(v) = self.heat_score {
      event.heat_score = v;
    }
    if let Some(v) = self.sources {
      event.sources = v;
    }
    if let Some(v) = self.media_urls {
      event.media_urls = v;
    }
    if let Some(v) = self.has_literature {
      event.has_literature = v;
    }
    if let Some(v) = self.literature_path {
      event.literature_path = v;
    }
    if let Some(v) = self.meme_image_url {
      event.meme_image_url = v;
    }
    if let Some(v) = self.detailed_overview {
      event.detailed_overview = v;
    }
    if let Some(v) = self.figure_id {
      event.figure_id = v;
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
  }

  #[test]
  fn new_event_defaults() {
    let now = Utc::now();
    let event = NewEvent::new("X", date(2021, 2, 15)).to_event("e1".into(), now);

    assert_eq!(event.event_type, "meme");
    assert_eq!(event.heat_level.as_deref(), Some("medium"));
    assert_eq!(event.heat_score, 50);
    assert_eq!(event.sources, vec![MANUAL_SOURCE.to_owned()]);
    assert_eq!(event.description.as_deref(), Some(""));
    assert!(event.categories.is_empty());
    assert!(!event.has_literature);
    assert_eq!(event.created_at, Some(now));
    assert_eq!(event.updated_at, Some(now));
  }

  #[test]
  fn degraded_record_reports_defaults() {
    let record = EventRecord::Degraded(SafeEvent {
      id:          "e1".into(),
      date:        date(2021, 2, 15),
      title:       "X".into(),
      description: String::new(),
      heat_score:  90,
      categories:  vec!["anime".into()],
      keywords:    vec![],
    });

    assert!(record.is_degraded());
    assert_eq!(record.event_type(), "meme");
    assert_eq!(record.heat_level(), Some("medium"));
    assert!(!record.has_literature());
    assert!(record.literature_path().is_none());
    assert!(record.sources().is_empty());
    assert!(record.as_full().is_none());
  }

  #[test]
  fn patch_ignores_unknown_keys_and_keeps_null_distinct() {
    let patch = EventPatch::from_json(serde_json::json!({
      "heat_score": 77,
      "description": null,
      "no_such_field": "ignored",
    }))
    .unwrap();

    assert_eq!(patch.heat_score, Some(77));
    assert_eq!(patch.description, Some(None));
    assert_eq!(patch.title, None);
    assert_eq!(patch.figure_id, None);
  }

  #[test]
  fn patch_applies_only_present_fields() {
    let mut event = NewEvent::new("X", date(2021, 2, 15)).to_event("e1".into(), Utc::now());
    let before = event.clone();

    EventPatch {
      title: Some("Y".into()),
      meme_image_url: Some(Some("https://example.com/y.png".into())),
      ..Default::default()
    }
    .apply_to(&mut event);

    assert_eq!(event.title, "Y");
    assert_eq!(event.meme_image_url.as_deref(), Some("https://example.com/y.png"));
    assert_eq!(event.categories, before.categories);
    assert_eq!(event.heat_score, before.heat_score);
    assert_eq!(event.description, before.description);
  }

  #[test]
  fn empty_patch() {
    assert!(EventPatch::default().is_empty());
    assert!(!EventPatch { heat_score: Some(1), ..Default::default() }.is_empty());
  }
}
