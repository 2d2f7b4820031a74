//! The "pantheon": figures referenced by events and the records they own.
//!
//! A [`Figure`] exclusively owns its [`Artifact`]s and [`TimelineEntry`]s.
//! Events point at a figure through an optional, non-owning link.
//! [`HistoricalEvent`]s stand alone and only mention figures and other
//! events by ID; those lists are never checked against the referenced
//! tables.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// ─── Figure ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Figure {
  pub id:               String,
  pub name:             String,
  pub alias:            Vec<String>,
  pub birth_date:       Option<NaiveDate>,
  pub birth_place:      Option<String>,
  /// Short summary.
  pub description:      Option<String>,
  /// Long-form biography.
  pub bio:              Option<String>,
  pub categories:       Vec<String>,
  pub tags:             Vec<String>,
  pub influence_score:  i32,
  pub popularity_level: Option<String>,
  pub avatar_url:       Option<String>,
  pub media_urls:       Vec<String>,
  pub is_active:        bool,
  pub created_at:       Option<DateTime<Utc>>,
  pub updated_at:       Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewFigure {
  #[serde(default)]
  pub id:               Option<String>,
  pub name:             String,
  #[serde(default)]
  pub alias:            Vec<String>,
  #[serde(default)]
  pub birth_date:       Option<NaiveDate>,
  #[serde(default)]
  pub birth_place:      Option<String>,
  #[serde(default)]
  pub description:      Option<String>,
  #[serde(default)]
  pub bio:              Option<String>,
  #[serde(default)]
  pub categories:       Vec<String>,
  #[serde(default)]
  pub tags:             Vec<String>,
  #[serde(default)]
  pub influence_score:  i32,
  #[serde(default)]
  pub popularity_level: Option<String>,
  #[serde(default)]
  pub avatar_url:       Option<String>,
  #[serde(default)]
  pub media_urls:       Vec<String>,
  #[serde(default = "yes")]
  pub is_active:        bool,
}

fn yes() -> bool { true }

impl NewFigure {
  pub fn new(name: impl Into<String>) -> Self {
    Self {
      id: None,
      name: name.into(),
      alias: Vec::new(),
      birth_date: None,
      birth_place: None,
      description: None,
      bio: None,
      categories: Vec::new(),
      tags: Vec::new(),
      influence_score: 0,
      popularity_level: None,
      avatar_url: None,
      media_urls: Vec::new(),
      is_active: true,
    }
  }

  pub fn into_figure(self, id: String, now: DateTime<Utc>) -> Figure {
    Figure {
      id,
      name:             self.name,
      alias:            self.alias,
      birth_date:       self.birth_date,
      birth_place:      self.birth_place,
      description:      self.description,
      bio:              self.bio,
      categories:       self.categories,
      tags:             self.tags,
      influence_score:  self.influence_score,
      popularity_level: self.popularity_level,
      avatar_url:       self.avatar_url,
      media_urls:       self.media_urls,
      is_active:        self.is_active,
      created_at:       Some(now),
      updated_at:       Some(now),
    }
  }
}

// ─── Artifact ────────────────────────────────────────────────────────────────

/// A dated item attributed to a figure: a quote, a work, an invention.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
  pub id:                 String,
  pub figure_id:          String,
  pub name:               String,
  pub artifact_type:      Option<String>,
  pub content:            Option<String>,
  pub occurrence_date:    Option<NaiveDate>,
  /// `exact`, `approximate` or `unknown`.
  pub date_accuracy:      Option<String>,
  pub source:             Option<String>,
  pub is_verified:        bool,
  pub significance_level: Option<String>,
  pub impact_description: Option<String>,
  pub media_urls:         Vec<String>,
  pub created_at:         Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewArtifact {
  #[serde(default)]
  pub id:                 Option<String>,
  pub figure_id:          String,
  pub name:               String,
  #[serde(default)]
  pub artifact_type:      Option<String>,
  #[serde(default)]
  pub content:            Option<String>,
  #[serde(default)]
  pub occurrence_date:    Option<NaiveDate>,
  #[serde(default)]
  pub date_accuracy:      Option<String>,
  #[serde(default)]
  pub source:             Option<String>,
  #[serde(default)]
  pub is_verified:        bool,
  #[serde(default)]
  pub significance_level: Option<String>,
  #[serde(default)]
  pub impact_description: Option<String>,
  #[serde(default)]
  pub media_urls:         Vec<String>,
}

impl NewArtifact {
  pub fn new(figure_id: impl Into<String>, name: impl Into<String>) -> Self {
    Self {
      id: None,
      figure_id: figure_id.into(),
      name: name.into(),
      artifact_type: None,
      content: None,
      occurrence_date: None,
      date_accuracy: None,
      source: None,
      is_verified: false,
      significance_level: None,
      impact_description: None,
      media_urls: Vec::new(),
    }
  }

  pub fn into_artifact(self, id: String, now: DateTime<Utc>) -> Artifact {
    Artifact {
      id,
      figure_id:          self.figure_id,
      name:               self.name,
      artifact_type:      self.artifact_type,
      content:            self.content,
      occurrence_date:    self.occurrence_date,
      date_accuracy:      self.date_accuracy,
      source:             self.source,
      is_verified:        self.is_verified,
      significance_level: self.significance_level,
      impact_description: self.impact_description,
      media_urls:         self.media_urls,
      created_at:         Some(now),
    }
  }
}

// ─── Timeline ────────────────────────────────────────────────────────────────

/// A year-stamped milestone in a figure's life.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineEntry {
  pub id:                String,
  pub figure_id:         String,
  pub year:              i32,
  pub event_title:       String,
  pub event_description: Option<String>,
  /// `major` or `minor`.
  pub importance:        Option<String>,
  /// e.g. `birth`, `career`, `achievement`, `controversy`.
  pub event_type:        Option<String>,
  pub source:            Option<String>,
  pub created_at:        Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTimelineEntry {
  #[serde(default)]
  pub id:                Option<String>,
  pub figure_id:         String,
  pub year:              i32,
  pub event_title:       String,
  #[serde(default)]
  pub event_description: Option<String>,
  #[serde(default)]
  pub importance:        Option<String>,
  #[serde(default)]
  pub event_type:        Option<String>,
  #[serde(default)]
  pub source:            Option<String>,
}

impl NewTimelineEntry {
  pub fn new(figure_id: impl Into<String>, year: i32, event_title: impl Into<String>) -> Self {
    Self {
      id: None,
      figure_id: figure_id.into(),
      year,
      event_title: event_title.into(),
      event_description: None,
      importance: None,
      event_type: None,
      source: None,
    }
  }

  pub fn into_entry(self, id: String, now: DateTime<Utc>) -> TimelineEntry {
    TimelineEntry {
      id,
      figure_id:         self.figure_id,
      year:              self.year,
      event_title:       self.event_title,
      event_description: self.event_description,
      importance:        self.importance,
      event_type:        self.event_type,
      source:            self.source,
      created_at:        Some(now),
    }
  }
}

// ─── HistoricalEvent ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoricalEvent {
  pub id:                 String,
  pub date:               NaiveDate,
  pub title:              String,
  pub description:        Option<String>,
  /// e.g. `historical`, `cultural`, `political`, `scientific`.
  pub event_type:         Option<String>,
  pub categories:         Vec<String>,
  pub importance_level:   Option<String>,
  pub location:           Option<String>,
  pub source:             Option<String>,
  pub is_verified:        bool,
  pub related_figure_ids: Vec<String>,
  pub related_event_ids:  Vec<String>,
  pub media_urls:         Vec<String>,
  pub created_at:         Option<DateTime<Utc>>,
  pub updated_at:         Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewHistoricalEvent {
  #[serde(default)]
  pub id:                 Option<String>,
  pub date:               NaiveDate,
  pub title:              String,
  #[serde(default)]
  pub description:        Option<String>,
  #[serde(default)]
  pub event_type:         Option<String>,
  #[serde(default)]
  pub categories:         Vec<String>,
  #[serde(default)]
  pub importance_level:   Option<String>,
  #[serde(default)]
  pub location:           Option<String>,
  #[serde(default)]
  pub source:             Option<String>,
  #[serde(default = "yes")]
  pub is_verified:        bool,
  #[serde(default)]
  pub related_figure_ids: Vec<String>,
  #[serde(default)]
  pub related_event_ids:  Vec<String>,
  #[serde(default)]
  pub media_urls:         Vec<String>,
}

impl NewHistoricalEvent {
  pub fn new(title: impl Into<String>, date: NaiveDate) -> Self {
    Self {
      id: None,
      date,
      title: title.into(),
      description: None,
      event_type: None,
      categories: Vec::new(),
      importance_level: None,
      location: None,
      source: None,
      is_verified: true,
      related_figure_ids: Vec::new(),
      related_event_ids: Vec::new(),
      media_urls: Vec::new(),
    }
  }

  pub fn into_historical_event(self, id: String, now: DateTime<Utc>) -> HistoricalEvent {
    HistoricalEvent {
      id,
      date:               self.date,
      title:              self.title,
      description:        self.description,
      event_type:         self.event_type,
      categories:         self.categories,
      importance_level:   self.importance_level,
      location:           self.location,
      source:             self.source,
      is_verified:        self.is_verified,
      related_figure_ids: self.related_figure_ids,
      related_event_ids:  self.related_event_ids,
      media_urls:         self.media_urls,
      created_at:         Some(now),
      updated_at:         Some(now),
    }
  }
}

// ─── Profile ─────────────────────────────────────────────────────────────────

/// A figure with everything it owns. Computed on read, never stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FigureProfile {
  pub figure:    Figure,
  pub artifacts: Vec<Artifact>,
  /// Ordered by year, earliest first.
  pub timeline:  Vec<TimelineEntry>,
}
