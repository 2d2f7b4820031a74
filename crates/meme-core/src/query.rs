//! Backend-neutral description of an event search.
//!
//! Storage backends compile an [`EventFilter`] into their own query language.
//! [`EventFilter::matches`] gives the same semantics in process; backends use
//! it for the parts of a filter they cannot express on a degraded read.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::event::EventRecord;

// ─── Ordering ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
  #[default]
  Date,
  Heat,
}

/// Primary sort. Ordering by date always breaks ties by heat score
/// (descending); ordering by heat breaks ties by date (descending).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortOrder {
  pub key:        SortKey,
  pub descending: bool,
}

impl Default for SortOrder {
  fn default() -> Self { Self { key: SortKey::Date, descending: true } }
}

// ─── Filter ──────────────────────────────────────────────────────────────────

/// Accumulated search criteria. All present criteria must hold (logical AND).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventFilter {
  /// Case-insensitive substring over title or description.
  pub keyword:          Option<String>,
  /// Also match the keyword against elements of the keyword list.
  pub keyword_in_tags:  bool,
  /// The categories list must contain this exact value.
  pub category:         Option<String>,
  pub event_type:       Option<String>,
  /// Inclusive lower date bound.
  pub start_date:       Option<NaiveDate>,
  /// Inclusive upper date bound.
  pub end_date:         Option<NaiveDate>,
  /// Inclusive lower heat bound.
  pub min_heat:         Option<i32>,
  /// Inclusive upper heat bound.
  pub max_heat:         Option<i32>,
  pub order:            SortOrder,
  /// `None` means unbounded.
  pub limit:            Option<usize>,
}

impl EventFilter {
  /// Whether `record` satisfies every criterion. Ordering and limit are not
  /// considered. Case folding is ASCII-only, as with SQL `LIKE`.
  pub fn matches(&self, record: &EventRecord) -> bool {
    if let Some(kw) = &self.keyword {
      let needle = kw.to_ascii_lowercase();
      let hit = |s: &str| s.to_ascii_lowercase().contains(&needle);
      let in_text =
        hit(record.title()) || record.description().is_some_and(hit);
      let in_tags = self.keyword_in_tags
        && record.keywords().iter().any(|k| k.eq_ignore_ascii_case(kw));
      if !(in_text || in_tags) {
        return false;
      }
    }
    if let Some(cat) = &self.category
      && !record.categories().iter().any(|c| c == cat)
    {
      return false;
    }
    if let Some(t) = &self.event_type
      && record.event_type() != t
    {
      return false;
    }
    let date = record.date();
    if self.start_date.is_some_and(|s| date < s) || self.end_date.is_some_and(|e| date > e) {
      return false;
    }
    let heat = record.heat_score();
    if self.min_heat.is_some_and(|m| heat < m) || self.max_heat.is_some_and(|m| heat > m) {
      return false;
    }
    true
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::event::SafeEvent;

  fn record(title: &str, description: &str, date: (i32, u32, u32), heat: i32) -> EventRecord {
    EventRecord::Degraded(SafeEvent {
      id:          title.to_owned(),
      date:        NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
      title:       title.to_owned(),
      description: description.to_owned(),
      heat_score:  heat,
      categories:  vec!["anime".into()],
      keywords:    vec!["hachimi".into()],
    })
  }

  #[test]
  fn keyword_matches_title_or_description_case_insensitively() {
    let filter = EventFilter { keyword: Some("ai".into()), ..Default::default() };
    assert!(filter.matches(&record("AI突破", "some desc", (2024, 1, 1), 50)));
    assert!(filter.matches(&record("B", "包含AI的描述", (2024, 1, 1), 50)));
    assert!(!filter.matches(&record("B", "nothing", (2024, 1, 1), 50)));
  }

  #[test]
  fn keyword_list_only_when_requested() {
    let mut filter = EventFilter { keyword: Some("HACHIMI".into()), ..Default::default() };
    assert!(!filter.matches(&record("B", "", (2024, 1, 1), 50)));
    filter.keyword_in_tags = true;
    assert!(filter.matches(&record("B", "", (2024, 1, 1), 50)));
  }

  #[test]
  fn bounds_are_inclusive() {
    let filter = EventFilter {
      start_date: NaiveDate::from_ymd_opt(2021, 2, 1),
      end_date:   NaiveDate::from_ymd_opt(2021, 2, 28),
      min_heat:   Some(80),
      ..Default::default()
    };
    assert!(filter.matches(&record("a", "", (2021, 2, 1), 80)));
    assert!(filter.matches(&record("b", "", (2021, 2, 28), 95)));
    assert!(!filter.matches(&record("c", "", (2021, 3, 1), 95)));
    assert!(!filter.matches(&record("d", "", (2021, 2, 15), 79)));
  }

  #[test]
  fn degraded_records_carry_the_default_type() {
    let meme = EventFilter { event_type: Some("meme".into()), ..Default::default() };
    let news = EventFilter { event_type: Some("news".into()), ..Default::default() };
    let r = record("a", "", (2021, 2, 1), 80);
    assert!(meme.matches(&r));
    assert!(!news.matches(&r));
  }

  #[test]
  fn category_is_exact_element_match() {
    let filter = EventFilter { category: Some("anim".into()), ..Default::default() };
    assert!(!filter.matches(&record("a", "", (2021, 2, 1), 80)));
  }
}
