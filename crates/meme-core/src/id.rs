//! Identifier scheme: `<prefix><YYYYMMDD><NNN>`.
//!
//! The date is the creation date, and the three-digit sequence counts up per
//! prefix and date. The store is responsible for finding the next free
//! sequence; this module only formats and parses.

use chrono::NaiveDate;

pub const EVENT_PREFIX: &str = "event_";
pub const FIGURE_PREFIX: &str = "figure_";
pub const ARTIFACT_PREFIX: &str = "artifact_";
pub const TIMELINE_PREFIX: &str = "timeline_";
pub const HISTORY_PREFIX: &str = "history_";

/// The prefix and date part shared by every ID created on `date`.
pub fn stem(prefix: &str, date: NaiveDate) -> String {
  format!("{prefix}{}", date.format("%Y%m%d"))
}

pub fn compose(prefix: &str, date: NaiveDate, sequence: u32) -> String {
  format!("{}{sequence:03}", stem(prefix, date))
}

/// Extract the sequence number from `id` if it was built from `stem`.
pub fn sequence_of(id: &str, stem: &str) -> Option<u32> {
  let rest = id.strip_prefix(stem)?;
  if rest.is_empty() || !rest.bytes().all(|b| b.is_ascii_digit()) {
    return None;
  }
  rest.parse().ok()
}

/// The ID following the highest sequence among `existing`.
pub fn next_id<'a>(
  prefix:   &str,
  date:     NaiveDate,
  existing: impl IntoIterator<Item = &'a str>,
) -> String {
  let stem = stem(prefix, date);
  let next = existing
    .into_iter()
    .filter_map(|id| sequence_of(id, &stem))
    .max()
    .map_or(1, |max| max + 1);
  compose(prefix, date, next)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn date() -> NaiveDate { NaiveDate::from_ymd_opt(2025, 10, 25).unwrap() }

  #[test]
  fn compose_pads_sequence() {
    assert_eq!(compose(EVENT_PREFIX, date(), 1), "event_20251025001");
    assert_eq!(compose(FIGURE_PREFIX, date(), 42), "figure_20251025042");
  }

  #[test]
  fn sequence_parsing() {
    let stem = stem(EVENT_PREFIX, date());
    assert_eq!(sequence_of("event_20251025007", &stem), Some(7));
    assert_eq!(sequence_of("event_20251024007", &stem), None);
    assert_eq!(sequence_of("event_20251025", &stem), None);
    assert_eq!(sequence_of("event_20251025abc", &stem), None);
  }

  #[test]
  fn next_id_skips_other_stems() {
    let existing = ["event_20251025001", "event_20251025003", "event_20251024009", "e1"];
    assert_eq!(next_id(EVENT_PREFIX, date(), existing), "event_20251025004");
    assert_eq!(next_id(EVENT_PREFIX, date(), Vec::<&str>::new()), "event_20251025001");
  }
}
