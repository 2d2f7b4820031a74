//! Simple trend summaries over a set of events.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::event::EventRecord;

pub const DEFAULT_TOP_KEYWORDS: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordCount {
  pub keyword: String,
  pub count:   usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeatPoint {
  pub date:       NaiveDate,
  pub heat_score: i32,
  pub title:      String,
}

/// The `top` most frequent keywords, most common first. Ties are broken
/// alphabetically so the output is stable.
pub fn keyword_trends(records: &[EventRecord], top: usize) -> Vec<KeywordCount> {
  let mut counts: HashMap<&str, usize> = HashMap::new();
  for kw in records.iter().flat_map(EventRecord::keywords) {
    *counts.entry(kw.as_str()).or_default() += 1;
  }

  let mut ranked: Vec<KeywordCount> = counts
    .into_iter()
    .map(|(keyword, count)| KeywordCount { keyword: keyword.to_owned(), count })
    .collect();
  ranked.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.keyword.cmp(&b.keyword)));
  ranked.truncate(top);
  ranked
}

/// Heat score per event, earliest first.
pub fn heat_trend(records: &[EventRecord]) -> Vec<HeatPoint> {
  let mut points: Vec<HeatPoint> = records
    .iter()
    .map(|r| HeatPoint {
      date:       r.date(),
      heat_score: r.heat_score(),
      title:      r.title().to_owned(),
    })
    .collect();
  points.sort_by_key(|p| p.date);
  points
}
