//! Compiles an [`EventFilter`] into SQL against `internet_events`.
//!
//! [`EventQueryBuilder`] accumulates criteria by value, so each builder
//! produces exactly one [`BuiltQuery`]. A built query runs in one of two
//! shapes:
//!
//! - [`BuiltQuery::fetch_full`] selects every column and uses `json_each` for
//!   list containment.
//! - [`BuiltQuery::fetch_safe`] selects only the baseline columns and
//!   filters in SQL on title, description, date and heat. List containment,
//!   event type and the row limit are applied in process with
//!   [`EventFilter::matches`], since legacy list text may not be in the form
//!   this crate writes (for example `\uXXXX`-escaped JSON).

use chrono::NaiveDate;
use meme_core::{
  event::{DEFAULT_LIMIT, Event, EventRecord},
  query::{EventFilter, SortKey, SortOrder},
};
use rusqlite::{Connection, params_from_iter, types::Value};

use crate::{
  Result,
  encode::{RawEvent, RawSafeEvent, encode_date},
  schema::{EVENTS_TABLE, SAFE_EVENT_COLUMNS, event_select_list},
};

// ─── Builder ─────────────────────────────────────────────────────────────────

/// Chainable search criteria. Every method ignores blank or absent input.
#[derive(Debug, Clone)]
pub struct EventQueryBuilder {
  filter: EventFilter,
}

impl Default for EventQueryBuilder {
  fn default() -> Self { Self::new() }
}

impl EventQueryBuilder {
  /// No criteria, newest first, capped at [`DEFAULT_LIMIT`].
  pub fn new() -> Self {
    Self { filter: EventFilter { limit: Some(DEFAULT_LIMIT), ..Default::default() } }
  }

  /// Start from an existing filter, taking its limit as given.
  pub fn from_filter(filter: EventFilter) -> Self { Self { filter } }

  /// Case-insensitive substring over title or description.
  pub fn keyword<'a>(mut self, keyword: impl Into<Option<&'a str>>) -> Self {
    if let Some(kw) = non_blank(keyword.into()) {
      self.filter.keyword = Some(kw.to_owned());
      self.filter.keyword_in_tags = false;
    }
    self
  }

  /// As [`Self::keyword`], also matching elements of the keyword list.
  pub fn keyword_with_tags<'a>(mut self, keyword: impl Into<Option<&'a str>>) -> Self {
    if let Some(kw) = non_blank(keyword.into()) {
      self.filter.keyword = Some(kw.to_owned());
      self.filter.keyword_in_tags = true;
    }
    self
  }

  pub fn category<'a>(mut self, category: impl Into<Option<&'a str>>) -> Self {
    if let Some(c) = non_blank(category.into()) {
      self.filter.category = Some(c.to_owned());
    }
    self
  }

  pub fn event_type<'a>(mut self, event_type: impl Into<Option<&'a str>>) -> Self {
    if let Some(t) = non_blank(event_type.into()) {
      self.filter.event_type = Some(t.to_owned());
    }
    self
  }

  /// Inclusive on both ends; either bound may be omitted.
  pub fn date_range(mut self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
    if start.is_some() {
      self.filter.start_date = start;
    }
    if end.is_some() {
      self.filter.end_date = end;
    }
    self
  }

  /// Inclusive on both ends; either bound may be omitted.
  pub fn heat_range(mut self, min: Option<i32>, max: Option<i32>) -> Self {
    if min.is_some() {
      self.filter.min_heat = min;
    }
    if max.is_some() {
      self.filter.max_heat = max;
    }
    self
  }

  pub fn order_by_date(mut self, descending: bool) -> Self {
    self.filter.order = SortOrder { key: SortKey::Date, descending };
    self
  }

  pub fn order_by_heat(mut self, descending: bool) -> Self {
    self.filter.order = SortOrder { key: SortKey::Heat, descending };
    self
  }

  pub fn limit(mut self, n: usize) -> Self {
    self.filter.limit = Some(n);
    self
  }

  pub fn unbounded(mut self) -> Self {
    self.filter.limit = None;
    self
  }

  pub fn filter(&self) -> &EventFilter { &self.filter }

  pub fn build(self) -> BuiltQuery { BuiltQuery { filter: self.filter } }
}

fn non_blank(s: Option<&str>) -> Option<&str> {
  s.map(str::trim).filter(|s| !s.is_empty())
}

// ─── Built query ─────────────────────────────────────────────────────────────

/// A finished query, ready to run against a connection.
#[derive(Debug, Clone)]
pub struct BuiltQuery {
  filter: EventFilter,
}

/// Which column set the query may reference.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Shape {
  Full,
  Safe,
}

impl BuiltQuery {
  pub fn filter(&self) -> &EventFilter { &self.filter }

  /// Run against every column of the table.
  pub fn fetch_full(&self, conn: &Connection) -> Result<Vec<Event>> {
    let (sql, params) = self.to_sql(Shape::Full);
    let mut stmt = conn.prepare(&sql)?;
    let raws = stmt
      .query_map(params_from_iter(params.iter()), RawEvent::from_row)?
      .collect::<rusqlite::Result<Vec<_>>>()?;
    raws.into_iter().map(RawEvent::into_event).collect()
  }

  /// Run against the baseline columns only. Every record is
  /// [`EventRecord::Degraded`].
  pub fn fetch_safe(&self, conn: &Connection) -> Result<Vec<EventRecord>> {
    let (sql, params) = self.to_sql(Shape::Safe);
    let mut stmt = conn.prepare(&sql)?;
    let raws = stmt
      .query_map(params_from_iter(params.iter()), RawSafeEvent::from_row)?
      .collect::<rusqlite::Result<Vec<_>>>()?;

    let mut records = raws
      .into_iter()
      .map(|raw| raw.into_safe().map(EventRecord::Degraded))
      .collect::<Result<Vec<_>>>()?;
    records.retain(|r| self.filter.matches(r));
    if let Some(limit) = self.filter.limit {
      records.truncate(limit);
    }
    Ok(records)
  }

  fn to_sql(&self, shape: Shape) -> (String, Vec<Value>) {
    let f = &self.filter;
    let mut conds: Vec<&'static str> = Vec::new();
    let mut params: Vec<Value> = Vec::new();
    // Bounds compare the same values the safe decoder produces.
    let (date_ge, date_le, heat_ge, heat_le) = match shape {
      Shape::Full => ("date >= ?", "date <= ?", "heat_score >= ?", "heat_score <= ?"),
      Shape::Safe => (
        "substr(date, 1, 10) >= ?",
        "substr(date, 1, 10) <= ?",
        "COALESCE(heat_score, 50) >= ?",
        "COALESCE(heat_score, 50) <= ?",
      ),
    };

    if let Some(kw) = &f.keyword {
      let pattern = format!("%{}%", like_escape(kw));
      match (f.keyword_in_tags, shape) {
        (false, _) => {
          conds.push(r"(title LIKE ? ESCAPE '\' OR description LIKE ? ESCAPE '\')");
          params.extend([Value::from(pattern.clone()), Value::from(pattern)]);
        }
        (true, Shape::Full) => {
          conds.push(
            r"(title LIKE ? ESCAPE '\' OR description LIKE ? ESCAPE '\'
              OR EXISTS (SELECT 1 FROM json_each(keywords) WHERE value LIKE ? ESCAPE '\'))",
          );
          params.extend([
            Value::from(pattern.clone()),
            Value::from(pattern),
            Value::from(like_escape(kw)),
          ]);
        }
        // A keyword-list hit can rescue a row whose text does not match, so
        // nothing can be ruled out before decoding.
        (true, Shape::Safe) => {}
      }
    }

    if let Some(cat) = &f.category
      && shape == Shape::Full
    {
      conds.push("EXISTS (SELECT 1 FROM json_each(categories) WHERE value = ?)");
      params.push(Value::from(cat.clone()));
    }

    if let Some(t) = &f.event_type
      && shape == Shape::Full
    {
      conds.push("event_type = ?");
      params.push(Value::from(t.clone()));
    }

    if let Some(start) = f.start_date {
      conds.push(date_ge);
      params.push(Value::from(encode_date(start)));
    }
    if let Some(end) = f.end_date {
      conds.push(date_le);
      params.push(Value::from(encode_date(end)));
    }
    if let Some(min) = f.min_heat {
      conds.push(heat_ge);
      params.push(Value::from(i64::from(min)));
    }
    if let Some(max) = f.max_heat {
      conds.push(heat_le);
      params.push(Value::from(i64::from(max)));
    }

    let columns = match shape {
      Shape::Full => event_select_list(),
      Shape::Safe => safe_select_list(),
    };
    let where_clause = if conds.is_empty() {
      String::new()
    } else {
      format!("WHERE {}", conds.join(" AND "))
    };
    let dir = if f.order.descending { "DESC" } else { "ASC" };
    let heat = match shape {
      Shape::Full => "heat_score",
      Shape::Safe => "COALESCE(heat_score, 50)",
    };
    let order = match f.order.key {
      SortKey::Date => format!("ORDER BY date {dir}, {heat} DESC, id"),
      SortKey::Heat => format!("ORDER BY {heat} {dir}, date DESC, id"),
    };

    let mut sql = format!("SELECT {columns} FROM {EVENTS_TABLE} {where_clause} {order}");
    if let Some(limit) = f.limit
      && shape == Shape::Full
    {
      sql.push_str(" LIMIT ?");
      params.push(Value::from(i64::try_from(limit).unwrap_or(i64::MAX)));
    }

    tracing::trace!(%sql, "compiled event query");
    (sql, params)
  }
}

/// Run `filter` on the full column set.
pub fn advanced_search(conn: &Connection, filter: &EventFilter) -> Result<Vec<Event>> {
  EventQueryBuilder::from_filter(filter.clone())
    .build()
    .fetch_full(conn)
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

/// Safe column list with NULL lists read as empty arrays.
fn safe_select_list() -> String {
  SAFE_EVENT_COLUMNS
    .iter()
    .map(|c| match *c {
      "categories" | "keywords" => format!("COALESCE({c}, '[]')"),
      _ => (*c).to_owned(),
    })
    .collect::<Vec<_>>()
    .join(", ")
}

/// Escape `LIKE` wildcards for use with `ESCAPE '\'`.
fn like_escape(s: &str) -> String {
  let mut out = String::with_capacity(s.len());
  for ch in s.chars() {
    if matches!(ch, '\\' | '%' | '_') {
      out.push('\\');
    }
    out.push(ch);
  }
  out
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::schema::SCHEMA;

  fn conn() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(SCHEMA).unwrap();
    conn
  }

  fn insert(conn: &Connection, id: &str, date: &str, title: &str, desc: &str, heat: i64, cats: &str) {
    conn
      .execute(
        "INSERT INTO internet_events (id, date, title, description, heat_score, categories, keywords)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, '[\"hachimi\"]')",
        rusqlite::params![id, date, title, desc, heat, cats],
      )
      .unwrap();
  }

  fn ids(events: &[Event]) -> Vec<&str> { events.iter().map(|e| e.id.as_str()).collect() }

  fn d(s: &str) -> Option<NaiveDate> { Some(s.parse().unwrap()) }

  #[test]
  fn keyword_is_case_insensitive_over_title_and_description() {
    let c = conn();
    insert(&c, "a", "2024-01-01", "AI突破", "some desc", 50, "[]");
    insert(&c, "b", "2024-01-02", "B", "包含AI的描述", 50, "[]");
    insert(&c, "c", "2024-01-03", "C", "nothing", 50, "[]");

    let found = EventQueryBuilder::new().keyword("ai").build().fetch_full(&c).unwrap();
    assert_eq!(ids(&found), ["b", "a"]);
  }

  #[test]
  fn like_wildcards_in_keyword_are_literal() {
    let c = conn();
    insert(&c, "a", "2024-01-01", "100% real", "", 50, "[]");
    insert(&c, "b", "2024-01-02", "1000 real", "", 50, "[]");

    let found = EventQueryBuilder::new().keyword("100%").build().fetch_full(&c).unwrap();
    assert_eq!(ids(&found), ["a"]);
    let found = EventQueryBuilder::new().keyword("_").build().fetch_full(&c).unwrap();
    assert!(found.is_empty());
  }

  #[test]
  fn blank_criteria_are_ignored() {
    let c = conn();
    insert(&c, "a", "2024-01-01", "A", "", 50, "[]");

    let blank: Option<&str> = None;
    let found = EventQueryBuilder::new()
      .keyword("   ")
      .category("")
      .event_type(blank)
      .date_range(None, None)
      .heat_range(None, None)
      .build()
      .fetch_full(&c)
      .unwrap();
    assert_eq!(ids(&found), ["a"]);
  }

  #[test]
  fn date_and_heat_bounds_are_inclusive() {
    let c = conn();
    insert(&c, "start", "2021-02-01", "s", "", 80, "[]");
    insert(&c, "end", "2021-02-28", "e", "", 95, "[]");
    insert(&c, "cold", "2021-02-15", "c", "", 79, "[]");
    insert(&c, "march", "2021-03-01", "m", "", 99, "[]");

    let found = EventQueryBuilder::new()
      .date_range(d("2021-02-01"), d("2021-02-28"))
      .heat_range(Some(80), None)
      .build()
      .fetch_full(&c)
      .unwrap();
    assert_eq!(ids(&found), ["end", "start"]);
  }

  #[test]
  fn category_is_exact_element_containment() {
    let c = conn();
    insert(&c, "a", "2024-01-01", "A", "", 50, r#"["anime","music"]"#);
    insert(&c, "b", "2024-01-02", "B", "", 50, r#"["animation"]"#);

    let found = EventQueryBuilder::new().category("anime").build().fetch_full(&c).unwrap();
    assert_eq!(ids(&found), ["a"]);
  }

  #[test]
  fn keyword_list_matching_is_opt_in() {
    let c = conn();
    insert(&c, "a", "2024-01-01", "A", "", 50, "[]");

    let plain = EventQueryBuilder::new().keyword("HACHIMI").build().fetch_full(&c).unwrap();
    assert!(plain.is_empty());
    let tagged = EventQueryBuilder::new()
      .keyword_with_tags("HACHIMI")
      .build()
      .fetch_full(&c)
      .unwrap();
    assert_eq!(ids(&tagged), ["a"]);
  }

  #[test]
  fn ordering_and_tie_breaks() {
    let c = conn();
    insert(&c, "cool", "2024-01-01", "x", "", 40, "[]");
    insert(&c, "hot", "2024-01-01", "x", "", 90, "[]");
    insert(&c, "later", "2024-02-01", "x", "", 90, "[]");

    let by_date = EventQueryBuilder::new().build().fetch_full(&c).unwrap();
    assert_eq!(ids(&by_date), ["later", "hot", "cool"]);

    let by_heat = EventQueryBuilder::new().order_by_heat(true).build().fetch_full(&c).unwrap();
    assert_eq!(ids(&by_heat), ["later", "hot", "cool"]);

    let oldest = EventQueryBuilder::new()
      .order_by_date(false)
      .limit(1)
      .build()
      .fetch_full(&c)
      .unwrap();
    assert_eq!(ids(&oldest), ["hot"]);
  }

  #[test]
  fn default_limit_caps_results() {
    let c = conn();
    for i in 0..(DEFAULT_LIMIT + 5) {
      insert(&c, &format!("e{i}"), "2024-01-01", "x", "", 50, "[]");
    }
    let capped = EventQueryBuilder::new().build().fetch_full(&c).unwrap();
    assert_eq!(capped.len(), DEFAULT_LIMIT);
    let all = EventQueryBuilder::new().unbounded().build().fetch_full(&c).unwrap();
    assert_eq!(all.len(), DEFAULT_LIMIT + 5);
  }

  #[test]
  fn safe_shape_keeps_category_and_type_filters() {
    let c = conn();
    insert(&c, "a", "2024-01-01", "A", "", 50, r#"["anime"]"#);
    insert(&c, "b", "2024-01-02", "B", "", 50, r#"["animation"]"#);
    c.execute("UPDATE internet_events SET categories = NULL WHERE id = 'b'", [])
      .unwrap();

    let found = EventQueryBuilder::new().category("anime").build().fetch_safe(&c).unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id(), "a");
    assert!(found[0].is_degraded());

    let memes = EventQueryBuilder::new().event_type("meme").build().fetch_safe(&c).unwrap();
    assert_eq!(memes.len(), 2);
    let news = EventQueryBuilder::new().event_type("news").build().fetch_safe(&c).unwrap();
    assert!(news.is_empty());
  }

  #[test]
  fn safe_shape_limits_after_filtering() {
    let c = conn();
    c.execute_batch(
      r#"INSERT INTO internet_events (id, date, title, description, heat_score, categories, keywords)
         VALUES ('newer', '2024-01-02', 'N', '', 50, '[]', '["aiyo"]'),
                ('older', '2024-01-01', 'O', '', 50, '[]', '["ai"]');"#,
    )
    .unwrap();

    let found = EventQueryBuilder::new()
      .keyword_with_tags("ai")
      .limit(1)
      .build()
      .fetch_safe(&c)
      .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id(), "older");
  }

  #[test]
  fn safe_shape_reads_ascii_escaped_lists() {
    let c = conn();
    insert(&c, "a", "2024-01-01", "A", "", 50, r#"["\u52a8\u6f2b"]"#);
    insert(&c, "b", "2024-01-02", "B", "", 50, r#"["\u97f3\u4e50"]"#);

    let found = EventQueryBuilder::new().category("动漫").build().fetch_safe(&c).unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id(), "a");
    assert_eq!(found[0].categories(), ["动漫"]);
  }

  #[test]
  fn safe_shape_bounds_use_decoded_values() {
    let c = conn();
    insert(&c, "dated", "2021-02-28 09:00:00", "d", "", 50, "[]");
    insert(&c, "unscored", "2021-02-10", "u", "", 0, "[]");
    c.execute("UPDATE internet_events SET heat_score = NULL WHERE id = 'unscored'", [])
      .unwrap();

    let found = EventQueryBuilder::new()
      .date_range(d("2021-02-01"), d("2021-02-28"))
      .heat_range(Some(50), Some(50))
      .build()
      .fetch_safe(&c)
      .unwrap();
    let ids: Vec<&str> = found.iter().map(EventRecord::id).collect();
    assert_eq!(ids, ["dated", "unscored"]);
  }

  #[test]
  fn advanced_search_uses_filter_as_given() {
    let c = conn();
    insert(&c, "a", "2024-01-01", "A", "", 50, "[]");
    insert(&c, "b", "2024-01-02", "B", "", 70, "[]");

    let filter = EventFilter { min_heat: Some(60), ..Default::default() };
    assert_eq!(ids(&advanced_search(&c, &filter).unwrap()), ["b"]);
  }

  #[test]
  fn escaping() {
    assert_eq!(like_escape(r"50%_\"), r"50\%\_\\");
  }
}
