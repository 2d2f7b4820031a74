//! Boundary validation for event input.
//!
//! Every check here runs before the store touches the database. Nothing is
//! coerced: a violation is returned as an [`Error`] describing the field.

use chrono::{Local, NaiveDate};

use crate::{
  Error, Result,
  event::{Event, MAX_TITLE_LEN, NewEvent},
};

/// The local calendar date used as the upper bound for event dates.
pub fn today() -> NaiveDate { Local::now().date_naive() }

pub fn validate_title(title: &str) -> Result<()> {
  if title.trim().is_empty() {
    return Err(Error::MissingField("title"));
  }
  let len = title.chars().count();
  if len > MAX_TITLE_LEN {
    return Err(Error::TitleTooLong { len, max: MAX_TITLE_LEN });
  }
  Ok(())
}

/// Reject IDs that could not serve as a plain file name: path separators,
/// control characters, `.` and `..`.
pub fn validate_id(id: &str) -> Result<()> {
  if matches!(id, "." | "..") || id.chars().any(|c| matches!(c, '/' | '\\') || c.is_control()) {
    return Err(Error::InvalidId(id.to_owned()));
  }
  Ok(())
}

pub fn validate_heat_score(score: i32) -> Result<()> {
  if !(0..=100).contains(&score) {
    return Err(Error::HeatScoreOutOfRange(score));
  }
  Ok(())
}

pub fn validate_date(date: NaiveDate, today: NaiveDate) -> Result<()> {
  if date > today {
    return Err(Error::FutureDate { date, today });
  }
  Ok(())
}

/// Validate insert input against `today`.
pub fn validate_new_event(input: &NewEvent, today: NaiveDate) -> Result<()> {
  if let Some(id) = input.id.as_deref().map(str::trim).filter(|id| !id.is_empty()) {
    validate_id(id)?;
  }
  validate_title(&input.title)?;
  validate_date(input.date, today)?;
  if let Some(score) = input.heat_score {
    validate_heat_score(score)?;
  }
  if input.has_literature
    && input.literature_path.is_none()
    && input.literature_content.is_none()
  {
    return Err(Error::LiteratureMissing);
  }
  Ok(())
}

/// Validate a complete event, e.g. after a patch has been merged into it.
pub fn validate_event(event: &Event, today: NaiveDate) -> Result<()> {
  validate_title(&event.title)?;
  validate_date(event.date, today)?;
  validate_heat_score(event.heat_score)?;
  if event.has_literature && event.literature_path.is_none() {
    return Err(Error::LiteratureMissing);
  }
  Ok(())
}
