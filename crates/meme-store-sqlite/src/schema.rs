//! SQL schema for the meme calendar SQLite store.
//!
//! Executed on every connect; idempotent thanks to `CREATE TABLE IF NOT
//! EXISTS`. An existing `internet_events` table is left as it is and brought
//! up to date column by column by [`crate::migration`].
//!
//! List-valued columns hold compact JSON arrays. Dates are `YYYY-MM-DD`,
//! timestamps RFC 3339.

pub const EVENTS_TABLE: &str = "internet_events";
pub const FIGURES_TABLE: &str = "pantheon_figures";
pub const ARTIFACTS_TABLE: &str = "historical_artifacts";
pub const TIMELINES_TABLE: &str = "figure_timelines";
pub const HISTORY_TABLE: &str = "historical_events";

/// Columns every deployed events table has had since the first release.
/// The degraded read path selects only these.
pub const SAFE_EVENT_COLUMNS: [&str; 7] =
  ["id", "date", "title", "description", "heat_score", "categories", "keywords"];

/// Full events column list, in the order row decoders expect.
pub const EVENT_COLUMNS: [&str; 18] = [
  "id",
  "date",
  "title",
  "description",
  "event_type",
  "categories",
  "keywords",
  "heat_level",
  "heat_score",
  "sources",
  "media_urls",
  "created_at",
  "updated_at",
  "has_literature",
  "literature_path",
  "meme_image_url",
  "detailed_overview",
  "figure_id",
];

pub const SCHEMA: &str = "
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS pantheon_figures (
    id               TEXT PRIMARY KEY,
    name             TEXT NOT NULL,
    alias            TEXT,              -- JSON array
    birth_date       TEXT,
    birth_place      TEXT,
    description      TEXT,
    bio              TEXT,
    categories       TEXT,              -- JSON array
    tags             TEXT,              -- JSON array
    influence_score  INTEGER DEFAULT 0,
    popularity_level TEXT,
    avatar_url       TEXT,
    media_urls       TEXT,              -- JSON array
    is_active        INTEGER DEFAULT 1,
    created_at       TEXT,
    updated_at       TEXT
);

CREATE TABLE IF NOT EXISTS internet_events (
    id                TEXT PRIMARY KEY,
    date              TEXT NOT NULL,
    title             TEXT NOT NULL,
    description       TEXT,
    event_type        TEXT DEFAULT 'meme',
    categories        TEXT,             -- JSON array
    keywords          TEXT,             -- JSON array
    heat_level        TEXT,
    heat_score        INTEGER DEFAULT 0,
    sources           TEXT,             -- JSON array
    media_urls        TEXT,             -- JSON array
    created_at        TEXT,
    updated_at        TEXT,
    has_literature    INTEGER DEFAULT 0,
    literature_path   TEXT,             -- relative to the literature root
    meme_image_url    TEXT,
    detailed_overview TEXT,
    figure_id         TEXT REFERENCES pantheon_figures(id)
);

CREATE TABLE IF NOT EXISTS historical_artifacts (
    id                 TEXT PRIMARY KEY,
    figure_id          TEXT NOT NULL REFERENCES pantheon_figures(id),
    name               TEXT NOT NULL,
    artifact_type      TEXT,
    content            TEXT,
    occurrence_date    TEXT,
    date_accuracy      TEXT,            -- 'exact' | 'approximate' | 'unknown'
    source             TEXT,
    is_verified        INTEGER DEFAULT 0,
    significance_level TEXT,
    impact_description TEXT,
    media_urls         TEXT,            -- JSON array
    created_at         TEXT
);

CREATE TABLE IF NOT EXISTS figure_timelines (
    id                TEXT PRIMARY KEY,
    figure_id         TEXT NOT NULL REFERENCES pantheon_figures(id),
    year              INTEGER NOT NULL,
    event_title       TEXT NOT NULL,
    event_description TEXT,
    importance        TEXT,             -- 'major' | 'minor'
    event_type        TEXT,
    source            TEXT,
    created_at        TEXT
);

-- Related ID lists are soft references; nothing checks them.
CREATE TABLE IF NOT EXISTS historical_events (
    id                 TEXT PRIMARY KEY,
    date               TEXT NOT NULL,
    title              TEXT NOT NULL,
    description        TEXT,
    event_type         TEXT,
    categories         TEXT,            -- JSON array
    importance_level   TEXT,
    location           TEXT,
    source             TEXT,
    is_verified        INTEGER DEFAULT 1,
    related_figure_ids TEXT,            -- JSON array
    related_event_ids  TEXT,            -- JSON array
    media_urls         TEXT,            -- JSON array
    created_at         TEXT,
    updated_at         TEXT
);

CREATE INDEX IF NOT EXISTS internet_events_date_idx   ON internet_events(date);
CREATE INDEX IF NOT EXISTS pantheon_figures_name_idx  ON pantheon_figures(name);
CREATE INDEX IF NOT EXISTS historical_events_date_idx ON historical_events(date);
CREATE INDEX IF NOT EXISTS artifacts_figure_idx       ON historical_artifacts(figure_id);
CREATE INDEX IF NOT EXISTS timelines_figure_idx       ON figure_timelines(figure_id);
";

/// `SELECT` list for the full events column set.
pub fn event_select_list() -> String { EVENT_COLUMNS.join(", ") }
