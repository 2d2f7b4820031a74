//! SQLite backend for the meme calendar.
//!
//! [`Calendar`] is the data-access façade. It owns a single synchronous
//! [`rusqlite`] connection and implements [`meme_core::store::EventStore`].
//! Reads that fail against the full column set are retried against the
//! baseline columns and come back as degraded records, and
//! [`migration::reconcile`] brings older event tables up to date.

mod calendar;
mod encode;
mod pantheon;

pub mod config;
pub mod error;
pub mod literature;
pub mod migration;
pub mod query;
pub mod schema;

pub use calendar::{Calendar, DEFAULT_TREND_DAYS};
pub use config::{CalendarConfig, StorageTarget};
pub use error::{Error, Result};
pub use literature::LiteratureStore;
pub use migration::ReconcileReport;
pub use query::{BuiltQuery, EventQueryBuilder, advanced_search};
