//! Core types and trait definitions for the meme calendar.
//!
//! This crate is deliberately free of database dependencies. The SQLite
//! backend and the command-line front end both depend on it.

pub mod analysis;
pub mod error;
pub mod event;
pub mod id;
pub mod pantheon;
pub mod query;
pub mod store;
pub mod validate;

pub use error::{Error, Result};
