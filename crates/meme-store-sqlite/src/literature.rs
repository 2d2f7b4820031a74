//! One UTF-8 text file per event under a configured root directory.
//!
//! Files are named `<event id><extension>` and always read and written
//! whole. Nothing here locks against concurrent writers.
//!
//! Relative paths handed to the store must stay under the root: absolute
//! paths, `..`, `.` and drive prefixes are rejected with
//! [`Error::InvalidLiteraturePath`].

use std::{
  fs, io,
  path::{Component, Path, PathBuf},
};

use crate::{Error, Result};

pub const DEFAULT_EXTENSION: &str = ".txt";

#[derive(Debug, Clone)]
pub struct LiteratureStore {
  root:      PathBuf,
  extension: String,
}

impl LiteratureStore {
  pub fn new(root: impl Into<PathBuf>, extension: &str) -> Self {
    let extension = match extension {
      "" => String::new(),
      e if e.starts_with('.') => e.to_owned(),
      e => format!(".{e}"),
    };
    Self { root: root.into(), extension }
  }

  pub fn root(&self) -> &Path { &self.root }

  /// Filename, relative to the root, used for `event_id`.
  pub fn file_name(&self, event_id: &str) -> String { format!("{event_id}{}", self.extension) }

  /// Absolute location of `rel`, which must name a path below the root.
  pub fn path_for(&self, rel: &str) -> Result<PathBuf> {
    let path = Path::new(rel);
    let mut components = path.components().peekable();
    if components.peek().is_none()
      || !components.all(|c| matches!(c, Component::Normal(_)))
    {
      return Err(Error::InvalidLiteraturePath(rel.to_owned()));
    }
    Ok(self.root.join(path))
  }

  /// Whether `rel` is a valid path naming an existing file.
  pub fn exists(&self, rel: &str) -> bool {
    self.path_for(rel).is_ok_and(|path| path.is_file())
  }

  /// The file's text, or `None` if it is missing, unreadable or outside the
  /// root.
  pub fn read(&self, rel: &str) -> Option<String> {
    let path = match self.path_for(rel) {
      Ok(path) => path,
      Err(e) => {
        tracing::warn!(error = %e, "refusing to read literature");
        return None;
      }
    };
    match fs::read_to_string(&path) {
      Ok(text) => Some(text),
      Err(e) if e.kind() == io::ErrorKind::NotFound => {
        tracing::debug!(path = %path.display(), "literature file missing");
        None
      }
      Err(e) => {
        tracing::warn!(path = %path.display(), error = %e, "failed to read literature");
        None
      }
    }
  }

  /// Write `content` for `event_id`, creating the root if needed. Returns the
  /// filename relative to the root.
  pub fn write(&self, event_id: &str, content: &str) -> Result<String> {
    let rel = self.file_name(event_id);
    let path = self.path_for(&rel)?;
    if path.parent() != Some(self.root.as_path()) {
      return Err(Error::InvalidLiteraturePath(rel));
    }
    fs::create_dir_all(&self.root)?;
    fs::write(path, content)?;
    tracing::debug!(file = %rel, bytes = content.len(), "wrote literature");
    Ok(rel)
  }

  /// Delete the file if present. Returns whether a file was removed.
  pub fn remove(&self, rel: &str) -> Result<bool> {
    match fs::remove_file(self.path_for(rel)?) {
      Ok(()) => Ok(true),
      Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
      Err(e) => Err(e.into()),
    }
  }
}
