use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, TrackerError>;

#[derive(Debug, Error)]
pub enum TrackerError {
  #[error("Stored set data is corrupt: {details}")]
  PersistedDataCorrupt { details: String },

  #[error("Invalid import format: {details}")]
  InvalidImportFormat { details: String },

  #[error("Failed to copy to clipboard: {details}")]
  ClipboardWriteFailed { details: String },

  #[error("Catalog fetch failed: {details}")]
  CatalogFetchFailed { details: String },

  #[error("No set is selected.")]
  NoCurrentSet,

  #[error("Set not found: {name}")]
  UnknownSet { name: String },

  #[error("Storage failure in {context}: {details}")]
  Storage {
    context: &'static str,
    details: String,
  },

  #[error("Invalid configuration: {details}")]
  Config { details: String },

  #[error("IO failure at {path}: {source}")]
  Io {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
}

impl TrackerError {
  pub const fn code(&self) -> &'static str {
    match self {
      Self::PersistedDataCorrupt { .. } => "persisted_data_corrupt",
      Self::InvalidImportFormat { .. } => "invalid_import_format",
      Self::ClipboardWriteFailed { .. } => "clipboard_write_failed",
      Self::CatalogFetchFailed { .. } => "catalog_fetch_failed",
      Self::NoCurrentSet => "no_current_set",
      Self::UnknownSet { .. } => "unknown_set",
      Self::Storage { .. } => "storage",
      Self::Config { .. } => "config",
      Self::Io { .. } => "io",
    }
  }

  pub(crate) fn storage(context: &'static str, error: rusqlite::Error) -> Self {
    Self::Storage {
      context,
      details: error.to_string(),
    }
  }

  pub(crate) fn fetch(details: impl Into<String>) -> Self {
    Self::CatalogFetchFailed {
      details: details.into(),
    }
  }
}

impl From<reqwest::Error> for TrackerError {
  fn from(error: reqwest::Error) -> Self {
    Self::fetch(error.to_string())
  }
}

impl From<toml::de::Error> for TrackerError {
  fn from(error: toml::de::Error) -> Self {
    Self::Config {
      details: error.to_string(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn codes_are_stable() {
    assert_eq!(TrackerError::NoCurrentSet.code(), "no_current_set");
    let err = TrackerError::InvalidImportFormat {
      details: "expected array".to_string(),
    };
    assert_eq!(err.code(), "invalid_import_format");
    assert_eq!(err.to_string(), "Invalid import format: expected array");
  }
}
