use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Result, TrackerError};

pub const CONFIG_FILE: &str = "config.toml";
pub const DEFAULT_STORAGE_KEY: &str = "champion_sets";
pub const DEFAULT_DB_FILE: &str = "champion-tracker.db";
pub const DEFAULT_VERSIONS_URL: &str = "https://ddragon.leagueoflegends.com/api/versions.json";
pub const DEFAULT_DATA_URL_TEMPLATE: &str =
  "https://ddragon.leagueoflegends.com/cdn/{version}/data/{locale}/champion.json";
pub const DEFAULT_LOCALE: &str = "en_US";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct Config {
  pub catalog: CatalogConfig,
  pub storage: StorageConfig,
  #[serde(skip)]
  pub data_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CatalogConfig {
  pub versions_url: String,
  /// `{version}` and `{locale}` are substituted at fetch time.
  pub data_url_template: String,
  pub locale: String,
  pub timeout_secs: u64,
}

impl Default for CatalogConfig {
  fn default() -> Self {
    Self {
      versions_url: DEFAULT_VERSIONS_URL.to_string(),
      data_url_template: DEFAULT_DATA_URL_TEMPLATE.to_string(),
      locale: DEFAULT_LOCALE.to_string(),
      timeout_secs: DEFAULT_TIMEOUT_SECS,
    }
  }
}

impl CatalogConfig {
  pub fn data_url(&self, version: &str) -> String {
    self
      .data_url_template
      .replace("{version}", version)
      .replace("{locale}", &self.locale)
  }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct StorageConfig {
  pub key: String,
  pub db_file: String,
}

impl Default for StorageConfig {
  fn default() -> Self {
    Self {
      key: DEFAULT_STORAGE_KEY.to_string(),
      db_file: DEFAULT_DB_FILE.to_string(),
    }
  }
}

impl Config {
  pub fn default_data_dir() -> PathBuf {
    let home_dir = env::var_os("HOME").map_or_else(
      || {
        log::warn!("HOME not set, falling back to /tmp for data paths");
        PathBuf::from("/tmp")
      },
      PathBuf::from,
    );
    home_dir.join(".local").join("share").join("champion-tracker")
  }

  /// Reads `config.toml` from `path`, or from the data directory when no path
  /// is given. A missing explicit path is an error; a missing default file
  /// yields the defaults.
  pub fn load(data_dir: Option<&Path>, path: Option<&Path>) -> Result<Self> {
    let data_dir = data_dir.map_or_else(Self::default_data_dir, Path::to_path_buf);
    let path_buf = path.map_or_else(|| data_dir.join(CONFIG_FILE), Path::to_path_buf);

    let mut cfg = if path_buf.exists() {
      let raw = fs::read_to_string(&path_buf).map_err(|source| TrackerError::Io {
        path: path_buf.clone(),
        source,
      })?;
      toml::from_str::<Self>(&raw)?
    } else if path.is_some() {
      return Err(TrackerError::Config {
        details: format!("config file not found: {}", path_buf.display()),
      });
    } else {
      Self::default()
    };

    cfg.data_dir = data_dir;
    cfg.validate()?;
    Ok(cfg)
  }

  pub fn db_path(&self) -> PathBuf {
    self.data_dir.join(&self.storage.db_file)
  }

  pub fn validate(&self) -> Result<()> {
    if self.storage.key.trim().is_empty() {
      return Err(TrackerError::Config {
        details: "storage.key must not be empty".to_string(),
      });
    }
    if self.storage.db_file.trim().is_empty() {
      return Err(TrackerError::Config {
        details: "storage.db_file must not be empty".to_string(),
      });
    }
    if !self.catalog.data_url_template.contains("{version}") {
      return Err(TrackerError::Config {
        details: "catalog.data_url_template must contain {version}".to_string(),
      });
    }
    if self.catalog.locale.trim().is_empty() {
      return Err(TrackerError::Config {
        details: "catalog.locale must not be empty".to_string(),
      });
    }
    Ok(())
  }
}
