use indexmap::IndexMap;
use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, USER_AGENT};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::time::Duration;

use crate::config::CatalogConfig;
use crate::error::{Result, TrackerError};

const DDRAGON_CDN: &str = "https://ddragon.leagueoflegends.com/cdn";

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct CatalogItem {
  pub id: String,
  pub name: String,
  pub title: String,
}

/// Champions of one catalog version, in the source document's order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Catalog {
  pub version: String,
  items: IndexMap<String, CatalogItem>,
}

#[derive(Deserialize)]
struct ChampionDocument {
  data: IndexMap<String, CatalogItem>,
}

impl Catalog {
  pub fn new(version: impl Into<String>, items: impl IntoIterator<Item = CatalogItem>) -> Self {
    Self {
      version: version.into(),
      items: items
        .into_iter()
        .map(|item| (item.id.clone(), item))
        .collect(),
    }
  }

  pub fn len(&self) -> usize {
    self.items.len()
  }

  pub fn is_empty(&self) -> bool {
    self.items.is_empty()
  }

  pub fn get(&self, id: &str) -> Option<&CatalogItem> {
    self.items.get(id)
  }

  pub fn items(&self) -> impl Iterator<Item = &CatalogItem> {
    self.items.values()
  }

  pub fn state_hash(&self) -> String {
    let mut hasher = Sha256::new();
    hasher.update(self.version.as_bytes());
    hasher.update(b"\n");
    for item in self.items.values() {
      let line = format!("{}|{}|{}\n", item.id, item.name, item.title);
      hasher.update(line.as_bytes());
    }
    format!("{:x}", hasher.finalize())
  }
}

pub fn splash_url(id: &str) -> String {
  format!("{DDRAGON_CDN}/img/champion/splash/{id}_0.jpg")
}

pub fn icon_url(version: &str, id: &str) -> String {
  format!("{DDRAGON_CDN}/{version}/img/champion/{id}.png")
}

/// The first entry of the versions document is the latest release.
pub fn parse_latest_version(body: &str) -> Result<String> {
  let versions: Vec<String> =
    serde_json::from_str(body).map_err(|e| TrackerError::fetch(format!("versions: {e}")))?;
  versions
    .into_iter()
    .next()
    .map(|version| version.trim().to_string())
    .filter(|version| !version.is_empty())
    .ok_or_else(|| TrackerError::fetch("versions list is empty"))
}

pub fn parse_catalog(version: &str, body: &str) -> Result<Catalog> {
  let document: ChampionDocument =
    serde_json::from_str(body).map_err(|e| TrackerError::fetch(format!("champion data: {e}")))?;
  Ok(Catalog {
    version: version.to_string(),
    items: document.data,
  })
}

pub trait CatalogSource {
  fn fetch_latest(&self) -> Result<Catalog>;
}

pub struct DataDragonClient {
  client: Client,
  config: CatalogConfig,
}

impl DataDragonClient {
  pub fn new(config: CatalogConfig) -> Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(config.timeout_secs))
      .build()?;
    Ok(Self { client, config })
  }

  fn get_text(&self, url: &str) -> Result<String> {
    let response = self
      .client
      .get(url)
      .header(USER_AGENT, concat!("champion-tracker/", env!("CARGO_PKG_VERSION")))
      .header(ACCEPT, "application/json")
      .send()?;

    if !response.status().is_success() {
      return Err(TrackerError::fetch(format!(
        "GET {} failed with status {}",
        url,
        response.status()
      )));
    }

    Ok(response.text()?)
  }
}

impl CatalogSource for DataDragonClient {
  fn fetch_latest(&self) -> Result<Catalog> {
    let versions_body = self.get_text(&self.config.versions_url)?;
    let version = parse_latest_version(&versions_body)?;
    let data_body = self.get_text(&self.config.data_url(&version))?;
    let catalog = parse_catalog(&version, &data_body)?;
    log::info!(
      "fetched {} champions for version {} ({})",
      catalog.len(),
      catalog.version,
      self.config.locale
    );
    Ok(catalog)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  const CHAMPION_JSON: &str = r#"{
    "type": "champion",
    "version": "14.1.1",
    "data": {
      "Aatrox": {"version": "14.1.1", "id": "Aatrox", "key": "266", "name": "Aatrox", "title": "the Darkin Blade"},
      "Ahri": {"version": "14.1.1", "id": "Ahri", "key": "103", "name": "Ahri", "title": "the Nine-Tailed Fox"},
      "MonkeyKing": {"version": "14.1.1", "id": "MonkeyKing", "key": "62", "name": "Wukong", "title": "the Monkey King"}
    }
  }"#;

  #[test]
  fn latest_version_is_first_entry() {
    assert_eq!(
      parse_latest_version(r#"["14.2.1", "14.1.1", "lolpatch_3.7"]"#).unwrap(),
      "14.2.1"
    );
  }

  #[test]
  fn empty_or_malformed_versions_fail() {
    assert_eq!(parse_latest_version("[]").unwrap_err().code(), "catalog_fetch_failed");
    assert_eq!(parse_latest_version("{}").unwrap_err().code(), "catalog_fetch_failed");
  }

  #[test]
  fn catalog_keeps_document_order_and_ignores_extra_fields() {
    let catalog = parse_catalog("14.1.1", CHAMPION_JSON).unwrap();
    let names: Vec<&str> = catalog.items().map(|item| item.name.as_str()).collect();
    assert_eq!(names, vec!["Aatrox", "Ahri", "Wukong"]);
    assert_eq!(catalog.get("MonkeyKing").unwrap().title, "the Monkey King");
    assert_eq!(catalog.version, "14.1.1");
  }

  #[test]
  fn catalog_without_data_fails() {
    let err = parse_catalog("14.1.1", r#"{"type": "champion"}"#).unwrap_err();
    assert_eq!(err.code(), "catalog_fetch_failed");
  }

  #[test]
  fn state_hash_tracks_content_and_version() {
    let catalog = parse_catalog("14.1.1", CHAMPION_JSON).unwrap();
    let same = parse_catalog("14.1.1", CHAMPION_JSON).unwrap();
    let bumped = parse_catalog("14.2.1", CHAMPION_JSON).unwrap();
    assert_eq!(catalog.state_hash(), same.state_hash());
    assert_ne!(catalog.state_hash(), bumped.state_hash());
    assert_eq!(catalog.state_hash().len(), 64);
  }

  #[test]
  fn image_urls() {
    assert_eq!(
      splash_url("Ahri"),
      "https://ddragon.leagueoflegends.com/cdn/img/champion/splash/Ahri_0.jpg"
    );
    assert_eq!(
      icon_url("14.1.1", "Ahri"),
      "https://ddragon.leagueoflegends.com/cdn/14.1.1/img/champion/Ahri.png"
    );
  }
}
