use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::rc::Rc;
use uuid::Uuid;

use crate::error::{Result, TrackerError};
use crate::registry::SetRegistry;

const MIGRATION_SQL_0001: &str = include_str!("../migrations/0001_initial.sql");
const MIGRATION_SQL_0002: &str = include_str!("../migrations/0002_catalog_fetch_history.sql");

pub fn now_iso() -> String {
  Utc::now().to_rfc3339()
}

/// Origin-scoped string storage, shaped after the browser's `localStorage`.
pub trait KeyValueStore {
  fn get_item(&self, key: &str) -> Result<Option<String>>;
  fn set_item(&self, key: &str, value: &str) -> Result<()>;
}

/// Reads the registry stored under `key`. An absent key is an empty registry.
pub fn load_registry(store: &dyn KeyValueStore, key: &str) -> Result<SetRegistry> {
  let Some(raw) = store.get_item(key)? else {
    return Ok(SetRegistry::default());
  };
  serde_json::from_str(&raw).map_err(|e| TrackerError::PersistedDataCorrupt {
    details: e.to_string(),
  })
}

pub fn save_registry(store: &dyn KeyValueStore, key: &str, registry: &SetRegistry) -> Result<()> {
  let serialized = serde_json::to_string(registry).map_err(|e| TrackerError::Storage {
    context: "serialize registry",
    details: e.to_string(),
  })?;
  store.set_item(key, &serialized)?;
  log::debug!("flushed {} set(s) under '{}'", registry.len(), key);
  Ok(())
}

#[derive(Clone, Default)]
pub struct MemoryStore {
  items: Rc<RefCell<HashMap<String, String>>>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }
}

impl KeyValueStore for MemoryStore {
  fn get_item(&self, key: &str) -> Result<Option<String>> {
    Ok(self.items.borrow().get(key).cloned())
  }

  fn set_item(&self, key: &str, value: &str) -> Result<()> {
    self
      .items
      .borrow_mut()
      .insert(key.to_string(), value.to_string());
    Ok(())
  }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CatalogFetchRecord {
  pub id: String,
  pub version: String,
  pub locale: String,
  pub item_count: i64,
  pub state_hash: String,
  pub fetched_at: String,
}

pub struct SqliteStore {
  connection: Connection,
}

impl SqliteStore {
  pub fn open(db_path: &Path) -> Result<Self> {
    if let Some(parent) = db_path.parent() {
      fs::create_dir_all(parent).map_err(|source| TrackerError::Io {
        path: parent.to_path_buf(),
        source,
      })?;
    }

    let connection =
      Connection::open(db_path).map_err(|e| TrackerError::storage("open database", e))?;
    Self::migrate(connection)
  }

  pub fn open_in_memory() -> Result<Self> {
    let connection =
      Connection::open_in_memory().map_err(|e| TrackerError::storage("open database", e))?;
    Self::migrate(connection)
  }

  fn migrate(connection: Connection) -> Result<Self> {
    connection
      .execute_batch(MIGRATION_SQL_0001)
      .map_err(|e| TrackerError::storage("migration 0001", e))?;
    connection
      .execute_batch(MIGRATION_SQL_0002)
      .map_err(|e| TrackerError::storage("migration 0002", e))?;
    Ok(Self { connection })
  }

  pub fn record_catalog_fetch(
    &self,
    version: &str,
    locale: &str,
    item_count: usize,
    state_hash: &str,
  ) -> Result<CatalogFetchRecord> {
    let record = CatalogFetchRecord {
      id: Uuid::new_v4().to_string(),
      version: version.to_string(),
      locale: locale.to_string(),
      item_count: item_count as i64,
      state_hash: state_hash.to_string(),
      fetched_at: now_iso(),
    };

    self
      .connection
      .execute(
        "INSERT INTO catalog_fetch_history (id, version, locale, item_count, state_hash, fetched_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
          record.id,
          record.version,
          record.locale,
          record.item_count,
          record.state_hash,
          record.fetched_at
        ],
      )
      .map_err(|e| TrackerError::storage("record catalog fetch", e))?;
    Ok(record)
  }

  pub fn latest_catalog_fetch(&self) -> Result<Option<CatalogFetchRecord>> {
    self
      .connection
      .query_row(
        "SELECT id, version, locale, item_count, state_hash, fetched_at
         FROM catalog_fetch_history
         ORDER BY fetched_at DESC, rowid DESC
         LIMIT 1",
        [],
        |row| {
          Ok(CatalogFetchRecord {
            id: row.get(0)?,
            version: row.get(1)?,
            locale: row.get(2)?,
            item_count: row.get(3)?,
            state_hash: row.get(4)?,
            fetched_at: row.get(5)?,
          })
        },
      )
      .optional()
      .map_err(|e| TrackerError::storage("read catalog fetch history", e))
  }
}

impl KeyValueStore for SqliteStore {
  fn get_item(&self, key: &str) -> Result<Option<String>> {
    self
      .connection
      .query_row(
        "SELECT value FROM kv_store WHERE key = ?1 LIMIT 1",
        params![key],
        |row| row.get(0),
      )
      .optional()
      .map_err(|e| TrackerError::storage("read item", e))
  }

  fn set_item(&self, key: &str, value: &str) -> Result<()> {
    self
      .connection
      .execute(
        "INSERT INTO kv_store (key, value, updated_at)
         VALUES (?1, ?2, ?3)
         ON CONFLICT(key) DO UPDATE SET
           value = excluded.value,
           updated_at = excluded.updated_at",
        params![key, value, now_iso()],
      )
      .map_err(|e| TrackerError::storage("write item", e))?;
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  const KEY: &str = "champion_sets";

  fn sample_registry() -> SetRegistry {
    let mut registry = SetRegistry::default();
    registry.create("Aram");
    registry.toggle("Aram", "Ahri");
    registry.toggle("Aram", "Aatrox");
    registry.create("S+ Rank");
    registry
  }

  #[test]
  fn absent_key_loads_empty_registry() {
    let store = MemoryStore::new();
    assert!(load_registry(&store, KEY).unwrap().is_empty());
  }

  #[test]
  fn corrupt_value_is_reported() {
    let store = MemoryStore::new();
    store.set_item(KEY, "{not json").unwrap();
    let err = load_registry(&store, KEY).unwrap_err();
    assert_eq!(err.code(), "persisted_data_corrupt");
  }

  #[test]
  fn stored_format_is_a_plain_object_of_arrays() {
    let store = MemoryStore::new();
    save_registry(&store, KEY, &sample_registry()).unwrap();
    let raw = store.get_item(KEY).unwrap().unwrap();
    assert_eq!(raw, r#"{"Aram":["Ahri","Aatrox"],"S+ Rank":[]}"#);
  }

  #[test]
  fn sqlite_store_persists_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("nested").join("tracker.db");
    {
      let store = SqliteStore::open(&db_path).unwrap();
      save_registry(&store, KEY, &sample_registry()).unwrap();
    }
    let store = SqliteStore::open(&db_path).unwrap();
    let loaded = load_registry(&store, KEY).unwrap();
    assert_eq!(loaded, sample_registry());
    assert_eq!(
      loaded.set_names().collect::<Vec<_>>(),
      vec!["Aram", "S+ Rank"]
    );
  }

  #[test]
  fn sqlite_set_item_overwrites_single_row() {
    let store = SqliteStore::open_in_memory().unwrap();
    assert_eq!(store.get_item(KEY).unwrap(), None);
    store.set_item(KEY, "{}").unwrap();
    store.set_item(KEY, r#"{"A":[]}"#).unwrap();
    assert_eq!(store.get_item(KEY).unwrap().as_deref(), Some(r#"{"A":[]}"#));
    let rows: i64 = store
      .connection
      .query_row("SELECT COUNT(*) FROM kv_store", [], |row| row.get(0))
      .unwrap();
    assert_eq!(rows, 1);
  }

  #[test]
  fn non_string_elements_are_stored_verbatim() {
    let store = MemoryStore::new();
    store.set_item(KEY, r#"{"S":[7,null,"Ahri"]}"#).unwrap();
    let registry = load_registry(&store, KEY).unwrap();
    assert!(registry.is_complete("S", "Ahri"));
    save_registry(&store, KEY, &registry).unwrap();
    assert_eq!(
      store.get_item(KEY).unwrap().as_deref(),
      Some(r#"{"S":[7,null,"Ahri"]}"#)
    );
  }

  #[test]
  fn catalog_fetch_history_returns_latest_row() {
    let store = SqliteStore::open_in_memory().unwrap();
    assert!(store.latest_catalog_fetch().unwrap().is_none());
    store.record_catalog_fetch("14.1.1", "en_US", 160, "aa").unwrap();
    let second = store.record_catalog_fetch("14.2.1", "en_US", 161, "bb").unwrap();
    let latest = store.latest_catalog_fetch().unwrap().unwrap();
    assert_eq!(latest, second);
    assert_eq!(latest.version, "14.2.1");
  }
}
