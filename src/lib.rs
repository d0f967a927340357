pub mod catalog;
pub mod cli;
pub mod config;
pub mod error;
pub mod palette;
pub mod query;
pub mod registry;
pub mod session;
pub mod store;
pub mod transfer;

use serde::Serialize;

use crate::catalog::{CatalogItem, CatalogSource, DataDragonClient};
use crate::config::Config;
use crate::query::CompletionFilter;
use crate::session::{Clipboard, Prompter, SetSummary, TrackerSession};
use crate::store::{CatalogFetchRecord, SqliteStore};

pub use crate::cli::run;

#[derive(Clone)]
pub struct AppState {
  pub config: Config,
}

#[derive(Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ChampionDto {
  pub id: String,
  pub name: String,
  pub title: String,
  pub completed: bool,
  pub splash_url: String,
}

#[derive(Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CatalogStatusDto {
  pub loaded_version: Option<String>,
  pub loaded_count: usize,
  pub last_fetch: Option<CatalogFetchRecord>,
}

#[derive(Clone, Default)]
pub struct ListChampionsInput {
  pub set_name: Option<String>,
  pub search: Option<String>,
  pub filter: CompletionFilter,
}

impl AppState {
  pub fn new(config: Config) -> Self {
    Self { config }
  }
}

pub fn open_session(
  state: &AppState,
  clipboard: Box<dyn Clipboard>,
  prompter: Box<dyn Prompter>,
) -> Result<TrackerSession, String> {
  let store = SqliteStore::open(&state.config.db_path()).map_err(|e| e.to_string())?;
  TrackerSession::open(
    Box::new(store),
    state.config.storage.key.clone(),
    clipboard,
    prompter,
  )
  .map_err(|e| e.to_string())
}

/// Loads the catalog into `session` and appends a fetch-history row. A fetch
/// failure leaves the session usable with whatever catalog it already had.
pub fn refresh_catalog(
  state: &AppState,
  session: &mut TrackerSession,
  source: &dyn CatalogSource,
) -> Result<usize, String> {
  let catalog = session.load_catalog(source).map_err(|e| e.to_string())?;
  let count = catalog.len();
  let version = catalog.version.clone();
  let state_hash = catalog.state_hash();

  let history = SqliteStore::open(&state.config.db_path()).map_err(|e| e.to_string())?;
  history
    .record_catalog_fetch(&version, &state.config.catalog.locale, count, &state_hash)
    .map_err(|e| e.to_string())?;
  Ok(count)
}

pub fn default_catalog_source(state: &AppState) -> Result<DataDragonClient, String> {
  DataDragonClient::new(state.config.catalog.clone()).map_err(|e| e.to_string())
}

pub fn get_catalog_status(
  state: &AppState,
  session: &TrackerSession,
) -> Result<CatalogStatusDto, String> {
  let history = SqliteStore::open(&state.config.db_path()).map_err(|e| e.to_string())?;
  let last_fetch = history.latest_catalog_fetch().map_err(|e| e.to_string())?;
  let catalog = session.catalog();
  Ok(CatalogStatusDto {
    loaded_version: (!catalog.version.is_empty()).then(|| catalog.version.clone()),
    loaded_count: catalog.len(),
    last_fetch,
  })
}

pub fn list_sets(session: &TrackerSession) -> Vec<SetSummary> {
  session.set_summaries()
}

pub fn create_set(session: &mut TrackerSession, name: &str) -> Result<String, String> {
  session
    .create_set(name)
    .map_err(|e| e.to_string())?
    .ok_or_else(|| "Set name is required.".to_string())
}

pub fn delete_set(session: &mut TrackerSession, name: &str) -> Result<bool, String> {
  session.delete_set(name).map_err(|e| e.to_string())
}

pub fn toggle_champion(
  session: &mut TrackerSession,
  set_name: &str,
  champion_id: &str,
) -> Result<bool, String> {
  session.select_set(set_name).map_err(|e| e.to_string())?;
  let completed = session.toggle(champion_id).map_err(|e| e.to_string())?;
  completed.ok_or_else(|| format!("Set not found: {}", set_name))
}

pub fn list_champions(
  session: &mut TrackerSession,
  input: ListChampionsInput,
) -> Result<Vec<ChampionDto>, String> {
  match input.set_name.as_deref() {
    Some(name) => session.select_set(name).map_err(|e| e.to_string())?,
    None => session.clear_selection(),
  }
  session.set_search(input.search.unwrap_or_default());
  session.set_filter(input.filter);
  let session: &TrackerSession = session;
  Ok(champion_rows(session, session.visible_items()))
}

pub fn champion_rows(session: &TrackerSession, items: Vec<&CatalogItem>) -> Vec<ChampionDto> {
  items
    .into_iter()
    .map(|item| ChampionDto {
      id: item.id.clone(),
      name: item.name.clone(),
      title: item.title.clone(),
      completed: session.is_complete(&item.id),
      splash_url: catalog::splash_url(&item.id),
    })
    .collect()
}

pub fn export_set(session: &mut TrackerSession, set_name: &str) -> Result<String, String> {
  session.select_set(set_name).map_err(|e| e.to_string())?;
  session.export_current().map_err(|e| e.to_string())
}

/// `None` when the import prompt was dismissed.
pub fn import_set(session: &mut TrackerSession, set_name: &str) -> Result<Option<usize>, String> {
  session.select_set(set_name).map_err(|e| e.to_string())?;
  session.import_current().map_err(|e| e.to_string())
}
