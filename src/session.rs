use serde::Serialize;
use serde_json::Value;

use crate::catalog::{Catalog, CatalogItem, CatalogSource};
use crate::error::{Result, TrackerError};
use crate::palette::{palette_entries, PaletteEntry};
use crate::query::{filter, CompletionFilter};
use crate::registry::{CompletionStats, SetRegistry};
use crate::store::{load_registry, save_registry, KeyValueStore};
use crate::transfer::{export_membership, parse_membership};

pub const IMPORT_PROMPT: &str = "Paste set JSON data:";

pub trait Clipboard {
  fn write_text(&self, text: &str) -> std::result::Result<(), String>;
}

/// Modal user input. `None` means the prompt was dismissed.
pub trait Prompter {
  fn prompt(&self, message: &str) -> Option<String>;
  fn confirm(&self, message: &str) -> bool;
}

#[derive(Serialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SelectionState {
  pub current_set: Option<String>,
  pub search_text: String,
  pub completion_filter: CompletionFilter,
  pub palette_open: bool,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SetSummary {
  pub name: String,
  pub completed_count: usize,
  pub total: usize,
  pub completion_rate: f64,
}

pub struct TrackerSession {
  store: Box<dyn KeyValueStore>,
  storage_key: String,
  clipboard: Box<dyn Clipboard>,
  prompter: Box<dyn Prompter>,
  registry: SetRegistry,
  catalog: Catalog,
  selection: SelectionState,
}

impl TrackerSession {
  /// Hydrates the registry from `store`. Corrupt stored data starts the
  /// session with no sets; the stored value is left untouched until the next
  /// mutation overwrites it.
  pub fn open(
    store: Box<dyn KeyValueStore>,
    storage_key: impl Into<String>,
    clipboard: Box<dyn Clipboard>,
    prompter: Box<dyn Prompter>,
  ) -> Result<Self> {
    let storage_key = storage_key.into();
    let registry = match load_registry(store.as_ref(), &storage_key) {
      Ok(registry) => registry,
      Err(error @ TrackerError::PersistedDataCorrupt { .. }) => {
        log::warn!("{}; starting with no sets", error);
        SetRegistry::default()
      }
      Err(error) => return Err(error),
    };

    Ok(Self {
      store,
      storage_key,
      clipboard,
      prompter,
      registry,
      catalog: Catalog::default(),
      selection: SelectionState::default(),
    })
  }

  fn flush(&self) -> Result<()> {
    save_registry(self.store.as_ref(), &self.storage_key, &self.registry)
  }

  pub fn registry(&self) -> &SetRegistry {
    &self.registry
  }

  pub fn catalog(&self) -> &Catalog {
    &self.catalog
  }

  pub fn selection(&self) -> &SelectionState {
    &self.selection
  }

  pub fn current_set(&self) -> Option<&str> {
    self.selection.current_set.as_deref()
  }

  /// Fetches the catalog once. On failure the previous catalog (empty at
  /// startup) is kept and the error is returned for the caller to surface.
  pub fn load_catalog(&mut self, source: &dyn CatalogSource) -> Result<&Catalog> {
    match source.fetch_latest() {
      Ok(catalog) => {
        self.catalog = catalog;
        Ok(&self.catalog)
      }
      Err(error) => {
        log::warn!("{}; keeping {} cached champion(s)", error, self.catalog.len());
        Err(error)
      }
    }
  }

  pub fn set_catalog(&mut self, catalog: Catalog) {
    self.catalog = catalog;
  }

  pub fn create_set(&mut self, name: &str) -> Result<Option<String>> {
    let Some(created) = self.registry.create(name) else {
      return Ok(None);
    };
    self.selection.current_set = Some(created.clone());
    self.flush()?;
    log::info!("created set '{}'", created);
    Ok(Some(created))
  }

  /// Returns `false` when the user declines the confirmation.
  pub fn delete_set(&mut self, name: &str) -> Result<bool> {
    if !self.registry.contains(name) {
      return Err(TrackerError::UnknownSet {
        name: name.to_string(),
      });
    }
    if !self.prompter.confirm(&format!("Delete set \"{}\"?", name)) {
      return Ok(false);
    }

    self.registry.delete(name);
    if self.current_set() == Some(name) {
      self.selection.current_set = None;
    }
    self.flush()?;
    log::info!("deleted set '{}'", name);
    Ok(true)
  }

  pub fn select_set(&mut self, name: &str) -> Result<()> {
    if !self.registry.contains(name) {
      return Err(TrackerError::UnknownSet {
        name: name.to_string(),
      });
    }
    self.selection.current_set = Some(name.to_string());
    Ok(())
  }

  pub fn clear_selection(&mut self) {
    self.selection.current_set = None;
  }

  /// Flips `item_id` in the current set. `None` when no set is selected.
  pub fn toggle(&mut self, item_id: &str) -> Result<Option<bool>> {
    let Some(current) = self.selection.current_set.clone() else {
      return Ok(None);
    };
    let Some(completed) = self.registry.toggle(&current, item_id) else {
      return Ok(None);
    };
    self.flush()?;
    Ok(Some(completed))
  }

  pub fn replace_membership(&mut self, name: &str, membership: Vec<Value>) -> Result<()> {
    self.registry.replace(name, membership);
    self.flush()
  }

  pub fn set_search(&mut self, text: impl Into<String>) {
    self.selection.search_text = text.into();
  }

  pub fn set_filter(&mut self, completion_filter: CompletionFilter) {
    self.selection.completion_filter = completion_filter;
  }

  pub fn visible_items(&self) -> Vec<&CatalogItem> {
    filter(
      &self.catalog,
      &self.registry,
      self.current_set(),
      &self.selection.search_text,
      self.selection.completion_filter,
    )
  }

  pub fn is_complete(&self, item_id: &str) -> bool {
    self
      .current_set()
      .is_some_and(|name| self.registry.is_complete(name, item_id))
  }

  pub fn completion_stats(&self, name: &str) -> CompletionStats {
    self.registry.completion_stats(name, self.catalog.len())
  }

  pub fn set_summaries(&self) -> Vec<SetSummary> {
    self
      .registry
      .set_names()
      .map(|name| {
        let stats = self.completion_stats(name);
        SetSummary {
          name: name.to_string(),
          completed_count: stats.completed_count,
          total: self.catalog.len(),
          completion_rate: stats.completion_rate,
        }
      })
      .collect()
  }

  /// Copies the current set to the clipboard and returns the copied text.
  pub fn export_current(&self) -> Result<String> {
    let text = export_membership(&self.registry, self.current_set())?;
    self
      .clipboard
      .write_text(&text)
      .map_err(|details| TrackerError::ClipboardWriteFailed { details })?;
    Ok(text)
  }

  /// Prompts for pasted export text and replaces the current set with it.
  /// Returns `None` when the prompt is dismissed or left blank.
  pub fn import_current(&mut self) -> Result<Option<usize>> {
    if self.current_set().is_none() {
      return Err(TrackerError::NoCurrentSet);
    }
    let Some(text) = self.prompter.prompt(IMPORT_PROMPT) else {
      return Ok(None);
    };
    if text.trim().is_empty() {
      return Ok(None);
    }
    self.import_text(&text).map(Some)
  }

  pub fn import_text(&mut self, text: &str) -> Result<usize> {
    let current = self
      .selection
      .current_set
      .clone()
      .ok_or(TrackerError::NoCurrentSet)?;
    let membership = parse_membership(text)?;
    let count = membership.len();
    self.replace_membership(&current, membership)?;
    log::info!("imported {} id(s) into '{}'", count, current);
    Ok(count)
  }

  pub fn toggle_palette(&mut self) -> bool {
    self.selection.palette_open = !self.selection.palette_open;
    self.selection.palette_open
  }

  pub fn palette_entries(&self, query: &str) -> Vec<PaletteEntry> {
    palette_entries(&self.registry, &self.catalog, self.current_set(), query)
  }

  /// Champion entries become the search text; set entries become current.
  pub fn select_palette_entry(&mut self, entry: &PaletteEntry) -> Result<()> {
    match entry {
      PaletteEntry::Set { name, .. } => self.select_set(name)?,
      PaletteEntry::Champion { name, .. } => self.set_search(name.clone()),
    }
    self.selection.palette_open = false;
    Ok(())
  }
}
