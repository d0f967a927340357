use serde::Serialize;
use serde_json::Value;

use crate::catalog::{icon_url, Catalog};
use crate::query::matches_search;
use crate::registry::SetRegistry;

#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum PaletteEntry {
  #[serde(rename_all = "camelCase")]
  Set {
    name: String,
    completed_count: usize,
    total: usize,
    current: bool,
  },
  #[serde(rename_all = "camelCase")]
  Champion {
    id: String,
    name: String,
    title: String,
    icon_url: String,
    /// Completed in the current set.
    completed: bool,
  },
}

impl PaletteEntry {
  pub fn label(&self) -> String {
    match self {
      Self::Set {
        name,
        completed_count,
        total,
        current,
      } => {
        let marker = if *current { "* " } else { "" };
        format!("{}{} ({}/{})", marker, name, completed_count, total)
      }
      Self::Champion {
        name,
        title,
        completed,
        ..
      } => {
        let check = if *completed { " ✓" } else { "" };
        format!("{} - {}{}", name, title, check)
      }
    }
  }
}

/// Cmd+K on macOS, Ctrl+K elsewhere.
pub fn is_toggle_shortcut(key: &str, meta: bool, ctrl: bool) -> bool {
  key == "k" && (meta || ctrl)
}

/// Reads a typed chord such as `ctrl+k`, `Cmd+K` or `⌘K` and reports whether
/// it is the palette shortcut.
pub fn is_toggle_chord(input: &str) -> bool {
  let chord = input.trim().to_lowercase();
  let (modifiers, key) = match chord.strip_prefix('⌘') {
    Some(key) => ("cmd", key),
    None => match chord.rsplit_once('+') {
      Some(parts) => parts,
      None => return false,
    },
  };

  let mut meta = false;
  let mut ctrl = false;
  for modifier in modifiers.split('+') {
    match modifier.trim() {
      "cmd" | "meta" | "super" => meta = true,
      "ctrl" | "control" => ctrl = true,
      _ => return false,
    }
  }
  is_toggle_shortcut(key.trim(), meta, ctrl)
}

pub fn shortcut_label(is_mac: bool) -> &'static str {
  if is_mac {
    "⌘K"
  } else {
    "Ctrl+K"
  }
}

/// Sets first, then champions, each narrowed by `query`. Completion flags are
/// relative to `current_set`.
pub fn palette_entries(
  registry: &SetRegistry,
  catalog: &Catalog,
  current_set: Option<&str>,
  query: &str,
) -> Vec<PaletteEntry> {
  let sets = registry
    .set_names()
    .filter(|name| matches_search(name, query))
    .map(|name| PaletteEntry::Set {
      name: name.to_string(),
      completed_count: registry.membership(name).map_or(0, <[Value]>::len),
      total: catalog.len(),
      current: current_set == Some(name),
    });

  let champions = catalog
    .items()
    .filter(|item| matches_search(&item.name, query))
    .map(|item| PaletteEntry::Champion {
      id: item.id.clone(),
      name: item.name.clone(),
      title: item.title.clone(),
      icon_url: icon_url(&catalog.version, &item.id),
      completed: current_set.is_some_and(|name| registry.is_complete(name, &item.id)),
    });

  sets.chain(champions).collect()
}
