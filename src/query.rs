use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::catalog::{Catalog, CatalogItem};
use crate::registry::SetRegistry;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CompletionFilter {
  #[default]
  All,
  Incomplete,
  Complete,
}

impl CompletionFilter {
  pub const fn as_str(self) -> &'static str {
    match self {
      Self::All => "all",
      Self::Incomplete => "incomplete",
      Self::Complete => "complete",
    }
  }
}

impl fmt::Display for CompletionFilter {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for CompletionFilter {
  type Err = String;

  fn from_str(value: &str) -> Result<Self, Self::Err> {
    match value.trim().to_lowercase().as_str() {
      "all" => Ok(Self::All),
      "incomplete" => Ok(Self::Incomplete),
      "complete" => Ok(Self::Complete),
      other => Err(format!(
        "Unknown filter '{}'. Expected all, incomplete or complete.",
        other
      )),
    }
  }
}

pub fn matches_search(name: &str, search_text: &str) -> bool {
  search_text.is_empty() || name.to_lowercase().contains(&search_text.to_lowercase())
}

/// Items visible for the given selection, in catalog order.
pub fn filter<'a>(
  catalog: &'a Catalog,
  registry: &SetRegistry,
  current_set: Option<&str>,
  search_text: &str,
  completion_filter: CompletionFilter,
) -> Vec<&'a CatalogItem> {
  catalog
    .items()
    .filter(|item| {
      if !matches_search(&item.name, search_text) {
        return false;
      }
      let is_completed = current_set.is_some_and(|name| registry.is_complete(name, &item.id));
      match completion_filter {
        CompletionFilter::All => true,
        CompletionFilter::Incomplete => !is_completed,
        CompletionFilter::Complete => is_completed,
      }
    })
    .collect()
}
