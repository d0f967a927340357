use serde_json::Value;

use crate::error::{Result, TrackerError};
use crate::registry::SetRegistry;

/// Pretty-printed JSON array of the set's membership.
pub fn export_membership(registry: &SetRegistry, current_set: Option<&str>) -> Result<String> {
  let name = current_set.ok_or(TrackerError::NoCurrentSet)?;
  let membership = registry
    .membership(name)
    .ok_or_else(|| TrackerError::UnknownSet {
      name: name.to_string(),
    })?;
  serde_json::to_string_pretty(membership).map_err(|e| TrackerError::Storage {
    context: "serialize export",
    details: e.to_string(),
  })
}

/// Parses pasted export text. Only a top-level array is accepted; its
/// elements are kept verbatim and not checked against the catalog.
pub fn parse_membership(text: &str) -> Result<Vec<Value>> {
  let parsed: Value =
    serde_json::from_str(text).map_err(|e| TrackerError::InvalidImportFormat {
      details: e.to_string(),
    })?;

  let Value::Array(elements) = parsed else {
    return Err(TrackerError::InvalidImportFormat {
      details: "expected a JSON array of champion ids".to_string(),
    });
  };

  Ok(elements)
}
