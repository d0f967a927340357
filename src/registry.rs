use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Named sets of completed catalog ids, in creation order.
///
/// Membership keeps insertion order. Elements are raw JSON values so that an
/// imported array is stored exactly as pasted; only string elements count as
/// catalog ids. Duplicates are never introduced by [`SetRegistry::toggle`],
/// but [`SetRegistry::replace`] stores whatever it is given.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(transparent)]
pub struct SetRegistry {
  sets: IndexMap<String, Vec<Value>>,
}

#[derive(Serialize, Clone, Copy, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CompletionStats {
  pub completed_count: usize,
  pub completion_rate: f64,
}

impl SetRegistry {
  pub fn len(&self) -> usize {
    self.sets.len()
  }

  pub fn is_empty(&self) -> bool {
    self.sets.is_empty()
  }

  pub fn contains(&self, name: &str) -> bool {
    self.sets.contains_key(name)
  }

  pub fn set_names(&self) -> impl Iterator<Item = &str> {
    self.sets.keys().map(String::as_str)
  }

  pub fn membership(&self, name: &str) -> Option<&[Value]> {
    self.sets.get(name).map(Vec::as_slice)
  }

  pub fn is_complete(&self, name: &str, item_id: &str) -> bool {
    self
      .sets
      .get(name)
      .is_some_and(|ids| ids.iter().any(|id| is_id(id, item_id)))
  }

  /// Inserts an empty set under the trimmed `name` and returns the stored
  /// name. An existing set with the same name is emptied. Returns `None`
  /// when the trimmed name is empty.
  pub fn create(&mut self, name: &str) -> Option<String> {
    let normalized = name.trim();
    if normalized.is_empty() {
      return None;
    }
    self.sets.insert(normalized.to_string(), Vec::new());
    Some(normalized.to_string())
  }

  pub fn delete(&mut self, name: &str) -> bool {
    self.sets.shift_remove(name).is_some()
  }

  /// Removes `item_id` when present, appends it otherwise. Returns the new
  /// completion state, or `None` when the set does not exist.
  pub fn toggle(&mut self, name: &str, item_id: &str) -> Option<bool> {
    let ids = self.sets.get_mut(name)?;
    if ids.iter().any(|id| is_id(id, item_id)) {
      ids.retain(|id| !is_id(id, item_id));
      Some(false)
    } else {
      ids.push(Value::String(item_id.to_string()));
      Some(true)
    }
  }

  /// Overwrites the membership of `name`, creating the set when missing.
  pub fn replace(&mut self, name: &str, membership: Vec<Value>) {
    self.sets.insert(name.to_string(), membership);
  }

  pub fn completion_stats(&self, name: &str, catalog_size: usize) -> CompletionStats {
    let completed_count = self.sets.get(name).map_or(0, Vec::len);
    let completion_rate = if catalog_size == 0 {
      0.0
    } else {
      completed_count as f64 / catalog_size as f64 * 100.0
    };
    CompletionStats {
      completed_count,
      completion_rate,
    }
  }
}

fn is_id(element: &Value, item_id: &str) -> bool {
  matches!(element, Value::String(id) if id == item_id)
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  fn ids(values: &[&str]) -> Vec<Value> {
    values.iter().map(|v| json!(v)).collect()
  }

  #[test]
  fn create_trims_and_rejects_blank_names() {
    let mut registry = SetRegistry::default();
    assert_eq!(registry.create("   "), None);
    assert_eq!(registry.create("  Aram "), Some("Aram".to_string()));
    assert!(registry.contains("Aram"));
    assert!(!registry.contains("  Aram "));
    assert_eq!(registry.len(), 1);
  }

  #[test]
  fn create_over_existing_name_empties_membership() {
    let mut registry = SetRegistry::default();
    registry.create("Aram");
    registry.toggle("Aram", "Ahri");
    registry.create("Aram");
    assert_eq!(registry.membership("Aram"), Some(&[][..]));
    assert_eq!(registry.len(), 1);
  }

  #[test]
  fn names_are_case_sensitive() {
    let mut registry = SetRegistry::default();
    registry.create("aram");
    registry.create("Aram");
    assert_eq!(registry.set_names().collect::<Vec<_>>(), vec!["aram", "Aram"]);
  }

  #[test]
  fn toggle_twice_restores_membership_but_moves_readded_ids_to_the_end() {
    let mut registry = SetRegistry::default();
    registry.create("S");
    registry.replace("S", ids(&["a", "b", "c"]));

    assert_eq!(registry.toggle("S", "d"), Some(true));
    assert_eq!(registry.toggle("S", "d"), Some(false));
    assert_eq!(registry.membership("S").unwrap(), ids(&["a", "b", "c"]).as_slice());

    assert_eq!(registry.toggle("S", "a"), Some(false));
    assert_eq!(registry.toggle("S", "a"), Some(true));
    assert_eq!(registry.membership("S").unwrap(), ids(&["b", "c", "a"]).as_slice());
  }

  #[test]
  fn toggle_on_missing_set_is_a_noop() {
    let mut registry = SetRegistry::default();
    assert_eq!(registry.toggle("missing", "a"), None);
    assert!(registry.is_empty());
  }

  #[test]
  fn toggle_removes_every_copy_of_a_duplicated_id() {
    let mut registry = SetRegistry::default();
    registry.replace("S", ids(&["a", "b", "a"]));
    assert_eq!(registry.toggle("S", "a"), Some(false));
    assert_eq!(registry.membership("S").unwrap(), ids(&["b"]).as_slice());
  }

  #[test]
  fn delete_keeps_order_of_remaining_sets() {
    let mut registry = SetRegistry::default();
    registry.create("A");
    registry.create("B");
    registry.create("C");
    assert!(registry.delete("B"));
    assert!(!registry.delete("B"));
    assert_eq!(registry.set_names().collect::<Vec<_>>(), vec!["A", "C"]);
  }

  #[test]
  fn completion_stats_bounds() {
    let mut registry = SetRegistry::default();
    registry.replace("S", ids(&["a", "b"]));
    assert_eq!(
      registry.completion_stats("S", 0),
      CompletionStats {
        completed_count: 2,
        completion_rate: 0.0
      }
    );
    assert_eq!(registry.completion_stats("S", 4).completion_rate, 50.0);
    assert_eq!(registry.completion_stats("S", 2).completion_rate, 100.0);
    assert_eq!(registry.completion_stats("missing", 10).completed_count, 0);
  }

  #[test]
  fn completion_rate_is_not_capped_when_membership_outgrows_catalog() {
    let mut registry = SetRegistry::default();
    registry.replace("S", ids(&["a", "b"]));
    assert_eq!(registry.completion_stats("S", 1).completion_rate, 200.0);

    registry.replace("S", ids(&["a", "b", "x"]));
    assert_eq!(
      registry.completion_stats("S", 2),
      CompletionStats {
        completed_count: 3,
        completion_rate: 150.0
      }
    );
  }

  #[test]
  fn only_string_elements_match_ids() {
    let mut registry = SetRegistry::default();
    registry.replace("S", vec![json!(7), Value::Null, json!("Ahri")]);
    assert!(registry.is_complete("S", "Ahri"));
    assert!(!registry.is_complete("S", "null"));
    assert!(!registry.is_complete("S", "7"));

    assert_eq!(registry.toggle("S", "null"), Some(true));
    assert_eq!(
      registry.membership("S").unwrap(),
      &[json!(7), Value::Null, json!("Ahri"), json!("null")][..]
    );
    assert_eq!(registry.toggle("S", "null"), Some(false));
    assert_eq!(
      registry.membership("S").unwrap(),
      &[json!(7), Value::Null, json!("Ahri")][..]
    );
  }
}
