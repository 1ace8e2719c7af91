// ── Configuration document ──
//
// The single mutable JSON tree holding the whole topology. Top-level
// keys are collection names; values are ordered record lists or a
// singleton record. The primitives here (`push`, `update_child`,
// `carve`, `move_record`) are what entity definitions build on, and
// every one of them fails loudly when its path does not resolve.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::path::StorePath;
use super::record::{Record, RecordExt, key_of};
use crate::error::CoreError;

/// Key field used when a list is addressed by name.
pub const NAME: &str = "name";

/// The configuration document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document {
    root: Map<String, Value>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a document from JSON text. The root must be an object.
    pub fn from_json_str(text: &str) -> Result<Self, CoreError> {
        let value: Value = serde_json::from_str(text)?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Self, CoreError> {
        match value {
            Value::Object(root) => Ok(Self { root }),
            other => Err(CoreError::InvalidDocument {
                message: format!("expected a JSON object at the root, found {}", kind(&other)),
            }),
        }
    }

    pub fn to_json_pretty(&self) -> Result<String, CoreError> {
        Ok(serde_json::to_string_pretty(&self.root)?)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.root
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.root)
    }

    // ── Collection access ────────────────────────────────────────────

    pub fn get(&self, collection: &str) -> Option<&Value> {
        self.root.get(collection)
    }

    pub fn contains(&self, collection: &str) -> bool {
        self.root.contains_key(collection)
    }

    /// Replace a collection wholesale. An existing key keeps its position.
    pub fn set(&mut self, collection: &str, value: Value) {
        self.root.insert(collection.to_owned(), value);
    }

    /// Temporarily take a collection out for in-place repair. Pair with
    /// [`Document::set`]; the key keeps its slot as `null` meanwhile.
    pub(crate) fn take(&mut self, collection: &str) -> Option<Value> {
        self.root.get_mut(collection).map(Value::take)
    }

    /// Records of a top-level list collection; empty when absent.
    pub fn records(&self, collection: &str) -> &[Value] {
        self.root
            .get(collection)
            .and_then(Value::as_array)
            .map_or(&[], Vec::as_slice)
    }

    /// Records of a top-level list collection, as objects.
    pub fn record_maps(&self, collection: &str) -> impl Iterator<Item = &Record> {
        self.records(collection).iter().filter_map(Value::as_object)
    }

    pub fn singleton(&self, collection: &str) -> Option<&Record> {
        self.root.get(collection).and_then(Value::as_object)
    }

    pub fn singleton_mut(&mut self, collection: &str) -> Option<&mut Record> {
        self.root.get_mut(collection).and_then(Value::as_object_mut)
    }

    /// Names in a top-level collection, in document order.
    pub fn names(&self, collection: &str) -> Vec<&str> {
        self.record_maps(collection)
            .filter_map(RecordExt::name)
            .collect()
    }

    /// Find a top-level record by name.
    pub fn find(&self, collection: &str, name: &str) -> Option<&Record> {
        self.record_maps(collection)
            .find(|r| r.name() == Some(name))
    }

    pub fn collection_names(&self) -> impl Iterator<Item = &str> {
        self.root.keys().map(String::as_str)
    }

    // ── Path resolution ──────────────────────────────────────────────

    /// Resolve a path to its record list.
    pub fn list(&self, path: &StorePath) -> Result<&Vec<Value>, CoreError> {
        let mut current = self
            .root
            .get(path.root())
            .ok_or_else(|| CoreError::path_not_found(path, path.root()))?;

        for (record, field) in path.steps() {
            let items = current
                .as_array()
                .ok_or_else(|| CoreError::NotAList {
                    path: path.to_string(),
                })?;
            let parent = items
                .iter()
                .find(|item| key_of(item, NAME) == Some(record.as_str()))
                .ok_or_else(|| CoreError::path_not_found(path, record))?;
            current = parent
                .get(field)
                .ok_or_else(|| CoreError::path_not_found(path, field))?;
        }

        current.as_array().ok_or_else(|| CoreError::NotAList {
            path: path.to_string(),
        })
    }

    /// Resolve a path to its record list, mutably.
    pub fn list_mut(&mut self, path: &StorePath) -> Result<&mut Vec<Value>, CoreError> {
        let mut current = self
            .root
            .get_mut(path.root())
            .ok_or_else(|| CoreError::path_not_found(path, path.root()))?;

        for (record, field) in path.steps() {
            let items = current
                .as_array_mut()
                .ok_or_else(|| CoreError::NotAList {
                    path: path.to_string(),
                })?;
            let parent = items
                .iter_mut()
                .find(|item| key_of(item, NAME) == Some(record.as_str()))
                .ok_or_else(|| CoreError::path_not_found(path, record))?;
            current = parent
                .get_mut(field)
                .ok_or_else(|| CoreError::path_not_found(path, field))?;
        }

        current.as_array_mut().ok_or_else(|| CoreError::NotAList {
            path: path.to_string(),
        })
    }

    /// Every list with the same shape as `path` (`vpcs/*/subnets`), one per
    /// owning record, in document order. Used for globally unique names.
    pub fn lists_like(&self, path: &StorePath) -> Vec<&Vec<Value>> {
        let mut current: Vec<&Value> = self.root.get(path.root()).into_iter().collect();
        for (_, field) in path.steps() {
            current = current
                .into_iter()
                .filter_map(Value::as_array)
                .flatten()
                .filter_map(|item| item.get(field.as_str()))
                .collect();
        }
        current.into_iter().filter_map(Value::as_array).collect()
    }

    /// The record that owns the list at `path` (`None` for top-level paths).
    pub fn parent_of(&self, path: &StorePath) -> Result<Option<&Record>, CoreError> {
        let Some((parent_path, parent_name)) = path.parent() else {
            return Ok(None);
        };
        let parent = self
            .list(&parent_path)?
            .iter()
            .find(|item| key_of(item, NAME) == Some(parent_name))
            .and_then(Value::as_object)
            .ok_or_else(|| CoreError::record_not_found(&parent_path, parent_name))?;
        Ok(Some(parent))
    }

    /// Find a record in the list at `path` by key.
    pub fn record_at(
        &self,
        path: &StorePath,
        key_field: &str,
        key: &str,
    ) -> Result<&Record, CoreError> {
        self.list(path)?
            .iter()
            .find(|item| key_of(item, key_field) == Some(key))
            .and_then(Value::as_object)
            .ok_or_else(|| CoreError::record_not_found(path, key))
    }

    /// Index of the record with `key_field == key` in the list at `path`.
    pub fn position(&self, path: &StorePath, key_field: &str, key: &str) -> Result<usize, CoreError> {
        self.list(path)?
            .iter()
            .position(|item| key_of(item, key_field) == Some(key))
            .ok_or_else(|| CoreError::record_not_found(path, key))
    }

    // ── Mutation primitives ──────────────────────────────────────────

    /// Append a record to the list at `path`.
    ///
    /// Refuses a record whose `name` already exists in that list.
    pub fn push(&mut self, path: &StorePath, record: Record) -> Result<(), CoreError> {
        self.insert_keyed(path, NAME, record, None)
    }

    /// Insert a record keyed by `key_field`, at `position` or at the end.
    pub fn insert_keyed(
        &mut self,
        path: &StorePath,
        key_field: &str,
        record: Record,
        position: Option<usize>,
    ) -> Result<(), CoreError> {
        let list = self.list_mut(path)?;
        if let Some(key) = record.str_field(key_field) {
            if list.iter().any(|item| key_of(item, key_field) == Some(key)) {
                return Err(CoreError::NameConflict {
                    path: path.to_string(),
                    name: key.to_owned(),
                });
            }
        }
        let index = position.unwrap_or(list.len()).min(list.len());
        list.insert(index, Value::Object(record));
        Ok(())
    }

    /// Merge `record` into the existing record named `key` at `path`.
    pub fn update_child(
        &mut self,
        path: &StorePath,
        key: &str,
        record: Record,
    ) -> Result<(), CoreError> {
        self.update_keyed(path, NAME, key, record)
    }

    /// Merge `record` into the record whose `key_field` equals `key`.
    ///
    /// Existing fields keep their position; new fields are appended. A
    /// rename that would collide with a sibling is refused.
    pub fn update_keyed(
        &mut self,
        path: &StorePath,
        key_field: &str,
        key: &str,
        record: Record,
    ) -> Result<(), CoreError> {
        let list = self.list_mut(path)?;
        let index = list
            .iter()
            .position(|item| key_of(item, key_field) == Some(key))
            .ok_or_else(|| CoreError::record_not_found(path, key))?;

        if let Some(new_key) = record.str_field(key_field) {
            let collides = list
                .iter()
                .enumerate()
                .any(|(i, item)| i != index && key_of(item, key_field) == Some(new_key));
            if collides {
                return Err(CoreError::NameConflict {
                    path: path.to_string(),
                    name: new_key.to_owned(),
                });
            }
        }

        let target = list
            .get_mut(index)
            .and_then(Value::as_object_mut)
            .ok_or_else(|| CoreError::record_not_found(path, key))?;
        for (field, value) in record {
            target.insert(field, value);
        }
        Ok(())
    }

    /// Remove and return the record named `key` at `path`.
    pub fn carve(&mut self, path: &StorePath, key: &str) -> Result<Record, CoreError> {
        self.carve_keyed(path, NAME, key)
    }

    pub fn carve_keyed(
        &mut self,
        path: &StorePath,
        key_field: &str,
        key: &str,
    ) -> Result<Record, CoreError> {
        let list = self.list_mut(path)?;
        let index = list
            .iter()
            .position(|item| key_of(item, key_field) == Some(key))
            .ok_or_else(|| CoreError::record_not_found(path, key))?;
        match list.remove(index) {
            Value::Object(record) => Ok(record),
            _ => Err(CoreError::record_not_found(path, key)),
        }
    }

    /// Move the record at index `from` to index `to` within its list.
    pub fn move_record(&mut self, path: &StorePath, from: usize, to: usize) -> Result<(), CoreError> {
        let list = self.list_mut(path)?;
        let len = list.len();
        for index in [from, to] {
            if index >= len {
                return Err(CoreError::IndexOutOfRange {
                    path: path.to_string(),
                    index,
                    len,
                });
            }
        }
        let record = list.remove(from);
        list.insert(to, record);
        Ok(())
    }
}

pub(crate) fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn doc() -> Document {
        Document::from_value(json!({
            "vpcs": [
                { "name": "management", "subnets": [ { "name": "mgmt-zone-1" } ] },
                { "name": "workload", "subnets": [] },
            ],
            "_options": { "prefix": "slz" },
        }))
        .unwrap()
    }

    fn record(value: Value) -> Record {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn rejects_non_object_root() {
        let err = Document::from_json_str("[1, 2]").unwrap_err();
        assert!(matches!(err, CoreError::InvalidDocument { .. }));
    }

    #[test]
    fn push_appends_to_nested_list() {
        let mut doc = doc();
        let path: StorePath = "vpcs/workload/subnets".parse().unwrap();
        doc.push(&path, record(json!({ "name": "wl-zone-1" }))).unwrap();
        assert_eq!(doc.list(&path).unwrap().len(), 1);
    }

    #[test]
    fn push_refuses_duplicate_name() {
        let mut doc = doc();
        let err = doc
            .push(&StorePath::collection("vpcs"), record(json!({ "name": "workload" })))
            .unwrap_err();
        assert!(matches!(err, CoreError::NameConflict { .. }));
        assert_eq!(doc.records("vpcs").len(), 2);
    }

    #[test]
    fn unresolved_paths_fail_loudly() {
        let mut doc = doc();
        let err = doc
            .push(&StorePath::collection("vpc"), record(json!({ "name": "x" })))
            .unwrap_err();
        assert!(matches!(err, CoreError::PathNotFound { .. }));

        let err = doc
            .carve(&"vpcs/missing/subnets".parse().unwrap(), "x")
            .unwrap_err();
        assert!(matches!(err, CoreError::PathNotFound { .. }));

        let err = doc
            .update_child(&StorePath::collection("_options"), "x", Record::new())
            .unwrap_err();
        assert!(matches!(err, CoreError::NotAList { .. }));
    }

    #[test]
    fn update_child_merges_in_place_preserving_order() {
        let mut doc = doc();
        let path = StorePath::collection("vpcs");
        doc.update_child(&path, "workload", record(json!({ "name": "edge", "classic_access": true })))
            .unwrap();
        let updated = doc.find("vpcs", "edge").unwrap();
        let keys: Vec<&str> = updated.keys().map(String::as_str).collect();
        assert_eq!(keys, ["name", "subnets", "classic_access"]);
        assert_eq!(doc.names("vpcs"), ["management", "edge"]);
    }

    #[test]
    fn update_child_refuses_colliding_rename() {
        let mut doc = doc();
        let err = doc
            .update_child(&StorePath::collection("vpcs"), "workload", record(json!({ "name": "management" })))
            .unwrap_err();
        assert!(matches!(err, CoreError::NameConflict { .. }));
    }

    #[test]
    fn carve_removes_and_returns_record() {
        let mut doc = doc();
        let removed = doc.carve(&StorePath::collection("vpcs"), "management").unwrap();
        assert_eq!(removed.name(), Some("management"));
        assert_eq!(doc.names("vpcs"), ["workload"]);
    }

    #[test]
    fn move_record_reorders() {
        let mut doc = doc();
        let path = StorePath::collection("vpcs");
        doc.move_record(&path, 1, 0).unwrap();
        assert_eq!(doc.names("vpcs"), ["workload", "management"]);
        assert!(doc.move_record(&path, 0, 5).is_err());
    }

    #[test]
    fn lists_like_spans_every_owner() {
        let doc = doc();
        let path: StorePath = "vpcs/workload/subnets".parse().unwrap();
        let lists = doc.lists_like(&path);
        assert_eq!(lists.len(), 2);
        assert_eq!(lists.iter().map(|l| l.len()).sum::<usize>(), 1);
    }

    #[test]
    fn parent_of_resolves_owner() {
        let doc = doc();
        let path: StorePath = "vpcs/management/subnets".parse().unwrap();
        let parent = doc.parent_of(&path).unwrap().unwrap();
        assert_eq!(parent.name(), Some("management"));
        assert!(doc.parent_of(&StorePath::collection("vpcs")).unwrap().is_none());
    }
}
