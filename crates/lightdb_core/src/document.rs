//! In-memory document tree addressed by dot-path segments.

use crate::codec;
use crate::error::{CoreError, CoreResult};
use crate::value::{Map, Value};
use std::sync::Arc;

/// The root mapping of a database, persisted as one JSON object.
///
/// Mutations are copy-on-write per path segment: every mapping on the way
/// to the target is made unique with [`Arc::make_mut`] before descending,
/// so a view captured with [`Document::root`] never observes later changes.
/// Descent is an explicit loop, so path depth does not grow the stack.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    root: Arc<Map>,
}

impl Document {
    /// Creates an empty document.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a persisted document.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidFormat`] if the bytes are not a JSON object.
    pub fn from_bytes(bytes: &[u8]) -> CoreResult<Self> {
        match codec::decode::<Value>(bytes)? {
            Value::Object(root) => Ok(Self { root }),
            other => Err(CoreError::invalid_format(format!(
                "expected a JSON object at the root, found {}",
                other.type_name()
            ))),
        }
    }

    /// Serializes the document with the given indentation.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_bytes(&self, tab_size: usize) -> CoreResult<Vec<u8>> {
        codec::encode(self.root.as_ref(), tab_size)
    }

    /// Returns a view of the whole document.
    ///
    /// The view shares structure with the live tree but is never affected
    /// by later mutations.
    #[must_use]
    pub fn root(&self) -> Value {
        Value::Object(Arc::clone(&self.root))
    }

    /// Returns a deep, fully independent copy of the document.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        self.root().to_json()
    }

    /// Returns the number of top-level keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.root.len()
    }

    /// Returns true if the document has no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    /// Removes every key.
    pub fn clear(&mut self) {
        self.root = Arc::default();
    }

    /// Resolves `segments` to a value.
    ///
    /// Objects are entered by key and arrays by decimal index. Anything
    /// that does not resolve yields `None`.
    #[must_use]
    pub fn get(&self, segments: &[&str]) -> Option<&Value> {
        let (first, rest) = segments.split_first()?;
        let mut current = self.root.get(*first)?;

        for segment in rest {
            current = match current {
                Value::Object(map) => map.get(*segment)?,
                Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }

        Some(current)
    }

    /// Stores `value` at `segments`.
    ///
    /// Missing or non-object intermediates are replaced by empty objects.
    pub fn set(&mut self, segments: &[&str], value: Value) {
        let Some((last, parents)) = segments.split_last() else {
            return;
        };

        let mut map = Arc::make_mut(&mut self.root);
        for segment in parents {
            let slot = map
                .entry((*segment).to_string())
                .or_insert_with(Value::object);
            map = make_object_mut(slot);
        }

        map.insert((*last).to_string(), value);
    }

    /// Deletes the entry at `segments` from its parent object.
    ///
    /// Returns true if an entry was removed. Nothing is copied when the
    /// parent does not resolve to an object holding the key.
    pub fn remove(&mut self, segments: &[&str]) -> bool {
        let Some((last, parents)) = segments.split_last() else {
            return false;
        };

        let present = self
            .object_at(parents)
            .is_some_and(|parent| parent.contains_key(*last));
        if !present {
            return false;
        }

        let mut map = Arc::make_mut(&mut self.root);
        for segment in parents {
            match map.get_mut(*segment) {
                Some(Value::Object(child)) => map = Arc::make_mut(child),
                _ => return false,
            }
        }

        map.shift_remove(*last).is_some()
    }

    /// Resolves `segments` through objects only.
    fn object_at(&self, segments: &[&str]) -> Option<&Map> {
        let mut map = self.root.as_ref();
        for segment in segments {
            map = map.get(*segment)?.as_object()?;
        }
        Some(map)
    }
}

/// Turns `slot` into an object if needed and returns its unique fields.
fn make_object_mut(slot: &mut Value) -> &mut Map {
    if !slot.is_object() {
        *slot = Value::object();
    }
    match slot {
        Value::Object(map) => Arc::make_mut(map),
        _ => unreachable!("slot was just replaced by an object"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(json: serde_json::Value) -> Document {
        Document::from_bytes(json.to_string().as_bytes()).unwrap()
    }

    #[test]
    fn set_and_get_nested() {
        let mut document = Document::new();
        document.set(&["a", "b", "c"], Value::from(1));

        assert_eq!(document.get(&["a", "b", "c"]), Some(&Value::from(1)));
        assert_eq!(document.to_json(), json!({"a": {"b": {"c": 1}}}));
    }

    #[test]
    fn get_missing_is_none() {
        let document = doc(json!({"a": {"b": 1}, "s": "text"}));

        assert_eq!(document.get(&["x"]), None);
        assert_eq!(document.get(&["a", "x"]), None);
        assert_eq!(document.get(&["a", "b", "c"]), None);
        assert_eq!(document.get(&["s", "length"]), None);
    }

    #[test]
    fn get_indexes_arrays() {
        let document = doc(json!({"list": [10, {"name": "x"}]}));

        assert_eq!(document.get(&["list", "0"]), Some(&Value::from(10)));
        assert_eq!(document.get(&["list", "1", "name"]), Some(&Value::from("x")));
        assert_eq!(document.get(&["list", "2"]), None);
        assert_eq!(document.get(&["list", "first"]), None);
    }

    #[test]
    fn set_replaces_non_object_intermediates() {
        let mut document = doc(json!({"a": 5, "l": [1]}));
        document.set(&["a", "b"], Value::from(true));
        document.set(&["l", "x"], Value::from(2));

        assert_eq!(document.to_json(), json!({"a": {"b": true}, "l": {"x": 2}}));
    }

    #[test]
    fn set_keeps_siblings_and_order() {
        let mut document = doc(json!({"z": 1, "a": {"k": 1}}));
        document.set(&["a", "j"], Value::from(2));
        document.set(&["b"], Value::from(3));

        let text = String::from_utf8(document.to_bytes(0).unwrap()).unwrap();
        assert_eq!(text, r#"{"z":1,"a":{"k":1,"j":2},"b":3}"#);
    }

    #[test]
    fn captured_view_is_not_affected_by_set() {
        let mut document = Document::new();
        document.set(&["a", "b"], Value::from(1));

        let captured = document.root();
        document.set(&["a", "c"], Value::from(2));
        document.set(&["a", "b"], Value::from(99));

        assert_eq!(captured.to_json(), json!({"a": {"b": 1}}));
        assert_eq!(document.to_json(), json!({"a": {"b": 99, "c": 2}}));
    }

    #[test]
    fn captured_subtree_is_not_affected_by_set() {
        let mut document = doc(json!({"a": {"b": {"c": 1}}}));
        let subtree = document.get(&["a", "b"]).cloned().unwrap();

        document.set(&["a", "b", "d"], Value::from(2));

        assert_eq!(subtree.to_json(), json!({"c": 1}));
    }

    #[test]
    fn untouched_branches_stay_shared() {
        let mut document = doc(json!({"left": {"x": 1}, "right": {"y": 2}}));
        let before = document.root();

        document.set(&["right", "y"], Value::from(3));

        let (Some(Value::Object(old)), Some(Value::Object(new))) = (
            before.as_object().and_then(|m| m.get("left")),
            document.get(&["left"]),
        ) else {
            panic!("left should be an object");
        };
        assert!(Arc::ptr_eq(old, new));
    }

    #[test]
    fn remove_entry() {
        let mut document = doc(json!({"a": {"b": 1, "c": 2}}));

        assert!(document.remove(&["a", "b"]));
        assert_eq!(document.get(&["a", "b"]), None);
        assert_eq!(document.to_json(), json!({"a": {"c": 2}}));
    }

    #[test]
    fn remove_missing_is_false() {
        let mut document = doc(json!({"a": {"b": 1}, "n": 3}));

        assert!(!document.remove(&["x"]));
        assert!(!document.remove(&["a", "x"]));
        assert!(!document.remove(&["n", "x"]));
        assert!(!document.remove(&[]));
    }

    #[test]
    fn remove_does_not_touch_captured_view() {
        let mut document = doc(json!({"a": {"b": 1}}));
        let captured = document.root();

        document.remove(&["a", "b"]);

        assert_eq!(captured.to_json(), json!({"a": {"b": 1}}));
        assert_eq!(document.to_json(), json!({"a": {}}));
    }

    #[test]
    fn deep_paths_use_bounded_stack() {
        let segments: Vec<String> = (0..500).map(|i| format!("k{i}")).collect();
        let path: Vec<&str> = segments.iter().map(String::as_str).collect();

        let mut document = Document::new();
        document.set(&path, Value::from("deep"));

        assert_eq!(document.get(&path), Some(&Value::from("deep")));
        assert!(document.remove(&path));
    }

    #[test]
    fn from_bytes_requires_object() {
        assert!(matches!(
            Document::from_bytes(b"[1,2]"),
            Err(CoreError::InvalidFormat { .. })
        ));
        assert!(matches!(
            Document::from_bytes(b"{oops"),
            Err(CoreError::InvalidFormat { .. })
        ));
    }

    #[test]
    fn clear_empties_document() {
        let mut document = doc(json!({"a": 1}));
        assert_eq!(document.len(), 1);

        document.clear();
        assert!(document.is_empty());
    }

    #[test]
    fn snapshot_is_independent() {
        let mut document = doc(json!({"a": {"b": 1}}));
        let mut snapshot = document.to_json();

        snapshot["a"]["b"] = json!(2);
        document.set(&["a", "c"], Value::from(3));

        assert_eq!(snapshot, json!({"a": {"b": 2}}));
        assert_eq!(document.to_json(), json!({"a": {"b": 1, "c": 3}}));
    }
}
