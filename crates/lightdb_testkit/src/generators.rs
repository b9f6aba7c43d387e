//! Property-based test generators using proptest.
//!
//! Provides strategies for generating random test data
//! that maintains required invariants.

use lightdb_core::Value;
use proptest::prelude::*;

/// Strategy for a single well-formed key segment.
pub fn segment_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-zA-Z_][a-zA-Z0-9_]{0,7}").expect("Invalid regex")
}

/// Strategy for generating valid dot-path keys with one to four segments.
pub fn key_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec(segment_strategy(), 1..=4).prop_map(|segments| segments.join("."))
}

/// Strategy for generating malformed dot-path keys.
pub fn invalid_key_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just(String::new()),
        key_strategy().prop_map(|k| format!(".{k}")),
        key_strategy().prop_map(|k| format!("{k}.")),
        (key_strategy(), key_strategy()).prop_map(|(a, b)| format!("{a}..{b}")),
    ]
}

/// Strategy for valid collection names.
pub fn collection_name_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-zA-Z][a-zA-Z0-9_]{0,15}").expect("Invalid regex")
}

/// Strategy for JSON leaves: null, booleans, integers, finite floats and strings.
pub fn leaf_strategy() -> impl Strategy<Value = serde_json::Value> {
    prop_oneof![
        Just(serde_json::Value::Null),
        any::<bool>().prop_map(serde_json::Value::from),
        any::<i64>().prop_map(serde_json::Value::from),
        (-1.0e9..1.0e9f64).prop_map(serde_json::Value::from),
        "[ -~]{0,16}".prop_map(serde_json::Value::from),
    ]
}

/// Strategy for arbitrary JSON values up to a small depth.
pub fn json_strategy() -> impl Strategy<Value = serde_json::Value> {
    leaf_strategy().prop_recursive(3, 32, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(serde_json::Value::Array),
            prop::collection::vec((segment_strategy(), inner), 0..4).prop_map(|fields| {
                serde_json::Value::Object(fields.into_iter().collect())
            }),
        ]
    })
}

/// Strategy for document values.
pub fn value_strategy() -> impl Strategy<Value = Value> {
    json_strategy().prop_map(Value::from)
}

/// Strategy for plaintexts accepted by encryption.
pub fn plaintext_strategy() -> impl Strategy<Value = String> {
    any::<String>()
}

/// A single mutation of a database.
#[derive(Debug, Clone)]
pub enum DocumentOperation {
    /// Store a value
    Set {
        /// Dot-path key
        key: String,
        /// Stored value
        value: serde_json::Value,
    },
    /// Delete a key
    Remove {
        /// Dot-path key
        key: String,
    },
    /// Add to a number
    Add {
        /// Dot-path key
        key: String,
        /// Amount added
        delta: i32,
    },
}

/// Strategy for generating document operations.
pub fn document_operation_strategy() -> impl Strategy<Value = DocumentOperation> {
    prop_oneof![
        3 => (key_strategy(), json_strategy())
            .prop_map(|(key, value)| DocumentOperation::Set { key, value }),
        1 => key_strategy().prop_map(|key| DocumentOperation::Remove { key }),
        1 => (key_strategy(), any::<i32>())
            .prop_map(|(key, delta)| DocumentOperation::Add { key, delta }),
    ]
}

/// Strategy for generating a sequence of operations.
pub fn operation_sequence_strategy(
    min_ops: usize,
    max_ops: usize,
) -> impl Strategy<Value = Vec<DocumentOperation>> {
    prop::collection::vec(document_operation_strategy(), min_ops..max_ops)
}

/// Configuration for property tests.
#[derive(Debug, Clone)]
pub struct PropTestConfig {
    /// Number of test cases to run.
    pub cases: u32,
    /// Maximum shrink iterations.
    pub max_shrink_iters: u32,
}

impl Default for PropTestConfig {
    fn default() -> Self {
        Self {
            cases: 256,
            max_shrink_iters: 1000,
        }
    }
}

impl PropTestConfig {
    /// Creates a configuration for quick tests.
    #[must_use]
    pub fn quick() -> Self {
        Self {
            cases: 32,
            max_shrink_iters: 100,
        }
    }

    /// Creates a configuration for thorough tests.
    #[must_use]
    pub fn thorough() -> Self {
        Self {
            cases: 1024,
            max_shrink_iters: 10000,
        }
    }

    /// Converts to proptest config.
    #[must_use]
    pub fn to_proptest_config(&self) -> ProptestConfig {
        ProptestConfig {
            cases: self.cases,
            max_shrink_iters: self.max_shrink_iters,
            ..ProptestConfig::default()
        }
    }
}
