//! Default-value completion for collection records.

use crate::value::{Map, Value};

/// Marker prefix of auto-increment fields in a defaults map.
pub const AUTO_INCREMENT_PREFIX: char = '$';

/// A flat record stored in a collection.
pub type Record = Map;

#[derive(Debug, Clone, PartialEq)]
enum DefaultField {
    Fixed { name: String, value: Value },
    AutoIncrement { name: String, seed: Value },
}

/// Field defaults applied to every inserted record.
///
/// Fixed defaults fill in a constant. Auto-increment defaults take the
/// field's value on the last existing record that has the field, plus one;
/// when no such record exists (or its value is not a number) the seed is
/// used instead.
///
/// ```rust
/// use lightdb_core::collection::Defaults;
///
/// let defaults = Defaults::new()
///     .auto_increment("id", 1)
///     .fixed("active", true);
/// assert_eq!(defaults.len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Defaults {
    fields: Vec<DefaultField>,
}

impl Defaults {
    /// Creates an empty set of defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds defaults from a map where `$`-prefixed keys are auto-increment
    /// fields (the prefix is stripped) and all other keys are fixed.
    #[must_use]
    pub fn from_map(map: &Map) -> Self {
        let fields = map
            .iter()
            .map(|(key, value)| match key.strip_prefix(AUTO_INCREMENT_PREFIX) {
                Some(name) => DefaultField::AutoIncrement {
                    name: name.to_string(),
                    seed: value.clone(),
                },
                None => DefaultField::Fixed {
                    name: key.clone(),
                    value: value.clone(),
                },
            })
            .collect();
        Self { fields }
    }

    /// Adds a fixed default.
    #[must_use]
    pub fn fixed(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.push(DefaultField::Fixed {
            name: name.into(),
            value: value.into(),
        });
        self
    }

    /// Adds an auto-increment default with the given seed.
    #[must_use]
    pub fn auto_increment(mut self, name: impl Into<String>, seed: impl Into<Value>) -> Self {
        self.fields.push(DefaultField::AutoIncrement {
            name: name.into(),
            seed: seed.into(),
        });
        self
    }

    /// Returns the number of configured defaults.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if no defaults are configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Fills every missing default field of `record`.
    ///
    /// `existing` are the records already in the collection, oldest first.
    /// Fields present on `record` are never overwritten.
    pub fn complete(&self, record: &mut Record, existing: &[Record]) {
        for field in &self.fields {
            match field {
                DefaultField::Fixed { name, value } => {
                    if !record.contains_key(name) {
                        record.insert(name.clone(), value.clone());
                    }
                }
                DefaultField::AutoIncrement { name, seed } => {
                    if !record.contains_key(name) {
                        let next = next_in_sequence(name, existing).unwrap_or_else(|| seed.clone());
                        record.insert(name.clone(), next);
                    }
                }
            }
        }
    }
}

/// Value after the one on the last record carrying `name`.
///
/// This follows the last such record rather than the maximum, so deleting
/// the newest records lets their numbers be handed out again.
fn next_in_sequence(name: &str, existing: &[Record]) -> Option<Value> {
    let last = existing.iter().rev().find_map(|record| record.get(name))?;

    if let Some(n) = last.as_i64() {
        if let Some(next) = n.checked_add(1) {
            return Some(Value::from(next));
        }
    }
    last.as_f64().map(|n| Value::from(n + 1.0))
}
