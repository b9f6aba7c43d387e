//! JSON encoding of persisted snapshots.

use crate::error::{CoreError, CoreResult};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;

/// Serializes `value` as JSON indented by `tab_size` spaces.
///
/// A `tab_size` of zero produces compact output.
pub fn encode<T: Serialize + ?Sized>(value: &T, tab_size: usize) -> CoreResult<Vec<u8>> {
    if tab_size == 0 {
        return serde_json::to_vec(value).map_err(|e| CoreError::invalid_format(e.to_string()));
    }

    let indent = vec![b' '; tab_size];
    let mut out = Vec::new();
    let mut serializer =
        serde_json::Serializer::with_formatter(&mut out, PrettyFormatter::with_indent(&indent));
    value
        .serialize(&mut serializer)
        .map_err(|e| CoreError::invalid_format(e.to_string()))?;
    Ok(out)
}

/// Parses persisted JSON.
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> CoreResult<T> {
    serde_json::from_slice(bytes).map_err(|e| CoreError::invalid_format(e.to_string()))
}
