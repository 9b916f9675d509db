//! JSON-backed serializer for complex values

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use typesafe::Serializer;

/// Serializer storing values as JSON strings
///
/// Stored strings that do not parse as `T` decode to the default.
#[derive(Clone)]
pub struct JsonSerializer<T> {
    default: T,
}

impl<T: fmt::Debug> fmt::Debug for JsonSerializer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonSerializer").field("default", &self.default).finish()
    }
}

impl<T> JsonSerializer<T>
where
    T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
{
    /// Create a JSON serializer with the given default
    pub fn new(default: T) -> Self {
        Self { default }
    }
}

impl<T> Serializer for JsonSerializer<T>
where
    T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
{
    type Value = T;
    type Raw = String;

    fn encode(&self, value: &T) -> String {
        match serde_json::to_string(value) {
            Ok(json) => json,
            Err(e) => {
                tracing::error!("Failed to encode preference value, storing default: {}", e);
                serde_json::to_string(&self.default).unwrap_or_else(|_| "null".to_string())
            }
        }
    }

    fn decode(&self, raw: String) -> T {
        match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("Failed to decode stored preference value, using default: {}", e);
                self.default.clone()
            }
        }
    }

    fn default(&self) -> T {
        self.default.clone()
    }
}

/// JSON serializer for any serde type
pub fn json_serializer<T>(default: T) -> JsonSerializer<T>
where
    T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
{
    JsonSerializer::new(default)
}

/// JSON serializer for lists, defaulting to an empty list
pub fn list_serializer<T>() -> JsonSerializer<Vec<T>>
where
    T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
{
    JsonSerializer::new(Vec::new())
}

/// JSON serializer for maps, defaulting to an empty map
pub fn map_serializer<K, V>() -> JsonSerializer<BTreeMap<K, V>>
where
    K: Serialize + DeserializeOwned + Ord + Clone + Send + Sync + 'static,
    V: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
{
    JsonSerializer::new(BTreeMap::new())
}

/// JSON serializer for sets, defaulting to an empty set
pub fn set_serializer<T>() -> JsonSerializer<BTreeSet<T>>
where
    T: Serialize + DeserializeOwned + Ord + Clone + Send + Sync + 'static,
{
    JsonSerializer::new(BTreeSet::new())
}
