//! Shorthand factory with built-in defaults and JSON-backed collections

use datastore::{DataStore, Key};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use typesafe::{IdentitySerializer, StorePreference, TypeSafeStore};

use crate::serializer::{json_serializer, list_serializer, map_serializer, set_serializer, JsonSerializer};

/// Preference stored as-is
pub type Primitive<R, D> = StorePreference<IdentitySerializer<R>, D>;

/// Preference stored as a JSON string
pub type Json<T, D> = StorePreference<JsonSerializer<T>, D>;

/// Factory creating preferences without spelling out serializers
///
/// Primitive preferences default to `false`, zero, or empty. Collections are
/// stored as JSON strings and default to empty.
pub struct AutoTypedStore<D: DataStore + ?Sized> {
    type_safe: TypeSafeStore<D>,
}

impl<D: DataStore + ?Sized> Clone for AutoTypedStore<D> {
    fn clone(&self) -> Self {
        Self { type_safe: self.type_safe.clone() }
    }
}

impl<D: DataStore + ?Sized> From<TypeSafeStore<D>> for AutoTypedStore<D> {
    fn from(type_safe: TypeSafeStore<D>) -> Self {
        Self { type_safe }
    }
}

impl<D: DataStore + ?Sized> AutoTypedStore<D> {
    /// Create a factory over `store`
    pub fn new(store: Arc<D>) -> Self {
        Self { type_safe: TypeSafeStore::new(store) }
    }

    /// Get the underlying factory, for preferences with custom serializers
    pub fn type_safe(&self) -> &TypeSafeStore<D> {
        &self.type_safe
    }

    /// Boolean preference, default `false`
    pub fn create_bool_preference(&self, key: Key<bool>) -> Primitive<bool, D> {
        self.type_safe.create_primitive_preference(key, false)
    }

    /// 32-bit integer preference, default `0`
    pub fn create_int_preference(&self, key: Key<i32>) -> Primitive<i32, D> {
        self.type_safe.create_primitive_preference(key, 0)
    }

    /// 64-bit integer preference, default `0`
    pub fn create_long_preference(&self, key: Key<i64>) -> Primitive<i64, D> {
        self.type_safe.create_primitive_preference(key, 0)
    }

    /// Single precision preference, default `0.0`
    pub fn create_float_preference(&self, key: Key<f32>) -> Primitive<f32, D> {
        self.type_safe.create_primitive_preference(key, 0.0)
    }

    /// Double precision preference, default `0.0`
    pub fn create_double_preference(&self, key: Key<f64>) -> Primitive<f64, D> {
        self.type_safe.create_primitive_preference(key, 0.0)
    }

    /// String preference, default empty
    pub fn create_string_preference(&self, key: Key<String>) -> Primitive<String, D> {
        self.type_safe.create_primitive_preference(key, String::new())
    }

    /// Native string set preference, default empty
    pub fn create_string_set_preference(&self, key: Key<BTreeSet<String>>) -> Primitive<BTreeSet<String>, D> {
        self.type_safe.create_primitive_preference(key, BTreeSet::new())
    }

    /// JSON list preference, default empty
    pub fn create_list_preference<T>(&self, key: Key<String>) -> Json<Vec<T>, D>
    where
        T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
    {
        self.type_safe.create_complex_preference(key, list_serializer())
    }

    /// JSON map preference, default empty
    pub fn create_map_preference<K, V>(&self, key: Key<String>) -> Json<BTreeMap<K, V>, D>
    where
        K: Serialize + DeserializeOwned + Ord + Clone + Send + Sync + 'static,
        V: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
    {
        self.type_safe.create_complex_preference(key, map_serializer())
    }

    /// JSON set preference, default empty
    pub fn create_set_preference<T>(&self, key: Key<String>) -> Json<BTreeSet<T>, D>
    where
        T: Serialize + DeserializeOwned + Ord + Clone + Send + Sync + 'static,
    {
        self.type_safe.create_complex_preference(key, set_serializer())
    }

    /// JSON preference for any serde type
    pub fn create_json_preference<T>(&self, key: Key<String>, default: T) -> Json<T, D>
    where
        T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
    {
        self.type_safe.create_complex_preference(key, json_serializer(default))
    }
}
