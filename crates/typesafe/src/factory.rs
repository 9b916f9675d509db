//! Factory binding keys and serializers to a shared store

use datastore::{DataStore, Key, StorableValue};
use std::sync::Arc;

use crate::serializer::{IdentitySerializer, Serializer};
use crate::store_preference::StorePreference;

/// Creates [`StorePreference`]s over one shared store
pub struct TypeSafeStore<D: DataStore + ?Sized> {
    store: Arc<D>,
}

impl<D: DataStore + ?Sized> Clone for TypeSafeStore<D> {
    fn clone(&self) -> Self {
        Self { store: Arc::clone(&self.store) }
    }
}

impl<D: DataStore + ?Sized> TypeSafeStore<D> {
    /// Create a factory over `store`
    pub fn new(store: Arc<D>) -> Self {
        Self { store }
    }

    /// Get the shared store handle
    pub fn store(&self) -> &Arc<D> {
        &self.store
    }

    /// Bind `key` with an explicit serializer
    pub fn create_preference<S: Serializer>(&self, key: Key<S::Raw>, serializer: S) -> StorePreference<S, D> {
        StorePreference::new(Arc::clone(&self.store), key, serializer)
    }

    /// Bind a key whose value is stored as-is
    pub fn create_primitive_preference<R: StorableValue>(
        &self,
        key: Key<R>,
        default: R,
    ) -> StorePreference<IdentitySerializer<R>, D> {
        self.create_preference(key, IdentitySerializer::new(default))
    }

    /// Bind a string key holding an encoded complex value
    pub fn create_complex_preference<S>(&self, key: Key<String>, serializer: S) -> StorePreference<S, D>
    where
        S: Serializer<Raw = String>,
    {
        self.create_preference(key, serializer)
    }
}
