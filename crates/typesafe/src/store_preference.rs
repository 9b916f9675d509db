//! Preferences bound to a shared data store

use async_trait::async_trait;
use datastore::{DataStore, Key, Preferences};
use futures::stream::{self, StreamExt};
use std::fmt;
use std::sync::Arc;

use crate::error::{PreferenceError, Result};
use crate::preference::{Preference, PreferenceStream};
use crate::serializer::Serializer;

/// [`Preference`] reading and writing one key of a [`DataStore`]
///
/// Holds no state of its own: every call goes through to the store.
pub struct StorePreference<S: Serializer, D: DataStore + ?Sized> {
    store: Arc<D>,
    key: Key<S::Raw>,
    serializer: Arc<S>,
}

impl<S: Serializer, D: DataStore + ?Sized> Clone for StorePreference<S, D> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            key: self.key.clone(),
            serializer: Arc::clone(&self.serializer),
        }
    }
}

impl<S: Serializer, D: DataStore + ?Sized> fmt::Debug for StorePreference<S, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorePreference").field("key", &self.key).finish_non_exhaustive()
    }
}

impl<S: Serializer, D: DataStore + ?Sized> StorePreference<S, D> {
    /// Bind `key` of `store` using `serializer`
    pub fn new(store: Arc<D>, key: Key<S::Raw>, serializer: S) -> Self {
        Self { store, key, serializer: Arc::new(serializer) }
    }

    /// Get the key this preference is bound to
    pub fn key(&self) -> &Key<S::Raw> {
        &self.key
    }

    /// Get the serializer
    pub fn serializer(&self) -> &S {
        &self.serializer
    }

    /// Get the store handle
    pub fn store(&self) -> &Arc<D> {
        &self.store
    }
}

fn read_value<S: Serializer>(snapshot: &Preferences, key: &Key<S::Raw>, serializer: &S) -> S::Value {
    match snapshot.get(key) {
        Some(raw) => serializer.decode(raw),
        None => serializer.default(),
    }
}

#[async_trait]
impl<S, D> Preference for StorePreference<S, D>
where
    S: Serializer,
    D: DataStore + ?Sized + 'static,
{
    type Value = S::Value;
    type Raw = S::Raw;

    async fn get(&self) -> Result<S::Value> {
        match self.store.snapshot().await {
            Ok(snapshot) => Ok(read_value(&snapshot, &self.key, &*self.serializer)),
            Err(e) if e.is_transient() => {
                tracing::warn!("Reading preference {} failed, using default: {}", self.key, e);
                Ok(self.serializer.default())
            }
            Err(e) => Err(e.into()),
        }
    }

    fn observe(&self) -> PreferenceStream<S::Value> {
        let key = self.key.clone();
        let serializer = Arc::clone(&self.serializer);

        // The upstream is dropped after a fatal error so the stream ends at once
        stream::unfold(Some(self.store.data()), move |upstream| {
            let key = key.clone();
            let serializer = Arc::clone(&serializer);

            async move {
                let mut upstream = upstream?;
                let value = match upstream.next().await? {
                    Ok(snapshot) => Ok(read_value(&snapshot, &key, &*serializer)),
                    Err(e) if e.is_transient() => {
                        tracing::warn!("Observing preference {} failed, using default: {}", key, e);
                        Ok(serializer.default())
                    }
                    Err(e) => return Some((Err(PreferenceError::from(e)), None)),
                };

                Some((value, Some(upstream)))
            }
        })
        .boxed()
    }

    async fn set(&self, value: S::Value) -> Result<()> {
        let raw = self.serializer.encode(&value);
        let key = self.key.clone();

        self.store
            .update_data(Box::new(move |mut prefs| {
                prefs.set(&key, raw);
                prefs
            }))
            .await?;

        Ok(())
    }

    async fn get_and_update<F>(&self, update: F) -> Result<()>
    where
        F: FnOnce(S::Value) -> S::Value + Send + 'static,
    {
        let key = self.key.clone();
        let serializer = Arc::clone(&self.serializer);

        self.store
            .update_data(Box::new(move |mut prefs| {
                let current = read_value(&prefs, &key, &*serializer);
                prefs.set(&key, serializer.encode(&update(current)));
                prefs
            }))
            .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serializer::{serializer_from_fn, IdentitySerializer};
    use datastore::{
        int_key, string_key, DataStoreExt, DataStream, MemoryDataStore, StoreError, Transform,
    };
    use mockall::mock;
    use std::time::Duration;

    mock! {
        Store {}

        #[async_trait]
        impl DataStore for Store {
            fn data(&self) -> DataStream;
            async fn update_data(&self, transform: Transform) -> datastore::Result<Preferences>;
            async fn snapshot(&self) -> datastore::Result<Preferences>;
        }
    }

    fn io_error() -> StoreError {
        StoreError::Io(std::io::Error::new(std::io::ErrorKind::Other, "read failed"))
    }

    fn counter(store: Arc<MemoryDataStore>) -> StorePreference<IdentitySerializer<i32>, MemoryDataStore> {
        StorePreference::new(store, int_key("counter"), IdentitySerializer::new(0))
    }

    #[tokio::test]
    async fn test_get_absent_returns_default() {
        let pref = counter(Arc::new(MemoryDataStore::in_memory()));
        assert_eq!(pref.get().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_set_then_get() {
        let pref = counter(Arc::new(MemoryDataStore::in_memory()));
        pref.set(12).await.unwrap();
        assert_eq!(pref.get().await.unwrap(), 12);
    }

    #[tokio::test]
    async fn test_get_and_update_applies_sequentially() {
        let pref = counter(Arc::new(MemoryDataStore::in_memory()));
        for _ in 0..5 {
            pref.get_and_update(|n| n * 2 + 1).await.unwrap();
        }
        // f(x) = 2x + 1 applied five times from 0
        assert_eq!(pref.get().await.unwrap(), 31);
    }

    #[tokio::test]
    async fn test_unrelated_keys_untouched() {
        let store = Arc::new(MemoryDataStore::in_memory());
        store
            .edit(|prefs| {
                prefs.set(&string_key("theme"), "dark".to_string());
            })
            .await
            .unwrap();

        let pref = counter(store.clone());
        pref.set(3).await.unwrap();

        let snapshot = store.snapshot().await.unwrap();
        assert_eq!(snapshot.get(&string_key("theme")), Some("dark".to_string()));
        assert_eq!(snapshot.get(&int_key("counter")), Some(3));
    }

    #[tokio::test]
    async fn test_kind_mismatch_reads_default() {
        let store = Arc::new(MemoryDataStore::in_memory());
        store
            .edit(|prefs| {
                prefs.set(&string_key("counter"), "not a number".to_string());
            })
            .await
            .unwrap();

        let pref = counter(store);
        assert_eq!(pref.get().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_observe_emits_current_then_writes() {
        let pref = counter(Arc::new(MemoryDataStore::in_memory()));
        let mut values = pref.observe();

        assert_eq!(values.next().await.unwrap().unwrap(), 0);
        pref.set(1).await.unwrap();
        assert_eq!(values.next().await.unwrap().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_decode_uses_serializer() {
        let store = Arc::new(MemoryDataStore::in_memory());
        let pref = StorePreference::new(
            store.clone(),
            string_key("tags"),
            serializer_from_fn(
                |raw: String| raw.split(',').map(str::to_string).collect::<Vec<_>>(),
                |tags: &Vec<String>| tags.join(","),
                Vec::new(),
            ),
        );

        pref.set(vec!["a".to_string(), "b".to_string()]).await.unwrap();

        let snapshot = store.snapshot().await.unwrap();
        assert_eq!(snapshot.get(&string_key("tags")), Some("a,b".to_string()));
        assert_eq!(pref.get().await.unwrap(), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_transient_read_failure_yields_default() {
        let mut store = MockStore::new();
        store.expect_snapshot().returning(|| Err(io_error()));

        let pref = StorePreference::new(Arc::new(store), int_key("counter"), IdentitySerializer::new(9));
        assert_eq!(pref.get().await.unwrap(), 9);
    }

    #[tokio::test]
    async fn test_non_transient_read_failure_is_returned() {
        let mut store = MockStore::new();
        store.expect_snapshot().returning(|| Err(StoreError::Closed));

        let pref = StorePreference::new(Arc::new(store), int_key("counter"), IdentitySerializer::new(9));
        assert!(!pref.get().await.unwrap_err().is_transient());
    }

    #[tokio::test]
    async fn test_write_failure_is_returned() {
        let mut store = MockStore::new();
        store.expect_update_data().returning(|_| Err(io_error()));

        let pref = StorePreference::new(Arc::new(store), int_key("counter"), IdentitySerializer::new(0));
        assert!(pref.set(1).await.unwrap_err().is_transient());
        assert!(pref.get_and_update(|n| n + 1).await.is_err());
    }

    #[tokio::test]
    async fn test_observe_maps_transient_to_default_and_ends_on_fatal() {
        let mut store = MockStore::new();
        store.expect_data().returning(|| {
            let mut prefs = Preferences::new();
            prefs.set(&int_key("counter"), 4);
            stream::iter(vec![
                Err(io_error()),
                Ok(prefs),
                Err(StoreError::Closed),
                Ok(Preferences::new()),
            ])
            .boxed()
        });

        let pref = StorePreference::new(Arc::new(store), int_key("counter"), IdentitySerializer::new(1));
        let values: Vec<_> = pref.observe().collect().await;

        assert_eq!(values.len(), 3);
        assert_eq!(values[0].as_ref().unwrap(), &1);
        assert_eq!(values[1].as_ref().unwrap(), &4);
        assert!(values[2].is_err());
    }

    #[tokio::test]
    async fn test_observe_ends_right_after_fatal_error() {
        let mut store = MockStore::new();
        store
            .expect_data()
            .returning(|| stream::iter(vec![Err(StoreError::Closed)]).chain(stream::pending()).boxed());

        let pref = StorePreference::new(Arc::new(store), int_key("counter"), IdentitySerializer::new(1));
        let mut values = pref.observe();

        assert!(values.next().await.unwrap().is_err());
        let end = tokio::time::timeout(Duration::from_secs(1), values.next()).await;
        assert!(matches!(end, Ok(None)));
    }
}
