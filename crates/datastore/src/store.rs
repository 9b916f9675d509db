//! Observable, transactional data store
//!
//! [`PreferenceDataStore`] caches the committed snapshot of a
//! [`StorageBackend`], serializes all writers through one lock, and publishes
//! every commit on a `watch` channel so observers see changes in commit order.

use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use std::sync::Arc;
use tokio::sync::{watch, Mutex};

use crate::backend::{
    FileBackend, FileStoreConfig, MemoryBackend, SledBackend, SledStoreConfig, StorageBackend,
};
use crate::error::{Result, StoreError};
use crate::migration::{clean_up_migrations, run_migrations, DataMigration};
use crate::preferences::Preferences;

/// Stream of committed snapshots
pub type DataStream = BoxStream<'static, Result<Preferences>>;

/// Pure transform applied to the full key set inside one transaction
pub type Transform = Box<dyn FnOnce(Preferences) -> Preferences + Send>;

/// Asynchronous, observable key-value store
#[async_trait]
pub trait DataStore: Send + Sync {
    /// Observe the store
    ///
    /// Emits the current snapshot on subscription, then once per committed
    /// write. Intermediate states may be coalesced. If the store cannot be
    /// opened the error is yielded once and the stream ends.
    fn data(&self) -> DataStream;

    /// Atomically replace the key set with `transform(current)`
    ///
    /// Returns the committed snapshot. When persisting fails the store keeps
    /// its previous state.
    async fn update_data(&self, transform: Transform) -> Result<Preferences>;

    /// Get the current committed snapshot
    async fn snapshot(&self) -> Result<Preferences> {
        match self.data().next().await {
            Some(result) => result,
            None => Err(StoreError::Closed),
        }
    }
}

/// Convenience helpers available on every [`DataStore`]
#[async_trait]
pub trait DataStoreExt: DataStore {
    /// Edit the key set in place inside one transaction
    async fn edit<F>(&self, edit: F) -> Result<Preferences>
    where
        F: FnOnce(&mut Preferences) + Send + 'static,
    {
        self.update_data(Box::new(move |mut prefs| {
            edit(&mut prefs);
            prefs
        }))
        .await
    }
}

impl<D: DataStore + ?Sized> DataStoreExt for D {}

struct Inner<B> {
    backend: B,
    migrations: Vec<Box<dyn DataMigration>>,
    /// Committed snapshot, `None` until the store has been opened
    state: Mutex<Option<Arc<Preferences>>>,
    tx: watch::Sender<Arc<Preferences>>,
}

impl<B: StorageBackend> Inner<B> {
    /// Load the backend and run migrations if the store is not open yet
    async fn open(&self, state: &mut Option<Arc<Preferences>>) -> Result<Arc<Preferences>> {
        if let Some(current) = state.as_ref() {
            return Ok(Arc::clone(current));
        }

        let loaded = self.backend.load().await?;
        let run = run_migrations(&self.migrations, loaded.clone()).await?;

        if !run.applied.is_empty() && run.data != loaded {
            self.backend.persist(&run.data).await?;
        }
        clean_up_migrations(&run.applied).await?;

        let current = Arc::new(run.data);
        *state = Some(Arc::clone(&current));
        self.tx.send_replace(Arc::clone(&current));
        tracing::info!(
            "Opened data store with {} entries ({} migrations applied)",
            current.len(),
            run.applied.len()
        );

        Ok(current)
    }

    /// Open the store and subscribe while holding the lock, so no commit is missed
    async fn subscribe(&self) -> Result<watch::Receiver<Arc<Preferences>>> {
        let mut state = self.state.lock().await;
        self.open(&mut state).await?;
        Ok(self.tx.subscribe())
    }
}

enum Subscription<B> {
    Opening(Arc<Inner<B>>),
    Live(watch::Receiver<Arc<Preferences>>),
    Done,
}

/// [`DataStore`] over any [`StorageBackend`]
pub struct PreferenceDataStore<B> {
    inner: Arc<Inner<B>>,
}

impl<B> Clone for PreferenceDataStore<B> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

impl<B: StorageBackend> PreferenceDataStore<B> {
    /// Create a store without migrations
    pub fn new(backend: B) -> Self {
        DataStoreBuilder::new(backend).build()
    }

    /// Start building a store with migrations
    pub fn builder(backend: B) -> DataStoreBuilder<B> {
        DataStoreBuilder::new(backend)
    }

    /// Get the storage backend
    pub fn backend(&self) -> &B {
        &self.inner.backend
    }
}

impl PreferenceDataStore<MemoryBackend> {
    /// Create an empty in-memory store (for testing)
    pub fn in_memory() -> Self {
        Self::new(MemoryBackend::new())
    }
}

impl PreferenceDataStore<FileBackend> {
    /// Create a store persisted to a single JSON file
    pub fn open(config: FileStoreConfig) -> Self {
        Self::new(FileBackend::new(config))
    }
}

impl PreferenceDataStore<SledBackend> {
    /// Create a store persisted to a sled tree
    pub fn open(config: &SledStoreConfig) -> Result<Self> {
        Ok(Self::new(SledBackend::open(config)?))
    }
}

#[async_trait]
impl<B: StorageBackend> DataStore for PreferenceDataStore<B> {
    fn data(&self) -> DataStream {
        let start = Subscription::Opening(Arc::clone(&self.inner));

        stream::unfold(start, |subscription| async move {
            match subscription {
                Subscription::Opening(inner) => match inner.subscribe().await {
                    Ok(mut rx) => {
                        let current = Arc::clone(&rx.borrow_and_update());
                        Some((Ok((*current).clone()), Subscription::Live(rx)))
                    }
                    Err(e) => Some((Err(e), Subscription::Done)),
                },
                Subscription::Live(mut rx) => {
                    // Sender lives in the store; an error means it was dropped
                    rx.changed().await.ok()?;
                    let current = Arc::clone(&rx.borrow_and_update());
                    Some((Ok((*current).clone()), Subscription::Live(rx)))
                }
                Subscription::Done => None,
            }
        })
        .boxed()
    }

    async fn update_data(&self, transform: Transform) -> Result<Preferences> {
        let mut state = self.inner.state.lock().await;
        let current = self.inner.open(&mut state).await?;

        let updated = transform((*current).clone());
        if updated == *current {
            return Ok(updated);
        }

        self.inner.backend.persist(&updated).await?;

        let committed = Arc::new(updated);
        *state = Some(Arc::clone(&committed));
        self.inner.tx.send_replace(Arc::clone(&committed));
        tracing::debug!("Committed data store update ({} entries)", committed.len());

        Ok((*committed).clone())
    }

    async fn snapshot(&self) -> Result<Preferences> {
        let mut state = self.inner.state.lock().await;
        let current = self.inner.open(&mut state).await?;
        Ok((*current).clone())
    }
}

/// Builder registering store-open migrations
pub struct DataStoreBuilder<B> {
    backend: B,
    migrations: Vec<Box<dyn DataMigration>>,
}

impl<B: StorageBackend> DataStoreBuilder<B> {
    /// Create a new builder
    pub fn new(backend: B) -> Self {
        Self { backend, migrations: Vec::new() }
    }

    /// Register a migration; migrations run in registration order
    pub fn migration(mut self, migration: impl DataMigration + 'static) -> Self {
        self.migrations.push(Box::new(migration));
        self
    }

    /// Register several boxed migrations
    pub fn migrations(mut self, migrations: impl IntoIterator<Item = Box<dyn DataMigration>>) -> Self {
        self.migrations.extend(migrations);
        self
    }

    /// Build the store; it is opened lazily on first access
    pub fn build(self) -> PreferenceDataStore<B> {
        let (tx, _) = watch::channel(Arc::new(Preferences::new()));

        PreferenceDataStore {
            inner: Arc::new(Inner {
                backend: self.backend,
                migrations: self.migrations,
                state: Mutex::new(None),
                tx,
            }),
        }
    }
}

/// Volatile store
pub type MemoryDataStore = PreferenceDataStore<MemoryBackend>;

/// Store persisted to a JSON file
pub type FileDataStore = PreferenceDataStore<FileBackend>;

/// Store persisted to a sled tree
pub type SledDataStore = PreferenceDataStore<SledBackend>;
