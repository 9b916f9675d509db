//! Sled-backed key-value backend
//!
//! Each preference is one entry in a sled tree, keyed by its name and holding
//! the JSON encoding of its [`PreferenceValue`]. Snapshots are persisted as a
//! single atomic batch containing only the entries that changed.

use async_trait::async_trait;
use sled::{Batch, Db, Tree};
use std::collections::BTreeMap;
use std::sync::Arc;

use super::StorageBackend;
use crate::error::{Result, StoreError};
use crate::preferences::Preferences;
use crate::value::PreferenceValue;

/// Sled backend configuration
#[derive(Debug, Clone)]
pub struct SledStoreConfig {
    /// Database path
    pub path: String,
    /// Name of the tree holding the preferences
    pub tree: String,
    /// Cache capacity in bytes
    pub cache_capacity: u64,
    /// Enable compression
    pub use_compression: bool,
    /// Flush interval in milliseconds (None for flushing only on persist)
    pub flush_every_ms: Option<u64>,
    /// Delete the database when it is dropped (for testing)
    pub temporary: bool,
}

impl Default for SledStoreConfig {
    fn default() -> Self {
        Self {
            path: "preferences.db".to_string(),
            tree: "preferences".to_string(),
            cache_capacity: 8 * 1024 * 1024, // 8MB
            use_compression: true,
            flush_every_ms: Some(500),
            temporary: false,
        }
    }
}

impl SledStoreConfig {
    /// Create a new configuration with a custom path
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into(), ..Default::default() }
    }

    /// Create a configuration for a temporary database
    pub fn temporary() -> Self {
        Self { temporary: true, ..Default::default() }
    }

    /// Set the tree name
    pub fn tree(mut self, name: impl Into<String>) -> Self {
        self.tree = name.into();
        self
    }

    /// Set cache capacity in bytes
    pub fn cache_capacity(mut self, bytes: u64) -> Self {
        self.cache_capacity = bytes;
        self
    }

    /// Enable or disable compression
    pub fn use_compression(mut self, enabled: bool) -> Self {
        self.use_compression = enabled;
        self
    }

    /// Set flush interval in milliseconds
    pub fn flush_every_ms(mut self, ms: Option<u64>) -> Self {
        self.flush_every_ms = ms;
        self
    }
}

/// Backend persisting preferences into a sled tree
#[derive(Clone)]
pub struct SledBackend {
    db: Arc<Db>,
    tree: Tree,
}

impl SledBackend {
    /// Open the sled database described by `config`
    pub fn open(config: &SledStoreConfig) -> Result<Self> {
        let mut db_config = sled::Config::new()
            .cache_capacity(config.cache_capacity)
            .use_compression(config.use_compression)
            .flush_every_ms(config.flush_every_ms);

        db_config = if config.temporary {
            db_config.temporary(true)
        } else {
            db_config.path(&config.path)
        };

        let db = db_config.open()?;
        Self::from_db(Arc::new(db), &config.tree)
    }

    /// Use a tree of an already opened database
    pub fn from_db(db: Arc<Db>, tree: &str) -> Result<Self> {
        let tree = db.open_tree(tree)?;
        Ok(Self { db, tree })
    }

    /// Get the underlying database
    pub fn db(&self) -> &Arc<Db> {
        &self.db
    }
}

fn read_tree(tree: &Tree) -> Result<BTreeMap<String, PreferenceValue>> {
    let mut entries = BTreeMap::new();

    for item in tree.iter() {
        let (key, value) = item?;
        let name = String::from_utf8(key.to_vec())
            .map_err(|e| StoreError::Corruption(format!("Non UTF-8 preference name: {}", e)))?;
        let value: PreferenceValue = serde_json::from_slice(&value)?;
        entries.insert(name, value);
    }

    Ok(entries)
}

/// Apply the difference between the tree and `data` as one batch, returning the change count
fn write_diff(tree: &Tree, data: &Preferences) -> Result<usize> {
    let stored = read_tree(tree)?;
    let mut batch = Batch::default();
    let mut changes = 0usize;

    for name in stored.keys() {
        if !data.as_map().contains_key(name) {
            batch.remove(name.as_bytes());
            changes += 1;
        }
    }

    for (name, value) in data {
        if stored.get(name) != Some(value) {
            batch.insert(name.as_bytes(), serde_json::to_vec(value)?);
            changes += 1;
        }
    }

    if changes > 0 {
        tree.apply_batch(batch)?;
        tree.flush()?;
    }

    Ok(changes)
}

/// Run blocking sled work off the async worker threads
async fn blocking<T, F>(work: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| StoreError::Io(std::io::Error::new(std::io::ErrorKind::Other, e)))?
}

#[async_trait]
impl StorageBackend for SledBackend {
    async fn load(&self) -> Result<Preferences> {
        let tree = self.tree.clone();
        let entries = blocking(move || read_tree(&tree)).await?;
        Ok(Preferences::from_map(entries))
    }

    async fn persist(&self, data: &Preferences) -> Result<()> {
        let tree = self.tree.clone();
        let data = data.clone();
        let changes = blocking(move || write_diff(&tree, &data)).await?;

        if changes > 0 {
            tracing::debug!("Persisted {} preference changes", changes);
        }

        Ok(())
    }
}
