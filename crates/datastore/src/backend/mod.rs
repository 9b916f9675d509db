//! Storage backends
//!
//! A backend only knows how to load and persist a whole snapshot. Locking,
//! change notification and migrations live in
//! [`PreferenceDataStore`](crate::PreferenceDataStore).

use async_trait::async_trait;

use crate::error::Result;
use crate::preferences::Preferences;

pub mod file;
pub mod memory;
pub mod kv;

pub use self::file::{FileBackend, FileStoreConfig};
pub use self::memory::MemoryBackend;
pub use self::kv::{SledBackend, SledStoreConfig};

/// Persistence primitive underneath a data store
#[async_trait]
pub trait StorageBackend: Send + Sync + 'static {
    /// Load the persisted snapshot, or an empty one if nothing was stored yet
    async fn load(&self) -> Result<Preferences>;

    /// Replace the persisted snapshot atomically
    async fn persist(&self, data: &Preferences) -> Result<()>;
}
