//! Volatile in-memory backend

use async_trait::async_trait;

use super::StorageBackend;
use crate::error::Result;
use crate::preferences::Preferences;

/// Backend that keeps nothing across process restarts
///
/// The store already caches the committed snapshot, so persisting is a no-op
/// and loading returns the seed the backend was created with.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    seed: Preferences,
}

impl MemoryBackend {
    /// Create an empty in-memory backend
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an in-memory backend pre-populated with `seed`
    pub fn with_data(seed: Preferences) -> Self {
        Self { seed }
    }
}

#[async_trait]
impl StorageBackend for MemoryBackend {
    async fn load(&self) -> Result<Preferences> {
        Ok(self.seed.clone())
    }

    async fn persist(&self, _data: &Preferences) -> Result<()> {
        Ok(())
    }
}
