//! Single-file JSON backend
//!
//! The whole snapshot is written as one versioned JSON document with an md5
//! checksum over its data, using temp file + rename for atomic replacement.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use super::StorageBackend;
use crate::error::{Result, StoreError};
use crate::preferences::Preferences;
use crate::value::PreferenceValue;

/// Current on-disk format version
const FORMAT_VERSION: u32 = 1;

/// Versioned envelope around the persisted entries
#[derive(Debug, Serialize, Deserialize)]
struct VersionedData {
    /// Format version
    version: u32,
    /// Checksum for corruption detection
    checksum: String,
    /// The persisted entries
    data: BTreeMap<String, PreferenceValue>,
}

impl VersionedData {
    fn new(data: BTreeMap<String, PreferenceValue>) -> Result<Self> {
        let checksum = checksum(&data)?;
        Ok(Self { version: FORMAT_VERSION, checksum, data })
    }

    fn verify(&self) -> Result<()> {
        if self.version != FORMAT_VERSION {
            return Err(StoreError::Corruption(format!(
                "Unsupported format version: expected {}, found {}",
                FORMAT_VERSION, self.version
            )));
        }

        let computed = checksum(&self.data)?;
        if computed != self.checksum {
            return Err(StoreError::Corruption(format!(
                "Checksum mismatch: expected {}, got {}",
                self.checksum, computed
            )));
        }

        Ok(())
    }
}

fn checksum(data: &BTreeMap<String, PreferenceValue>) -> Result<String> {
    let json = serde_json::to_string(data)?;
    Ok(format!("{:x}", md5::compute(&json)))
}

/// File backend configuration
#[derive(Debug, Clone)]
pub struct FileStoreConfig {
    /// Path to the store file
    pub path: PathBuf,
    /// Enable atomic writes with temp files
    pub atomic_writes: bool,
    /// Start from an empty store instead of failing when the file is corrupt
    pub replace_on_corruption: bool,
}

impl Default for FileStoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("preferences.json"),
            atomic_writes: true,
            replace_on_corruption: false,
        }
    }
}

impl FileStoreConfig {
    /// Create a new configuration
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), ..Default::default() }
    }

    /// Enable or disable atomic writes
    pub fn atomic_writes(mut self, enabled: bool) -> Self {
        self.atomic_writes = enabled;
        self
    }

    /// Replace a corrupt file with an empty store instead of failing
    pub fn replace_on_corruption(mut self, enabled: bool) -> Self {
        self.replace_on_corruption = enabled;
        self
    }
}

/// Backend persisting the snapshot to a single JSON file
#[derive(Debug, Clone)]
pub struct FileBackend {
    config: FileStoreConfig,
}

impl FileBackend {
    /// Create a new file backend
    pub fn new(config: FileStoreConfig) -> Self {
        Self { config }
    }

    /// Get the backend configuration
    pub fn config(&self) -> &FileStoreConfig {
        &self.config
    }

    async fn read_file(&self) -> Result<Preferences> {
        let contents = match fs::read_to_string(&self.config.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Preferences::new());
            }
            Err(e) => return Err(e.into()),
        };

        let versioned: VersionedData = serde_json::from_str(&contents)
            .map_err(|e| StoreError::Corruption(format!("Unreadable store file: {}", e)))?;
        versioned.verify()?;

        Ok(Preferences::from_map(versioned.data))
    }

    /// Write atomically using temp file + rename
    async fn write_atomic(&self, contents: &str) -> Result<()> {
        let temp_path = self.config.path.with_extension("tmp");

        let mut file = fs::File::create(&temp_path).await?;
        file.write_all(contents.as_bytes()).await?;
        file.sync_all().await?;
        drop(file);

        fs::rename(&temp_path, &self.config.path).await?;

        Ok(())
    }
}

#[async_trait]
impl StorageBackend for FileBackend {
    async fn load(&self) -> Result<Preferences> {
        match self.read_file().await {
            Err(StoreError::Corruption(reason)) if self.config.replace_on_corruption => {
                tracing::warn!(
                    "Replacing corrupt store file {}: {}",
                    self.config.path.display(),
                    reason
                );
                Ok(Preferences::new())
            }
            result => result,
        }
    }

    async fn persist(&self, data: &Preferences) -> Result<()> {
        let versioned = VersionedData::new(data.as_map().clone())?;
        let json = serde_json::to_string_pretty(&versioned)?;

        if let Some(parent) = self.config.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        if self.config.atomic_writes {
            self.write_atomic(&json).await
        } else {
            fs::write(&self.config.path, json).await?;
            Ok(())
        }
    }
}
