//! Observable key-value data store
//!
//! This crate provides the untyped storage layer underneath typed
//! preferences: typed keys, immutable snapshots, transactional updates,
//! change streams, store-open migrations and pluggable persistence backends.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod backend;
pub mod error;
pub mod key;
pub mod migration;
pub mod preferences;
pub mod store;
pub mod value;

pub use backend::{
    FileBackend, FileStoreConfig, MemoryBackend, SledBackend, SledStoreConfig, StorageBackend,
};
pub use error::{Result, StoreError};
pub use key::{
    bool_key, double_key, float_key, int_key, long_key, string_key, string_set_key, Key,
};
pub use migration::DataMigration;
pub use preferences::Preferences;
pub use store::{
    DataStore, DataStoreBuilder, DataStoreExt, DataStream, FileDataStore, MemoryDataStore,
    PreferenceDataStore, SledDataStore, Transform,
};
pub use value::{PreferenceValue, StorableValue, ValueKind};
