//! Type-safe preferences
//!
//! This crate binds typed keys and serializers to an observable
//! [`DataStore`](datastore::DataStore), exposing each key as a [`Preference`]
//! with `get`, `observe`, `set` and `get_and_update`, and provides helpers
//! for writing store-open migrations.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod factory;
pub mod migration;
pub mod preference;
pub mod serializer;
pub mod store_preference;

pub use error::{MigrationError, PreferenceError, Result};
pub use factory::TypeSafeStore;
pub use migration::{
    cross_key_migration, cross_type_migration, custom_migration, raw_key_migration,
    same_key_migration, CustomMigration,
};
pub use preference::{ComplexPreference, Preference, PreferenceStream, PrimitivePreference};
pub use serializer::{serializer_from_fn, FnSerializer, IdentitySerializer, Serializer};
pub use store_preference::StorePreference;
