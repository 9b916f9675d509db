//! Helpers building store-open migrations for preferences
//!
//! Every helper returns a [`CustomMigration`], which implements
//! [`DataMigration`](datastore::DataMigration) and is registered on the store
//! with [`DataStoreBuilder::migration`](datastore::DataStoreBuilder::migration).

mod custom;
mod shapes;

pub use custom::{custom_migration, CustomMigration};
pub use shapes::{cross_key_migration, cross_type_migration, raw_key_migration, same_key_migration};
