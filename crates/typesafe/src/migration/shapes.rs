//! Common migration shapes built on [`custom_migration`]

use datastore::{Key, Preferences, StorableValue};
use std::sync::Arc;

use super::custom::{custom_migration, CustomMigration};
use crate::serializer::Serializer;

/// Reshape the raw value stored under `key` in place
///
/// `transform` receives the stored value (`None` when absent) and its result
/// is written back under the same key. The key stays present after the
/// migration, so `should_migrate` must recognise data that was already
/// migrated; otherwise the migration runs on every open.
pub fn same_key_migration<R, P, F>(key: Key<R>, should_migrate: P, transform: F) -> CustomMigration
where
    R: StorableValue,
    P: Fn(&Preferences) -> bool + Send + Sync + 'static,
    F: Fn(Option<R>) -> anyhow::Result<R> + Send + Sync + 'static,
{
    let slot = key.clone();

    custom_migration(key.clone(), key, move |mut prefs: Preferences| {
        let current = prefs.remove(&slot);
        prefs.set(&slot, transform(current)?);
        Ok(prefs)
    })
    .should_migrate_when(should_migrate)
}

/// Move a value to a new key, transforming it with one serializer
pub fn cross_key_migration<S, F>(
    current_key: Key<S::Raw>,
    new_key: Key<S::Raw>,
    serializer: S,
    transform: F,
) -> CustomMigration
where
    S: Serializer,
    F: Fn(S::Value) -> anyhow::Result<S::Value> + Send + Sync + 'static,
{
    let serializer = Arc::new(serializer);
    cross_type_migration(current_key, new_key, Arc::clone(&serializer), serializer, transform)
}

/// Move a value to a new key and type
///
/// The stored value is removed from `current_key`, decoded with
/// `current_serializer` (its default when absent), transformed, encoded with
/// `new_serializer` and written to `new_key`.
pub fn cross_type_migration<CS, NS, F>(
    current_key: Key<CS::Raw>,
    new_key: Key<NS::Raw>,
    current_serializer: CS,
    new_serializer: NS,
    transform: F,
) -> CustomMigration
where
    CS: Serializer,
    NS: Serializer,
    F: Fn(CS::Value) -> anyhow::Result<NS::Value> + Send + Sync + 'static,
{
    let from = current_key.clone();
    let to = new_key.clone();

    custom_migration(current_key, new_key, move |mut prefs: Preferences| {
        let current = match prefs.remove(&from) {
            Some(raw) => current_serializer.decode(raw),
            None => current_serializer.default(),
        };
        let migrated = transform(current)?;
        prefs.set(&to, new_serializer.encode(&migrated));
        Ok(prefs)
    })
}

/// Move a raw value to a new key without serializers
///
/// `transform` receives the stored value, or `None` when it is absent or of
/// another kind.
pub fn raw_key_migration<R, NR, F>(current_key: Key<R>, new_key: Key<NR>, transform: F) -> CustomMigration
where
    R: StorableValue,
    NR: StorableValue,
    F: Fn(Option<R>) -> anyhow::Result<NR> + Send + Sync + 'static,
{
    let from = current_key.clone();
    let to = new_key.clone();

    custom_migration(current_key, new_key, move |mut prefs: Preferences| {
        let current = prefs.remove(&from);
        prefs.set(&to, transform(current)?);
        Ok(prefs)
    })
}
