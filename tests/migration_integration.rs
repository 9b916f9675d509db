//! Migration Integration Tests
//!
//! End-to-end tests of preference migrations run when a store is opened.

use datastore::{
    int_key, string_key, DataStore, DataStoreExt, FileDataStore, FileStoreConfig, MemoryBackend,
    MemoryDataStore, PreferenceDataStore, Preferences,
};
use futures::FutureExt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Once};
use tempfile::TempDir;
use tracing_subscriber::EnvFilter;
use typesafe::{
    cross_key_migration, cross_type_migration, custom_migration, raw_key_migration,
    same_key_migration, CustomMigration, IdentitySerializer, Preference, TypeSafeStore,
};
use typesafe_json::list_serializer;

static TRACING: Once = Once::new();

fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

fn old_to_new() -> CustomMigration {
    cross_type_migration(
        int_key("old"),
        string_key("new"),
        IdentitySerializer::new(0),
        IdentitySerializer::new(String::new()),
        |x: i32| Ok(x.to_string()),
    )
}

fn seeded(seed: impl FnOnce(&mut Preferences)) -> MemoryBackend {
    let mut prefs = Preferences::new();
    seed(&mut prefs);
    MemoryBackend::with_data(prefs)
}

fn counting_clean_up(migration: CustomMigration, counter: Arc<AtomicUsize>) -> CustomMigration {
    migration.on_clean_up(move || {
        let counter = counter.clone();
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            tracing::info!("Cleaned up after migration");
            Ok(())
        }
        .boxed()
    })
}

/// Test renaming an int key to a string key
#[tokio::test]
async fn test_int_to_string_rename() {
    init_tracing();
    let store = PreferenceDataStore::builder(seeded(|prefs| {
        prefs.set(&int_key("old"), 5);
    }))
    .migration(old_to_new())
    .build();

    let snapshot = store.snapshot().await.unwrap();
    assert!(!snapshot.contains(&int_key("old")));
    assert_eq!(snapshot.get(&string_key("new")), Some("5".to_string()));
    assert_eq!(snapshot.len(), 1);
}

/// Test a migration is persisted once and is a no-op on the next open
#[tokio::test]
async fn test_migration_persists_and_second_open_is_noop() {
    init_tracing();
    let temp_dir = TempDir::new().unwrap();
    let config = FileStoreConfig::new(temp_dir.path().join("settings.json"));
    let cleanups = Arc::new(AtomicUsize::new(0));

    {
        let store = FileDataStore::open(config.clone());
        store
            .edit(|prefs| {
                prefs.set(&int_key("old"), 5);
            })
            .await
            .unwrap();
    }

    for _ in 0..2 {
        let store = PreferenceDataStore::builder(datastore::FileBackend::new(config.clone()))
            .migration(counting_clean_up(old_to_new(), cleanups.clone()))
            .build();
        let prefs = TypeSafeStore::new(Arc::new(store));

        let new = prefs.create_primitive_preference(string_key("new"), String::new());
        let old = prefs.create_primitive_preference(int_key("old"), -1);
        assert_eq!(new.get().await.unwrap(), "5");
        assert_eq!(old.get().await.unwrap(), -1);
    }

    assert_eq!(cleanups.load(Ordering::SeqCst), 1);
}

/// Test a same-key migration with a predicate recognising migrated data
#[tokio::test]
async fn test_same_key_migration() {
    init_tracing();
    // Font sizes used to be stored as a scale factor in percent
    let migration = || {
        same_key_migration(
            string_key("font_size"),
            |prefs| {
                prefs
                    .get(&string_key("font_size"))
                    .map_or(false, |size| size.ends_with('%'))
            },
            |size| {
                let percent: u32 = size
                    .unwrap_or_default()
                    .trim_end_matches('%')
                    .parse()?;
                Ok(format!("{}px", percent * 16 / 100))
            },
        )
    };

    let store = PreferenceDataStore::builder(seeded(|prefs| {
        prefs.set(&string_key("font_size"), "150%".to_string());
    }))
    .migration(migration())
    .build();
    let snapshot = store.snapshot().await.unwrap();
    assert_eq!(snapshot.get(&string_key("font_size")), Some("24px".to_string()));

    // Running against the migrated state leaves it alone
    let again = PreferenceDataStore::builder(MemoryBackend::with_data(snapshot.clone()))
        .migration(migration())
        .build();
    assert_eq!(again.snapshot().await.unwrap(), snapshot);
}

/// Test migrations run in registration order
#[tokio::test]
async fn test_chained_migrations() {
    init_tracing();
    let store = PreferenceDataStore::builder(seeded(|prefs| {
        prefs.set(&int_key("v1"), 2);
    }))
    .migration(cross_key_migration(
        int_key("v1"),
        int_key("v2"),
        IdentitySerializer::new(0),
        |n| Ok(n * 10),
    ))
    .migration(raw_key_migration(int_key("v2"), string_key("v3"), |n: Option<i32>| {
        Ok(format!("level-{}", n.unwrap_or(0)))
    }))
    .build();

    let snapshot = store.snapshot().await.unwrap();
    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot.get(&string_key("v3")), Some("level-20".to_string()));
}

/// Test migrating a raw string into a JSON list
#[tokio::test]
async fn test_migrate_into_json_list() {
    init_tracing();
    let store = PreferenceDataStore::builder(seeded(|prefs| {
        prefs.set(&string_key("recent_csv"), "alpha,beta".to_string());
    }))
    .migration(cross_type_migration(
        string_key("recent_csv"),
        string_key("recent"),
        IdentitySerializer::new(String::new()),
        list_serializer::<String>(),
        |csv: String| Ok(csv.split(',').map(str::to_string).collect()),
    ))
    .build();

    let prefs = TypeSafeStore::new(Arc::new(store));
    let recent = prefs.create_complex_preference(string_key("recent"), list_serializer::<String>());
    assert_eq!(recent.get().await.unwrap(), vec!["alpha", "beta"]);
}

/// Test clean-up is skipped when the migration does not apply
#[tokio::test]
async fn test_clean_up_skipped_without_data() {
    init_tracing();
    let cleanups = Arc::new(AtomicUsize::new(0));
    let store = MemoryDataStore::builder(MemoryBackend::new())
        .migration(counting_clean_up(old_to_new(), cleanups.clone()))
        .build();

    assert!(store.snapshot().await.unwrap().is_empty());
    assert_eq!(cleanups.load(Ordering::SeqCst), 0);
}

/// Test a failing transform aborts the store open with a descriptive error
#[tokio::test]
async fn test_failed_migration_is_fatal() {
    init_tracing();
    let store = PreferenceDataStore::builder(seeded(|prefs| {
        prefs.set(&int_key("old"), 5);
    }))
    .migration(custom_migration(int_key("old"), string_key("new"), |_| {
        Err(anyhow::anyhow!("unsupported legacy format"))
    }))
    .build();

    let prefs = TypeSafeStore::new(Arc::new(store));
    let new = prefs.create_primitive_preference(string_key("new"), String::new());

    let err = new.get().await.unwrap_err();
    assert!(!err.is_transient());
    assert!(err
        .to_string()
        .contains("Could not migrate preference of key old to new: unsupported legacy format"));

    assert!(new.set("x".to_string()).await.is_err());

    let mut values = new.observe();
    assert!(futures::StreamExt::next(&mut values).await.unwrap().is_err());
    assert!(futures::StreamExt::next(&mut values).await.is_none());
}
