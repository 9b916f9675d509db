//! Store-open data migrations
//!
//! Migrations are registered on a store when it is built and run once, the
//! first time the store is opened, before any reader or writer sees the data.

use async_trait::async_trait;

use crate::error::{Result, StoreError};
use crate::preferences::Preferences;

/// A one-time transformation of a store's key set
///
/// Implementations must not call back into the store they are registered
/// on: they run while the store holds its write lock and only operate on the
/// snapshot they are handed.
#[async_trait]
pub trait DataMigration: Send + Sync {
    /// Decide whether [`migrate`](Self::migrate) should run this session
    async fn should_migrate(&self, current: &Preferences) -> bool;

    /// Produce the migrated snapshot
    async fn migrate(&self, current: Preferences) -> anyhow::Result<Preferences>;

    /// Side effect run once after the migrated data has been persisted
    async fn clean_up(&self) -> anyhow::Result<()>;
}

/// Outcome of running the registered migrations over a loaded snapshot
pub(crate) struct MigrationRun<'a> {
    /// The migrated snapshot
    pub data: Preferences,
    /// Migrations that ran and still need their clean-up
    pub applied: Vec<&'a dyn DataMigration>,
}

/// Apply every migration whose predicate holds, in registration order
pub(crate) async fn run_migrations<'a>(
    migrations: &'a [Box<dyn DataMigration>],
    loaded: Preferences,
) -> Result<MigrationRun<'a>> {
    let mut data = loaded;
    let mut applied = Vec::new();

    for (index, migration) in migrations.iter().enumerate() {
        if !migration.should_migrate(&data).await {
            continue;
        }

        tracing::info!("Applying data migration {}", index);
        data = migration
            .migrate(data)
            .await
            .map_err(StoreError::migration)?;
        applied.push(&**migration);
    }

    Ok(MigrationRun { data, applied })
}

/// Run clean-up for every applied migration
///
/// All clean-ups run even if one fails; the first failure is returned.
pub(crate) async fn clean_up_migrations(applied: &[&dyn DataMigration]) -> Result<()> {
    let mut first_error = None;

    for migration in applied {
        if let Err(e) = migration.clean_up().await {
            tracing::error!("Migration clean-up failed: {:#}", e);
            first_error.get_or_insert(e);
        }
    }

    match first_error {
        Some(e) => Err(StoreError::migration(e)),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::int_key;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct Increment {
        cleanups: Arc<AtomicUsize>,
        fail_cleanup: bool,
    }

    #[async_trait]
    impl DataMigration for Increment {
        async fn should_migrate(&self, current: &Preferences) -> bool {
            current.get(&int_key("n")).unwrap_or(0) < 2
        }

        async fn migrate(&self, mut current: Preferences) -> anyhow::Result<Preferences> {
            let n = current.get(&int_key("n")).unwrap_or(0);
            current.set(&int_key("n"), n + 1);
            Ok(current)
        }

        async fn clean_up(&self) -> anyhow::Result<()> {
            self.cleanups.fetch_add(1, Ordering::SeqCst);
            if self.fail_cleanup {
                anyhow::bail!("cleanup failed");
            }
            Ok(())
        }
    }

    struct Reject;

    #[async_trait]
    impl DataMigration for Reject {
        async fn should_migrate(&self, _current: &Preferences) -> bool {
            true
        }

        async fn migrate(&self, _current: Preferences) -> anyhow::Result<Preferences> {
            anyhow::bail!("rejected")
        }

        async fn clean_up(&self) -> anyhow::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_migrations_run_in_order_with_predicates() {
        let cleanups = Arc::new(AtomicUsize::new(0));
        let migrations: Vec<Box<dyn DataMigration>> = (0..3)
            .map(|_| {
                Box::new(Increment { cleanups: cleanups.clone(), fail_cleanup: false })
                    as Box<dyn DataMigration>
            })
            .collect();

        let run = run_migrations(&migrations, Preferences::new()).await.unwrap();

        // Third migration sees n == 2 and is skipped
        assert_eq!(run.data.get(&int_key("n")), Some(2));
        assert_eq!(run.applied.len(), 2);

        clean_up_migrations(&run.applied).await.unwrap();
        assert_eq!(cleanups.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failing_migration_aborts() {
        let migrations: Vec<Box<dyn DataMigration>> = vec![Box::new(Reject)];

        let result = run_migrations(&migrations, Preferences::new()).await;
        assert!(matches!(result, Err(StoreError::Migration(_))));
    }

    #[tokio::test]
    async fn test_cleanup_failure_runs_all_and_reports_first() {
        let cleanups = Arc::new(AtomicUsize::new(0));
        let first = Increment { cleanups: cleanups.clone(), fail_cleanup: true };
        let second = Increment { cleanups: cleanups.clone(), fail_cleanup: false };
        let applied: Vec<&dyn DataMigration> = vec![&first, &second];

        let result = clean_up_migrations(&applied).await;
        assert!(matches!(result, Err(StoreError::Migration(_))));
        assert_eq!(cleanups.load(Ordering::SeqCst), 2);
    }
}
