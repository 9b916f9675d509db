//! The migration primitive every helper is built on

use async_trait::async_trait;
use datastore::{DataMigration, Key, Preferences, StorableValue};
use futures::future::BoxFuture;
use std::fmt;

use crate::error::MigrationError;

type MigrateFn = Box<dyn Fn(Preferences) -> anyhow::Result<Preferences> + Send + Sync>;
type PredicateFn = Box<dyn Fn(&Preferences) -> bool + Send + Sync>;
type CleanUpFn = Box<dyn Fn() -> BoxFuture<'static, anyhow::Result<()>> + Send + Sync>;

/// Migration moving a value from one key to another
///
/// Runs when the store is opened. By default it applies while the snapshot
/// still contains `current_key` and its clean-up does nothing.
pub struct CustomMigration {
    current_key: String,
    new_key: String,
    should_migrate: PredicateFn,
    migrate: MigrateFn,
    clean_up: Option<CleanUpFn>,
}

/// Build a migration from `current_key` to `new_key`
///
/// `transform` receives the whole snapshot and returns the migrated one. Its
/// errors are reported as [`MigrationError::Transform`] and abort the store's
/// open sequence. It must not read or write the store through preferences.
pub fn custom_migration<C, N, F>(current_key: Key<C>, new_key: Key<N>, transform: F) -> CustomMigration
where
    C: StorableValue,
    N: StorableValue,
    F: Fn(Preferences) -> anyhow::Result<Preferences> + Send + Sync + 'static,
{
    let present = current_key.clone();

    CustomMigration {
        current_key: current_key.name().to_string(),
        new_key: new_key.name().to_string(),
        should_migrate: Box::new(move |prefs| prefs.contains(&present)),
        migrate: Box::new(transform),
        clean_up: None,
    }
}

impl CustomMigration {
    /// Replace the predicate deciding whether the migration runs
    pub fn should_migrate_when<P>(mut self, predicate: P) -> Self
    where
        P: Fn(&Preferences) -> bool + Send + Sync + 'static,
    {
        self.should_migrate = Box::new(predicate);
        self
    }

    /// Run `clean_up` once after the migrated data has been persisted
    pub fn on_clean_up<F>(mut self, clean_up: F) -> Self
    where
        F: Fn() -> BoxFuture<'static, anyhow::Result<()>> + Send + Sync + 'static,
    {
        self.clean_up = Some(Box::new(clean_up));
        self
    }

    /// Key the value is read from
    pub fn current_key(&self) -> &str {
        &self.current_key
    }

    /// Key the value is written to
    pub fn new_key(&self) -> &str {
        &self.new_key
    }
}

impl fmt::Debug for CustomMigration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomMigration")
            .field("current_key", &self.current_key)
            .field("new_key", &self.new_key)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl DataMigration for CustomMigration {
    async fn should_migrate(&self, current: &Preferences) -> bool {
        (self.should_migrate)(current)
    }

    async fn migrate(&self, current: Preferences) -> anyhow::Result<Preferences> {
        tracing::info!("Migrating preference {} to {}", self.current_key, self.new_key);

        (self.migrate)(current).map_err(|source| {
            MigrationError::Transform {
                current_key: self.current_key.clone(),
                new_key: self.new_key.clone(),
                source: source.into(),
            }
            .into()
        })
    }

    async fn clean_up(&self) -> anyhow::Result<()> {
        match &self.clean_up {
            Some(clean_up) => clean_up().await,
            None => Ok(()),
        }
    }
}
