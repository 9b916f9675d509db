//! Stateful preferences without a backing store

use async_trait::async_trait;
use datastore::{StorableValue, StoreError};
use futures::stream::{self, StreamExt};
use std::io;
use std::marker::PhantomData;
use tokio::sync::watch;
use typesafe::{Preference, PreferenceError, PreferenceStream, Result};

/// Preference keeping its value in memory
///
/// Writes are visible to `get` and to every `observe` stream.
pub struct InMemoryPreference<T, R> {
    tx: watch::Sender<T>,
    _raw: PhantomData<fn() -> R>,
}

impl<T, R> InMemoryPreference<T, R>
where
    T: Clone + Send + Sync + 'static,
    R: StorableValue,
{
    /// Create a preference holding `initial`
    pub fn new(initial: T) -> Self {
        let (tx, _) = watch::channel(initial);
        Self { tx, _raw: PhantomData }
    }
}

#[async_trait]
impl<T, R> Preference for InMemoryPreference<T, R>
where
    T: Clone + Send + Sync + 'static,
    R: StorableValue,
{
    type Value = T;
    type Raw = R;

    async fn get(&self) -> Result<T> {
        Ok(self.tx.borrow().clone())
    }

    fn observe(&self) -> PreferenceStream<T> {
        let mut rx = self.tx.subscribe();
        let current = rx.borrow_and_update().clone();

        stream::once(futures::future::ready(Ok(current)))
            .chain(stream::unfold(rx, |mut rx| async move {
                rx.changed().await.ok()?;
                let value = rx.borrow_and_update().clone();
                Some((Ok(value), rx))
            }))
            .boxed()
    }

    async fn set(&self, value: T) -> Result<()> {
        self.tx.send_replace(value);
        Ok(())
    }

    async fn get_and_update<F>(&self, update: F) -> Result<()>
    where
        F: FnOnce(T) -> T + Send + 'static,
    {
        self.tx.send_modify(|value| *value = update(value.clone()));
        Ok(())
    }
}

/// Preference whose writes always fail
///
/// Reads return the default. Writes return a transient store error, as a
/// real store would on a failing disk.
pub struct FailingPreference<T, R> {
    default: T,
    kind: io::ErrorKind,
    _raw: PhantomData<fn() -> R>,
}

impl<T, R> FailingPreference<T, R>
where
    T: Clone + Send + Sync + 'static,
    R: StorableValue,
{
    /// Create a failing preference reading `default`
    pub fn new(default: T) -> Self {
        Self { default, kind: io::ErrorKind::Other, _raw: PhantomData }
    }

    /// Set the kind of I/O error writes fail with
    pub fn with_error_kind(mut self, kind: io::ErrorKind) -> Self {
        self.kind = kind;
        self
    }

    fn error(&self) -> PreferenceError {
        StoreError::Io(io::Error::new(self.kind, "simulated store failure")).into()
    }
}

#[async_trait]
impl<T, R> Preference for FailingPreference<T, R>
where
    T: Clone + Send + Sync + 'static,
    R: StorableValue,
{
    type Value = T;
    type Raw = R;

    async fn get(&self) -> Result<T> {
        Ok(self.default.clone())
    }

    fn observe(&self) -> PreferenceStream<T> {
        stream::once(futures::future::ready(Ok(self.default.clone()))).boxed()
    }

    async fn set(&self, _value: T) -> Result<()> {
        Err(self.error())
    }

    async fn get_and_update<F>(&self, _update: F) -> Result<()>
    where
        F: FnOnce(T) -> T + Send + 'static,
    {
        Err(self.error())
    }
}
