//! Fixed-value preferences

use async_trait::async_trait;
use datastore::StorableValue;
use futures::stream::{self, StreamExt};
use std::fmt;
use std::marker::PhantomData;
use typesafe::{Preference, PreferenceStream, Result};

/// Preference that always reads the same value
///
/// `observe` emits the value once and ends. Writes succeed and are ignored.
pub struct MockPreference<T, R> {
    value: T,
    _raw: PhantomData<fn() -> R>,
}

impl<T: Clone, R> Clone for MockPreference<T, R> {
    fn clone(&self) -> Self {
        Self { value: self.value.clone(), _raw: PhantomData }
    }
}

impl<T: fmt::Debug, R> fmt::Debug for MockPreference<T, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockPreference").field("value", &self.value).finish()
    }
}

/// Mock any preference
pub fn mock_preference<T, R>(value: T) -> MockPreference<T, R>
where
    T: Clone + Send + Sync + 'static,
    R: StorableValue,
{
    MockPreference { value, _raw: PhantomData }
}

/// Mock a preference whose value is stored as-is
pub fn mock_primitive_preference<T: StorableValue>(value: T) -> MockPreference<T, T> {
    mock_preference(value)
}

/// Mock a preference whose value is stored as a string
pub fn mock_complex_preference<T>(value: T) -> MockPreference<T, String>
where
    T: Clone + Send + Sync + 'static,
{
    mock_preference(value)
}

#[async_trait]
impl<T, R> Preference for MockPreference<T, R>
where
    T: Clone + Send + Sync + 'static,
    R: StorableValue,
{
    type Value = T;
    type Raw = R;

    async fn get(&self) -> Result<T> {
        Ok(self.value.clone())
    }

    fn observe(&self) -> PreferenceStream<T> {
        stream::once(futures::future::ready(Ok(self.value.clone()))).boxed()
    }

    async fn set(&self, _value: T) -> Result<()> {
        Ok(())
    }

    async fn get_and_update<F>(&self, _update: F) -> Result<()>
    where
        F: FnOnce(T) -> T + Send + 'static,
    {
        Ok(())
    }
}
