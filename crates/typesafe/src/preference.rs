//! The typed preference contract

use async_trait::async_trait;
use datastore::StorableValue;
use futures::stream::BoxStream;

use crate::error::Result;

/// Stream of values emitted by [`Preference::observe`]
pub type PreferenceStream<T> = BoxStream<'static, Result<T>>;

/// Typed accessor for one logical key of a store
///
/// Reads never fail on missing or unreadable values: those yield the
/// serializer's default. Writes report every store failure through the
/// returned `Result`.
#[async_trait]
pub trait Preference: Send + Sync {
    /// The application-facing type
    type Value: Clone + Send + Sync + 'static;

    /// The type held by the store
    type Raw: StorableValue;

    /// Read the current value
    ///
    /// Transient store failures yield the default; other failures are
    /// returned as errors.
    async fn get(&self) -> Result<Self::Value>;

    /// Observe the value
    ///
    /// Emits the current value on subscription and again after each committed
    /// write. Consecutive writes may be coalesced. Every call starts a new
    /// subscription.
    fn observe(&self) -> PreferenceStream<Self::Value>;

    /// Replace the stored value
    async fn set(&self, value: Self::Value) -> Result<()>;

    /// Atomically replace the value with `update(current)`
    ///
    /// `update` runs inside the store's transaction and must not touch the
    /// store itself.
    async fn get_and_update<F>(&self, update: F) -> Result<()>
    where
        F: FnOnce(Self::Value) -> Self::Value + Send + 'static;
}

/// A preference whose value is stored as-is
pub trait PrimitivePreference<T>: Preference<Value = T, Raw = T> {}

impl<T, P> PrimitivePreference<T> for P
where
    T: StorableValue,
    P: Preference<Value = T, Raw = T> + ?Sized,
{
}

/// A preference whose value is stored as an encoded string
pub trait ComplexPreference<T>: Preference<Value = T, Raw = String> {}

impl<T, P> ComplexPreference<T> for P
where
    T: Clone + Send + Sync + 'static,
    P: Preference<Value = T, Raw = String> + ?Sized,
{
}
