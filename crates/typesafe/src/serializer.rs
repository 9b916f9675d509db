//! Conversions between application values and stored raw values

use datastore::StorableValue;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// Bidirectional conversion between a value type and a storable raw type
///
/// Implementations must satisfy `decode(encode(x)) == x` for every value they
/// are handed. `decode` never fails: a raw value that cannot be read back
/// should yield [`default`](Self::default).
pub trait Serializer: Send + Sync + 'static {
    /// The application-facing type
    type Value: Clone + Send + Sync + 'static;

    /// The type actually stored
    type Raw: StorableValue;

    /// Convert a value into its stored form
    fn encode(&self, value: &Self::Value) -> Self::Raw;

    /// Convert a stored value back
    fn decode(&self, raw: Self::Raw) -> Self::Value;

    /// Value used when nothing (readable) is stored
    fn default(&self) -> Self::Value;
}

impl<S: Serializer + ?Sized> Serializer for Arc<S> {
    type Value = S::Value;
    type Raw = S::Raw;

    fn encode(&self, value: &Self::Value) -> Self::Raw {
        (**self).encode(value)
    }

    fn decode(&self, raw: Self::Raw) -> Self::Value {
        (**self).decode(raw)
    }

    fn default(&self) -> Self::Value {
        (**self).default()
    }
}

/// Serializer for values the store holds natively
#[derive(Debug, Clone, PartialEq)]
pub struct IdentitySerializer<R> {
    default: R,
}

impl<R: StorableValue> IdentitySerializer<R> {
    /// Create a serializer that stores values as-is
    pub fn new(default: R) -> Self {
        Self { default }
    }
}

impl<R: StorableValue> Serializer for IdentitySerializer<R> {
    type Value = R;
    type Raw = R;

    fn encode(&self, value: &R) -> R {
        value.clone()
    }

    fn decode(&self, raw: R) -> R {
        raw
    }

    fn default(&self) -> R {
        self.default.clone()
    }
}

/// Serializer built from a pair of closures
pub struct FnSerializer<T, R, D, E> {
    decode: D,
    encode: E,
    default: T,
    _raw: PhantomData<fn() -> R>,
}

impl<T, R, D, E> fmt::Debug for FnSerializer<T, R, D, E>
where
    T: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnSerializer")
            .field("default", &self.default)
            .finish_non_exhaustive()
    }
}

/// Build a serializer from `decode` and `encode` closures and a default
///
/// ```
/// use typesafe::{serializer_from_fn, Serializer};
///
/// let celsius = serializer_from_fn(
///     |raw: i32| f64::from(raw) / 10.0,
///     |value: &f64| (value * 10.0).round() as i32,
///     20.0,
/// );
/// assert_eq!(celsius.encode(&21.5), 215);
/// assert_eq!(celsius.decode(215), 21.5);
/// ```
pub fn serializer_from_fn<T, R, D, E>(decode: D, encode: E, default: T) -> FnSerializer<T, R, D, E>
where
    T: Clone + Send + Sync + 'static,
    R: StorableValue,
    D: Fn(R) -> T + Send + Sync + 'static,
    E: Fn(&T) -> R + Send + Sync + 'static,
{
    FnSerializer { decode, encode, default, _raw: PhantomData }
}

impl<T, R, D, E> Serializer for FnSerializer<T, R, D, E>
where
    T: Clone + Send + Sync + 'static,
    R: StorableValue,
    D: Fn(R) -> T + Send + Sync + 'static,
    E: Fn(&T) -> R + Send + Sync + 'static,
{
    type Value = T;
    type Raw = R;

    fn encode(&self, value: &T) -> R {
        (self.encode)(value)
    }

    fn decode(&self, raw: R) -> T {
        (self.decode)(raw)
    }

    fn default(&self) -> T {
        self.default.clone()
    }
}
