//! Typed keys
//!
//! A [`Key`] addresses one slot of a store by name and pins the primitive
//! type stored there.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::value::{StorableValue, ValueKind};
use std::collections::BTreeSet;

/// Store-level identifier with a declared primitive type
///
/// Names are expected to be unique within one store. Declaring two keys with
/// the same name and different types is not detected; reads through the
/// mismatched key behave as if the slot were empty.
pub struct Key<R> {
    name: Arc<str>,
    _kind: PhantomData<fn() -> R>,
}

impl<R: StorableValue> Key<R> {
    /// Create a new key
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self { name: name.into(), _kind: PhantomData }
    }

    /// Get the key name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the kind of value stored under this key
    pub fn kind(&self) -> ValueKind {
        R::KIND
    }
}

impl<R> Clone for Key<R> {
    fn clone(&self) -> Self {
        Self { name: Arc::clone(&self.name), _kind: PhantomData }
    }
}

impl<R> PartialEq for Key<R> {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl<R> Eq for Key<R> {}

impl<R: StorableValue> fmt::Debug for Key<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Key")
            .field("name", &self.name)
            .field("kind", &R::KIND)
            .finish()
    }
}

impl<R> fmt::Display for Key<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Declare a `bool` key
pub fn bool_key(name: impl Into<Arc<str>>) -> Key<bool> {
    Key::new(name)
}

/// Declare an `i32` key
pub fn int_key(name: impl Into<Arc<str>>) -> Key<i32> {
    Key::new(name)
}

/// Declare an `i64` key
pub fn long_key(name: impl Into<Arc<str>>) -> Key<i64> {
    Key::new(name)
}

/// Declare an `f32` key
pub fn float_key(name: impl Into<Arc<str>>) -> Key<f32> {
    Key::new(name)
}

/// Declare an `f64` key
pub fn double_key(name: impl Into<Arc<str>>) -> Key<f64> {
    Key::new(name)
}

/// Declare a `String` key
pub fn string_key(name: impl Into<Arc<str>>) -> Key<String> {
    Key::new(name)
}

/// Declare a string-set key
pub fn string_set_key(name: impl Into<Arc<str>>) -> Key<BTreeSet<String>> {
    Key::new(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_name_and_kind() {
        let key = int_key("launch_count");
        assert_eq!(key.name(), "launch_count");
        assert_eq!(key.kind(), ValueKind::Int);
        assert_eq!(key.to_string(), "launch_count");
    }

    #[test]
    fn test_key_equality_by_name() {
        let a = string_key("theme");
        let b = a.clone();
        assert_eq!(a, b);
        assert_ne!(a, string_key("language"));
    }
}
