//! Storable primitive values
//!
//! Every slot in a preferences store holds exactly one [`PreferenceValue`].
//! The [`StorableValue`] trait ties each supported Rust primitive to its
//! variant so that keys can be declared with a static type.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// A primitive value as it is held by the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PreferenceValue {
    /// Boolean value
    Bool(bool),
    /// 32-bit signed integer
    Int(i32),
    /// 64-bit signed integer
    Long(i64),
    /// 32-bit float
    #[serde(with = "float_repr")]
    Float(f32),
    /// 64-bit float
    #[serde(with = "double_repr")]
    Double(f64),
    /// UTF-8 string
    String(String),
    /// Ordered set of strings
    StringSet(BTreeSet<String>),
}

/// JSON has no literal for NaN or the infinities, so those are written as
/// the strings `"NaN"`, `"inf"` and `"-inf"`
mod non_finite {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Number(f64),
        Text(String),
    }

    pub(super) fn to_text(value: f64) -> &'static str {
        if value.is_nan() {
            "NaN"
        } else if value.is_sign_positive() {
            "inf"
        } else {
            "-inf"
        }
    }

    pub(super) fn read<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        match Repr::deserialize(deserializer)? {
            Repr::Number(value) => Ok(value),
            Repr::Text(text) => match text.as_str() {
                "NaN" => Ok(f64::NAN),
                "inf" => Ok(f64::INFINITY),
                "-inf" => Ok(f64::NEG_INFINITY),
                other => Err(D::Error::custom(format!("invalid float value: {:?}", other))),
            },
        }
    }
}

mod float_repr {
    use serde::{Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &f32, serializer: S) -> Result<S::Ok, S::Error> {
        if value.is_finite() {
            serializer.serialize_f32(*value)
        } else {
            serializer.serialize_str(super::non_finite::to_text(f64::from(*value)))
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f32, D::Error> {
        super::non_finite::read(deserializer).map(|value| value as f32)
    }
}

mod double_repr {
    use serde::{Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if value.is_finite() {
            serializer.serialize_f64(*value)
        } else {
            serializer.serialize_str(super::non_finite::to_text(*value))
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        super::non_finite::read(deserializer)
    }
}

impl PreferenceValue {
    /// Get the kind of this value
    pub fn kind(&self) -> ValueKind {
        match self {
            PreferenceValue::Bool(_) => ValueKind::Bool,
            PreferenceValue::Int(_) => ValueKind::Int,
            PreferenceValue::Long(_) => ValueKind::Long,
            PreferenceValue::Float(_) => ValueKind::Float,
            PreferenceValue::Double(_) => ValueKind::Double,
            PreferenceValue::String(_) => ValueKind::String,
            PreferenceValue::StringSet(_) => ValueKind::StringSet,
        }
    }
}

/// Discriminant of a [`PreferenceValue`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// `bool`
    Bool,
    /// `i32`
    Int,
    /// `i64`
    Long,
    /// `f32`
    Float,
    /// `f64`
    Double,
    /// `String`
    String,
    /// `BTreeSet<String>`
    StringSet,
}

impl ValueKind {
    /// Get a short lowercase name for diagnostics
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueKind::Bool => "bool",
            ValueKind::Int => "int",
            ValueKind::Long => "long",
            ValueKind::Float => "float",
            ValueKind::Double => "double",
            ValueKind::String => "string",
            ValueKind::StringSet => "string_set",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A Rust type that can be stored directly in a preferences store
pub trait StorableValue: Clone + Send + Sync + 'static {
    /// The kind every value of this type is stored as
    const KIND: ValueKind;

    /// Wrap into a [`PreferenceValue`]
    fn into_value(self) -> PreferenceValue;

    /// Unwrap from a [`PreferenceValue`], returning `None` on a kind mismatch
    fn from_value(value: &PreferenceValue) -> Option<Self>;
}

macro_rules! impl_storable {
    ($ty:ty, $variant:ident) => {
        impl StorableValue for $ty {
            const KIND: ValueKind = ValueKind::$variant;

            fn into_value(self) -> PreferenceValue {
                PreferenceValue::$variant(self)
            }

            fn from_value(value: &PreferenceValue) -> Option<Self> {
                match value {
                    PreferenceValue::$variant(v) => Some(v.clone()),
                    _ => None,
                }
            }
        }
    };
}

impl_storable!(bool, Bool);
impl_storable!(i32, Int);
impl_storable!(i64, Long);
impl_storable!(f32, Float);
impl_storable!(f64, Double);
impl_storable!(String, String);
impl_storable!(BTreeSet<String>, StringSet);
