//! JSON-backed preferences
//!
//! Provides [`JsonSerializer`] for storing any serde type as a string
//! preference and [`AutoTypedStore`], a factory that picks serializers and
//! defaults for common types.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod auto_typed;
pub mod serializer;

pub use auto_typed::{AutoTypedStore, Json, Primitive};
pub use serializer::{json_serializer, list_serializer, map_serializer, set_serializer, JsonSerializer};
