//! Test doubles for preferences
//!
//! Use these in place of store-backed preferences when unit testing code that
//! consumes the [`Preference`](typesafe::Preference) trait.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod in_memory;
pub mod mock;

pub use in_memory::{FailingPreference, InMemoryPreference};
pub use mock::{mock_complex_preference, mock_preference, mock_primitive_preference, MockPreference};
