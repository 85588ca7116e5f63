//! Database abstraction layer
//!
//! This module provides a database-agnostic interface for catalog discovery,
//! whole-table reads and single-statement mutations.

#[cfg(any(feature = "sqlite", feature = "postgres", feature = "mysql"))]
use serde_json::Value;

pub mod traits;

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(feature = "postgres")]
pub mod postgres;

#[cfg(feature = "mysql")]
pub mod mysql;

// Re-export the main trait
pub use traits::{DatabaseError, DatabaseProvider};

/// Placeholder shown instead of binary column contents
#[cfg(any(feature = "sqlite", feature = "postgres", feature = "mysql"))]
pub(crate) fn blob_marker(bytes: &[u8]) -> Value {
    Value::String(format!("[BLOB: {} bytes]", bytes.len()))
}

/// JSON number from a float, or null for NaN/infinity
#[cfg(any(feature = "sqlite", feature = "postgres", feature = "mysql"))]
pub(crate) fn float_value(value: f64) -> Value {
    serde_json::Number::from_f64(value)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}
