//! # axum-table-crud
//!
//! Generic CRUD over every table of a SQL database, exposed as an Axum router.
//!
//! ## Features
//!
//! - Table discovery through the database's own catalog
//! - Concurrent snapshot of every table in one request
//! - Insert/update/delete driven by JSON payloads instead of compiled schema
//! - Primary keys resolved per request from key-constraint metadata
//! - Every value bound as a statement parameter
//! - Support for SQLite, PostgreSQL and MySQL
//!
//! ## Security Warning
//!
//! **This is an administrative tool only!**
//!
//! - No authentication/authorization built-in
//! - Exposes and mutates every table of the connected database
//! - Should never be exposed on public networks
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use axum::{Router, routing::get};
//! use axum_table_crud::{CrudLayer, EngineConfig};
//! use sqlx::SqlitePool;
//!
//! #[tokio::main]
//! async fn main() {
//!     let pool = SqlitePool::connect("sqlite::memory:")
//!         .await
//!         .unwrap();
//!
//!     let app = Router::new()
//!         .route("/health", get(|| async { "ok" }))
//!         .merge(CrudLayer::sqlite("/crud", pool, EngineConfig::default()).into_router());
//!
//!     // Serve the application...
//! }
//! ```

// Public modules
pub mod api;
pub mod config;
pub mod database;
pub mod engine;
pub mod layer;
pub mod schema;
pub mod sql;

#[cfg(test)]
pub(crate) mod testutils;

// Public exports
pub use config::EngineConfig;
pub use engine::{AggregateFetcher, CrudEngine, MutationEngine, SchemaIntrospector, TableReader};
pub use layer::CrudLayer;
pub use schema::{ColumnInfo, MutationOutcome, PrimaryKey, Row, TableSchema, TableSnapshot};

// Re-export database providers
pub use database::traits::{DatabaseError, DatabaseProvider};

#[cfg(feature = "sqlite")]
pub use database::sqlite::SqliteProvider;

#[cfg(feature = "postgres")]
pub use database::postgres::PostgresProvider;

#[cfg(feature = "mysql")]
pub use database::mysql::MySqlProvider;

// Error type
use thiserror::Error;

/// Failures surfaced by the engine to its callers
#[derive(Debug, Error)]
pub enum Error {
    /// The pool could not hand out a connection, the connection broke, or a
    /// query exceeded its timeout
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    /// The database refused the statement (unknown table, constraint
    /// violation, ...). The message is the database's own.
    #[error("{0}")]
    QueryRejected(String),

    /// Create payload keys differ from the table's reference column set
    #[error("{}", describe_column_mismatch(.table, .missing, .unexpected))]
    ColumnMismatch {
        table: String,
        missing: Vec<String>,
        unexpected: Vec<String>,
    },

    /// The target table declares no primary key
    #[error("No primary key found for table '{0}'")]
    NoPrimaryKey(String),

    /// The primary key spans several columns, so one identifier cannot address a row
    #[error(
        "Table '{}' has a composite primary key ({}), rows cannot be addressed by a single id",
        .table,
        .columns.join(", ")
    )]
    CompositePrimaryKey { table: String, columns: Vec<String> },

    /// Payload or identifier is not usable (nested values, null id, no columns)
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    /// Update/delete matched nothing (only with `report_missing_rows`)
    #[error("No row in '{table}' where {key} = {identifier}")]
    RowNotFound {
        table: String,
        key: String,
        identifier: String,
    },
}

fn describe_column_mismatch(table: &str, missing: &[String], unexpected: &[String]) -> String {
    let mut parts = Vec::new();
    if !missing.is_empty() {
        parts.push(format!("Missing required columns: {}", missing.join(", ")));
    }
    if !unexpected.is_empty() {
        parts.push(format!("Invalid columns: {}", unexpected.join(", ")));
    }
    format!("Column mismatch for table '{}': {}", table, parts.join("; "))
}

impl From<DatabaseError> for Error {
    fn from(error: DatabaseError) -> Self {
        match error {
            DatabaseError::Connection(message) => Error::StorageUnavailable(message),
            DatabaseError::Timeout => Error::StorageUnavailable(DatabaseError::Timeout.to_string()),
            DatabaseError::Query(message) => Error::QueryRejected(message),
            error @ DatabaseError::TableNotFound(_) => Error::QueryRejected(error.to_string()),
            error @ DatabaseError::Serialization(_) => Error::QueryRejected(error.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_mismatch_message_lists_both_sides() {
        let error = Error::ColumnMismatch {
            table: "employee".to_string(),
            missing: vec!["sex".to_string(), "salary".to_string()],
            unexpected: vec!["nickname".to_string()],
        };
        assert_eq!(
            error.to_string(),
            "Column mismatch for table 'employee': Missing required columns: sex, salary; Invalid columns: nickname"
        );
    }

    #[test]
    fn test_column_mismatch_message_with_only_missing() {
        let error = Error::ColumnMismatch {
            table: "branch".to_string(),
            missing: vec!["branch_name".to_string()],
            unexpected: vec![],
        };
        assert!(error.to_string().ends_with("Missing required columns: branch_name"));
        assert!(!error.to_string().contains("Invalid columns"));
    }

    #[test]
    fn test_database_error_mapping() {
        assert!(matches!(
            Error::from(DatabaseError::Connection("pool timed out".to_string())),
            Error::StorageUnavailable(_)
        ));
        assert!(matches!(
            Error::from(DatabaseError::Timeout),
            Error::StorageUnavailable(_)
        ));
        match Error::from(DatabaseError::Query("UNIQUE constraint failed: employee.emp_id".to_string())) {
            Error::QueryRejected(message) => {
                assert_eq!(message, "UNIQUE constraint failed: employee.emp_id")
            }
            other => panic!("unexpected error: {other:?}"),
        }
        match Error::from(DatabaseError::TableNotFound("ghost".to_string())) {
            Error::QueryRejected(message) => assert!(message.contains("ghost")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_composite_primary_key_message() {
        let error = Error::CompositePrimaryKey {
            table: "works_with".to_string(),
            columns: vec!["emp_id".to_string(), "client_id".to_string()],
        };
        assert!(error.to_string().contains("(emp_id, client_id)"));
    }
}
