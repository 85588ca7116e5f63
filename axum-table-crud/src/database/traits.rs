//! Database provider trait
//!
//! This trait defines the interface that all database implementations must provide.
//! The provider owns the connection pool; the engine only ever talks to it
//! through these methods.

use crate::schema::{Row, TableSchema};
use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// Database provider trait for catalog discovery, reads and mutations
///
/// Each method acquires a pooled connection for its statement(s) and releases
/// it before returning.
#[async_trait]
pub trait DatabaseProvider: Send + Sync + 'static {
    /// List all table names in the database, in the catalog's order
    async fn list_tables(&self) -> Result<Vec<String>, DatabaseError>;

    /// Get column and primary-key information for a specific table
    ///
    /// # Arguments
    ///
    /// * `table` - Name of the table
    ///
    /// # Returns
    ///
    /// Columns in catalog order and the primary key columns in key order.
    /// Fails with [`DatabaseError::TableNotFound`] if the catalog knows no
    /// columns for `table`.
    async fn get_table_schema(&self, table: &str) -> Result<TableSchema, DatabaseError>;

    /// Fetch every row of a table
    ///
    /// No projection, filtering or pagination. The table name is not checked
    /// against the catalog first; an unknown table surfaces as the
    /// database's own error.
    async fn fetch_rows(&self, table: &str) -> Result<Vec<Row>, DatabaseError>;

    /// Insert one row
    ///
    /// # Arguments
    ///
    /// * `schema` - Catalog information for the target table
    /// * `values` - Column/value pairs, in statement order
    ///
    /// # Returns
    ///
    /// Number of rows affected
    async fn insert_row(
        &self,
        schema: &TableSchema,
        values: &[(String, Value)],
    ) -> Result<u64, DatabaseError>;

    /// Update the rows whose `key` column equals `identifier`
    async fn update_rows(
        &self,
        schema: &TableSchema,
        assignments: &[(String, Value)],
        key: &str,
        identifier: &Value,
    ) -> Result<u64, DatabaseError>;

    /// Delete the rows whose `key` column equals `identifier`
    async fn delete_rows(
        &self,
        schema: &TableSchema,
        key: &str,
        identifier: &Value,
    ) -> Result<u64, DatabaseError>;
}

/// Database error type
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// No connection could be obtained or the connection failed
    #[error("Connection error: {0}")]
    Connection(String),

    /// The database rejected the statement
    #[error("Database error: {0}")]
    Query(String),

    /// Table not found
    #[error("Table not found: {0}")]
    TableNotFound(String),

    /// Query timeout
    #[error("Query timeout exceeded")]
    Timeout,

    /// A column value could not be converted to JSON
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<sqlx::Error> for DatabaseError {
    fn from(error: sqlx::Error) -> Self {
        match &error {
            sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::Protocol(_)
            | sqlx::Error::WorkerCrashed => DatabaseError::Connection(error.to_string()),
            _ => DatabaseError::Query(error.to_string()),
        }
    }
}
