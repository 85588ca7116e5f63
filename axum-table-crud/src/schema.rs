//! Schema and payload types
//!
//! These types represent table metadata discovered at runtime, the rows read
//! from tables, and the request bodies accepted by the mutation endpoints.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One table row: column name to scalar value, in result-set column order
pub type Row = Map<String, Value>;

/// Catalog information for a database table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableSchema {
    /// Name of the table
    pub name: String,

    /// List of columns in the table
    pub columns: Vec<ColumnInfo>,

    /// Primary key column names in key order (if any)
    pub primary_key: Option<Vec<String>>,
}

impl TableSchema {
    /// Look up a column by name
    pub fn column(&self, name: &str) -> Option<&ColumnInfo> {
        self.columns.iter().find(|column| column.name == name)
    }

    /// Column names in catalog order
    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|column| column.name.clone()).collect()
    }
}

/// Information about a single column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnInfo {
    /// Column name
    pub name: String,

    /// SQL data type as the catalog reports it (e.g. "INTEGER", "int4", "varchar")
    pub data_type: String,

    /// Whether the column allows NULL values
    pub nullable: bool,

    /// Default value expression (if any)
    pub default_value: Option<String>,

    /// Whether this column is part of the primary key
    pub is_primary_key: bool,
}

/// The column that identifies a single row of a table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrimaryKey {
    pub table: String,
    pub column: String,
}

/// All rows of one table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableSnapshot {
    /// Name of the table
    pub table_name: String,

    /// Every row of the table; empty for an empty table
    #[serde(rename = "data")]
    pub rows: Vec<Row>,
}

/// Result of a mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MutationOutcome {
    /// Rows the database reported as affected
    pub rows_affected: u64,
}

/// Body of POST /create-data
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRequest {
    pub table_name: String,
    pub data: Map<String, Value>,
}

/// Body of PUT /update-data
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRequest {
    pub table_name: String,
    pub id: Value,
    pub data: Map<String, Value>,
}

/// Body of DELETE /delete-data
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteRequest {
    pub table_name: String,
    pub id: Value,
}
