//! SQLite database provider implementation

use crate::database::traits::{DatabaseError, DatabaseProvider};
use crate::database::{blob_marker, float_value};
use crate::schema::{ColumnInfo, Row, TableSchema};
use crate::sql::{self, Dialect, Statement};
use async_trait::async_trait;
use serde_json::Value;
use sqlx::query::Query;
use sqlx::sqlite::SqliteRow;
use sqlx::{Column, Database, Row as _, Sqlite, SqlitePool, TypeInfo, ValueRef};
use tracing::debug;

const DIALECT: Dialect = Dialect::Sqlite;

/// SQLite database provider
pub struct SqliteProvider {
    pool: SqlitePool,
}

impl SqliteProvider {
    /// Create a new SQLite provider
    ///
    /// # Arguments
    ///
    /// * `pool` - SQLite connection pool
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Convert a SQLite row to a JSON object
    ///
    /// This handles all SQLite data types and converts them to appropriate JSON values.
    fn row_to_json(row: &SqliteRow) -> Result<Row, DatabaseError> {
        let mut map = Row::new();

        for column in row.columns() {
            let value = Self::extract_column_value(row, column)?;
            map.insert(column.name().to_string(), value);
        }

        Ok(map)
    }

    /// Extract a column value from a SQLite row and convert to JSON
    fn extract_column_value(
        row: &SqliteRow,
        column: &sqlx::sqlite::SqliteColumn,
    ) -> Result<Value, DatabaseError> {
        let index = column.ordinal();

        // Check if the value is NULL first
        if row.try_get_raw(index)?.is_null() {
            return Ok(Value::Null);
        }

        // SQLite has dynamic typing but reports affinities; dispatch on the
        // declared type and fall back to whatever the stored value decodes as
        match column.type_info().name() {
            "INTEGER" | "BIGINT" | "INT8" => {
                if let Ok(value) = row.try_get::<i64, _>(index) {
                    return Ok(Value::Number(value.into()));
                }
            }
            "REAL" | "FLOAT" | "DOUBLE" => {
                if let Ok(value) = row.try_get::<f64, _>(index) {
                    return Ok(float_value(value));
                }
            }
            "BOOLEAN" | "BOOL" => {
                if let Ok(value) = row.try_get::<bool, _>(index) {
                    return Ok(Value::Bool(value));
                }
            }
            "BLOB" => {
                if let Ok(value) = row.try_get::<Vec<u8>, _>(index) {
                    return Ok(blob_marker(&value));
                }
            }
            // TEXT, DATE, DATETIME, TIME: SQLite stores dates as ISO-8601 text
            _ => {
                if let Ok(value) = row.try_get::<String, _>(index) {
                    return Ok(Value::String(value));
                }
            }
        }

        // Fallback: try common types in order
        if let Ok(value) = row.try_get::<i64, _>(index) {
            return Ok(Value::Number(value.into()));
        }
        if let Ok(value) = row.try_get::<f64, _>(index) {
            return Ok(float_value(value));
        }
        if let Ok(value) = row.try_get::<String, _>(index) {
            return Ok(Value::String(value));
        }
        if let Ok(value) = row.try_get::<Vec<u8>, _>(index) {
            return Ok(blob_marker(&value));
        }

        Err(DatabaseError::Serialization(format!(
            "cannot decode column '{}' of type {}",
            column.name(),
            column.type_info().name()
        )))
    }

    /// Execute a built statement and return the affected row count
    async fn execute(&self, statement: Statement) -> Result<u64, DatabaseError> {
        debug!(statement = %statement.rendered, "Executing statement");

        let mut query = sqlx::query(&statement.sql);
        for value in &statement.parameters {
            query = bind_value(query, value);
        }

        let result = query.execute(&self.pool).await?;
        Ok(result.rows_affected())
    }
}

/// Bind a JSON scalar with the closest SQLite type
fn bind_value<'q>(
    query: Query<'q, Sqlite, <Sqlite as Database>::Arguments<'q>>,
    value: &Value,
) -> Query<'q, Sqlite, <Sqlite as Database>::Arguments<'q>> {
    match value {
        Value::Null => query.bind(None::<String>),
        Value::Bool(flag) => query.bind(*flag),
        Value::Number(number) => match number.as_i64() {
            Some(integer) => query.bind(integer),
            None => query.bind(number.as_f64()),
        },
        Value::String(text) => query.bind(text.clone()),
        nested => query.bind(nested.to_string()),
    }
}

#[async_trait]
impl DatabaseProvider for SqliteProvider {
    async fn list_tables(&self) -> Result<Vec<String>, DatabaseError> {
        let query = "SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%' ORDER BY name";

        let rows = sqlx::query(query).fetch_all(&self.pool).await?;

        rows.iter()
            .map(|row| row.try_get::<String, _>("name").map_err(DatabaseError::from))
            .collect()
    }

    async fn get_table_schema(&self, table: &str) -> Result<TableSchema, DatabaseError> {
        // pragma_table_info returns: cid, name, type, notnull, dflt_value, pk
        let column_rows = sqlx::query(
            "SELECT name, type, \"notnull\", dflt_value, pk FROM pragma_table_info(?) ORDER BY cid",
        )
        .bind(table)
        .fetch_all(&self.pool)
        .await?;

        if column_rows.is_empty() {
            return Err(DatabaseError::TableNotFound(table.to_string()));
        }

        let mut columns = Vec::new();
        let mut primary_key_columns = Vec::new();

        for row in column_rows {
            let name: String = row.try_get("name")?;
            let data_type: String = row.try_get("type")?;
            let not_null: i64 = row.try_get("notnull")?;
            let default_value: Option<String> = row.try_get("dflt_value").ok().flatten();
            let primary_key: i64 = row.try_get("pk")?;

            let is_primary_key = primary_key > 0;
            if is_primary_key {
                primary_key_columns.push((primary_key, name.clone()));
            }

            columns.push(ColumnInfo {
                name,
                data_type,
                nullable: not_null == 0,
                default_value,
                is_primary_key,
            });
        }

        // Sort primary key columns by their pk order and extract names
        primary_key_columns.sort_by_key(|(order, _)| *order);
        let primary_key = if primary_key_columns.is_empty() {
            None
        } else {
            Some(primary_key_columns.into_iter().map(|(_, name)| name).collect())
        };

        Ok(TableSchema {
            name: table.to_string(),
            columns,
            primary_key,
        })
    }

    async fn fetch_rows(&self, table: &str) -> Result<Vec<Row>, DatabaseError> {
        let rows = sqlx::query(&sql::select_all(DIALECT, table))
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(Self::row_to_json).collect()
    }

    async fn insert_row(
        &self,
        schema: &TableSchema,
        values: &[(String, Value)],
    ) -> Result<u64, DatabaseError> {
        self.execute(sql::insert(DIALECT, schema, values)).await
    }

    async fn update_rows(
        &self,
        schema: &TableSchema,
        assignments: &[(String, Value)],
        key: &str,
        identifier: &Value,
    ) -> Result<u64, DatabaseError> {
        self.execute(sql::update(DIALECT, schema, assignments, key, identifier))
            .await
    }

    async fn delete_rows(
        &self,
        schema: &TableSchema,
        key: &str,
        identifier: &Value,
    ) -> Result<u64, DatabaseError> {
        self.execute(sql::delete(DIALECT, schema, key, identifier)).await
    }
}
