//! MySQL database provider implementation

use crate::database::traits::{DatabaseError, DatabaseProvider};
use crate::database::{blob_marker, float_value};
use crate::schema::{ColumnInfo, Row, TableSchema};
use crate::sql::{self, Dialect, Statement};
use async_trait::async_trait;
use serde_json::Value;
use sqlx::mysql::MySqlRow;
use sqlx::query::Query;
use sqlx::types::chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use sqlx::types::Decimal;
use sqlx::{Column, Database, MySql, MySqlPool, Row as _, TypeInfo, ValueRef};
use tracing::debug;

const DIALECT: Dialect = Dialect::MySql;

/// How a MySQL column type is decoded into JSON
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MySqlKind {
    Bool,
    Signed,
    Unsigned,
    Year,
    Float,
    Double,
    Decimal,
    Date,
    DateTime,
    Timestamp,
    Time,
    Json,
    /// Byte strings sqlx decodes as `Vec<u8>`
    Binary,
    /// BIT and GEOMETRY: bytes sqlx only hands out unchecked
    RawBytes,
    /// CHAR, VARCHAR, TEXT variants, ENUM, SET
    Text,
}

impl MySqlKind {
    fn of(type_name: &str) -> Self {
        match type_name {
            "BOOLEAN" => MySqlKind::Bool,
            "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" => MySqlKind::Signed,
            "TINYINT UNSIGNED" | "SMALLINT UNSIGNED" | "MEDIUMINT UNSIGNED" | "INT UNSIGNED"
            | "BIGINT UNSIGNED" => MySqlKind::Unsigned,
            "YEAR" => MySqlKind::Year,
            "FLOAT" => MySqlKind::Float,
            "DOUBLE" => MySqlKind::Double,
            "DECIMAL" => MySqlKind::Decimal,
            "DATE" => MySqlKind::Date,
            "DATETIME" => MySqlKind::DateTime,
            "TIMESTAMP" => MySqlKind::Timestamp,
            "TIME" => MySqlKind::Time,
            "JSON" => MySqlKind::Json,
            "BINARY" | "VARBINARY" | "TINYBLOB" | "BLOB" | "MEDIUMBLOB" | "LONGBLOB" => {
                MySqlKind::Binary
            }
            "BIT" | "GEOMETRY" => MySqlKind::RawBytes,
            _ => MySqlKind::Text,
        }
    }
}

/// MySQL database provider
///
/// Works on the connection's default database (`DATABASE()`).
pub struct MySqlProvider {
    pool: MySqlPool,
}

impl MySqlProvider {
    /// Create a new MySQL provider
    ///
    /// # Arguments
    ///
    /// * `pool` - MySQL connection pool
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    /// Convert a MySQL row to a JSON object
    fn row_to_json(row: &MySqlRow) -> Result<Row, DatabaseError> {
        let mut map = Row::new();

        for column in row.columns() {
            let value = Self::extract_column_value(row, column)?;
            map.insert(column.name().to_string(), value);
        }

        Ok(map)
    }

    /// Extract a column value from a MySQL row and convert to JSON
    fn extract_column_value(
        row: &MySqlRow,
        column: &sqlx::mysql::MySqlColumn,
    ) -> Result<Value, DatabaseError> {
        let index = column.ordinal();

        if row.try_get_raw(index)?.is_null() {
            return Ok(Value::Null);
        }

        let value = match MySqlKind::of(column.type_info().name()) {
            MySqlKind::Bool => Value::Bool(row.try_get::<bool, _>(index)?),
            MySqlKind::Signed => Value::Number(row.try_get::<i64, _>(index)?.into()),
            MySqlKind::Unsigned => Value::Number(row.try_get::<u64, _>(index)?.into()),
            // Binary protocol sends YEAR as a little-endian u16, which no
            // checked Rust type accepts
            MySqlKind::Year => Value::Number(row.try_get_unchecked::<u16, _>(index)?.into()),
            MySqlKind::Float => float_value(row.try_get::<f32, _>(index)? as f64),
            MySqlKind::Double => float_value(row.try_get::<f64, _>(index)?),
            // String keeps the precision a float would lose
            MySqlKind::Decimal => Value::String(row.try_get::<Decimal, _>(index)?.to_string()),
            MySqlKind::Date => Value::String(row.try_get::<NaiveDate, _>(index)?.to_string()),
            MySqlKind::DateTime => Value::String(
                row.try_get::<NaiveDateTime, _>(index)?
                    .format("%Y-%m-%dT%H:%M:%S%.f")
                    .to_string(),
            ),
            MySqlKind::Timestamp => {
                Value::String(row.try_get::<DateTime<Utc>, _>(index)?.to_rfc3339())
            }
            MySqlKind::Time => match row.try_get::<NaiveTime, _>(index) {
                Ok(time) => Value::String(time.to_string()),
                // Durations outside 00:00..24:00 are valid MySQL TIME values
                Err(_) => Value::String(row.try_get_unchecked::<String, _>(index)?),
            },
            MySqlKind::Json => row.try_get::<Value, _>(index)?,
            MySqlKind::Binary => blob_marker(&row.try_get::<Vec<u8>, _>(index)?),
            MySqlKind::RawBytes => blob_marker(&row.try_get_unchecked::<Vec<u8>, _>(index)?),
            MySqlKind::Text => match row.try_get::<String, _>(index) {
                Ok(text) => Value::String(text),
                Err(_) => Value::String(row.try_get_unchecked::<String, _>(index)?),
            },
        };

        Ok(value)
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

/// Bind a JSON scalar; MySQL converts it to the column type on assignment
fn bind_value<'q>(
    query: Query<'q, MySql, <MySql as Database>::Arguments<'q>>,
    value: &Value,
) -> Query<'q, MySql, <MySql as Database>::Arguments<'q>> {
    match value {
        Value::Null => query.bind(None::<String>),
        Value::Bool(flag) => query.bind(*flag),
        Value::Number(number) => {
            if let Some(integer) = number.as_i64() {
                query.bind(integer)
            } else if let Some(unsigned) = number.as_u64() {
                query.bind(unsigned)
            } else {
                query.bind(number.as_f64())
            }
        }
        Value::String(text) => query.bind(text.clone()),
        nested => query.bind(nested.to_string()),
    }
}

#[async_trait]
impl DatabaseProvider for MySqlProvider {
    async fn list_tables(&self) -> Result<Vec<String>, DatabaseError> {
        // information_schema columns may come back as binary strings, hence the casts
        let query = r#"
            SELECT CAST(table_name AS CHAR) AS table_name
            FROM information_schema.tables
            WHERE table_schema = DATABASE()
              AND table_type = 'BASE TABLE'
            ORDER BY table_name
        "#;

        let rows = sqlx::query(query).fetch_all(&self.pool).await?;

        rows.iter()
            .map(|row| row.try_get::<String, _>("table_name").map_err(DatabaseError::from))
            .collect()
    }

    async fn get_table_schema(&self, table: &str) -> Result<TableSchema, DatabaseError> {
        let column_query = r#"
            SELECT
                CAST(column_name AS CHAR) AS column_name,
                CAST(data_type AS CHAR) AS data_type,
                CAST(is_nullable AS CHAR) AS is_nullable,
                CAST(column_default AS CHAR) AS column_default
            FROM information_schema.columns
            WHERE table_schema = DATABASE()
              AND table_name = ?
            ORDER BY ordinal_position
        "#;

        let column_rows = sqlx::query(column_query)
            .bind(table)
            .fetch_all(&self.pool)
            .await?;

        if column_rows.is_empty() {
            return Err(DatabaseError::TableNotFound(table.to_string()));
        }

        let pk_query = r#"
            SELECT CAST(column_name AS CHAR) AS column_name
            FROM information_schema.key_column_usage
            WHERE table_schema = DATABASE()
              AND table_name = ?
              AND constraint_name = 'PRIMARY'
            ORDER BY ordinal_position
        "#;

        let pk_rows = sqlx::query(pk_query)
            .bind(table)
            .fetch_all(&self.pool)
            .await?;

        let primary_key_columns: Vec<String> = pk_rows
            .iter()
            .map(|row| row.try_get::<String, _>("column_name"))
            .collect::<Result<Vec<_>, _>>()?;

        let columns: Vec<ColumnInfo> = column_rows
            .iter()
            .map(|row| {
                let column_name: String = row.try_get("column_name")?;
                let data_type: String = row.try_get("data_type")?;
                let is_nullable: String = row.try_get("is_nullable")?;
                let column_default: Option<String> = row.try_get("column_default")?;

                Ok(ColumnInfo {
                    is_primary_key: primary_key_columns.contains(&column_name),
                    name: column_name,
                    data_type,
                    nullable: is_nullable == "YES",
                    default_value: column_default,
                })
            })
            .collect::<Result<Vec<_>, sqlx::Error>>()?;

        let primary_key = if primary_key_columns.is_empty() {
            None
        } else {
            Some(primary_key_columns)
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
