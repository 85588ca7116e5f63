//! PostgreSQL database provider implementation

use crate::database::traits::{DatabaseError, DatabaseProvider};
use crate::database::{blob_marker, float_value};
use crate::schema::{ColumnInfo, Row, TableSchema};
use crate::sql::{self, Dialect, Statement};
use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::PgRow;
use sqlx::query::Query;
use sqlx::types::chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use sqlx::types::{Decimal, Uuid};
use sqlx::{Column, Database, PgPool, Postgres, Row as _, TypeInfo};
use tracing::debug;

const DIALECT: Dialect = Dialect::Postgres;

/// PostgreSQL database provider
///
/// Works on the connection's `current_schema()`.
pub struct PostgresProvider {
    pool: PgPool,
}

impl PostgresProvider {
    /// Create a new PostgreSQL provider
    ///
    /// # Arguments
    ///
    /// * `pool` - PostgreSQL connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Convert a PostgreSQL row to a JSON object
    fn row_to_json(row: &PgRow) -> Result<Row, DatabaseError> {
        let mut map = Row::new();

        for column in row.columns() {
            let column_name = column.name();
            let index = column.ordinal();

            let value: Value = match column.type_info().name() {
                "BOOL" => {
                    let val: Option<bool> = row.try_get(index)?;
                    val.map(Value::Bool).unwrap_or(Value::Null)
                }
                "INT2" => {
                    let val: Option<i16> = row.try_get(index)?;
                    val.map(|v| Value::Number(v.into())).unwrap_or(Value::Null)
                }
                "INT4" => {
                    let val: Option<i32> = row.try_get(index)?;
                    val.map(|v| Value::Number(v.into())).unwrap_or(Value::Null)
                }
                "INT8" => {
                    let val: Option<i64> = row.try_get(index)?;
                    val.map(|v| Value::Number(v.into())).unwrap_or(Value::Null)
                }
                "FLOAT4" => {
                    let val: Option<f32> = row.try_get(index)?;
                    val.map(|v| float_value(v as f64)).unwrap_or(Value::Null)
                }
                "FLOAT8" => {
                    let val: Option<f64> = row.try_get(index)?;
                    val.map(float_value).unwrap_or(Value::Null)
                }
                "NUMERIC" => {
                    // String keeps the precision a float would lose
                    let val: Option<Decimal> = row.try_get(index)?;
                    val.map(|v| Value::String(v.to_string()))
                        .unwrap_or(Value::Null)
                }
                "TEXT" | "VARCHAR" | "CHAR" | "NAME" | "BPCHAR" => {
                    let val: Option<String> = row.try_get(index)?;
                    val.map(Value::String).unwrap_or(Value::Null)
                }
                "BYTEA" => {
                    let val: Option<Vec<u8>> = row.try_get(index)?;
                    val.map(|bytes| blob_marker(&bytes)).unwrap_or(Value::Null)
                }
                "DATE" => {
                    let val: Option<NaiveDate> = row.try_get(index)?;
                    val.map(|v| Value::String(v.to_string()))
                        .unwrap_or(Value::Null)
                }
                "TIME" => {
                    let val: Option<NaiveTime> = row.try_get(index)?;
                    val.map(|v| Value::String(v.to_string()))
                        .unwrap_or(Value::Null)
                }
                "TIMESTAMP" => {
                    let val: Option<NaiveDateTime> = row.try_get(index)?;
                    val.map(|v| Value::String(v.format("%Y-%m-%dT%H:%M:%S%.f").to_string()))
                        .unwrap_or(Value::Null)
                }
                "TIMESTAMPTZ" => {
                    let val: Option<DateTime<Utc>> = row.try_get(index)?;
                    val.map(|v| Value::String(v.to_rfc3339()))
                        .unwrap_or(Value::Null)
                }
                "JSON" | "JSONB" => {
                    let val: Option<Value> = row.try_get(index)?;
                    val.unwrap_or(Value::Null)
                }
                "UUID" => {
                    let val: Option<Uuid> = row.try_get(index)?;
                    val.map(|v| Value::String(v.to_string()))
                        .unwrap_or(Value::Null)
                }
                other => {
                    // Enums, citext and friends are text on the wire
                    match row.try_get_unchecked::<Option<String>, _>(index) {
                        Ok(val) => val.map(Value::String).unwrap_or(Value::Null),
                        Err(error) => {
                            return Err(DatabaseError::Serialization(format!(
                                "cannot decode column '{}' of type {}: {}",
                                column_name, other, error
                            )))
                        }
                    }
                }
            };

            map.insert(column_name.to_string(), value);
        }

        Ok(map)
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

/// Bind a JSON scalar; the statement casts it to the column's type
fn bind_value<'q>(
    query: Query<'q, Postgres, <Postgres as Database>::Arguments<'q>>,
    value: &Value,
) -> Query<'q, Postgres, <Postgres as Database>::Arguments<'q>> {
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
impl DatabaseProvider for PostgresProvider {
    async fn list_tables(&self) -> Result<Vec<String>, DatabaseError> {
        let query = r#"
            SELECT table_name::text AS table_name
            FROM information_schema.tables
            WHERE table_schema = current_schema()
              AND table_type = 'BASE TABLE'
            ORDER BY table_name
        "#;

        let rows = sqlx::query(query).fetch_all(&self.pool).await?;

        rows.iter()
            .map(|row| row.try_get::<String, _>("table_name").map_err(DatabaseError::from))
            .collect()
    }

    async fn get_table_schema(&self, table: &str) -> Result<TableSchema, DatabaseError> {
        // udt_name is the castable type name ("int4", "varchar", ...)
        let column_query = r#"
            SELECT
                column_name::text AS column_name,
                udt_name::text AS data_type,
                is_nullable::text AS is_nullable,
                column_default::text AS column_default
            FROM information_schema.columns
            WHERE table_schema = current_schema()
              AND table_name = $1
            ORDER BY ordinal_position
        "#;

        let column_rows = sqlx::query(column_query)
            .bind(table)
            .fetch_all(&self.pool)
            .await?;

        if column_rows.is_empty() {
            return Err(DatabaseError::TableNotFound(table.to_string()));
        }

        // Get primary key columns
        let pk_query = r#"
            SELECT kcu.column_name::text AS column_name
            FROM information_schema.table_constraints tc
            JOIN information_schema.key_column_usage kcu
              ON tc.constraint_name = kcu.constraint_name
              AND tc.table_schema = kcu.table_schema
            WHERE tc.table_schema = current_schema()
              AND tc.table_name = $1
              AND tc.constraint_type = 'PRIMARY KEY'
            ORDER BY kcu.ordinal_position
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
