//! Mutation Engine: create, update and delete driven by JSON payloads
//!
//! Every operation reads the table's catalog entry first, validates the
//! payload against it, and only then hands a single statement to the
//! provider. Values always travel as bound parameters.

use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::config::EngineConfig;
use crate::database::traits::DatabaseProvider;
use crate::engine::{with_timeout, SchemaIntrospector};
use crate::schema::{MutationOutcome, PrimaryKey, TableSchema};
use crate::{Error, Result};

/// Validates and executes row mutations
pub struct MutationEngine<DB: DatabaseProvider> {
    database: Arc<DB>,
    introspector: SchemaIntrospector<DB>,
    config: Arc<EngineConfig>,
    timeout: Option<Duration>,
}

impl<DB: DatabaseProvider> Clone for MutationEngine<DB> {
    fn clone(&self) -> Self {
        Self {
            database: self.database.clone(),
            introspector: self.introspector.clone(),
            config: self.config.clone(),
            timeout: self.timeout,
        }
    }
}

impl<DB: DatabaseProvider> MutationEngine<DB> {
    pub fn new(database: Arc<DB>, introspector: SchemaIntrospector<DB>, config: Arc<EngineConfig>) -> Self {
        let timeout = config.query_timeout();
        Self {
            database,
            introspector,
            config,
            timeout,
        }
    }

    /// Insert one row into `table`
    ///
    /// The payload's key set must equal the table's reference column set:
    /// the configured list for `table` if there is one, otherwise every
    /// column the catalog reports.
    ///
    /// # Errors
    ///
    /// * [`Error::InvalidPayload`] - a value is an array or object
    /// * [`Error::ColumnMismatch`] - keys missing from or foreign to the reference set
    /// * [`Error::QueryRejected`] - the database refused the insert
    pub async fn create(&self, table: &str, payload: &Map<String, Value>) -> Result<MutationOutcome> {
        validate_scalars(payload)?;

        let schema = self.introspector.table_schema(table).await?;
        let reference = self.reference_columns(&schema)?;
        check_columns(table, &reference, payload)?;

        let values: Vec<(String, Value)> = payload
            .iter()
            .map(|(column, value)| (column.clone(), value.clone()))
            .collect();

        let rows_affected = with_timeout(self.timeout, self.database.insert_row(&schema, &values)).await?;

        info!(table, rows_affected, "Created row");
        Ok(MutationOutcome { rows_affected })
    }

    /// Set the payload's columns on the row whose primary key equals `identifier`
    ///
    /// Only columns the catalog knows are accepted. Columns not named in the
    /// payload keep their values.
    pub async fn update(
        &self,
        table: &str,
        identifier: &Value,
        payload: &Map<String, Value>,
    ) -> Result<MutationOutcome> {
        validate_identifier(identifier)?;
        if payload.is_empty() {
            return Err(Error::InvalidPayload("no columns to update".to_string()));
        }
        validate_scalars(payload)?;

        let (schema, key) = self.resolve_primary_key(table).await?;

        let unexpected: Vec<String> = payload
            .keys()
            .filter(|column| schema.column(column).is_none())
            .cloned()
            .collect();
        if !unexpected.is_empty() {
            return Err(Error::ColumnMismatch {
                table: table.to_string(),
                missing: Vec::new(),
                unexpected,
            });
        }

        let assignments: Vec<(String, Value)> = payload
            .iter()
            .map(|(column, value)| (column.clone(), value.clone()))
            .collect();

        let rows_affected = with_timeout(
            self.timeout,
            self.database
                .update_rows(&schema, &assignments, &key.column, identifier),
        )
        .await?;

        self.check_matched(&key, identifier, rows_affected)?;

        info!(table, key = %key.column, rows_affected, "Updated rows");
        Ok(MutationOutcome { rows_affected })
    }

    /// Delete the row whose primary key equals `identifier`
    pub async fn delete(&self, table: &str, identifier: &Value) -> Result<MutationOutcome> {
        validate_identifier(identifier)?;

        let (schema, key) = self.resolve_primary_key(table).await?;

        let rows_affected = with_timeout(
            self.timeout,
            self.database.delete_rows(&schema, &key.column, identifier),
        )
        .await?;

        self.check_matched(&key, identifier, rows_affected)?;

        info!(table, key = %key.column, rows_affected, "Deleted rows");
        Ok(MutationOutcome { rows_affected })
    }

    /// Load `table`'s schema and the single column that addresses its rows
    pub async fn resolve_primary_key(&self, table: &str) -> Result<(TableSchema, PrimaryKey)> {
        let schema = self.introspector.table_schema(table).await?;
        let key = primary_key_of(&schema)?;
        Ok((schema, key))
    }

    fn reference_columns(&self, schema: &TableSchema) -> Result<Vec<String>> {
        let Some(configured) = self.config.reference_columns.get(&schema.name) else {
            return Ok(schema.column_names());
        };

        if let Some(absent) = configured.iter().find(|column| schema.column(column).is_none()) {
            return Err(Error::QueryRejected(format!(
                "Configured reference column '{}' does not exist in table '{}'",
                absent, schema.name
            )));
        }
        Ok(configured.clone())
    }

    fn check_matched(&self, key: &PrimaryKey, identifier: &Value, rows_affected: u64) -> Result<()> {
        if rows_affected == 0 && self.config.report_missing_rows {
            return Err(Error::RowNotFound {
                table: key.table.clone(),
                key: key.column.clone(),
                identifier: identifier.to_string(),
            });
        }
        Ok(())
    }
}

/// Compare payload keys with the reference set in both directions
///
/// `missing` follows reference order, `unexpected` follows payload order.
fn check_columns(table: &str, reference: &[String], payload: &Map<String, Value>) -> Result<()> {
    let missing: Vec<String> = reference
        .iter()
        .filter(|column| !payload.contains_key(column.as_str()))
        .cloned()
        .collect();
    let unexpected: Vec<String> = payload
        .keys()
        .filter(|column| !reference.contains(column))
        .cloned()
        .collect();

    if missing.is_empty() && unexpected.is_empty() {
        Ok(())
    } else {
        Err(Error::ColumnMismatch {
            table: table.to_string(),
            missing,
            unexpected,
        })
    }
}

fn validate_scalars(payload: &Map<String, Value>) -> Result<()> {
    match payload
        .iter()
        .find(|(_, value)| value.is_array() || value.is_object())
    {
        Some((column, _)) => Err(Error::InvalidPayload(format!(
            "value for column '{column}' must be a string, number, boolean or null"
        ))),
        None => Ok(()),
    }
}

fn validate_identifier(identifier: &Value) -> Result<()> {
    match identifier {
        Value::Null => Err(Error::InvalidPayload("id must not be null".to_string())),
        Value::Array(_) | Value::Object(_) => {
            Err(Error::InvalidPayload("id must be a string, number or boolean".to_string()))
        }
        _ => Ok(()),
    }
}

fn primary_key_of(schema: &TableSchema) -> Result<PrimaryKey> {
    match schema.primary_key.as_deref() {
        None | Some([]) => Err(Error::NoPrimaryKey(schema.name.clone())),
        Some([column]) => Ok(PrimaryKey {
            table: schema.name.clone(),
            column: column.clone(),
        }),
        Some(columns) => Err(Error::CompositePrimaryKey {
            table: schema.name.clone(),
            columns: columns.to_vec(),
        }),
    }
}
