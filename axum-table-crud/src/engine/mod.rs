//! The schema-introspecting CRUD engine
//!
//! Four components share one injected [`DatabaseProvider`]:
//!
//! - [`SchemaIntrospector`] discovers tables and their catalog metadata
//! - [`TableReader`] reads whole tables
//! - [`AggregateFetcher`] snapshots every table concurrently
//! - [`MutationEngine`] validates and runs insert/update/delete
//!
//! Nothing is cached between calls; every operation re-reads the catalog.

use serde_json::{Map, Value};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::config::EngineConfig;
use crate::database::traits::{DatabaseError, DatabaseProvider};
use crate::schema::{MutationOutcome, Row, TableSnapshot};
use crate::Result;

pub mod aggregate;
pub mod introspector;
pub mod mutation;
pub mod reader;

pub use aggregate::AggregateFetcher;
pub use introspector::SchemaIntrospector;
pub use mutation::MutationEngine;
pub use reader::TableReader;

/// Run one provider call under the per-query timeout
pub(crate) async fn with_timeout<T, F>(
    timeout: Option<Duration>,
    operation: F,
) -> std::result::Result<T, DatabaseError>
where
    F: Future<Output = std::result::Result<T, DatabaseError>>,
{
    match timeout {
        Some(limit) => tokio::time::timeout(limit, operation)
            .await
            .map_err(|_| DatabaseError::Timeout)?,
        None => operation.await,
    }
}

/// All four engine components wired to one provider
pub struct CrudEngine<DB: DatabaseProvider> {
    introspector: SchemaIntrospector<DB>,
    reader: TableReader<DB>,
    aggregate: AggregateFetcher<DB>,
    mutations: MutationEngine<DB>,
}

impl<DB: DatabaseProvider> CrudEngine<DB> {
    /// Build the engine around an injected provider
    ///
    /// # Arguments
    ///
    /// * `database` - Provider owning the connection pool
    /// * `config` - Timeouts and mutation policy
    pub fn new(database: Arc<DB>, config: EngineConfig) -> Self {
        let config = Arc::new(config);
        let timeout = config.query_timeout();

        let introspector = SchemaIntrospector::new(database.clone(), timeout);
        let reader = TableReader::new(database.clone(), timeout);
        let aggregate = AggregateFetcher::new(introspector.clone(), reader.clone());
        let mutations = MutationEngine::new(database, introspector.clone(), config);

        Self {
            introspector,
            reader,
            aggregate,
            mutations,
        }
    }

    pub fn introspector(&self) -> &SchemaIntrospector<DB> {
        &self.introspector
    }

    pub fn reader(&self) -> &TableReader<DB> {
        &self.reader
    }

    pub fn aggregate(&self) -> &AggregateFetcher<DB> {
        &self.aggregate
    }

    pub fn mutations(&self) -> &MutationEngine<DB> {
        &self.mutations
    }

    /// List all table names
    pub async fn list_tables(&self) -> Result<Vec<String>> {
        self.introspector.list_tables().await
    }

    /// Read every row of one table
    pub async fn read_table(&self, table: &str) -> Result<Vec<Row>> {
        self.reader.read_table(table).await
    }

    /// Snapshot every table
    pub async fn fetch_all(&self) -> Result<Vec<TableSnapshot>> {
        self.aggregate.fetch_all().await
    }

    /// Insert one row
    pub async fn create(&self, table: &str, payload: &Map<String, Value>) -> Result<MutationOutcome> {
        self.mutations.create(table, payload).await
    }

    /// Update the row identified by its primary key
    pub async fn update(
        &self,
        table: &str,
        identifier: &Value,
        payload: &Map<String, Value>,
    ) -> Result<MutationOutcome> {
        self.mutations.update(table, identifier, payload).await
    }

    /// Delete the row identified by its primary key
    pub async fn delete(&self, table: &str, identifier: &Value) -> Result<MutationOutcome> {
        self.mutations.delete(table, identifier).await
    }
}
