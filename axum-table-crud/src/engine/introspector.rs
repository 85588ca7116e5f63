//! Schema Introspector: table discovery and catalog lookups

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::database::traits::DatabaseProvider;
use crate::engine::with_timeout;
use crate::schema::TableSchema;
use crate::Result;

/// Discovers tables and their metadata from the database catalog
pub struct SchemaIntrospector<DB: DatabaseProvider> {
    database: Arc<DB>,
    timeout: Option<Duration>,
}

impl<DB: DatabaseProvider> Clone for SchemaIntrospector<DB> {
    fn clone(&self) -> Self {
        Self {
            database: self.database.clone(),
            timeout: self.timeout,
        }
    }
}

impl<DB: DatabaseProvider> SchemaIntrospector<DB> {
    pub fn new(database: Arc<DB>, timeout: Option<Duration>) -> Self {
        Self { database, timeout }
    }

    /// List all table names in the database's own order
    ///
    /// One catalog query, no retry.
    pub async fn list_tables(&self) -> Result<Vec<String>> {
        let tables = with_timeout(self.timeout, self.database.list_tables()).await?;
        debug!(count = tables.len(), "Discovered tables");
        Ok(tables)
    }

    /// Columns and primary key of one table, fresh from the catalog
    pub async fn table_schema(&self, table: &str) -> Result<TableSchema> {
        let schema = with_timeout(self.timeout, self.database.get_table_schema(table)).await?;
        debug!(
            table,
            columns = schema.columns.len(),
            primary_key = ?schema.primary_key,
            "Loaded table schema"
        );
        Ok(schema)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutils::MemoryProvider;
    use crate::Error;

    #[tokio::test]
    async fn test_list_tables_preserves_catalog_order() {
        let database = MemoryProvider::new()
            .with_table("works_with", &["emp_id", "client_id"], &["emp_id", "client_id"], vec![])
            .with_table("branch", &["branch_id"], &["branch_id"], vec![]);
        let introspector = SchemaIntrospector::new(Arc::new(database), None);

        assert_eq!(
            introspector.list_tables().await.unwrap(),
            vec!["works_with".to_string(), "branch".to_string()]
        );
    }

    #[tokio::test]
    async fn test_list_tables_propagates_storage_failure() {
        let database = MemoryProvider::new().unavailable();
        let introspector = SchemaIntrospector::new(Arc::new(database), None);

        assert!(matches!(
            introspector.list_tables().await,
            Err(Error::StorageUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_unknown_table_schema_is_rejected() {
        let introspector = SchemaIntrospector::new(Arc::new(MemoryProvider::new()), None);

        assert!(matches!(
            introspector.table_schema("ghost").await,
            Err(Error::QueryRejected(_))
        ));
    }
}
