//! Aggregate Fetcher: every table in one call

use futures::future::try_join_all;
use tracing::debug;

use crate::database::traits::DatabaseProvider;
use crate::engine::{SchemaIntrospector, TableReader};
use crate::schema::TableSnapshot;
use crate::Result;

/// Snapshots all tables, reading them concurrently
///
/// All-or-nothing: the first failing table read fails the whole call, so an
/// empty `rows` always means an empty table.
pub struct AggregateFetcher<DB: DatabaseProvider> {
    introspector: SchemaIntrospector<DB>,
    reader: TableReader<DB>,
}

impl<DB: DatabaseProvider> Clone for AggregateFetcher<DB> {
    fn clone(&self) -> Self {
        Self {
            introspector: self.introspector.clone(),
            reader: self.reader.clone(),
        }
    }
}

impl<DB: DatabaseProvider> AggregateFetcher<DB> {
    pub fn new(introspector: SchemaIntrospector<DB>, reader: TableReader<DB>) -> Self {
        Self {
            introspector,
            reader,
        }
    }

    /// One snapshot per discovered table, in discovery order
    ///
    /// Reads run concurrently and may hold several pool connections at once;
    /// beyond pool capacity they queue for a connection.
    pub async fn fetch_all(&self) -> Result<Vec<TableSnapshot>> {
        let table_names = self.introspector.list_tables().await?;
        let reader = &self.reader;

        let snapshots = try_join_all(table_names.into_iter().map(|table_name| async move {
            let rows = reader.read_table(&table_name).await?;
            Ok::<_, crate::Error>(TableSnapshot { table_name, rows })
        }))
        .await?;

        debug!(tables = snapshots.len(), "Fetched all tables");
        Ok(snapshots)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutils::MemoryProvider;
    use crate::Error;
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;

    fn fetcher(database: MemoryProvider) -> (Arc<MemoryProvider>, AggregateFetcher<MemoryProvider>) {
        let database = Arc::new(database);
        let fetcher = AggregateFetcher::new(
            SchemaIntrospector::new(database.clone(), None),
            TableReader::new(database.clone(), None),
        );
        (database, fetcher)
    }

    fn two_tables() -> MemoryProvider {
        MemoryProvider::new()
            .with_table(
                "a",
                &["id", "label"],
                &["id"],
                vec![json!({ "id": 1, "label": "one" }), json!({ "id": 2, "label": "two" })],
            )
            .with_table("b", &["id"], &["id"], vec![])
    }

    #[tokio::test]
    async fn test_snapshots_follow_discovery_order() {
        let (_, fetcher) = fetcher(two_tables());

        let snapshots = fetcher.fetch_all().await.unwrap();

        assert_eq!(snapshots.len(), 2);
        assert_eq!(snapshots[0].table_name, "a");
        assert_eq!(snapshots[0].rows.len(), 2);
        assert_eq!(snapshots[1].table_name, "b");
        assert!(snapshots[1].rows.is_empty());
    }

    #[tokio::test]
    async fn test_one_failing_table_fails_the_batch() {
        let (_, fetcher) = fetcher(two_tables().failing_on("b"));

        assert!(matches!(
            fetcher.fetch_all().await,
            Err(Error::QueryRejected(_))
        ));
    }

    #[tokio::test]
    async fn test_empty_database() {
        let (_, fetcher) = fetcher(MemoryProvider::new());
        assert!(fetcher.fetch_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_tables_are_read_concurrently() {
        let database = two_tables()
            .with_table("c", &["id"], &["id"], vec![])
            .with_read_delay(Duration::from_millis(50));
        let (database, fetcher) = fetcher(database);

        fetcher.fetch_all().await.unwrap();

        assert_eq!(database.max_concurrent_reads(), 3);
    }
}
