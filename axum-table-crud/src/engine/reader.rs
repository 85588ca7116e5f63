//! Table Reader: whole-table reads

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::database::traits::DatabaseProvider;
use crate::engine::with_timeout;
use crate::schema::Row;
use crate::Result;

/// Reads every row and column of a named table
pub struct TableReader<DB: DatabaseProvider> {
    database: Arc<DB>,
    timeout: Option<Duration>,
}

impl<DB: DatabaseProvider> Clone for TableReader<DB> {
    fn clone(&self) -> Self {
        Self {
            database: self.database.clone(),
            timeout: self.timeout,
        }
    }
}

impl<DB: DatabaseProvider> TableReader<DB> {
    pub fn new(database: Arc<DB>, timeout: Option<Duration>) -> Self {
        Self { database, timeout }
    }

    /// Fetch all rows of `table`
    ///
    /// An empty table yields an empty vector. A name the database does not
    /// know fails with [`crate::Error::QueryRejected`].
    pub async fn read_table(&self, table: &str) -> Result<Vec<Row>> {
        let rows = with_timeout(self.timeout, self.database.fetch_rows(table)).await?;
        debug!(table, rows = rows.len(), "Read table");
        Ok(rows)
    }
}
