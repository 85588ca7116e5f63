//! In-memory `DatabaseProvider` for engine tests
//!
//! Tables keep their registration order, which stands in for catalog order.
//! Faults, latency and mutation calls are all observable from the test.

use crate::database::traits::{DatabaseError, DatabaseProvider};
use crate::schema::{ColumnInfo, Row, TableSchema};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

struct MemoryTable {
    schema: TableSchema,
    rows: Mutex<Vec<Row>>,
}

pub struct MemoryProvider {
    tables: Vec<MemoryTable>,
    failing: HashSet<String>,
    unavailable: bool,
    read_delay: Option<Duration>,
    calls: Mutex<Vec<String>>,
    reads_in_flight: AtomicUsize,
    max_reads_in_flight: AtomicUsize,
}

impl MemoryProvider {
    pub fn new() -> Self {
        Self {
            tables: Vec::new(),
            failing: HashSet::new(),
            unavailable: false,
            read_delay: None,
            calls: Mutex::new(Vec::new()),
            reads_in_flight: AtomicUsize::new(0),
            max_reads_in_flight: AtomicUsize::new(0),
        }
    }

    /// Register a table; `rows` must be JSON objects
    pub fn with_table(mut self, name: &str, columns: &[&str], primary_key: &[&str], rows: Vec<Value>) -> Self {
        let columns = columns
            .iter()
            .map(|column| ColumnInfo {
                name: column.to_string(),
                data_type: "TEXT".to_string(),
                nullable: !primary_key.contains(column),
                default_value: None,
                is_primary_key: primary_key.contains(column),
            })
            .collect();

        let primary_key = if primary_key.is_empty() {
            None
        } else {
            Some(primary_key.iter().map(|column| column.to_string()).collect())
        };

        let rows = rows
            .into_iter()
            .map(|row| match row {
                Value::Object(map) => map,
                other => panic!("table rows must be objects, got {other}"),
            })
            .collect();

        self.tables.push(MemoryTable {
            schema: TableSchema {
                name: name.to_string(),
                columns,
                primary_key,
            },
            rows: Mutex::new(rows),
        });
        self
    }

    /// Reads of `table` fail as if the database rejected them
    pub fn failing_on(mut self, table: &str) -> Self {
        self.failing.insert(table.to_string());
        self
    }

    /// Every call fails as if the pool had no connection to give
    pub fn unavailable(mut self) -> Self {
        self.unavailable = true;
        self
    }

    /// Every row read sleeps this long before answering
    pub fn with_read_delay(mut self, delay: Duration) -> Self {
        self.read_delay = Some(delay);
        self
    }

    /// Mutation calls in the order they reached the provider, as `"kind:table"`
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn rows(&self, table: &str) -> Vec<Row> {
        self.table(table).map(|t| t.rows.lock().unwrap().clone()).unwrap_or_default()
    }

    /// Highest number of row reads that were running at the same time
    pub fn max_concurrent_reads(&self) -> usize {
        self.max_reads_in_flight.load(Ordering::SeqCst)
    }

    fn table(&self, name: &str) -> Option<&MemoryTable> {
        self.tables.iter().find(|table| table.schema.name == name)
    }

    fn check_available(&self) -> Result<(), DatabaseError> {
        if self.unavailable {
            return Err(DatabaseError::Connection("pool timed out while waiting for an open connection".to_string()));
        }
        Ok(())
    }

    fn existing_table(&self, name: &str) -> Result<&MemoryTable, DatabaseError> {
        self.table(name)
            .ok_or_else(|| DatabaseError::Query(format!("no such table: {name}")))
    }

    fn record(&self, kind: &str, table: &str) {
        self.calls.lock().unwrap().push(format!("{kind}:{table}"));
    }
}

/// Key comparison that treats `102` and `"102"` alike, as SQL affinity would
fn key_matches(stored: Option<&Value>, identifier: &Value) -> bool {
    fn text(value: &Value) -> String {
        match value {
            Value::String(text) => text.clone(),
            other => other.to_string(),
        }
    }
    stored.is_some_and(|stored| text(stored) == text(identifier))
}

#[async_trait]
impl DatabaseProvider for MemoryProvider {
    async fn list_tables(&self) -> Result<Vec<String>, DatabaseError> {
        self.check_available()?;
        Ok(self.tables.iter().map(|table| table.schema.name.clone()).collect())
    }

    async fn get_table_schema(&self, table: &str) -> Result<TableSchema, DatabaseError> {
        self.check_available()?;
        self.table(table)
            .map(|t| t.schema.clone())
            .ok_or_else(|| DatabaseError::TableNotFound(table.to_string()))
    }

    async fn fetch_rows(&self, table: &str) -> Result<Vec<Row>, DatabaseError> {
        self.check_available()?;

        let in_flight = self.reads_in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_reads_in_flight.fetch_max(in_flight, Ordering::SeqCst);
        if let Some(delay) = self.read_delay {
            tokio::time::sleep(delay).await;
        }
        self.reads_in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.failing.contains(table) {
            return Err(DatabaseError::Query(format!("disk I/O error reading {table}")));
        }
        Ok(self.existing_table(table)?.rows.lock().unwrap().clone())
    }

    async fn insert_row(&self, schema: &TableSchema, values: &[(String, Value)]) -> Result<u64, DatabaseError> {
        self.check_available()?;
        self.record("insert", &schema.name);

        let row: Row = values.iter().cloned().collect();
        self.existing_table(&schema.name)?.rows.lock().unwrap().push(row);
        Ok(1)
    }

    async fn update_rows(
        &self,
        schema: &TableSchema,
        assignments: &[(String, Value)],
        key: &str,
        identifier: &Value,
    ) -> Result<u64, DatabaseError> {
        self.check_available()?;
        self.record("update", &schema.name);

        let mut rows = self.existing_table(&schema.name)?.rows.lock().unwrap();
        let mut affected = 0;
        for row in rows.iter_mut().filter(|row| key_matches(row.get(key), identifier)) {
            for (column, value) in assignments {
                row.insert(column.clone(), value.clone());
            }
            affected += 1;
        }
        Ok(affected)
    }

    async fn delete_rows(&self, schema: &TableSchema, key: &str, identifier: &Value) -> Result<u64, DatabaseError> {
        self.check_available()?;
        self.record("delete", &schema.name);

        let mut rows = self.existing_table(&schema.name)?.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|row| !key_matches(row.get(key), identifier));
        Ok((before - rows.len()) as u64)
    }
}
