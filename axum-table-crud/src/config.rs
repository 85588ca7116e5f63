//! Engine configuration

use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

/// Tunables for the CRUD engine
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Per-query timeout in seconds; 0 disables it
    pub query_timeout_seconds: u64,

    /// Report update/delete that matched no rows as "not found" instead of success
    pub report_missing_rows: bool,

    /// Fixed create-time column sets, keyed by table name.
    ///
    /// Tables without an entry use their full catalog column list.
    pub reference_columns: HashMap<String, Vec<String>>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            query_timeout_seconds: 30,
            report_missing_rows: false,
            reference_columns: HashMap::new(),
        }
    }
}

impl EngineConfig {
    /// Timeout applied to every database round-trip
    pub fn query_timeout(&self) -> Option<Duration> {
        (self.query_timeout_seconds > 0).then(|| Duration::from_secs(self.query_timeout_seconds))
    }
}
