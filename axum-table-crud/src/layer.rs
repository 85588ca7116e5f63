//! CrudLayer - Main Axum integration layer
//!
//! This module provides the entry point for mounting the CRUD endpoints into
//! an Axum application.

use crate::api::create_api_router;
use crate::config::EngineConfig;
use crate::database::traits::DatabaseProvider;
use crate::engine::CrudEngine;
use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

#[cfg(feature = "sqlite")]
use crate::database::sqlite::SqliteProvider;

#[cfg(feature = "postgres")]
use crate::database::postgres::PostgresProvider;

#[cfg(feature = "mysql")]
use crate::database::mysql::MySqlProvider;

/// Main layer for mounting the CRUD API into an Axum application
///
/// # Example
///
/// ```rust,no_run
/// use axum::Router;
/// use axum_table_crud::{CrudLayer, EngineConfig};
/// use sqlx::SqlitePool;
///
/// # async fn example() {
/// let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
/// let crud = CrudLayer::sqlite("/crud", pool, EngineConfig::default());
/// let app = Router::new().merge(crud.into_router());
/// # }
/// ```
pub struct CrudLayer<DB: DatabaseProvider> {
    base_path: String,
    engine: Arc<CrudEngine<DB>>,
}

impl<DB: DatabaseProvider> CrudLayer<DB> {
    /// Create a new CRUD layer at the given base path
    ///
    /// # Arguments
    ///
    /// * `base_path` - The URL path the routes are mounted under (e.g. "/crud"); empty for the root
    /// * `database` - The database provider implementation
    /// * `config` - Engine tunables
    pub fn new(base_path: impl Into<String>, database: DB, config: EngineConfig) -> Self {
        Self {
            base_path: base_path.into(),
            engine: Arc::new(CrudEngine::new(Arc::new(database), config)),
        }
    }

    /// The engine behind the routes, for callers that want to use it directly
    pub fn engine(&self) -> Arc<CrudEngine<DB>> {
        self.engine.clone()
    }

    /// Convert into an Axum Router that can be merged
    ///
    /// The returned router includes:
    /// - `GET {base_path}/all-data`, `/table-names`, `/table-data/{name}`
    /// - `POST {base_path}/create-data`, `PUT /update-data`, `DELETE /delete-data`
    /// - Permissive CORS middleware, since a browser client usually runs on another origin
    pub fn into_router(self) -> Router {
        let api_router = create_api_router(self.engine);

        let router = match mount_path(&self.base_path) {
            Some(path) => Router::new().nest(&path, api_router),
            None => api_router,
        };

        router.layer(CorsLayer::permissive())
    }
}

/// Normalise a base path to `/segment[/segment...]`, or `None` for the root
///
/// axum only nests under paths with a leading `/` and no trailing one.
fn mount_path(base_path: &str) -> Option<String> {
    let trimmed = base_path.trim().trim_matches('/');
    if trimmed.is_empty() {
        None
    } else {
        Some(format!("/{trimmed}"))
    }
}

#[cfg(feature = "sqlite")]
impl CrudLayer<SqliteProvider> {
    /// Create a new CRUD layer for SQLite
    ///
    /// # Arguments
    ///
    /// * `base_path` - The URL path the routes are mounted under
    /// * `pool` - The SQLite connection pool
    /// * `config` - Engine tunables
    pub fn sqlite(base_path: impl Into<String>, pool: sqlx::SqlitePool, config: EngineConfig) -> Self {
        Self::new(base_path, SqliteProvider::new(pool), config)
    }
}

#[cfg(feature = "postgres")]
impl CrudLayer<PostgresProvider> {
    /// Create a new CRUD layer for PostgreSQL
    pub fn postgres(base_path: impl Into<String>, pool: sqlx::PgPool, config: EngineConfig) -> Self {
        Self::new(base_path, PostgresProvider::new(pool), config)
    }
}

#[cfg(feature = "mysql")]
impl CrudLayer<MySqlProvider> {
    /// Create a new CRUD layer for MySQL
    pub fn mysql(base_path: impl Into<String>, pool: sqlx::MySqlPool, config: EngineConfig) -> Self {
        Self::new(base_path, MySqlProvider::new(pool), config)
    }
}

#[cfg(test)]
mod tests {
    use super::mount_path;

    #[test]
    fn test_mount_path_normalisation() {
        assert_eq!(mount_path(""), None);
        assert_eq!(mount_path("/"), None);
        assert_eq!(mount_path("crud"), Some("/crud".to_string()));
        assert_eq!(mount_path("/crud/"), Some("/crud".to_string()));
        assert_eq!(mount_path("admin/crud"), Some("/admin/crud".to_string()));
    }
}
