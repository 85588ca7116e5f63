//! REST API endpoints
//!
//! Handlers are thin: they decode the request, call the [`CrudEngine`] and
//! map its result onto a status code and body.

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;

use crate::database::traits::DatabaseProvider;
use crate::engine::CrudEngine;

pub mod data;
pub mod error;
pub mod mutations;

// Re-export handlers for convenience
pub use data::{all_data_handler, table_data_handler, table_names_handler};
pub use error::ErrorResponse;
pub use mutations::{create_data_handler, delete_data_handler, update_data_handler};

/// Create the API router with all endpoints
///
/// # Arguments
///
/// * `engine` - Engine shared by every handler
///
/// # Returns
///
/// An Axum Router configured with all API routes
pub fn create_api_router<DB: DatabaseProvider>(engine: Arc<CrudEngine<DB>>) -> Router {
    // Axum 0.8 uses {param} syntax instead of :param
    Router::new()
        .route("/all-data", get(all_data_handler::<DB>))
        .route("/table-names", get(table_names_handler::<DB>))
        .route("/table-data/{name}", get(table_data_handler::<DB>))
        .route("/create-data", post(create_data_handler::<DB>))
        .route("/update-data", put(update_data_handler::<DB>))
        .route("/delete-data", delete(delete_data_handler::<DB>))
        .with_state(engine)
}
