//! Read endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use std::sync::Arc;
use tracing::error;

use crate::database::traits::DatabaseProvider;
use crate::engine::CrudEngine;
use crate::schema::TableSnapshot;

/// Handler for GET /all-data
///
/// Returns one `{tableName, data}` snapshot per table, in catalog order.
/// Any single table failing fails the whole response.
pub async fn all_data_handler<DB: DatabaseProvider>(
    State(engine): State<Arc<CrudEngine<DB>>>,
) -> Response {
    match engine.fetch_all().await {
        Ok(snapshots) => (StatusCode::OK, Json(snapshots)).into_response(),
        Err(err) => {
            error!(error = %err, "Failed to fetch all tables");
            err.into_response()
        }
    }
}

/// Handler for GET /table-names
pub async fn table_names_handler<DB: DatabaseProvider>(
    State(engine): State<Arc<CrudEngine<DB>>>,
) -> Response {
    match engine.list_tables().await {
        Ok(tables) => (StatusCode::OK, Json(tables)).into_response(),
        Err(err) => {
            error!(error = %err, "Failed to list tables");
            err.into_response()
        }
    }
}

/// Handler for GET /table-data/{name}
pub async fn table_data_handler<DB: DatabaseProvider>(
    State(engine): State<Arc<CrudEngine<DB>>>,
    Path(table_name): Path<String>,
) -> Response {
    match engine.read_table(&table_name).await {
        Ok(rows) => (StatusCode::OK, Json(TableSnapshot { table_name, rows })).into_response(),
        Err(err) => {
            error!(table = %table_name, error = %err, "Failed to read table");
            err.into_response()
        }
    }
}
