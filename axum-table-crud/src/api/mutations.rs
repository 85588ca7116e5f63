//! Mutation endpoints
//!
//! Success bodies are plain confirmation texts; failures are JSON
//! `{"error": ...}` bodies produced by [`crate::Error`]'s `IntoResponse`.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use std::sync::Arc;
use tracing::error;

use crate::database::traits::DatabaseProvider;
use crate::engine::CrudEngine;
use crate::schema::{CreateRequest, DeleteRequest, UpdateRequest};

pub const CREATED_MESSAGE: &str = "Data created successfully";
pub const UPDATED_MESSAGE: &str = "Data updated successfully";
pub const DELETED_MESSAGE: &str = "Data deleted successfully";

/// Handler for POST /create-data
///
/// Body: `{"tableName": ..., "data": {column: value, ...}}`. The data keys
/// must match the table's reference columns exactly.
pub async fn create_data_handler<DB: DatabaseProvider>(
    State(engine): State<Arc<CrudEngine<DB>>>,
    Json(request): Json<CreateRequest>,
) -> Response {
    match engine.create(&request.table_name, &request.data).await {
        Ok(_) => (StatusCode::CREATED, CREATED_MESSAGE).into_response(),
        Err(err) => {
            error!(table = %request.table_name, error = %err, "Failed to create row");
            err.into_response()
        }
    }
}

/// Handler for PUT /update-data
///
/// Body: `{"tableName": ..., "id": ..., "data": {column: value, ...}}`
pub async fn update_data_handler<DB: DatabaseProvider>(
    State(engine): State<Arc<CrudEngine<DB>>>,
    Json(request): Json<UpdateRequest>,
) -> Response {
    match engine
        .update(&request.table_name, &request.id, &request.data)
        .await
    {
        Ok(_) => (StatusCode::OK, UPDATED_MESSAGE).into_response(),
        Err(err) => {
            error!(table = %request.table_name, id = %request.id, error = %err, "Failed to update row");
            err.into_response()
        }
    }
}

/// Handler for DELETE /delete-data
///
/// Body: `{"tableName": ..., "id": ...}`
pub async fn delete_data_handler<DB: DatabaseProvider>(
    State(engine): State<Arc<CrudEngine<DB>>>,
    Json(request): Json<DeleteRequest>,
) -> Response {
    match engine.delete(&request.table_name, &request.id).await {
        Ok(_) => (StatusCode::OK, DELETED_MESSAGE).into_response(),
        Err(err) => {
            error!(table = %request.table_name, id = %request.id, error = %err, "Failed to delete row");
            err.into_response()
        }
    }
}
