//! HTTP mapping of engine errors

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;

use crate::Error;

/// JSON body returned for every failed request
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub missing: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub unexpected: Option<Vec<String>>,
}

impl Error {
    /// Status code this error is reported with
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::ColumnMismatch { .. }
            | Error::NoPrimaryKey(_)
            | Error::CompositePrimaryKey { .. }
            | Error::InvalidPayload(_) => StatusCode::BAD_REQUEST,
            Error::RowNotFound { .. } => StatusCode::NOT_FOUND,
            Error::StorageUnavailable(_) | Error::QueryRejected(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<&Error> for ErrorResponse {
    fn from(error: &Error) -> Self {
        let (missing, unexpected) = match error {
            Error::ColumnMismatch {
                missing,
                unexpected,
                ..
            } => (Some(missing.clone()), Some(unexpected.clone())),
            _ => (None, None),
        };

        Self {
            error: error.to_string(),
            missing,
            unexpected,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        (self.status_code(), Json(ErrorResponse::from(&self))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            Error::NoPrimaryKey("trigger_test".to_string()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            Error::InvalidPayload("id must not be null".to_string()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            Error::RowNotFound {
                table: "employee".to_string(),
                key: "emp_id".to_string(),
                identifier: "999".to_string(),
            }
            .status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            Error::QueryRejected("no such table: ghost".to_string()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            Error::StorageUnavailable("pool timed out".to_string()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_column_mismatch_body_lists_columns() {
        let error = Error::ColumnMismatch {
            table: "employee".to_string(),
            missing: vec!["sex".to_string()],
            unexpected: vec![],
        };

        let body = serde_json::to_value(ErrorResponse::from(&error)).unwrap();

        assert_eq!(body["missing"], json!(["sex"]));
        assert_eq!(body["unexpected"], json!([]));
        assert!(body["error"].as_str().unwrap().contains("Missing required columns: sex"));
    }

    #[test]
    fn test_plain_error_body_has_only_message() {
        let body = serde_json::to_value(ErrorResponse::from(&Error::NoPrimaryKey("t".to_string()))).unwrap();
        assert_eq!(body, json!({ "error": "No primary key found for table 't'" }));
    }
}
