use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Map};
use thiserror::Error;

use crate::constants::{
    ERR_ALREADY_TAKEN, ERR_CANT_BE_BLANK, ERR_INTERNAL, ERR_IS_INVALID, ERR_UNAUTHORIZED,
    LOGIN_FAILURE_FIELD,
};

/// A single field-level validation failure, keyed by field name in the
/// response body
#[derive(Debug, Clone)]
pub struct FieldError {
    pub kind: &'static str,
    pub path: String,
    pub value: String,
    pub message: &'static str,
}

impl FieldError {
    /// Uniqueness violation for `path` with the submitted `value`
    pub fn unique(path: &str, value: &str) -> Self {
        FieldError {
            kind: "unique",
            path: path.to_string(),
            value: value.to_string(),
            message: ERR_ALREADY_TAKEN,
        }
    }

    /// Required field that arrived missing or blank
    pub fn required(path: &str) -> Self {
        FieldError {
            kind: "required",
            path: path.to_string(),
            value: String::new(),
            message: ERR_CANT_BE_BLANK,
        }
    }
}

/// Application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] redb::Error),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Task join error: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),

    #[error("Crypto failure")]
    Crypto(#[from] ring::error::Unspecified),

    #[error("HMAC key error: {0}")]
    InvalidKey(#[from] hmac::digest::InvalidLength),

    #[error("Validation failed")]
    Validation(Vec<FieldError>),

    #[error("{0} can't be blank")]
    MissingField(&'static str),

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Invalid payload: {0}")]
    InvalidPayload(String),
}

/// Implement IntoResponse to convert AppError into HTTP responses
///
/// This is the single place where internal errors become status codes and
/// bodies. Validation-family errors use the `{"errors": ...}` shape the
/// deployed clients parse; everything else uses `{"error": ...}`. Internal
/// detail goes to the log, never to the client.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::Database(ref e) => {
                tracing::error!("Database error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": ERR_INTERNAL }),
                )
            }
            AppError::Transaction(ref e) => {
                tracing::error!("Transaction error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": ERR_INTERNAL }),
                )
            }
            AppError::Table(ref e) => {
                tracing::error!("Table error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": ERR_INTERNAL }),
                )
            }
            AppError::Storage(ref e) => {
                tracing::error!("Storage error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": ERR_INTERNAL }),
                )
            }
            AppError::Commit(ref e) => {
                tracing::error!("Commit error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": ERR_INTERNAL }),
                )
            }
            AppError::Serialization(ref e) => {
                tracing::error!("Serialization error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": ERR_INTERNAL }),
                )
            }
            AppError::Json(ref e) => {
                tracing::error!("JSON error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": ERR_INTERNAL }),
                )
            }
            AppError::TaskJoin(ref e) => {
                tracing::error!("Task join error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": ERR_INTERNAL }),
                )
            }
            AppError::Crypto(ref e) => {
                tracing::error!("Crypto failure: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": ERR_INTERNAL }),
                )
            }
            AppError::InvalidKey(ref e) => {
                tracing::error!("HMAC key error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": ERR_INTERNAL }),
                )
            }
            AppError::Validation(ref violations) => {
                let mut errors = Map::new();
                for violation in violations {
                    errors.insert(
                        violation.path.clone(),
                        json!({
                            "kind": violation.kind,
                            "path": violation.path,
                            "value": violation.value,
                            "message": violation.message,
                        }),
                    );
                }
                (StatusCode::UNPROCESSABLE_ENTITY, json!({ "errors": errors }))
            }
            AppError::MissingField(field) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                json!({ "errors": { field: ERR_CANT_BE_BLANK } }),
            ),
            AppError::InvalidCredentials => (
                StatusCode::UNPROCESSABLE_ENTITY,
                json!({ "errors": { LOGIN_FAILURE_FIELD: ERR_IS_INVALID } }),
            ),
            // Missing, malformed, expired and mis-signed tokens all land
            // here, as do lookups of unknown user ids
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                json!({ "error": ERR_UNAUTHORIZED }),
            ),
            AppError::InvalidPayload(ref msg) => {
                tracing::warn!("Rejected request payload: {}", msg);
                (StatusCode::BAD_REQUEST, json!({ "error": msg }))
            }
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for application results
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // Error Source Tests
    // =========================================================================

    #[test]
    fn test_crypto_failure_keeps_its_source() {
        let err = AppError::from(ring::error::Unspecified);

        // The derived source() hands back the ring error itself
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_crypto_failure_maps_to_internal_error() {
        let response = AppError::Crypto(ring::error::Unspecified).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
