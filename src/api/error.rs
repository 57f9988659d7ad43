use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use utoipa::ToSchema;

use crate::db::WalletDbError;
use crate::wallet::WalletError;

#[derive(Debug, Error, ToSchema)]
pub enum ApiError {
    #[error("Internal server error: {0}")]
    InternalServerError(String),
    #[error("Database error: {0}")]
    DbError(String),
    #[error("Wallet not found: {0}")]
    WalletNotFound(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Invalid request: {0}")]
    BadRequest(String),
    #[error("Ledger unavailable: {0}")]
    LedgerUnavailable(String),
    #[error("Cipher task failed: {0}")]
    TransformFailed(String),
}

impl From<WalletError> for ApiError {
    fn from(err: WalletError) -> Self {
        match err {
            WalletError::NotFound(name) => ApiError::WalletNotFound(name),
            WalletError::Database(WalletDbError::DuplicateEntry(msg)) => ApiError::Conflict(msg),
            WalletError::Database(e) => ApiError::DbError(e.to_string()),
            WalletError::Ledger(e) => ApiError::LedgerUnavailable(e.to_string()),
            WalletError::Transform(e) => ApiError::TransformFailed(e.to_string()),
            other => ApiError::InternalServerError(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            ApiError::InternalServerError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            ApiError::DbError(e) => (StatusCode::INTERNAL_SERVER_ERROR, e),
            ApiError::WalletNotFound(name) => (StatusCode::NOT_FOUND, format!("Wallet '{}' not found", name)),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::LedgerUnavailable(e) => (StatusCode::BAD_GATEWAY, e),
            ApiError::TransformFailed(e) => (StatusCode::INTERNAL_SERVER_ERROR, e),
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}
