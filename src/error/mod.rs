use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::store::StoreError;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

/// Failure taxonomy of the auth core. The transport mapping below is the
/// only place status codes are decided; operations return these variants.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Validation failed")]
    Validation(Vec<String>),
    #[error("User with email or username already exists")]
    DuplicateHandle,
    #[error("{0}")]
    NotFound(String),
    /// Password mismatch, or an unknown handle during login. The two are
    /// deliberately indistinguishable externally to block handle
    /// enumeration.
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    AssetUpload(String),
    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, error_message, code, details) = match self {
            AuthError::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                "Validation failed".to_string(),
                "VALIDATION_ERROR".to_string(),
                Some(serde_json::json!({ "errors": errors })),
            ),
            AuthError::DuplicateHandle => (
                StatusCode::CONFLICT,
                "User with email or username already exists".to_string(),
                "CONFLICT".to_string(),
                None,
            ),
            AuthError::NotFound(msg) => {
                (StatusCode::NOT_FOUND, msg, "NOT_FOUND".to_string(), None)
            }
            AuthError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                "Invalid email/username or password".to_string(),
                "UNAUTHORIZED".to_string(),
                None,
            ),
            AuthError::Unauthorized(msg) => (
                StatusCode::UNAUTHORIZED,
                msg,
                "UNAUTHORIZED".to_string(),
                None,
            ),
            AuthError::AssetUpload(msg) => (
                StatusCode::BAD_REQUEST,
                msg,
                "ASSET_UPLOAD_FAILED".to_string(),
                None,
            ),
            AuthError::Internal(err) => {
                tracing::error!("Internal server error: {:?}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                    "INTERNAL_SERVER_ERROR".to_string(),
                    None,
                )
            }
        };

        let body = Json(ErrorResponse {
            error: error_message,
            code,
            details,
        });

        (status, body).into_response()
    }
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => AuthError::NotFound("User not found".to_string()),
            StoreError::DuplicateHandle => AuthError::DuplicateHandle,
            StoreError::Backend(e) => AuthError::Internal(e),
        }
    }
}

impl From<validator::ValidationErrors> for AuthError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let messages: Vec<String> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter()
                    .map(move |e| format!("{}: {}", field, e.code.as_ref()))
            })
            .collect();
        AuthError::Validation(messages)
    }
}
