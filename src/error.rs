use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

/// ApiResponse
///
/// The uniform JSON envelope returned by every endpoint. Successful handlers wrap
/// their payload in `{ "success": true, "data": ... }`; failures are serialized by
/// `ApiError` into `{ "success": false, "error": ... }`.
#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    /// Wraps a payload in the success envelope.
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

/// RepoError
///
/// Failure surface of the persistence layer. Data-store errors are never retried;
/// they bubble up to the handler boundary where they become a 500 response.
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// ApiError
///
/// The three error kinds of the handler boundary (validation, authorization, backend
/// failure), plus NotFound for missing resources. Each variant carries its HTTP status
/// and serializes into the failure envelope.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or malformed request fields. HTTP 400.
    #[error("{0}")]
    Validation(String),
    /// Failed session or password check. HTTP 401.
    #[error("unauthorized")]
    Unauthorized,
    /// The addressed resource does not exist. HTTP 404.
    #[error("not found")]
    NotFound,
    /// Data-store failure. HTTP 500.
    #[error(transparent)]
    Backend(#[from] RepoError),
    /// Unexpected server-side failure outside the data store (e.g. token signing).
    /// HTTP 500.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// Shorthand for the validation variant.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Backend(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    /// Serializes the error into the failure envelope. Backend failures are logged
    /// here and nowhere else; nothing is retried or escalated beyond the log line.
    fn into_response(self) -> Response {
        let status = self.status();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("request failed: {:?}", self);
        }
        // Internal details stay out of the client-facing message for 500s.
        let message = match &self {
            Self::Backend(_) | Self::Internal(_) => "internal server error".to_string(),
            other => other.to_string(),
        };
        let body = ApiResponse::<()> {
            success: false,
            data: None,
            error: Some(message),
        };
        (status, Json(body)).into_response()
    }
}
