use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Why a free trial request was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrialDenyReason {
    /// The account already received a trial.
    AccountAlreadyGranted,
    /// The network origin already received a trial.
    OriginAlreadyGranted,
    /// The hardware id already received a trial.
    DeviceAlreadyGranted,
    /// The hardware id received a trial under a different account.
    ForeignDevice,
}

impl TrialDenyReason {
    pub fn message(&self) -> &'static str {
        match self {
            TrialDenyReason::AccountAlreadyGranted => "A trial was already granted to this account",
            TrialDenyReason::OriginAlreadyGranted => {
                "A trial was already granted from this network address"
            }
            TrialDenyReason::DeviceAlreadyGranted => "A trial was already granted on this device",
            TrialDenyReason::ForeignDevice => "This device is tied to another account",
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Account not found")]
    AccountNotFound,

    #[error("Key not found")]
    KeyNotFound,

    #[error("Key already used")]
    KeyAlreadyUsed,

    #[error("Device mismatch")]
    DeviceMismatch,

    #[error("Trial denied: {}", .0.message())]
    TrialDenied(TrialDenyReason),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, details) = match &self {
            AppError::InvalidCredentials => {
                (StatusCode::UNAUTHORIZED, "Invalid credentials", None)
            }
            AppError::AccountNotFound => (StatusCode::NOT_FOUND, "Account not found", None),
            AppError::KeyNotFound => (StatusCode::NOT_FOUND, "Key not found", None),
            AppError::KeyAlreadyUsed => {
                (StatusCode::CONFLICT, "Key has already been used", None)
            }
            AppError::DeviceMismatch => (
                StatusCode::FORBIDDEN,
                "Account is bound to another device",
                None,
            ),
            AppError::TrialDenied(reason) => (
                StatusCode::FORBIDDEN,
                "Trial unavailable",
                Some(reason.message().to_string()),
            ),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "Not found", Some(msg.clone())),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "Bad request", Some(msg.clone())),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized", None),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, "Forbidden", Some(msg.clone())),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "Conflict", Some(msg.clone())),
            AppError::Database(e) => {
                tracing::error!("Database error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error", None)
            }
            AppError::Pool(e) => {
                tracing::error!("Pool error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error", None)
            }
            AppError::Json(e) => {
                tracing::error!("JSON error: {}", e);
                (StatusCode::BAD_REQUEST, "Invalid JSON", Some(e.to_string()))
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error", None)
            }
        };

        let body = ErrorResponse {
            error: error.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
