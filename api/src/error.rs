use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use horizon_core::config::ConfigError;
use horizon_core::curation::CurationError;
use horizon_core::error::{self, ApiError};

/// Internal error type that converts to structured API responses
#[derive(Debug)]
pub enum AppError {
    /// Validation error (400)
    Validation {
        message: String,
        field: Option<String>,
        received: Option<serde_json::Value>,
        docs_hint: Option<String>,
    },
    /// Resource does not exist (404)
    NotFound { resource: String },
    /// No default registered anywhere in the scope chain (404)
    ConfigurationNotFound { scope: String, field_key: String },
    /// Missing or invalid admin bearer token (401)
    Unauthorized { message: String },
    /// Internal error (500)
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let request_id = uuid::Uuid::now_v7().to_string();

        let (status, api_error) = match self {
            AppError::Validation {
                message,
                field,
                received,
                docs_hint,
            } => (
                StatusCode::BAD_REQUEST,
                ApiError {
                    error: error::codes::VALIDATION_FAILED.to_string(),
                    message,
                    field,
                    received,
                    request_id,
                    docs_hint,
                },
            ),
            AppError::NotFound { resource } => (
                StatusCode::NOT_FOUND,
                ApiError {
                    error: error::codes::NOT_FOUND.to_string(),
                    message: format!("{resource} not found"),
                    field: None,
                    received: None,
                    request_id,
                    docs_hint: None,
                },
            ),
            AppError::ConfigurationNotFound { scope, field_key } => (
                StatusCode::NOT_FOUND,
                ApiError {
                    error: error::codes::CONFIGURATION_NOT_FOUND.to_string(),
                    message: format!(
                        "no configuration registered for field '{field_key}' at scope '{scope}'"
                    ),
                    field: Some("field_key".to_string()),
                    received: Some(serde_json::Value::String(field_key)),
                    request_id,
                    docs_hint: Some(
                        "GET /api/admin/chat-config lists every registered page and field."
                            .to_string(),
                    ),
                },
            ),
            AppError::Unauthorized { message } => (
                StatusCode::UNAUTHORIZED,
                ApiError {
                    error: error::codes::UNAUTHORIZED.to_string(),
                    message,
                    field: None,
                    received: None,
                    request_id,
                    docs_hint: Some(
                        "Pass the admin token as 'Authorization: Bearer <token>'.".to_string(),
                    ),
                },
            ),
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiError {
                        error: error::codes::INTERNAL_ERROR.to_string(),
                        message: "An internal error occurred".to_string(),
                        field: None,
                        received: None,
                        request_id,
                        docs_hint: None,
                    },
                )
            }
        };

        (status, Json(api_error)).into_response()
    }
}

impl From<ConfigError> for AppError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::ConfigurationNotFound { scope, field_key } => {
                AppError::ConfigurationNotFound { scope, field_key }
            }
            ConfigError::InvalidScopePath { message } => AppError::Validation {
                message,
                field: Some("subtab".to_string()),
                received: None,
                docs_hint: Some("A subtab scope must name its enclosing tab.".to_string()),
            },
        }
    }
}

impl From<CurationError> for AppError {
    fn from(err: CurationError) -> Self {
        match err {
            CurationError::ItemNotFound { report_id, item_id } => AppError::NotFound {
                resource: format!("candidate item {item_id} in report {report_id}"),
            },
        }
    }
}
