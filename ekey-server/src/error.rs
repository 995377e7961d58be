//! API error handling module
//!
//! Provides a unified error type for all API endpoints with structured error variants.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use ekey_core::{EventError, MappingError};
use thiserror::Error;

/// API error type with structured variants for different error categories
#[derive(Debug, Error)]
pub enum ApiError {
    /// Unauthorized - credentials required but absent
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Forbidden - credentials present but wrong
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Not found - requested resource does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Webhook body could not be turned into an event
    #[error("Invalid event: {0}")]
    InvalidEvent(#[from] EventError),

    /// Mapping export rejected at configuration time
    #[error("Invalid mapping: {0}")]
    InvalidMapping(#[from] MappingError),
}

impl ApiError {
    /// Create an unauthorized error
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized(message.into())
    }

    /// Create a forbidden error
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden(message.into())
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidEvent(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::InvalidMapping(e) => match e {
                MappingError::Io { .. } => StatusCode::INTERNAL_SERVER_ERROR,
                MappingError::InvalidJson(_)
                | MappingError::InvalidStructure
                | MappingError::MissingRequiredFields => StatusCode::BAD_REQUEST,
            },
        }
    }

    /// Get the error code for programmatic error handling
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::NotFound(_) => "NOT_FOUND",
            Self::InvalidEvent(e) => match e {
                EventError::InvalidJson(_) => "INVALID_JSON",
                EventError::MissingFields(_) => "MISSING_FIELDS",
                EventError::InvalidField(_) => "INVALID_FIELD",
            },
            Self::InvalidMapping(e) => match e {
                MappingError::InvalidJson(_) => "INVALID_JSON",
                MappingError::InvalidStructure => "INVALID_MAPPING_STRUCTURE",
                MappingError::MissingRequiredFields => "MISSING_REQUIRED_FIELDS",
                MappingError::Io { .. } => "MAPPING_IO_ERROR",
            },
        }
    }

    /// Get sanitized error message for client response
    fn client_message(&self) -> String {
        match self {
            Self::InvalidMapping(MappingError::Io { .. }) => {
                "Mapping file could not be read".to_string()
            }
            _ => self.to_string(),
        }
    }

    /// Get the error category for logging
    fn error_category(&self) -> &'static str {
        match self {
            Self::Unauthorized(_) => "unauthorized",
            Self::Forbidden(_) => "forbidden",
            Self::NotFound(_) => "not_found",
            Self::InvalidEvent(_) => "invalid_event",
            Self::InvalidMapping(_) => "invalid_mapping",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let category = self.error_category();
        let code = self.error_code();
        let internal_message = self.to_string();
        let client_message = self.client_message();

        if status.is_server_error() {
            tracing::error!(
                status = %status,
                category = category,
                code = code,
                error = %internal_message,
                "Server error"
            );
        } else if matches!(self, Self::Unauthorized(_) | Self::Forbidden(_)) {
            tracing::warn!(
                status = %status,
                category = category,
                code = code,
                error = %internal_message,
                "Rejected request"
            );
        } else {
            tracing::warn!(
                status = %status,
                category = category,
                code = code,
                error = %internal_message,
                "Client error"
            );
        }

        let body = serde_json::json!({
            "error": client_message,
            "code": code,
        });

        (status, Json(body)).into_response()
    }
}
