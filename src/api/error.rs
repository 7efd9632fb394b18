//! API error responses.

use crate::audit::AuditError;
use crate::entry::FieldErrors;
use crate::store::StoreError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// Message for field-level validation failures.
pub const VALIDATION_FAILED: &str = "Input validation failed.";

/// Errors returned by API handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Malformed request or failed validation.
    #[error("{message}")]
    BadRequest {
        /// Summary message.
        message: String,
        /// Per-field messages.
        field_errors: Option<FieldErrors>,
    },

    /// Route disabled or resource missing.
    #[error("Not found.")]
    NotFound,

    /// Uniqueness violation.
    #[error("{0}")]
    Conflict(String),

    /// An upstream dependency could not answer.
    #[error("{0}")]
    Unavailable(String),

    /// Anything else. The detail is logged, never returned.
    #[error("Internal server error.")]
    Internal(String),
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    field_errors: Option<FieldErrors>,
}

impl ApiError {
    /// A 400 with a message only.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
            field_errors: None,
        }
    }

    /// A 400 carrying field errors.
    #[must_use]
    pub fn validation(field_errors: FieldErrors) -> Self {
        Self::BadRequest {
            message: VALIDATION_FAILED.to_string(),
            field_errors: Some(field_errors),
        }
    }

    /// A 400 with one message on one field.
    #[must_use]
    pub fn field(field: &str, message: &str) -> Self {
        Self::validation(FieldErrors::from([(
            field.to_string(),
            vec![message.to_string()],
        )]))
    }

    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if let Self::Internal(detail) = &self {
            error!("Request failed: {detail}");
        }

        let error = self.to_string();
        let field_errors = match self {
            Self::BadRequest { field_errors, .. } => field_errors,
            _ => None,
        };

        (status, Json(ErrorBody { error, field_errors })).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate(_) => Self::Conflict(super::USERNAME_TAKEN.to_string()),
            other => Self::Internal(other.to_string()),
        }
    }
}

impl From<AuditError> for ApiError {
    fn from(err: AuditError) -> Self {
        match err {
            AuditError::Store(e) => e.into(),
            AuditError::Invalid(errors) => Self::BadRequest {
                message: "Invalid payload.".to_string(),
                field_errors: Some(errors),
            },
            AuditError::ConfirmationRequired => Self::BadRequest {
                message: AuditError::ConfirmationRequired.to_string(),
                field_errors: AuditError::ConfirmationRequired.field_errors(),
            },
        }
    }
}
