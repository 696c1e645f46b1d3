use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::types::ApiErrorResponse;

/// Application error codes following the pattern E{area}{sequence}
///
/// Ranges:
/// - E0xxx: Shared/infrastructure errors
/// - E1xxx: Direct-message errors
/// - E2xxx: Forum errors
/// - E3xxx: Category errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    // Shared (E0xxx)
    InternalError,
    ValidationError,
    NotFound,
    Unauthorized,
    Forbidden,
    BadRequest,
    ExternalServiceError,

    // Direct messages (E1xxx)
    MessageNotFound,

    // Forums (E2xxx)
    ForumNotFound,
    DuplicateForum,
    UnsafeContent,
    GroupRegistrationFailed,
    EventCreationFailed,
    CompensationFailed,

    // Categories (E3xxx)
    CategoryNotFound,
}

impl ErrorCode {
    pub fn code(&self) -> &'static str {
        match self {
            // Shared
            Self::InternalError => "E0001",
            Self::ValidationError => "E0002",
            Self::NotFound => "E0003",
            Self::Unauthorized => "E0004",
            Self::Forbidden => "E0005",
            Self::BadRequest => "E0006",
            Self::ExternalServiceError => "E0007",

            // Direct messages
            Self::MessageNotFound => "E1001",

            // Forums
            Self::ForumNotFound => "E2001",
            Self::DuplicateForum => "E2002",
            Self::UnsafeContent => "E2003",
            Self::GroupRegistrationFailed => "E2004",
            Self::EventCreationFailed => "E2005",
            Self::CompensationFailed => "E2006",

            // Categories
            Self::CategoryNotFound => "E3001",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InternalError | Self::CompensationFailed => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ValidationError | Self::BadRequest | Self::UnsafeContent => {
                StatusCode::BAD_REQUEST
            }
            Self::NotFound
            | Self::MessageNotFound
            | Self::ForumNotFound
            | Self::CategoryNotFound => StatusCode::NOT_FOUND,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::DuplicateForum => StatusCode::CONFLICT,
            Self::ExternalServiceError
            | Self::GroupRegistrationFailed
            | Self::EventCreationFailed => StatusCode::BAD_GATEWAY,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{message}")]
    Known {
        code: ErrorCode,
        message: String,
        details: Option<serde_json::Value>,
    },

    #[error("internal server error")]
    Internal(#[from] anyhow::Error),

    #[error("database error: {0}")]
    Database(#[from] diesel::result::Error),

    #[error("validation error: {0}")]
    Validation(String),
}

impl AppError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Known {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(
        code: ErrorCode,
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self::Known {
            code,
            message: message.into(),
            details: Some(details),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unauthorized, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::BadRequest, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Forbidden, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    pub fn external(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ExternalServiceError, message)
    }

    /// The error code the HTTP layer should surface, if one is known.
    pub fn error_code(&self) -> Option<ErrorCode> {
        match self {
            Self::Known { code, .. } => Some(*code),
            _ => None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_response) = match &self {
            AppError::Known {
                code,
                message,
                details,
            } => {
                let status = code.status_code();
                let mut resp = ApiErrorResponse::new(code.code(), message);
                if let Some(d) = details {
                    resp = resp.with_details(d.clone());
                }
                (status, resp)
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiErrorResponse::new("E0001", "internal server error"),
                )
            }
            AppError::Database(err) => {
                tracing::error!(error = %err, "database error");
                match err {
                    diesel::result::Error::NotFound => (
                        StatusCode::NOT_FOUND,
                        ApiErrorResponse::new("E0003", "resource not found"),
                    ),
                    _ => (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        ApiErrorResponse::new("E0001", "database error"),
                    ),
                }
            }
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                ApiErrorResponse::new("E0002", msg),
            ),
        };

        (status, Json(error_response)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_errors_map_to_expected_status_codes() {
        assert_eq!(
            ErrorCode::DuplicateForum.status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ErrorCode::UnsafeContent.status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ErrorCode::ForumNotFound.status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(ErrorCode::Forbidden.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(
            ErrorCode::EventCreationFailed.status_code(),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn error_codes_are_stable_strings() {
        assert_eq!(ErrorCode::DuplicateForum.code(), "E2002");
        assert_eq!(ErrorCode::UnsafeContent.code(), "E2003");
        assert_eq!(ErrorCode::MessageNotFound.code(), "E1001");
    }

    #[test]
    fn error_code_accessor_only_reports_known_errors() {
        let known = AppError::new(ErrorCode::ForumNotFound, "forum not found");
        assert_eq!(known.error_code(), Some(ErrorCode::ForumNotFound));

        let validation = AppError::Validation("bad filter".into());
        assert_eq!(validation.error_code(), None);
    }
}
