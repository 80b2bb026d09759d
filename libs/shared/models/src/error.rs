use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

const GENERIC_INTERNAL_MESSAGE: &str = "An internal error occurred";
const GENERIC_DEPENDENCY_MESSAGE: &str = "An upstream service failed";
pub const TOKEN_INVALID_MESSAGE: &str = "Invalid or expired token";

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not Found: {0}")]
    NotFound(String),

    #[error("Bad Request: {0}")]
    BadRequest(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid or expired token")]
    TokenInvalidOrExpired,

    #[error("Internal Server Error: {0}")]
    Internal(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("External service error: {0}")]
    ExternalService(String),
}

impl AppError {
    /// Stable discriminant returned to clients alongside the message.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Auth(_) => "unauthorized",
            AppError::Forbidden(_) => "forbidden",
            AppError::NotFound(_) => "not_found",
            AppError::BadRequest(_) | AppError::ValidationError(_) => "invalid_input",
            AppError::Conflict(_) => "conflict",
            AppError::TokenInvalidOrExpired => "token_invalid_or_expired",
            AppError::Internal(_) => "internal",
            AppError::Database(_) | AppError::ExternalService(_) => "dependency_failure",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Auth(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) | AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::TokenInvalidOrExpired => StatusCode::BAD_REQUEST,
            AppError::Internal(_) | AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::ExternalService(_) => StatusCode::BAD_GATEWAY,
        }
    }

    /// Message safe to show to the caller. Internal details stay in the logs.
    pub fn public_message(&self) -> String {
        match self {
            AppError::Auth(msg)
            | AppError::Forbidden(msg)
            | AppError::NotFound(msg)
            | AppError::BadRequest(msg)
            | AppError::ValidationError(msg)
            | AppError::Conflict(msg) => msg.clone(),
            AppError::TokenInvalidOrExpired => TOKEN_INVALID_MESSAGE.to_string(),
            AppError::Internal(_) | AppError::Database(_) => GENERIC_INTERNAL_MESSAGE.to_string(),
            AppError::ExternalService(_) => GENERIC_DEPENDENCY_MESSAGE.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            tracing::error!("Error: {}: {}", status, self);
        } else {
            tracing::debug!("Request rejected: {}: {}", status, self);
        }

        let body = Json(json!({
            "error": self.public_message(),
            "code": self.code(),
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_internal_details_are_not_exposed() {
        let err = AppError::Database("relation \"appointments\" does not exist".to_string());
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.code(), "dependency_failure");
        assert!(!err.public_message().contains("appointments"));
    }

    #[test]
    fn test_client_errors_keep_detail() {
        let err = AppError::Conflict("Appointment is already completed".to_string());
        assert_eq!(err.status(), StatusCode::CONFLICT);
        assert_eq!(err.public_message(), "Appointment is already completed");
    }

    #[test]
    fn test_token_error_is_generic() {
        let err = AppError::TokenInvalidOrExpired;
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.code(), "token_invalid_or_expired");
        assert_eq!(err.public_message(), TOKEN_INVALID_MESSAGE);
    }
}
