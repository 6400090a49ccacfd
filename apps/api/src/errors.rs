use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::llm_client::normalize::ParseError;
use crate::llm_client::LlmError;
use crate::timeout::TimeoutError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
///
/// The three `Upstream*` variants are recovered locally wherever a fallback
/// payload exists; they only reach the client on paths without one.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Unauthorized")]
    Unauthorized,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Upstream timeout: {0}")]
    UpstreamTimeout(String),

    #[error("Upstream returned malformed output: {0}")]
    UpstreamParse(String),

    #[error("Upstream failure: {0}")]
    UpstreamFailure(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// True for failures of the AI provider, which callers may paper over
    /// with a fallback payload.
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            AppError::UpstreamTimeout(_) | AppError::UpstreamParse(_) | AppError::UpstreamFailure(_)
        )
    }
}

impl From<LlmError> for AppError {
    fn from(e: LlmError) -> Self {
        AppError::UpstreamFailure(e.to_string())
    }
}

impl From<ParseError> for AppError {
    fn from(e: ParseError) -> Self {
        AppError::UpstreamParse(e.to_string())
    }
}

impl From<TimeoutError> for AppError {
    fn from(e: TimeoutError) -> Self {
        AppError::UpstreamTimeout(e.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                "Authentication required".to_string(),
            ),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::UpstreamTimeout(msg) => {
                tracing::error!("AI provider timed out: {msg}");
                (
                    StatusCode::GATEWAY_TIMEOUT,
                    "UPSTREAM_TIMEOUT",
                    "The AI provider took too long to respond".to_string(),
                )
            }
            AppError::UpstreamParse(msg) => {
                tracing::error!("AI provider output unusable: {msg}");
                (
                    StatusCode::BAD_GATEWAY,
                    "UPSTREAM_PARSE_ERROR",
                    "The AI provider returned an unusable response".to_string(),
                )
            }
            AppError::UpstreamFailure(msg) => {
                tracing::error!("AI provider error: {msg}");
                (
                    StatusCode::BAD_GATEWAY,
                    "UPSTREAM_ERROR",
                    "An AI processing error occurred".to_string(),
                )
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "A database error occurred".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes_follow_taxonomy() {
        let cases = [
            (AppError::Unauthorized, StatusCode::UNAUTHORIZED),
            (AppError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (AppError::Validation("x".into()), StatusCode::BAD_REQUEST),
            (AppError::UpstreamTimeout("x".into()), StatusCode::GATEWAY_TIMEOUT),
            (AppError::UpstreamParse("x".into()), StatusCode::BAD_GATEWAY),
            (AppError::UpstreamFailure("x".into()), StatusCode::BAD_GATEWAY),
        ];
        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }

    #[test]
    fn test_upstream_classification() {
        assert!(AppError::UpstreamTimeout("t".into()).is_upstream());
        assert!(AppError::from(ParseError::NoJson).is_upstream());
        assert!(AppError::from(LlmError::NotConfigured).is_upstream());
        assert!(!AppError::Unauthorized.is_upstream());
        assert!(!AppError::NotFound("gone".into()).is_upstream());
    }
}
