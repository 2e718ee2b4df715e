//! Gateway error types and their HTTP translation.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use gitway_backend::BackendError;
use gitway_git::GitError;
use thiserror::Error;

/// Errors surfaced at the request-handler boundary.
///
/// Protocol clients get a bare status code; the cause stays in the log.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// No route matched, or the requested file does not exist.
    #[error("not found")]
    NotFound,

    /// A route matched the path but not the method.
    #[error("method not allowed")]
    MethodNotAllowed,

    /// Repository identifier failed validation.
    #[error("invalid repository identifier: {0:?}")]
    InvalidRepository(String),

    /// Backend invocation failed.
    #[error("backend error: {0}")]
    Backend(#[from] BackendError),

    /// Protocol framing failed; an oversized advertisement line means the
    /// backend produced anomalous output, not that the client erred.
    #[error("protocol error: {0}")]
    Protocol(#[from] GitError),

    /// Filesystem error other than absence.
    #[error("file error: {0}")]
    File(std::io::Error),

    /// Invariant violation inside the gateway itself.
    #[error("internal error: {0}")]
    Internal(String),
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = match &self {
            GatewayError::NotFound => StatusCode::NOT_FOUND,
            GatewayError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            GatewayError::InvalidRepository(_) => StatusCode::BAD_REQUEST,
            GatewayError::Backend(_)
            | GatewayError::Protocol(_)
            | GatewayError::File(_)
            | GatewayError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        // The one log line per failure.
        match status {
            StatusCode::INTERNAL_SERVER_ERROR => {
                tracing::error!(error = %self, "request failed")
            }
            StatusCode::BAD_REQUEST => tracing::warn!(error = %self, "request rejected"),
            _ => tracing::debug!(error = %self, "request not served"),
        }

        status.into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        assert_eq!(
            GatewayError::NotFound.into_response().status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            GatewayError::MethodNotAllowed.into_response().status(),
            StatusCode::METHOD_NOT_ALLOWED
        );
        assert_eq!(
            GatewayError::InvalidRepository("..".into())
                .into_response()
                .status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            GatewayError::Internal("oops".into()).into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn error_responses_have_empty_bodies() {
        let response = GatewayError::NotFound.into_response();
        assert!(response.headers().get("content-type").is_none());
    }
}
