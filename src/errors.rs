// Error types and user-friendly error messages
//
// `ApiError` is what HTTP handlers return. The string helpers turn startup
// failures into actionable terminal messages.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use std::fmt;

use crate::server::SessionError;

/// Errors surfaced to API callers
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Missing bearer token")]
    Unauthorized,

    #[error("Invalid bearer token")]
    Forbidden,

    #[error("Session not found")]
    SessionNotFound,

    #[error("Session has been terminated")]
    SessionTerminated,

    #[error("{0}")]
    BadRequest(String),

    #[error("Maximum session limit reached ({0})")]
    SessionLimit(usize),

    #[error("Chat provider failed: {0}")]
    Upstream(anyhow::Error),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::SessionNotFound => StatusCode::NOT_FOUND,
            ApiError::SessionTerminated | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::SessionLimit(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_type(&self) -> &'static str {
        match self {
            ApiError::Unauthorized | ApiError::Forbidden => "authentication_error",
            ApiError::SessionNotFound => "not_found_error",
            ApiError::SessionTerminated | ApiError::BadRequest(_) => "invalid_request_error",
            ApiError::SessionLimit(_) => "overloaded_error",
            ApiError::Upstream(_) => "upstream_error",
            ApiError::Internal(_) => "api_error",
        }
    }
}

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::NotFound => ApiError::SessionNotFound,
            SessionError::Terminated => ApiError::SessionTerminated,
            SessionError::LimitReached(max) => ApiError::SessionLimit(max),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Upstream and internal details stay in the log
        let message = match &self {
            ApiError::Upstream(e) => {
                tracing::error!(error = %e, "Chat provider request failed");
                "The companion is unavailable right now. Please try again shortly.".to_string()
            }
            ApiError::Internal(e) => {
                tracing::error!(error = %e, "Request failed");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        let body = serde_json::json!({
            "error": {
                "message": message,
                "type": self.error_type(),
            }
        });

        (status, Json(body)).into_response()
    }
}

/// Format a config parse error with helpful suggestions
pub fn config_parse_error(error: &str) -> String {
    format!(
        "Failed to parse config file\n\n\
        \x1b[1;33mError:\x1b[0m {}\n\n\
        \x1b[1;32mTry:\x1b[0m\n\
        1. Check config file syntax:\n\
           \x1b[36mcat ~/.solace/config.toml\x1b[0m\n\n\
        2. Validate it without starting the server:\n\
           \x1b[36msolace check-config\x1b[0m\n\n\
        3. Common mistakes:\n\
           • Missing quotes around strings\n\
           • [[therapists]] entries without an id or username\n\
           • Timeouts written as strings instead of milliseconds",
        error
    )
}

/// Format a missing config file error
pub fn config_not_found_error(path: &str) -> String {
    format!(
        "Config file not found: {}\n\n\
        \x1b[1;33mPossible causes:\x1b[0m\n\
        • Wrong path passed to --config\n\
        • File has been moved or deleted\n\n\
        \x1b[1;32mTry:\x1b[0m\n\
        1. Check the path:\n\
           \x1b[36mls -la {}\x1b[0m\n\n\
        2. Omit --config to use ~/.solace/config.toml or built-in defaults",
        path, path
    )
}

/// Format a missing provider key error
pub fn api_key_missing_error() -> String {
    "Gemini API key is missing\n\n\
    \x1b[1;32mTry:\x1b[0m\n\
    1. Set it in ~/.solace/config.toml:\n\
       \x1b[36m[provider]\x1b[0m\n\
       \x1b[36mapi_key = \"AI...\"\x1b[0m\n\n\
    2. Or export it:\n\
       \x1b[36mexport GEMINI_API_KEY=\"AI...\"\x1b[0m\n\n\
    3. Get a key:\n\
       https://aistudio.google.com/app/apikey"
        .to_string()
}

/// Wrap a generic error with a suggestion
pub fn wrap_error_with_suggestion(error: impl fmt::Display, suggestion: &str) -> String {
    format!(
        "{}\n\n\
        \x1b[1;33mSuggestion:\x1b[0m {}",
        error, suggestion
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(ApiError::Unauthorized.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::Forbidden.status(), StatusCode::FORBIDDEN);
        assert_eq!(ApiError::SessionNotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::SessionTerminated.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError::Upstream(anyhow::anyhow!("boom")).status(),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_internal_from_anyhow() {
        let err: ApiError = anyhow::anyhow!("disk on fire").into();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_config_errors_have_suggestions() {
        let msg = config_parse_error("expected `=`");
        assert!(msg.contains("expected `=`"));
        assert!(msg.contains("solace check-config"));

        let msg = config_not_found_error("/tmp/missing.toml");
        assert!(msg.contains("Config file not found: /tmp/missing.toml"));

        assert!(api_key_missing_error().contains("GEMINI_API_KEY"));
    }
}
