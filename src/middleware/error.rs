use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Authentication errors for the middleware layer.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Wrong username or secret. Deliberately does not say which.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// No live session on a protected route.
    #[error("Not authenticated")]
    Unauthenticated,

    /// Credential verifier failed to run.
    #[error("Credential verifier error: {0}")]
    Verifier(String),

    /// Session store operation failed.
    #[error("Session store error: {0}")]
    Store(String),

    /// Missing or invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        match self {
            Self::InvalidCredentials | Self::Unauthenticated => {
                (StatusCode::UNAUTHORIZED, self.to_string()).into_response()
            }
            Self::Verifier(_) | Self::Store(_) | Self::Config(_) => {
                tracing::error!(error = %self, "Auth internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal error").into_response()
            }
        }
    }
}
