//! Error types and HTTP response handling.
//!
//! `AppError` is the top-level error for anything that is not the user's fault.
//! Its `IntoResponse` implementation is the catch-all handler: the detail goes to
//! the server log, the client gets a generic 500.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Body returned to the client for every internal failure.
pub const GENERIC_FAILURE: &str = "Something broke!";

/// Uniform login failure notice. Never reveals which credential was wrong.
pub const LOGIN_FAILURE: &str = "Incorrect username or password.";

#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration error during startup.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Query or connectivity failure from the store.
    #[error(transparent)]
    Database(#[from] sqlx::Error),

    /// Session store operation error.
    #[error(transparent)]
    Session(#[from] tower_sessions::session::Error),

    /// Hashing or parsing a credential digest failed.
    #[error("password hashing failed: {0}")]
    PasswordHash(String),
}

impl From<argon2::password_hash::Error> for AppError {
    fn from(err: argon2::password_hash::Error) -> Self {
        AppError::PasswordHash(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self, "request failed");

        (StatusCode::INTERNAL_SERVER_ERROR, GENERIC_FAILURE).into_response()
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    /// Required environment variable is not set.
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    /// Environment variable is set but cannot be parsed.
    #[error("Invalid value for {0}: {1:?}")]
    InvalidValue(String, String),

    #[error("SESSION_SECRET must be at least 64 bytes, got {0}")]
    SessionSecretTooShort(usize),
}

/// Outcome of a failed credential check.
///
/// The two credential variants are kept apart for logging; `notice()` maps both
/// to the same message for the client.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("no user with that username")]
    UnknownUsername,

    #[error("password does not match")]
    IncorrectPassword,

    #[error(transparent)]
    Internal(#[from] AppError),
}

impl AuthError {
    /// The notice shown to the user, if this is a credential failure.
    pub fn notice(&self) -> Option<&'static str> {
        match self {
            Self::UnknownUsername | Self::IncorrectPassword => Some(LOGIN_FAILURE),
            Self::Internal(_) => None,
        }
    }
}

impl From<sqlx::Error> for AuthError {
    fn from(err: sqlx::Error) -> Self {
        AuthError::Internal(err.into())
    }
}
