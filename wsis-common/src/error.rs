//! Common error types for WSIS

use thiserror::Error;

/// Common result type for WSIS operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across the WSIS service
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error (fatal at startup)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Too many sign-in attempts; caller must back off and retry manually
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Caller identity does not match the namespace being accessed
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Stable machine-readable code for the wire (`{"code": ...}` in API errors)
    pub fn code(&self) -> &'static str {
        match self {
            Error::Database(_) => "store-error",
            Error::Io(_) => "io-error",
            Error::Config(_) => "config-invalid",
            Error::RateLimited(_) => "auth-rate-limited",
            Error::PermissionDenied(_) => "permission-denied",
            Error::NotFound(_) => "not-found",
            Error::InvalidInput(_) => "invalid-input",
            Error::Internal(_) => "internal",
        }
    }
}
