//! Error types for signage-player
//!
//! Defines module-specific error types using thiserror for clear error propagation.

use thiserror::Error;

/// Main error type for signage-player
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration file loading errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Database connection or query errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Render backend failed to show content
    #[error("Render error: {0}")]
    Render(String),

    /// Renderer process could not be spawned or controlled
    #[error("Renderer process error: {0}")]
    Process(String),

    /// Uploaded content has a type no backend can render
    #[error("Unsupported content type: {0}")]
    UnsupportedType(String),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid request
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Other errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<signage_common::Error> for Error {
    fn from(err: signage_common::Error) -> Self {
        use signage_common::Error as Common;
        match err {
            Common::Io(e) => Error::Io(e),
            Common::Config(msg) => Error::Config(msg),
            Common::NotFound(msg) => Error::NotFound(msg),
            Common::InvalidInput(msg) => Error::BadRequest(msg),
            Common::Internal(msg) => Error::Internal(msg),
        }
    }
}

/// Convenience Result type using signage-player Error
pub type Result<T> = std::result::Result<T, Error>;
