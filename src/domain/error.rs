//! Domain-level error types for quote-sync.
//!
//! All errors are typed with `thiserror` and provide meaningful context
//! without exposing internal details to end users.

use thiserror::Error;

/// Application-level errors.
#[derive(Error, Debug)]
pub enum AppError {
    /// A quote was rejected at the add boundary.
    #[error("Validation error: {message}")]
    Validation { message: String },

    /// Imported data did not have the expected shape.
    #[error("Invalid format: {message}")]
    Format {
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    /// The remote endpoint could not be reached or answered with an error status.
    #[error("Network error: {message}")]
    Network {
        message: String,
        #[source]
        source: Option<reqwest::Error>,
    },

    /// The remote payload could not be decoded.
    #[error("Remote payload error: {message}")]
    RemoteParse {
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    /// JSON serialization failed.
    #[error("JSON parse error: {message}")]
    JsonParse {
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    /// Failed to open or query local storage.
    #[error("Storage error: {message}")]
    Storage {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration or environment error.
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// IO operation failed.
    #[error("IO error: {message}")]
    Io {
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },
}

impl AppError {
    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a format error, optionally wrapping the JSON error that caused it.
    pub fn format(message: impl Into<String>, source: Option<serde_json::Error>) -> Self {
        Self::Format {
            message: message.into(),
            source,
        }
    }

    /// Create a network error from a reqwest error.
    pub fn network(err: reqwest::Error) -> Self {
        Self::Network {
            message: err.to_string(),
            source: Some(err),
        }
    }

    /// Create a remote payload error.
    pub fn remote_parse(err: serde_json::Error) -> Self {
        Self::RemoteParse {
            message: err.to_string(),
            source: Some(err),
        }
    }

    /// Create a storage error from rusqlite error.
    pub fn storage(err: rusqlite::Error) -> Self {
        Self::Storage {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }

    /// Create a JSON parse error.
    pub fn json_parse(err: serde_json::Error) -> Self {
        Self::JsonParse {
            message: err.to_string(),
            source: Some(err),
        }
    }

    /// Create an IO error with context.
    pub fn io(message: impl Into<String>, err: std::io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source: Some(err),
        }
    }
}

/// Result type alias using `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;
