//! Error taxonomy shared by the adapters, dispatcher and comparison
//! engine.
//!
//! Core components return these directly; only the binary entry point
//! decides how they are presented.

use thiserror::Error;

use crate::models::BackendId;

/// Result alias used throughout the core.
pub type Result<T> = std::result::Result<T, Error>;

/// Underlying I/O failure reported by a backend.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Errors produced by the search and comparison core.
#[derive(Debug, Error)]
pub enum Error {
    /// Backend identifier outside the recognized set.
    #[error("invalid backend identifier `{0}` (expected one of: pg, es)")]
    InvalidBackend(String),

    /// Recognized backend with no adapter registered in the table.
    #[error("no adapter registered for backend `{0}`")]
    Unregistered(BackendId),

    /// Network or database failure, propagated unchanged.
    #[error("{backend} transport failure")]
    Transport {
        backend: BackendId,
        #[source]
        source: TransportError,
    },

    /// Backend answered but the payload lacks the expected structure.
    #[error("{backend} returned a malformed response: {message}")]
    MalformedResponse { backend: BackendId, message: String },

    /// Dispatch exceeded the configured per-dispatch timeout.
    #[error("{backend} did not respond within {after_ms} ms")]
    Timeout { backend: BackendId, after_ms: u64 },

    /// Invalid configuration value.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Required command-line input was not supplied.
    #[error("{0}")]
    MissingInput(String),
}

impl Error {
    pub(crate) fn database(backend: BackendId, source: sqlx::Error) -> Self {
        Error::Transport {
            backend,
            source: TransportError::Database(source),
        }
    }

    pub(crate) fn http(backend: BackendId, source: reqwest::Error) -> Self {
        Error::Transport {
            backend,
            source: TransportError::Http(source),
        }
    }

    pub(crate) fn malformed(backend: BackendId, message: impl Into<String>) -> Self {
        Error::MalformedResponse {
            backend,
            message: message.into(),
        }
    }

    /// Whether this error stems from user input rather than a backend.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            Error::InvalidBackend(_) | Error::MissingInput(_) | Error::Config(_)
        )
    }
}
