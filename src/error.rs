//! Error taxonomy for catalog, store and coordinator operations.
//!
//! Host-level plumbing (config, connect, migrations) uses `anyhow`. The
//! operations a UI calls repeatedly return [`Result<T>`] so the caller can
//! tell a transient network failure from a bad payload or a vanished id.

use serde::Serialize;
use thiserror::Error;

/// Failure of a catalog, store or coordinator operation.
#[derive(Debug, Error)]
pub enum Error {
    /// Connectivity problem: connect refused, timeout, truncated body.
    #[error("network error: {0}")]
    Network(String),

    /// The server answered with a non-success status or a payload that
    /// does not decode.
    #[error("protocol error{}: {message}", .status.map(|s| format!(" (HTTP {s})")).unwrap_or_default())]
    Protocol {
        status: Option<u16>,
        message: String,
    },

    /// Detail fetch for an id the server does not know.
    #[error("character {0} not found")]
    NotFound(i64),

    /// Favorite store failure.
    #[error("storage error: {0}")]
    Storage(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Discriminant of [`Error`], cheap to copy into UI state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorKind {
    Network,
    Protocol,
    NotFound,
    Storage,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Network(_) => ErrorKind::Network,
            Error::Protocol { .. } => ErrorKind::Protocol,
            Error::NotFound(_) => ErrorKind::NotFound,
            Error::Storage(_) => ErrorKind::Storage,
        }
    }

    /// Whether reissuing the same request can succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Network(_) | Error::Protocol { .. })
    }

    pub(crate) fn protocol(status: Option<u16>, message: impl Into<String>) -> Self {
        Error::Protocol {
            status,
            message: message.into(),
        }
    }
}

impl From<sqlx::Error> for Error {
    fn from(e: sqlx::Error) -> Self {
        Error::Storage(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() || e.is_status() {
            Error::protocol(e.status().map(|s| s.as_u16()), e.to_string())
        } else {
            Error::Network(e.to_string())
        }
    }
}

/// A page-load failure as exposed to the consumer of a paging session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadError {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<&Error> for LoadError {
    fn from(e: &Error) -> Self {
        Self {
            kind: e.kind(),
            message: e.to_string(),
        }
    }
}

impl std::fmt::Display for LoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}
