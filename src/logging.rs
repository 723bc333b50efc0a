//! Tracing subscriber initialization for hosts.
//!
//! The library itself only emits `tracing` events; installing a subscriber
//! is left to the embedding application, which can call [`init`] once at
//! startup or wire its own.

use thiserror::Error;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Error)]
pub enum LoggingError {
    /// A global subscriber is already installed.
    #[error("Tracing subscriber already initialized")]
    SubscriberAlreadySet,
}

/// Install a formatted stderr subscriber.
///
/// `RUST_LOG` takes precedence; otherwise `default_filter` is used
/// (`"info"` when `None`).
pub fn init(default_filter: Option<&str>) -> Result<(), LoggingError> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter.unwrap_or("info")));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .try_init()
        .map_err(|_| LoggingError::SubscriberAlreadySet)
}
