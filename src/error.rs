//! Error types shared across subsystems.

use thiserror::Error;

/// Errors raised by durable storage.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage document is malformed: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Errors raised by the request host.
#[derive(Debug, Error)]
pub enum HostError {
    #[error("invalid match pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: &'static str },

    #[error("failed to build upstream request: {0}")]
    Build(#[from] axum::http::Error),

    #[error("upstream request failed: {0}")]
    Upstream(#[from] hyper_util::client::legacy::Error),

    #[error("upstream request timed out after {0} seconds")]
    Timeout(u64),

    #[error("menu item '{0}' already exists")]
    DuplicateMenuItem(String),

    #[error("menu item '{0}' does not exist")]
    UnknownMenuItem(String),
}

/// Errors raised while sniffing the default Accept-Language.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("probe request was not intercepted")]
    NotIntercepted,

    #[error("probe timed out after {0} ms")]
    Timeout(u64),

    #[error("probe request failed: {0}")]
    Request(#[from] HostError),
}

/// Top-level error for the library.
#[derive(Debug, Error)]
pub enum AltTongError {
    #[error(transparent)]
    Config(#[from] crate::config::ConfigError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Host(#[from] HostError),

    #[error(transparent)]
    Probe(#[from] ProbeError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
