//! Top-level error types for cobiebot.

use std::sync::Arc;

/// Crate-wide result type alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error enum wrapping domain-specific errors.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Completion(#[from] CompletionError),

    #[error(transparent)]
    Social(#[from] SocialError),

    #[error(transparent)]
    Messaging(#[from] MessagingError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Configuration loading errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to load config from {path}: {source}")]
    Load {
        path: String,
        source: Arc<std::io::Error>,
    },

    #[error("failed to parse config file {path}: {message}")]
    Parse { path: String, message: String },

    #[error("invalid configuration: {0}")]
    Invalid(String),

    #[error("missing required config key: {0}")]
    MissingKey(String),
}

/// Completion endpoint failures, one variant per user-visible fallback.
#[derive(Debug, thiserror::Error)]
pub enum CompletionError {
    /// The request never produced a response (connection, TLS, timeout).
    #[error("completion request failed: {0}")]
    Transport(String),

    /// The endpoint answered with a non-success status.
    #[error("completion endpoint returned {status}")]
    Status { status: u16 },

    /// A success status whose body lacked a usable `choices[0].text`.
    #[error("malformed completion payload: {0}")]
    MalformedPayload(String),
}

/// Social feed publishing errors.
#[derive(Debug, thiserror::Error)]
pub enum SocialError {
    #[error("publish request failed: {0}")]
    Request(String),

    #[error("feed rejected post ({status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("failed to sign request: {0}")]
    Signing(String),
}

/// Chat gateway errors.
#[derive(Debug, thiserror::Error)]
pub enum MessagingError {
    #[error("{adapter} client not connected")]
    NotConnected { adapter: String },

    #[error("invalid channel id: {0}")]
    InvalidChannel(String),

    #[error("failed to send message: {0}")]
    SendFailed(String),
}
