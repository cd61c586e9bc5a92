//! Error types for the chat client.

use thiserror::Error;

/// Failure while talking to the chat endpoint.
///
/// The `Display` output is shown to the user verbatim in the transcript, so
/// it carries only the underlying message without extra prefixes.
#[derive(Error, Debug)]
pub enum TransportError {
    /// HTTP request or body read failed.
    #[error("{0}")]
    Http(#[from] reqwest::Error),

    /// Failure reported by a non-HTTP transport.
    #[error("{0}")]
    Message(String),
}

impl TransportError {
    /// Create a transport error from a plain message.
    pub fn message(msg: impl Into<String>) -> Self {
        Self::Message(msg.into())
    }
}

/// Crate-level error type.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration could not be loaded or is invalid.
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Endpoint is not a valid URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Transport could not be set up.
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Terminal output failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for crate operations.
pub type Result<T> = std::result::Result<T, Error>;
