//! Error types for the REST client.
//!
//! # Design
//! Setup problems (`Configuration`) and bad caller input (`Validation`,
//! `NoFiles`, `InvalidBody`) are separate variants so callers can branch on
//! "fix the config" versus "fix the request". Non-2xx responses are never
//! errors: they come back as ordinary `Response` values.

use thiserror::Error;

/// Errors returned by the client, registry and response parsers.
#[derive(Debug, Error)]
pub enum RestError {
    /// Missing credentials, unknown auth method, empty accept type, unknown
    /// configuration group or an unreadable config file.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// An upload entry failed the validity rule.
    #[error("validation failed: {0}")]
    Validation(String),

    /// `files` was called without any upload payload, or the requested field
    /// is absent.
    #[error("no files specified")]
    NoFiles,

    /// The body does not fit the verb: structured fields on a plain call, or a
    /// raw body on an upload.
    #[error("invalid body: {0}")]
    InvalidBody(&'static str),

    /// The response body could not be decoded for the negotiated accept type.
    #[error("failed to parse response body: {0}")]
    Parse(String),

    /// The transport failed before a response was produced.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Failure reported by a [`Transport`](crate::Transport) implementation.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The HTTP backend gave up (connection refused, timeout, bad URL, ...).
    #[error("transport failed: {0}")]
    Backend(String),

    /// A local file referenced by an upload could not be read.
    #[error("failed to read upload file: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = RestError> = std::result::Result<T, E>;

impl RestError {
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        RestError::Configuration(msg.into())
    }
}
