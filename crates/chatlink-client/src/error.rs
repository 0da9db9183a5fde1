//! Client error types.
//!
//! Every asynchronous fault the manager encounters is normalized to a
//! [`StreamError`] before it reaches the `on_error` callback or a caller
//! awaiting `connect`/`send`; raw transport values never escape.

use std::time::Duration;

use chatlink_transport::TransportError;
use thiserror::Error;

/// Errors surfaced by the streaming connection manager.
#[derive(Error, Debug)]
pub enum StreamError {
    /// The endpoint URL does not use a streaming-transport scheme.
    #[error("unsupported stream scheme `{scheme}` (expected ws or wss)")]
    UnsupportedScheme {
        /// The offending scheme.
        scheme: String,
    },

    /// The endpoint URL could not be parsed.
    #[error("invalid stream URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// A connection attempt did not complete in time.
    #[error("connection timed out after {timeout:?}")]
    ConnectTimeout {
        /// The configured connect timeout.
        timeout: Duration,
    },

    /// The stream is not connected and not in a state that queues messages.
    #[error("stream is not connected")]
    NotConnected,

    /// `send` was called with empty content.
    #[error("invalid prompt: must be a non-empty string")]
    InvalidPrompt,

    /// The server no longer knows this session. Fatal; never retried.
    #[error("session not found")]
    SessionNotFound,

    /// Automatic reconnection gave up.
    #[error("max reconnection attempts reached after {attempts} tries")]
    ReconnectExhausted {
        /// How many attempts were made.
        attempts: u32,
    },

    /// An inbound frame could not be decoded. The frame is dropped; the
    /// connection stays up.
    #[error("malformed inbound frame: {message}")]
    MalformedFrame {
        /// What went wrong.
        message: String,
    },

    /// An outbound message could not be serialized.
    #[error("serialization error: {message}")]
    Serialization {
        /// What went wrong.
        message: String,
    },

    /// A transport-level fault.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl StreamError {
    /// Create a malformed-frame error.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedFrame {
            message: message.into(),
        }
    }
}
