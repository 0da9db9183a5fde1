//! Transport traits for the streaming channel.
//!
//! These are the minimal capabilities the connection manager needs from a
//! duplex transport: dial a URL, push text frames, ping, close with a code
//! and reason, and pull inbound events. Implementations must not spawn their
//! own reader tasks; the manager owns the socket on a single task and pulls
//! events itself.

use std::future::Future;

use url::Url;

use crate::error::TransportError;

/// Normal closure; the peer is done with the connection. Never triggers
/// reconnection.
pub const CLOSE_NORMAL: u16 = 1000;

/// Abnormal closure; the connection dropped without a close frame. Used when
/// a transport ends without reporting a code.
pub const CLOSE_ABNORMAL: u16 = 1006;

/// Application close code meaning the session no longer exists server-side.
/// Fatal for the connection; never triggers reconnection.
pub const CLOSE_SESSION_NOT_FOUND: u16 = 4001;

/// Code and reason carried by a close frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloseInfo {
    /// Close code (1000 = normal).
    pub code: u16,
    /// Human-readable reason, possibly empty.
    pub reason: String,
}

impl CloseInfo {
    /// Create a new close frame description.
    #[must_use]
    pub fn new(code: u16, reason: impl Into<String>) -> Self {
        Self {
            code,
            reason: reason.into(),
        }
    }

    /// Whether this is a normal closure.
    #[must_use]
    pub fn is_normal(&self) -> bool {
        self.code == CLOSE_NORMAL
    }
}

/// An inbound event pulled from a socket.
#[derive(Debug)]
pub enum WireEvent {
    /// A text frame.
    Text(String),
    /// A binary frame. The manager normalizes it to text; non-UTF-8 payloads
    /// are reported as errors and dropped.
    Binary(Vec<u8>),
    /// A pong reply to an earlier ping.
    Pong,
    /// The peer closed the connection.
    Closed(CloseInfo),
}

/// A connected duplex socket.
///
/// All methods take `&mut self`: a socket has exactly one owner. Returning
/// `None` from [`next_event`](Self::next_event) means the underlying stream
/// ended without a close frame.
pub trait StreamSocket: Send {
    /// Send a text frame.
    fn send_text(&mut self, text: String)
    -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Send a liveness ping. Transports without ping support may make this a
    /// no-op.
    fn ping(&mut self) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Close the connection with a code and reason.
    ///
    /// Must be idempotent; closing an already-closed socket is not an error.
    fn close(
        &mut self,
        code: u16,
        reason: &str,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Pull the next inbound event.
    ///
    /// Cancel-safe: dropping the returned future must not lose a frame.
    fn next_event(&mut self) -> impl Future<Output = Option<Result<WireEvent, TransportError>>> + Send;

    /// Whether the socket is currently open.
    fn is_open(&self) -> bool;
}

/// Dials new connections for the manager.
///
/// A connector is reused across reconnection attempts, so it takes `&self`.
pub trait Connector: Send + Sync {
    /// The socket type produced by a successful dial.
    type Socket: StreamSocket + 'static;

    /// Establish a connection to `url`.
    ///
    /// The caller bounds this with its own connect timeout; implementations
    /// do not need to time out on their own.
    fn connect(&self, url: &Url)
    -> impl Future<Output = Result<Self::Socket, TransportError>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn close_info_normal_detection() {
        assert!(CloseInfo::new(CLOSE_NORMAL, "bye").is_normal());
        assert!(!CloseInfo::new(CLOSE_ABNORMAL, "").is_normal());
        assert!(!CloseInfo::new(CLOSE_SESSION_NOT_FOUND, "gone").is_normal());
    }
}
