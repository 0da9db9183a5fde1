//! In-memory transport for testing.
//!
//! [`MemoryConnector`] hands out channel-backed sockets so connection
//! lifecycle logic can be exercised without network I/O. Each successful
//! dial yields a [`MemoryPeer`] on the connector's peer channel: the test
//! acts as the server through it, injecting inbound events and inspecting
//! the frames the client sent.
//!
//! Dial outcomes can be scripted per attempt with
//! [`MemoryConnector::script`]; unscripted attempts are accepted.
//!
//! # Example
//!
//! ```rust
//! use chatlink_transport::memory::MemoryConnector;
//! use chatlink_transport::traits::Connector;
//!
//! # async fn demo() {
//! let (connector, mut peers) = MemoryConnector::new();
//! let socket = connector.connect(&"ws://test".parse().unwrap()).await.unwrap();
//! let peer = peers.recv().await.unwrap();
//! peer.send_text("{\"hello\":true}");
//! # }
//! ```

use std::collections::VecDeque;
use std::sync::Mutex;

use tokio::sync::mpsc;
use url::Url;

use crate::error::TransportError;
use crate::traits::{CloseInfo, Connector, StreamSocket, WireEvent};

/// Scripted result of a single dial attempt.
#[derive(Debug, Clone, Copy)]
pub enum ConnectOutcome {
    /// The dial succeeds and a [`MemoryPeer`] is produced.
    Accept,
    /// The dial fails immediately with a connection error.
    Refuse,
    /// The dial never completes; used to exercise connect timeouts.
    Stall,
}

/// A frame captured on the peer side of a memory socket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SentFrame {
    /// A text frame sent by the client.
    Text(String),
    /// A liveness ping.
    Ping,
    /// The client closed the connection.
    Close {
        /// Close code.
        code: u16,
        /// Close reason.
        reason: String,
    },
}

/// Connector producing in-memory sockets.
pub struct MemoryConnector {
    outcomes: Mutex<VecDeque<ConnectOutcome>>,
    peers: mpsc::UnboundedSender<MemoryPeer>,
}

impl MemoryConnector {
    /// Create a connector and the channel on which peers for accepted dials
    /// arrive.
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<MemoryPeer>) {
        let (peers_tx, peers_rx) = mpsc::unbounded_channel();
        (
            Self {
                outcomes: Mutex::new(VecDeque::new()),
                peers: peers_tx,
            },
            peers_rx,
        )
    }

    /// Queue the outcome for the next unscripted dial attempt. Outcomes are
    /// consumed in FIFO order; once the queue is empty, dials are accepted.
    pub fn script(&self, outcome: ConnectOutcome) {
        self.outcomes.lock().unwrap().push_back(outcome);
    }
}

impl Connector for MemoryConnector {
    type Socket = MemorySocket;

    async fn connect(&self, _url: &Url) -> Result<Self::Socket, TransportError> {
        let outcome = self
            .outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(ConnectOutcome::Accept);

        match outcome {
            ConnectOutcome::Refuse => Err(TransportError::connection("connection refused")),
            ConnectOutcome::Stall => std::future::pending().await,
            ConnectOutcome::Accept => {
                let (event_tx, event_rx) = mpsc::unbounded_channel();
                let (frame_tx, frame_rx) = mpsc::unbounded_channel();

                let _ = self.peers.send(MemoryPeer {
                    events: event_tx,
                    frames: frame_rx,
                });

                Ok(MemorySocket {
                    events: event_rx,
                    frames: frame_tx,
                    open: true,
                })
            }
        }
    }
}

/// The server end of an accepted memory connection.
pub struct MemoryPeer {
    events: mpsc::UnboundedSender<Result<WireEvent, TransportError>>,
    frames: mpsc::UnboundedReceiver<SentFrame>,
}

impl MemoryPeer {
    /// Deliver a text frame to the client.
    pub fn send_text(&self, text: impl Into<String>) {
        let _ = self.events.send(Ok(WireEvent::Text(text.into())));
    }

    /// Deliver a binary frame to the client.
    pub fn send_binary(&self, data: Vec<u8>) {
        let _ = self.events.send(Ok(WireEvent::Binary(data)));
    }

    /// Surface a transport-level error on the client's socket.
    pub fn send_error(&self, error: TransportError) {
        let _ = self.events.send(Err(error));
    }

    /// Close the connection with a code and reason.
    pub fn close(&self, code: u16, reason: &str) {
        let _ = self
            .events
            .send(Ok(WireEvent::Closed(CloseInfo::new(code, reason))));
    }

    /// Await the next frame the client sent.
    pub async fn next_frame(&mut self) -> Option<SentFrame> {
        self.frames.recv().await
    }

    /// Drain all frames the client has sent so far, without waiting.
    pub fn drain_frames(&mut self) -> Vec<SentFrame> {
        let mut out = Vec::new();
        while let Ok(frame) = self.frames.try_recv() {
            out.push(frame);
        }
        out
    }
}

/// The client end of a memory connection.
pub struct MemorySocket {
    events: mpsc::UnboundedReceiver<Result<WireEvent, TransportError>>,
    frames: mpsc::UnboundedSender<SentFrame>,
    open: bool,
}

impl StreamSocket for MemorySocket {
    async fn send_text(&mut self, text: String) -> Result<(), TransportError> {
        if !self.open {
            return Err(TransportError::NotConnected);
        }
        self.frames
            .send(SentFrame::Text(text))
            .map_err(|_| TransportError::ConnectionClosed)
    }

    async fn ping(&mut self) -> Result<(), TransportError> {
        if !self.open {
            return Err(TransportError::NotConnected);
        }
        self.frames
            .send(SentFrame::Ping)
            .map_err(|_| TransportError::ConnectionClosed)
    }

    async fn close(&mut self, code: u16, reason: &str) -> Result<(), TransportError> {
        if !self.open {
            return Ok(());
        }
        self.open = false;
        let _ = self.frames.send(SentFrame::Close {
            code,
            reason: reason.to_string(),
        });
        Ok(())
    }

    async fn next_event(&mut self) -> Option<Result<WireEvent, TransportError>> {
        let event = self.events.recv().await;
        if matches!(event, None | Some(Ok(WireEvent::Closed(_))) | Some(Err(_))) {
            self.open = false;
        }
        event
    }

    fn is_open(&self) -> bool {
        self.open
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::CLOSE_NORMAL;

    fn test_url() -> Url {
        "ws://memory.test/v1/stream".parse().unwrap()
    }

    #[tokio::test]
    async fn accepted_dial_produces_peer() {
        let (connector, mut peers) = MemoryConnector::new();
        let mut socket = connector.connect(&test_url()).await.unwrap();
        let mut peer = peers.recv().await.unwrap();

        socket.send_text("hello".to_string()).await.unwrap();
        assert_eq!(
            peer.next_frame().await,
            Some(SentFrame::Text("hello".to_string()))
        );
    }

    #[tokio::test]
    async fn refused_dial_errors() {
        let (connector, _peers) = MemoryConnector::new();
        connector.script(ConnectOutcome::Refuse);
        let result = connector.connect(&test_url()).await;
        assert!(matches!(result, Err(TransportError::Connection { .. })));
    }

    #[tokio::test]
    async fn outcomes_consumed_in_order() {
        let (connector, _peers) = MemoryConnector::new();
        connector.script(ConnectOutcome::Refuse);

        assert!(connector.connect(&test_url()).await.is_err());
        // Queue exhausted; next dial is accepted.
        assert!(connector.connect(&test_url()).await.is_ok());
    }

    #[tokio::test]
    async fn peer_close_surfaces_as_event() {
        let (connector, mut peers) = MemoryConnector::new();
        let mut socket = connector.connect(&test_url()).await.unwrap();
        let peer = peers.recv().await.unwrap();

        peer.close(CLOSE_NORMAL, "done");
        match socket.next_event().await {
            Some(Ok(WireEvent::Closed(info))) => {
                assert_eq!(info.code, CLOSE_NORMAL);
                assert_eq!(info.reason, "done");
            }
            other => panic!("expected close event, got {other:?}"),
        }
        assert!(!socket.is_open());
    }

    #[tokio::test]
    async fn send_after_close_fails() {
        let (connector, mut peers) = MemoryConnector::new();
        let mut socket = connector.connect(&test_url()).await.unwrap();
        let _peer = peers.recv().await.unwrap();

        socket.close(CLOSE_NORMAL, "bye").await.unwrap();
        assert!(socket.send_text("late".to_string()).await.is_err());
        // Close is idempotent.
        socket.close(CLOSE_NORMAL, "bye again").await.unwrap();
    }
}
