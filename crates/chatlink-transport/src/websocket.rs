//! WebSocket transport implementation.
//!
//! Wraps `tokio-tungstenite` behind the [`Connector`]/[`StreamSocket`]
//! traits. Protocol-level pings from the server are answered inline and
//! never surface to the caller; pongs do surface (as [`WireEvent::Pong`]) so
//! the manager can trace liveness.

use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream, connect_async,
    tungstenite::{
        self,
        protocol::CloseFrame,
        protocol::Message as WsMessage,
        protocol::frame::coding::CloseCode,
    },
};
use url::Url;

use crate::error::TransportError;
use crate::traits::{CLOSE_ABNORMAL, CloseInfo, Connector, StreamSocket, WireEvent};

/// Connector for `ws://` and `wss://` endpoints.
#[derive(Debug, Clone, Copy, Default)]
pub struct WsConnector;

impl WsConnector {
    /// Create a new WebSocket connector.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Connector for WsConnector {
    type Socket = WsSocket;

    async fn connect(&self, url: &Url) -> Result<Self::Socket, TransportError> {
        let (stream, _response) = connect_async(url.as_str())
            .await
            .map_err(|e| TransportError::connection(format!("WebSocket connect failed: {e}")))?;

        tracing::debug!(host = url.host_str().unwrap_or(""), "WebSocket connected");

        Ok(WsSocket { stream, open: true })
    }
}

/// A connected WebSocket.
pub struct WsSocket {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
    open: bool,
}

fn map_ws_error(err: tungstenite::Error) -> TransportError {
    match err {
        tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed => {
            TransportError::ConnectionClosed
        }
        other => TransportError::connection(other.to_string()),
    }
}

impl StreamSocket for WsSocket {
    async fn send_text(&mut self, text: String) -> Result<(), TransportError> {
        if !self.open {
            return Err(TransportError::NotConnected);
        }
        self.stream
            .send(WsMessage::Text(text))
            .await
            .map_err(map_ws_error)
    }

    async fn ping(&mut self) -> Result<(), TransportError> {
        if !self.open {
            return Err(TransportError::NotConnected);
        }
        self.stream
            .send(WsMessage::Ping(Vec::new()))
            .await
            .map_err(map_ws_error)
    }

    async fn close(&mut self, code: u16, reason: &str) -> Result<(), TransportError> {
        if !self.open {
            return Ok(());
        }
        self.open = false;

        let frame = CloseFrame {
            code: CloseCode::from(code),
            reason: reason.to_owned().into(),
        };
        match self.stream.close(Some(frame)).await {
            Ok(()) => Ok(()),
            Err(tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed) => Ok(()),
            Err(e) => Err(map_ws_error(e)),
        }
    }

    async fn next_event(&mut self) -> Option<Result<WireEvent, TransportError>> {
        loop {
            match self.stream.next().await {
                Some(Ok(WsMessage::Text(text))) => return Some(Ok(WireEvent::Text(text))),
                Some(Ok(WsMessage::Binary(data))) => return Some(Ok(WireEvent::Binary(data))),
                Some(Ok(WsMessage::Ping(payload))) => {
                    // Answer inline and keep pulling.
                    let _ = self.stream.send(WsMessage::Pong(payload)).await;
                }
                Some(Ok(WsMessage::Pong(_))) => return Some(Ok(WireEvent::Pong)),
                Some(Ok(WsMessage::Close(frame))) => {
                    self.open = false;
                    let info = frame.map_or_else(
                        || CloseInfo::new(CLOSE_ABNORMAL, ""),
                        |f| CloseInfo::new(u16::from(f.code), f.reason.into_owned()),
                    );
                    tracing::debug!(code = info.code, "WebSocket close frame received");
                    return Some(Ok(WireEvent::Closed(info)));
                }
                Some(Ok(WsMessage::Frame(_))) => {
                    // Raw frame, skip and keep pulling.
                }
                Some(Err(e)) => {
                    self.open = false;
                    return Some(Err(map_ws_error(e)));
                }
                None => {
                    self.open = false;
                    return None;
                }
            }
        }
    }

    fn is_open(&self) -> bool {
        self.open
    }
}
