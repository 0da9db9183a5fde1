//! Transport abstractions for the chatlink streaming SDK.
//!
//! The streaming connection manager is transport-agnostic: it drives any
//! implementation of the [`Connector`]/[`StreamSocket`] pair defined here.
//! Two implementations ship with the crate:
//!
//! | Transport | Use case |
//! |-----------|----------|
//! | [`websocket::WsConnector`] | Production WebSocket (ws/wss) via tokio-tungstenite |
//! | [`memory::MemoryConnector`] | Scripted in-process transport for tests |
//!
//! Sockets use a pull model: the owner repeatedly awaits
//! [`StreamSocket::next_event`] and reacts to the resulting [`WireEvent`]s,
//! which keeps all connection state on a single task.

#![deny(missing_docs)]

pub mod error;
pub mod memory;
pub mod traits;
pub mod websocket;

pub use error::TransportError;
pub use traits::{
    CLOSE_ABNORMAL, CLOSE_NORMAL, CLOSE_SESSION_NOT_FOUND, CloseInfo, Connector, StreamSocket,
    WireEvent,
};
pub use websocket::WsConnector;
