//! # chatlink - Streaming SDK for conversational AI sessions
//!
//! A Rust SDK for holding long-lived, bidirectional conversations with a
//! streaming AI service over WebSocket.
//!
//! ## Features
//!
//! - **Typed message model** with roles, MIME types, and stream message kinds
//! - **Resilient connections**: exponential-backoff reconnection, heartbeat
//!   keep-alive, and FIFO queuing of prompts while the link is down
//! - **Callback-driven** event surface for messages, errors, and lifecycle
//! - **Transport-agnostic** core; WebSocket in production, an in-memory
//!   transport for tests
//!
//! ## Quick Start
//!
//! ```no_run
//! use chatlink::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), StreamError> {
//!     let config = StreamerConfig::new("wss://api.example.com", "session-id", "api-key");
//!     let handlers = EventHandlers::new(|message| {
//!         if let Some(content) = message.content {
//!             println!("{content}");
//!         }
//!     });
//!
//!     let streamer = Streamer::connect(config, handlers).await?;
//!     streamer.send("Summarize this session", None).await?;
//!     streamer.close().await;
//!     Ok(())
//! }
//! ```
//!
//! ## Crate Organization
//!
//! - [`chatlink_core`] - Message model and protocol constants (no async runtime)
//! - [`chatlink_transport`] - Transport abstractions (WebSocket, in-memory)
//! - [`chatlink_client`] - The streaming connection manager

#![deny(missing_docs)]

pub mod prelude;

pub use chatlink_client::{
    ConnectionStatus, EventHandlers, ExponentialBackoff, StreamError, Streamer, StreamerConfig,
};
pub use chatlink_core::{Message, MessageType, MimeType, ROOT_PARENT_ID, Role, status};
pub use chatlink_transport::{CloseInfo, Connector, StreamSocket, TransportError, WireEvent};
