//! Streaming connection manager for the chatlink SDK.
//!
//! Given a session id and credentials obtained from the session layer, a
//! [`Streamer`] opens a persistent duplex channel to the service, exchanges
//! typed [`Message`](chatlink_core::Message)s, and transparently survives
//! disruptions: automatic reconnection with exponential backoff, heartbeat
//! keep-alive, and FIFO queuing of outbound messages while the link is down.
//!
//! # Example
//!
//! ```no_run
//! use chatlink_client::{EventHandlers, Streamer, StreamerConfig};
//!
//! # async fn run() -> Result<(), chatlink_client::StreamError> {
//! let config = StreamerConfig::new("wss://api.example.com", "session-id", "api-key");
//! let handlers = EventHandlers::new(|message| {
//!     println!("<- {:?}", message.content);
//! });
//!
//! let streamer = Streamer::connect(config, handlers).await?;
//! streamer.send("What does this binary do?", None).await?;
//! # streamer.close().await;
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]

pub mod config;
pub mod error;
pub mod events;
pub mod streamer;

pub use config::{ExponentialBackoff, StreamerConfig};
pub use error::StreamError;
pub use events::{ConnectionStatus, EventHandlers};
pub use streamer::Streamer;
