//! Prelude module for convenient imports.
//!
//! Import everything you need with a single use statement:
//!
//! ```rust
//! use chatlink::prelude::*;
//!
//! let config = StreamerConfig::new("wss://api.example.com", "session-id", "api-key");
//! let handlers = EventHandlers::new(|message| println!("{:?}", message.content));
//! ```
//!
//! ## Included Types
//!
//! - Message model (`Message`, `MessageType`, `MimeType`, `Role`)
//! - The connection manager (`Streamer`, `StreamerConfig`, `EventHandlers`)
//! - Error and status types (`StreamError`, `ConnectionStatus`, `CloseInfo`)

pub use chatlink_client::{
    ConnectionStatus, EventHandlers, ExponentialBackoff, StreamError, Streamer, StreamerConfig,
};
pub use chatlink_core::{Message, MessageType, MimeType, ROOT_PARENT_ID, Role};
pub use chatlink_transport::CloseInfo;
