//! Core wire types for the chatlink streaming SDK.
//!
//! This crate defines the typed message model exchanged over the streaming
//! channel: the [`Message`](protocol::Message) envelope and its enums, the
//! root-parent sentinel used for top-level messages, and the well-known
//! response status codes. It is deliberately free of any I/O or runtime
//! dependency so that transports and clients can share it.

#![deny(missing_docs)]

pub mod protocol;

pub use protocol::{
    Message, MessageType, MimeType, ROOT_PARENT_ID, Role, STREAM_ENDPOINT, status,
};
