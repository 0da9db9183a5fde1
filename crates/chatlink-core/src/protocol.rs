//! Typed message model for the streaming channel.
//!
//! Wire messages are JSON objects with snake_case keys (`parent_id`,
//! `mime_type`, `message_type`, `status_code`, `status_message`). Messages
//! are immutable once constructed: outbound messages are built fresh per
//! send, inbound messages are a one-shot deserialization of a frame.
//!
//! # Example
//!
//! ```rust
//! use chatlink_core::protocol::{Message, MessageType, ROOT_PARENT_ID};
//!
//! let msg = Message::query("hello", None);
//! assert_eq!(msg.parent_id, ROOT_PARENT_ID);
//! assert_eq!(msg.message_type, MessageType::Query);
//! ```

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Parent-message identifier used for top-level messages with no explicit
/// parent. The service treats this value as the conversation root.
pub const ROOT_PARENT_ID: &str = "3713";

/// Path of the streaming endpoint, relative to the service base URL.
pub const STREAM_ENDPOINT: &str = "/v1/stream";

/// Well-known response status codes carried in [`Message::status_code`].
///
/// These mirror HTTP semantics but travel inside the message envelope, not
/// as transport status.
pub mod status {
    /// Request handled successfully.
    pub const OK: u16 = 200;
    /// Partial result; more messages follow.
    pub const PARTIAL_CONTENT: u16 = 206;
    /// Malformed request.
    pub const BAD_REQUEST: u16 = 400;
    /// Missing or invalid API key.
    pub const AUTHENTICATION_ERROR: u16 = 401;
    /// Referenced entity (typically the session) does not exist.
    pub const NOT_FOUND: u16 = 404;
    /// Entity already exists.
    pub const ALREADY_EXISTS: u16 = 409;
    /// Caller exceeded their quota.
    pub const QUOTA_EXCEEDED: u16 = 429;
    /// Server-side failure.
    pub const SERVER_ERROR: u16 = 500;
}

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// The end user.
    User,
    /// The model.
    Assistant,
    /// A tool/function invocation.
    Function,
    /// The service itself.
    System,
}

/// MIME type of a message's content.
///
/// The streaming client only ever *sends* `text/plain`; inbound messages may
/// carry any of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MimeType {
    /// Plain text.
    #[serde(rename = "text/plain")]
    TextPlain,
    /// Markdown text.
    #[serde(rename = "text/markdown")]
    TextMarkdown,
    /// JSON serialized into a text field.
    #[serde(rename = "text/serialized-json")]
    TextSerializedJson,
    /// HTML.
    #[serde(rename = "text/html")]
    TextHtml,
    /// CSV.
    #[serde(rename = "text/csv")]
    TextCsv,
    /// JSON document.
    #[serde(rename = "application/json")]
    ApplicationJson,
    /// Opaque bytes.
    #[serde(rename = "application/octet-stream")]
    ApplicationOctetStream,
    /// PDF document.
    #[serde(rename = "application/pdf")]
    ApplicationPdf,
    /// PNG image.
    #[serde(rename = "image/png")]
    ImagePng,
    /// JPEG image.
    #[serde(rename = "image/jpeg")]
    ImageJpeg,
}

/// Kind of a message within the conversation stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    /// First message of a session.
    SessionStart,
    /// Last message of a session.
    SessionEnd,
    /// Start of a related group of messages.
    GroupStart,
    /// End of a related group of messages.
    GroupEnd,
    /// Intermediate progress update.
    Update,
    /// Final answer content.
    Result,
    /// Diagnostic output.
    Debug,
    /// Informational, transitory content.
    Info,
    /// Server-reported error.
    Error,
    /// A user prompt.
    Query,
}

/// A unit of conversational exchange.
///
/// `message_type` is the only field whose absence makes an inbound frame
/// malformed; the status fields are optional and only meaningful on inbound
/// messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Unique message identifier.
    #[serde(default)]
    pub id: String,
    /// Identifier of the parent message; [`ROOT_PARENT_ID`] for top-level
    /// messages.
    #[serde(default = "root_parent")]
    pub parent_id: String,
    /// Author of the message.
    #[serde(default = "default_role")]
    pub role: Role,
    /// Content MIME type.
    #[serde(default = "default_mime_type")]
    pub mime_type: MimeType,
    /// Kind of message.
    pub message_type: MessageType,
    /// Literal content, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Server-side processing state (e.g. `thinking`, `generating`), used by
    /// UI consumers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    /// Ordering hint within a group.
    #[serde(default)]
    pub order: u32,
    /// Status code accompanying the message, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    /// Human-readable status detail, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_message: Option<String>,
}

fn root_parent() -> String {
    ROOT_PARENT_ID.to_string()
}

fn default_role() -> Role {
    Role::System
}

fn default_mime_type() -> MimeType {
    MimeType::TextPlain
}

impl Message {
    /// Build an outbound user query.
    ///
    /// Generates a fresh id, uses `parent_id` when given and the root
    /// sentinel otherwise. Queries are always plain text.
    #[must_use]
    pub fn query(content: impl Into<String>, parent_id: Option<&str>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            parent_id: parent_id.unwrap_or(ROOT_PARENT_ID).to_string(),
            role: Role::User,
            mime_type: MimeType::TextPlain,
            message_type: MessageType::Query,
            content: Some(content.into()),
            state: None,
            order: 0,
            status_code: Some(status::OK),
            status_message: None,
        }
    }

    /// Whether this message reports an error condition, either through its
    /// kind or through a non-success status code.
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.message_type == MessageType::Error
            || self.status_code.is_some_and(|c| c >= status::BAD_REQUEST)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn query_uses_root_sentinel_by_default() {
        let msg = Message::query("hello", None);
        assert_eq!(msg.parent_id, ROOT_PARENT_ID);
        assert_eq!(msg.role, Role::User);
        assert_eq!(msg.mime_type, MimeType::TextPlain);
        assert_eq!(msg.message_type, MessageType::Query);
        assert_eq!(msg.content.as_deref(), Some("hello"));
        assert_eq!(msg.status_code, Some(status::OK));
    }

    #[test]
    fn query_honors_explicit_parent() {
        let msg = Message::query("hello", Some("abc-123"));
        assert_eq!(msg.parent_id, "abc-123");
    }

    #[test]
    fn query_ids_are_unique() {
        let a = Message::query("a", None);
        let b = Message::query("b", None);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn serializes_with_snake_case_wire_keys() {
        let msg = Message::query("hi", None);
        let value: serde_json::Value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["parent_id"], ROOT_PARENT_ID);
        assert_eq!(value["mime_type"], "text/plain");
        assert_eq!(value["message_type"], "query");
        assert_eq!(value["role"], "user");
        assert_eq!(value["status_code"], 200);
    }

    #[test]
    fn deserializes_inbound_frame() {
        let json = r#"{
            "id": "m1",
            "parent_id": "3713",
            "role": "assistant",
            "mime_type": "text/markdown",
            "message_type": "result",
            "content": "answer",
            "state": "answering",
            "status_code": 200,
            "status_message": ""
        }"#;
        let msg: Message = serde_json::from_str(json).unwrap();
        assert_eq!(msg.message_type, MessageType::Result);
        assert_eq!(msg.role, Role::Assistant);
        assert_eq!(msg.state.as_deref(), Some("answering"));
        assert!(!msg.is_error());
    }

    #[test]
    fn missing_message_type_is_rejected() {
        let json = r#"{"id": "m1", "role": "assistant", "mime_type": "text/plain"}"#;
        let result: Result<Message, _> = serde_json::from_str(json);
        assert!(result.is_err());
    }

    #[test]
    fn optional_fields_default_on_inbound() {
        let json = r#"{"role": "system", "mime_type": "text/plain", "message_type": "info"}"#;
        let msg: Message = serde_json::from_str(json).unwrap();
        assert_eq!(msg.parent_id, ROOT_PARENT_ID);
        assert_eq!(msg.order, 0);
        assert!(msg.content.is_none());
    }

    #[test]
    fn missing_role_and_mime_type_fall_back() {
        // Only message_type is mandatory; sparse frames still parse.
        let json = r#"{"message_type": "info", "content": "maintenance at 02:00"}"#;
        let msg: Message = serde_json::from_str(json).unwrap();
        assert_eq!(msg.role, Role::System);
        assert_eq!(msg.mime_type, MimeType::TextPlain);
        assert_eq!(msg.content.as_deref(), Some("maintenance at 02:00"));
    }

    #[test]
    fn error_detection() {
        let mut msg = Message::query("q", None);
        assert!(!msg.is_error());
        msg.status_code = Some(status::NOT_FOUND);
        assert!(msg.is_error());
        msg.status_code = Some(status::OK);
        msg.message_type = MessageType::Error;
        assert!(msg.is_error());
    }
}
