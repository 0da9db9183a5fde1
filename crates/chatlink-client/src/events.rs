//! Connection status and event callbacks.

use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};

use chatlink_core::Message;
use chatlink_transport::CloseInfo;

use crate::error::StreamError;

/// Lifecycle state of the streaming connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    /// No connection, and none in progress. Terminal once reached after a
    /// normal close or exhausted reconnection.
    Disconnected,
    /// The first connection attempt is in progress.
    Connecting,
    /// The channel is open and messages flow.
    Connected,
    /// The connection dropped; a retry is scheduled.
    Reconnecting,
    /// A fault occurred. May be followed by `Reconnecting` or
    /// `Disconnected`.
    Error,
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Reconnecting => "reconnecting",
            Self::Error => "error",
        };
        f.write_str(s)
    }
}

type MessageFn = Box<dyn FnMut(Message) + Send>;
type OpenFn = Box<dyn FnMut() + Send>;
type ErrorFn = Box<dyn FnMut(StreamError) + Send>;
type CloseFn = Box<dyn FnMut(CloseInfo) + Send>;
type ReconnectFn = Box<dyn FnMut(bool, u32) + Send>;
type StatusFn = Box<dyn FnMut(ConnectionStatus) + Send>;

/// Callbacks invoked by the connection manager.
///
/// Only the message handler is required. All callbacks run on the manager's
/// task, so a slow handler delays frame processing. A panicking handler is
/// caught and logged; it never takes the connection down.
pub struct EventHandlers {
    on_message: MessageFn,
    on_open: Option<OpenFn>,
    on_error: Option<ErrorFn>,
    on_close: Option<CloseFn>,
    on_reconnect: Option<ReconnectFn>,
    on_status_change: Option<StatusFn>,
}

impl EventHandlers {
    /// Create handlers with the required message callback.
    pub fn new(on_message: impl FnMut(Message) + Send + 'static) -> Self {
        Self {
            on_message: Box::new(on_message),
            on_open: None,
            on_error: None,
            on_close: None,
            on_reconnect: None,
            on_status_change: None,
        }
    }

    /// Invoked each time a connection is established, including after a
    /// reconnect.
    #[must_use]
    pub fn on_open(mut self, f: impl FnMut() + Send + 'static) -> Self {
        self.on_open = Some(Box::new(f));
        self
    }

    /// Invoked on faults: malformed frames, transport errors, fatal session
    /// loss, and reconnection exhaustion.
    #[must_use]
    pub fn on_error(mut self, f: impl FnMut(StreamError) + Send + 'static) -> Self {
        self.on_error = Some(Box::new(f));
        self
    }

    /// Invoked each time the connection closes, with the close code and
    /// reason.
    #[must_use]
    pub fn on_close(mut self, f: impl FnMut(CloseInfo) + Send + 'static) -> Self {
        self.on_close = Some(Box::new(f));
        self
    }

    /// Invoked per reconnection attempt: `(true, n)` when attempt `n`
    /// succeeded, `(false, n)` when it failed and another retry is pending.
    #[must_use]
    pub fn on_reconnect(mut self, f: impl FnMut(bool, u32) + Send + 'static) -> Self {
        self.on_reconnect = Some(Box::new(f));
        self
    }

    /// Invoked on every [`ConnectionStatus`] transition.
    #[must_use]
    pub fn on_status_change(mut self, f: impl FnMut(ConnectionStatus) + Send + 'static) -> Self {
        self.on_status_change = Some(Box::new(f));
        self
    }

    pub(crate) fn message(&mut self, message: Message) {
        guard("on_message", || (self.on_message)(message));
    }

    pub(crate) fn opened(&mut self) {
        if let Some(f) = &mut self.on_open {
            guard("on_open", || f());
        }
    }

    pub(crate) fn error(&mut self, error: StreamError) {
        if let Some(f) = &mut self.on_error {
            guard("on_error", || f(error));
        } else {
            tracing::error!(%error, "stream error (no on_error handler)");
        }
    }

    pub(crate) fn closed(&mut self, info: CloseInfo) {
        if let Some(f) = &mut self.on_close {
            guard("on_close", || f(info));
        }
    }

    pub(crate) fn reconnect(&mut self, success: bool, attempt: u32) {
        if let Some(f) = &mut self.on_reconnect {
            guard("on_reconnect", || f(success, attempt));
        }
    }

    pub(crate) fn status_change(&mut self, status: ConnectionStatus) {
        if let Some(f) = &mut self.on_status_change {
            guard("on_status_change", || f(status));
        }
    }
}

impl fmt::Debug for EventHandlers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventHandlers")
            .field("on_open", &self.on_open.is_some())
            .field("on_error", &self.on_error.is_some())
            .field("on_close", &self.on_close.is_some())
            .field("on_reconnect", &self.on_reconnect.is_some())
            .field("on_status_change", &self.on_status_change.is_some())
            .finish_non_exhaustive()
    }
}

fn guard(name: &str, f: impl FnOnce()) {
    if catch_unwind(AssertUnwindSafe(f)).is_err() {
        tracing::warn!(handler = name, "event handler panicked");
    }
}
