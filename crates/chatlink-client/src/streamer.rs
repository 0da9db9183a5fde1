//! The streaming connection manager.
//!
//! A [`Streamer`] is a cheap handle to a background task that owns the
//! socket. The task dials the stream URL, pulls inbound frames, dispatches
//! them to the [`EventHandlers`], answers heartbeat ticks, and reconnects
//! with exponential backoff when the link drops. Outbound sends travel to
//! the task over a command channel; while a reconnect is pending they are
//! queued and flushed FIFO once the link is back.
//!
//! Close code 1000 and the session-not-found code 4001 are terminal; every
//! other disconnect triggers the retry schedule.

use std::collections::VecDeque;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::MissedTickBehavior;
use url::Url;

use chatlink_core::Message;
use chatlink_transport::{
    CLOSE_ABNORMAL, CLOSE_NORMAL, CLOSE_SESSION_NOT_FOUND, CloseInfo, Connector, StreamSocket,
    WireEvent, WsConnector,
};

use crate::config::StreamerConfig;
use crate::error::StreamError;
use crate::events::{ConnectionStatus, EventHandlers};

/// Handle to a streaming connection.
///
/// Dropping the last handle shuts the background task down after a clean
/// close. All methods take `&self`; the handle can be shared freely.
#[derive(Debug)]
pub struct Streamer {
    commands: mpsc::UnboundedSender<Command>,
    status: watch::Receiver<ConnectionStatus>,
}

impl Streamer {
    /// Connect over WebSocket.
    ///
    /// Resolves once the first connection attempt completes. An initial
    /// failure is returned directly; reconnection only applies to links
    /// that were established at least once.
    pub async fn connect(
        config: StreamerConfig,
        handlers: EventHandlers,
    ) -> Result<Self, StreamError> {
        Self::connect_with(WsConnector::new(), config, handlers).await
    }

    /// Connect using a custom [`Connector`].
    pub async fn connect_with<C>(
        connector: C,
        config: StreamerConfig,
        handlers: EventHandlers,
    ) -> Result<Self, StreamError>
    where
        C: Connector + 'static,
    {
        let url = config.stream_url()?;
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (status_tx, status_rx) = watch::channel(ConnectionStatus::Disconnected);
        let (ready_tx, ready_rx) = oneshot::channel();

        let runner = Runner {
            connector,
            url,
            config,
            handlers,
            commands: command_rx,
            status: status_tx,
            queue: VecDeque::new(),
        };
        tokio::spawn(runner.run(ready_tx));

        match ready_rx.await {
            Ok(Ok(())) => Ok(Self {
                commands: command_tx,
                status: status_rx,
            }),
            Ok(Err(err)) => Err(err),
            Err(_) => Err(StreamError::NotConnected),
        }
    }

    /// Send a user prompt.
    ///
    /// `parent_id` threads the prompt under an earlier message; `None`
    /// targets the conversation root. Empty or whitespace-only content is
    /// rejected without touching the wire. While a reconnect is pending the
    /// prompt is queued and this resolves `Ok`; once the stream has shut
    /// down it resolves [`StreamError::NotConnected`].
    pub async fn send(
        &self,
        content: impl Into<String>,
        parent_id: Option<&str>,
    ) -> Result<(), StreamError> {
        let content = content.into();
        if content.trim().is_empty() {
            return Err(StreamError::InvalidPrompt);
        }

        let (ack_tx, ack_rx) = oneshot::channel();
        self.commands
            .send(Command::Send {
                content,
                parent_id: parent_id.map(str::to_string),
                ack: ack_tx,
            })
            .map_err(|_| StreamError::NotConnected)?;
        ack_rx.await.unwrap_or(Err(StreamError::NotConnected))
    }

    /// Close the stream with a normal (1000) close code.
    ///
    /// Resolves once the close frame is on the wire. Idempotent; closing a
    /// stream that already shut down is a no-op.
    pub async fn close(&self) {
        self.close_with(CLOSE_NORMAL, "client closed").await;
    }

    /// Close the stream with an explicit code and reason.
    pub async fn close_with(&self, code: u16, reason: &str) {
        let (ack_tx, ack_rx) = oneshot::channel();
        let command = Command::Close {
            code,
            reason: reason.to_string(),
            ack: ack_tx,
        };
        if self.commands.send(command).is_ok() {
            let _ = ack_rx.await;
        }
    }

    /// Current connection status.
    #[must_use]
    pub fn status(&self) -> ConnectionStatus {
        *self.status.borrow()
    }

    /// Whether the channel is currently open.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.status() == ConnectionStatus::Connected
    }
}

enum Command {
    Send {
        content: String,
        parent_id: Option<String>,
        ack: oneshot::Sender<Result<(), StreamError>>,
    },
    Close {
        code: u16,
        reason: String,
        ack: oneshot::Sender<()>,
    },
}

/// A prompt accepted while the link was down.
struct Pending {
    content: String,
    parent_id: Option<String>,
}

/// What to do after a connection ends.
enum Verdict {
    Shutdown,
    Retry,
}

/// Outcome of one `select!` round while connected. Resolving the branch into
/// a value first keeps the socket borrow out of the handler code.
enum Step {
    Command(Option<Command>),
    Event(Option<Result<WireEvent, chatlink_transport::TransportError>>),
    Ping,
}

struct Runner<C: Connector> {
    connector: C,
    url: Url,
    config: StreamerConfig,
    handlers: EventHandlers,
    commands: mpsc::UnboundedReceiver<Command>,
    status: watch::Sender<ConnectionStatus>,
    queue: VecDeque<Pending>,
}

impl<C: Connector> Runner<C> {
    async fn run(mut self, ready: oneshot::Sender<Result<(), StreamError>>) {
        let mut ready = Some(ready);
        let mut attempt: u32 = 0;

        loop {
            // Every attempt passes through `connecting`, retries included.
            self.set_status(ConnectionStatus::Connecting);
            match self.attempt_connect().await {
                Ok(socket) => {
                    if let Some(tx) = ready.take() {
                        let _ = tx.send(Ok(()));
                    } else {
                        self.handlers.reconnect(true, attempt);
                    }
                    // Backoff schedule resets on every established link.
                    attempt = 0;
                    self.set_status(ConnectionStatus::Connected);

                    if let Verdict::Shutdown = self.connected(socket).await {
                        self.set_status(ConnectionStatus::Disconnected);
                        return;
                    }
                }
                Err(err) => {
                    if let Some(tx) = ready.take() {
                        // Initial attempt; the caller gets the error, no
                        // retries.
                        self.set_status(ConnectionStatus::Disconnected);
                        let _ = tx.send(Err(err));
                        return;
                    }
                    tracing::warn!(attempt, error = %err, "reconnection attempt failed");
                    self.set_status(ConnectionStatus::Error);
                    self.handlers.reconnect(false, attempt);
                }
            }

            if attempt >= self.config.max_reconnect_attempts {
                self.handlers
                    .error(StreamError::ReconnectExhausted { attempts: attempt });
                self.set_status(ConnectionStatus::Disconnected);
                return;
            }

            self.set_status(ConnectionStatus::Reconnecting);
            let delay = self.config.reconnect_backoff.delay_for_attempt(attempt);
            attempt += 1;
            tracing::info!(attempt, ?delay, "scheduling reconnection");

            if let Verdict::Shutdown = self.wait_before_retry(delay).await {
                self.set_status(ConnectionStatus::Disconnected);
                return;
            }
        }
    }

    async fn attempt_connect(&mut self) -> Result<C::Socket, StreamError> {
        let timeout = self.config.connect_timeout;
        match tokio::time::timeout(timeout, self.connector.connect(&self.url)).await {
            Ok(Ok(socket)) => Ok(socket),
            Ok(Err(err)) => Err(err.into()),
            Err(_) => Err(StreamError::ConnectTimeout { timeout }),
        }
    }

    /// Drive an established connection until it ends.
    async fn connected(&mut self, mut socket: C::Socket) -> Verdict {
        // Flush prompts queued while the link was down, oldest first. A
        // flush failure is reported but does not abort the rest.
        while let Some(pending) = self.queue.pop_front() {
            let sent =
                Self::transmit(&mut socket, &pending.content, pending.parent_id.as_deref()).await;
            if let Err(err) = sent {
                tracing::warn!(error = %err, "failed to flush queued prompt");
                self.handlers.error(err);
            }
        }
        self.handlers.opened();

        let mut ping = tokio::time::interval_at(
            tokio::time::Instant::now() + self.config.ping_interval,
            self.config.ping_interval,
        );
        ping.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            let step = tokio::select! {
                cmd = self.commands.recv() => Step::Command(cmd),
                event = socket.next_event() => Step::Event(event),
                _ = ping.tick() => Step::Ping,
            };

            match step {
                Step::Command(None) => {
                    // Last handle dropped.
                    let _ = socket.close(CLOSE_NORMAL, "client dropped").await;
                    return Verdict::Shutdown;
                }
                Step::Command(Some(Command::Close { code, reason, ack })) => {
                    let _ = socket.close(code, &reason).await;
                    let _ = ack.send(());
                    return Verdict::Shutdown;
                }
                Step::Command(Some(Command::Send {
                    content,
                    parent_id,
                    ack,
                })) => {
                    let result =
                        Self::transmit(&mut socket, &content, parent_id.as_deref()).await;
                    let _ = ack.send(result);
                }
                Step::Ping => {
                    // Liveness signal only; a dead link is detected by the
                    // event stream ending, not by a missing pong.
                    if let Err(err) = socket.ping().await {
                        tracing::debug!(error = %err, "heartbeat ping failed");
                    }
                }
                Step::Event(Some(Ok(WireEvent::Text(text)))) => {
                    if let Some(verdict) = self.handle_frame(&mut socket, &text).await {
                        return verdict;
                    }
                }
                Step::Event(Some(Ok(WireEvent::Binary(data)))) => match String::from_utf8(data) {
                    Ok(text) => {
                        if let Some(verdict) = self.handle_frame(&mut socket, &text).await {
                            return verdict;
                        }
                    }
                    Err(_) => {
                        self.handlers
                            .error(StreamError::malformed("binary frame is not valid UTF-8"));
                    }
                },
                Step::Event(Some(Ok(WireEvent::Pong))) => {
                    tracing::trace!("heartbeat pong");
                }
                Step::Event(Some(Ok(WireEvent::Closed(info)))) => {
                    let code = info.code;
                    tracing::info!(code, reason = %info.reason, "stream closed by peer");
                    self.handlers.closed(info);
                    return self.after_disconnect(code);
                }
                Step::Event(Some(Err(err))) => {
                    self.set_status(ConnectionStatus::Error);
                    self.handlers.error(err.into());
                    return self.after_disconnect(CLOSE_ABNORMAL);
                }
                Step::Event(None) => {
                    // Stream ended without a close frame.
                    self.handlers
                        .closed(CloseInfo::new(CLOSE_ABNORMAL, "connection lost"));
                    return self.after_disconnect(CLOSE_ABNORMAL);
                }
            }
        }
    }

    /// Decode and dispatch one inbound frame. Returns a verdict only when
    /// the frame ends the connection.
    async fn handle_frame(&mut self, socket: &mut C::Socket, text: &str) -> Option<Verdict> {
        let message: Message = match serde_json::from_str(text) {
            Ok(message) => message,
            Err(err) => {
                tracing::warn!(error = %err, "dropping malformed frame");
                self.handlers.error(StreamError::malformed(err.to_string()));
                return None;
            }
        };

        // A "not found" status means the server lost the session; retrying
        // cannot bring it back.
        if message
            .status_message
            .as_deref()
            .is_some_and(|m| m.contains("not found"))
        {
            let _ = socket
                .close(CLOSE_SESSION_NOT_FOUND, "session not found")
                .await;
            self.handlers.error(StreamError::SessionNotFound);
            self.handlers
                .closed(CloseInfo::new(CLOSE_SESSION_NOT_FOUND, "session not found"));
            return Some(Verdict::Shutdown);
        }

        self.handlers.message(message);
        None
    }

    fn after_disconnect(&mut self, code: u16) -> Verdict {
        match code {
            CLOSE_NORMAL => Verdict::Shutdown,
            CLOSE_SESSION_NOT_FOUND => {
                self.handlers.error(StreamError::SessionNotFound);
                Verdict::Shutdown
            }
            _ => Verdict::Retry,
        }
    }

    /// Sleep out the backoff delay while still serving the command channel.
    /// Sends received here are queued for the next connection.
    async fn wait_before_retry(&mut self, delay: Duration) -> Verdict {
        let sleep = tokio::time::sleep(delay);
        tokio::pin!(sleep);

        loop {
            tokio::select! {
                () = &mut sleep => return Verdict::Retry,
                cmd = self.commands.recv() => match cmd {
                    Some(Command::Send { content, parent_id, ack }) => {
                        self.queue.push_back(Pending { content, parent_id });
                        let _ = ack.send(Ok(()));
                    }
                    Some(Command::Close { ack, .. }) => {
                        let _ = ack.send(());
                        return Verdict::Shutdown;
                    }
                    None => return Verdict::Shutdown,
                },
            }
        }
    }

    async fn transmit(
        socket: &mut C::Socket,
        content: &str,
        parent_id: Option<&str>,
    ) -> Result<(), StreamError> {
        let message = Message::query(content, parent_id);
        let payload = serde_json::to_string(&message).map_err(|err| StreamError::Serialization {
            message: err.to_string(),
        })?;
        socket.send_text(payload).await?;
        Ok(())
    }

    fn set_status(&mut self, status: ConnectionStatus) {
        if *self.status.borrow() != status {
            let _ = self.status.send(status);
            tracing::debug!(%status, "connection status changed");
            self.handlers.status_change(status);
        }
    }
}
