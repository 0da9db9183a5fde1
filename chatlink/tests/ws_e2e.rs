//! End-to-end tests over a real WebSocket server.
//!
//! Each test binds a local listener, speaks the wire protocol with
//! tokio-tungstenite directly on the server side, and drives a real
//! [`Streamer`] against it.

use std::net::SocketAddr;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::handshake::server::{Request, Response};
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{WebSocketStream, accept_hdr_async};

use chatlink::prelude::*;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

async fn bind() -> (TcpListener, SocketAddr) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    (listener, addr)
}

/// Accept one connection, capturing the request URI the client dialed.
async fn accept_with_uri(
    listener: &TcpListener,
) -> (WebSocketStream<TcpStream>, String) {
    let (stream, _addr) = listener.accept().await.unwrap();
    let (uri_tx, mut uri_rx) = mpsc::unbounded_channel();
    let ws = accept_hdr_async(stream, move |req: &Request, resp: Response| {
        let _ = uri_tx.send(req.uri().to_string());
        Ok(resp)
    })
    .await
    .unwrap();
    let uri = uri_rx.recv().await.unwrap();
    (ws, uri)
}

fn result_frame(content: &str) -> WsMessage {
    WsMessage::Text(
        serde_json::json!({
            "id": "srv-1",
            "parent_id": ROOT_PARENT_ID,
            "role": "assistant",
            "mime_type": "text/markdown",
            "message_type": "result",
            "content": content,
            "status_code": 200
        })
        .to_string(),
    )
}

fn config_for(addr: SocketAddr) -> StreamerConfig {
    StreamerConfig::new(format!("ws://{addr}"), "sess-e2e", "key-e2e")
}

#[tokio::test]
async fn query_round_trip_over_websocket() {
    init_tracing();
    let (listener, addr) = bind().await;

    // Server: echo each query back as a result message.
    let server = tokio::spawn(async move {
        let (ws, uri) = accept_with_uri(&listener).await;
        let (mut tx, mut rx) = ws.split();

        let frame = rx.next().await.unwrap().unwrap();
        let WsMessage::Text(text) = frame else {
            panic!("expected text frame, got {frame:?}");
        };
        let query: Message = serde_json::from_str(&text).unwrap();
        let reply = format!("echo: {}", query.content.as_deref().unwrap_or(""));
        tx.send(result_frame(&reply)).await.unwrap();

        (uri, query)
    });

    let (message_tx, mut message_rx) = mpsc::unbounded_channel();
    let handlers = EventHandlers::new(move |message: Message| {
        let _ = message_tx.send(message);
    });

    let streamer = Streamer::connect(config_for(addr), handlers).await.unwrap();
    assert!(streamer.is_connected());

    streamer.send("hello over the wire", None).await.unwrap();

    let reply = timeout(Duration::from_secs(5), message_rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(reply.content.as_deref(), Some("echo: hello over the wire"));
    assert_eq!(reply.role, Role::Assistant);

    let (uri, query) = server.await.unwrap();
    assert_eq!(
        uri,
        "/v1/stream?api_key=key-e2e&session_id=sess-e2e"
    );
    assert_eq!(query.parent_id, ROOT_PARENT_ID);
    assert_eq!(query.content.as_deref(), Some("hello over the wire"));

    streamer.close().await;
}

#[tokio::test]
async fn server_restart_is_survived_by_reconnection() {
    init_tracing();
    let (listener, addr) = bind().await;

    let server = tokio::spawn(async move {
        // First connection: accept, then kick the client with a restart code.
        let (ws, _uri) = accept_with_uri(&listener).await;
        let (mut tx, _rx) = ws.split();
        tx.send(WsMessage::Close(Some(CloseFrame {
            code: CloseCode::from(1012),
            reason: "service restart".into(),
        })))
        .await
        .unwrap();

        // Second connection: answer the first query.
        let (ws, _uri) = accept_with_uri(&listener).await;
        let (mut tx, mut rx) = ws.split();
        loop {
            match rx.next().await {
                Some(Ok(WsMessage::Text(_))) => {
                    tx.send(result_frame("back online")).await.unwrap();
                    break;
                }
                Some(Ok(_)) => {}
                other => panic!("connection ended early: {other:?}"),
            }
        }
    });

    let (message_tx, mut message_rx) = mpsc::unbounded_channel();
    let (reconnect_tx, mut reconnect_rx) = mpsc::unbounded_channel();
    let handlers = EventHandlers::new(move |message: Message| {
        let _ = message_tx.send(message);
    })
    .on_reconnect(move |success, attempt| {
        let _ = reconnect_tx.send((success, attempt));
    });

    let backoff = ExponentialBackoff {
        initial_delay: Duration::from_millis(50),
        max_delay: Duration::from_millis(200),
        multiplier: 2.0,
    };
    let config = config_for(addr).with_reconnect_backoff(backoff);
    let streamer = Streamer::connect(config, handlers).await.unwrap();

    let (success, _attempt) = timeout(Duration::from_secs(5), reconnect_rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert!(success);

    streamer.send("are you back?", None).await.unwrap();
    let reply = timeout(Duration::from_secs(5), message_rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(reply.content.as_deref(), Some("back online"));

    streamer.close().await;
    server.await.unwrap();
}

#[tokio::test]
async fn normal_server_close_ends_the_stream() {
    init_tracing();
    let (listener, addr) = bind().await;

    let server = tokio::spawn(async move {
        let (ws, _uri) = accept_with_uri(&listener).await;
        let (mut tx, mut rx) = ws.split();
        tx.send(WsMessage::Close(Some(CloseFrame {
            code: CloseCode::Normal,
            reason: "conversation complete".into(),
        })))
        .await
        .unwrap();
        // Drain until the client acknowledges the close.
        while let Some(Ok(_)) = rx.next().await {}
    });

    let (close_tx, mut close_rx) = mpsc::unbounded_channel();
    let handlers = EventHandlers::new(|_| {}).on_close(move |info: CloseInfo| {
        let _ = close_tx.send(info);
    });

    let streamer = Streamer::connect(config_for(addr), handlers).await.unwrap();

    let info = timeout(Duration::from_secs(5), close_rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(info.code, 1000);
    assert_eq!(info.reason, "conversation complete");

    // Terminal: no retry, later sends fail.
    let late = streamer.send("anyone there?", None).await;
    assert!(matches!(late, Err(StreamError::NotConnected)));
    server.await.unwrap();
}
