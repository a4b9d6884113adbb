//! Shared test helpers for integration tests.

use std::net::SocketAddr;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use coursechat_api::AppState;
use coursechat_core::config::AppConfig;
use coursechat_realtime::message::ServerEvent;
use coursechat_realtime::RealtimeEngine;

const RECV_TIMEOUT: Duration = Duration::from_secs(5);

/// Drains every event currently queued on a receiver.
pub fn drain(rx: &mut mpsc::Receiver<ServerEvent>) -> Vec<ServerEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

/// Count for `room` in the last `online_users_update` among `events`.
pub fn last_count(events: &[ServerEvent], room: &str) -> Option<usize> {
    events.iter().rev().find_map(|event| match event {
        ServerEvent::OnlineUsersUpdate { counts } => counts.get(room).copied(),
        _ => None,
    })
}

/// A server bound to an ephemeral local port.
pub struct TestServer {
    /// Bound address
    pub addr: SocketAddr,
    /// Shared application state
    pub state: AppState,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl TestServer {
    /// Start a server with the default configuration.
    pub async fn start() -> Self {
        Self::start_with(AppConfig::default()).await
    }

    /// Start a server with the given configuration.
    pub async fn start_with(config: AppConfig) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("local addr");

        let engine = RealtimeEngine::in_memory(config.realtime.clone());
        let state = AppState::new(config, engine);

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let server_state = state.clone();
        let task = tokio::spawn(async move {
            coursechat_api::serve(listener, server_state, async {
                let _ = shutdown_rx.await;
            })
            .await
            .expect("server error");
        });

        Self {
            addr,
            state,
            shutdown_tx: Some(shutdown_tx),
            task,
        }
    }

    /// WebSocket URL of the socket endpoint.
    pub fn ws_url(&self) -> String {
        format!("ws://{}{}", self.addr, self.state.config.server.socket_path)
    }

    /// Open a WebSocket client and consume the `request_auth` greeting.
    pub async fn client(&self) -> WsClient {
        let mut client = WsClient::connect(&self.ws_url()).await;
        let greeting = client.recv_type("request_auth").await;
        assert_eq!(greeting["type"], "request_auth");
        client
    }

    /// Open a client and authenticate it as `user_id`.
    pub async fn authenticated_client(&self, user_id: &str, user_name: &str) -> WsClient {
        let mut client = self.client().await;
        client
            .send(serde_json::json!({
                "type": "authenticate",
                "userId": user_id,
                "userName": user_name,
                "userRole": "student",
            }))
            .await;
        client.recv_type("authenticated").await;
        client.recv_type("online_users_update").await;
        client
    }

    /// Stop the server and wait for it to exit.
    pub async fn stop(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        let _ = tokio::time::timeout(RECV_TIMEOUT, &mut self.task).await;
    }
}

/// Minimal JSON WebSocket client.
pub struct WsClient {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl WsClient {
    /// Connect to `url`.
    pub async fn connect(url: &str) -> Self {
        let (stream, _) = connect_async(url).await.expect("WebSocket connect");
        Self { stream }
    }

    /// Send a JSON frame.
    pub async fn send(&mut self, value: Value) {
        self.stream
            .send(Message::text(value.to_string()))
            .await
            .expect("send frame");
    }

    /// Send a raw text frame.
    pub async fn send_raw(&mut self, text: &str) {
        self.stream
            .send(Message::text(text.to_string()))
            .await
            .expect("send frame");
    }

    /// Receive the next JSON frame, skipping pings.
    pub async fn recv(&mut self) -> Value {
        loop {
            let frame = tokio::time::timeout(RECV_TIMEOUT, self.stream.next())
                .await
                .expect("timed out waiting for frame")
                .expect("stream ended")
                .expect("frame error");

            if let Message::Text(text) = frame {
                let value: Value = serde_json::from_str(text.as_str()).expect("JSON frame");
                if value["type"] != "ping" {
                    return value;
                }
            }
        }
    }

    /// Receive frames until one of the given type arrives.
    pub async fn recv_type(&mut self, event_type: &str) -> Value {
        loop {
            let value = self.recv().await;
            if value["type"] == event_type {
                return value;
            }
        }
    }

    /// Receive frames until an `online_users_update` reports `count` for `room`.
    pub async fn recv_count(&mut self, room: &str, count: u64) {
        loop {
            let value = self.recv_type("online_users_update").await;
            if value["counts"][room] == count {
                return;
            }
        }
    }

    /// Whether any frame other than a ping arrives within `wait`.
    pub async fn is_quiet_for(&mut self, wait: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + wait;
        loop {
            match tokio::time::timeout_at(deadline, self.stream.next()).await {
                Err(_) => return true,
                Ok(Some(Ok(Message::Text(text)))) => {
                    let value: Value = serde_json::from_str(text.as_str()).expect("JSON frame");
                    if value["type"] != "ping" {
                        return false;
                    }
                }
                Ok(Some(Ok(_))) => {}
                Ok(_) => return true,
            }
        }
    }

    /// Close the connection.
    pub async fn close(mut self) {
        let _ = self.stream.close(None).await;
    }
}
