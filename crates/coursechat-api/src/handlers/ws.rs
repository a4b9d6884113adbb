//! WebSocket upgrade handler.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::Response;
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use coursechat_realtime::connection::ConnectionHandle;
use coursechat_realtime::connection::heartbeat::{HeartbeatConfig, run_heartbeat};
use coursechat_realtime::message::ServerEvent;
use coursechat_realtime::message::serializer::serialize_outbound;

use crate::state::AppState;

/// GET {socket_path}: WebSocket upgrade
///
/// Identity is established in-band with an `authenticate` event.
pub async fn ws_upgrade(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    // Frames up to twice the limit still get an error event; larger ones drop the socket.
    let max_frame = state.config.realtime.max_frame_bytes.saturating_mul(2);

    ws.max_message_size(max_frame)
        .on_upgrade(move |socket| handle_ws_connection(state, socket))
}

/// Handles an established WebSocket connection.
async fn handle_ws_connection(state: AppState, socket: WebSocket) {
    let (ws_tx, mut ws_rx) = socket.split();
    let sessions = state.realtime.sessions.clone();

    let (handle, outbound_rx) = sessions.connect();
    let conn_id = handle.id;

    let outbound_task = tokio::spawn(forward_outbound(handle.clone(), outbound_rx, ws_tx));
    let heartbeat_task = tokio::spawn(run_heartbeat(
        handle.clone(),
        sessions.clone(),
        HeartbeatConfig::from(&state.config.realtime),
    ));

    loop {
        let frame = tokio::select! {
            _ = handle.closed() => break,
            frame = ws_rx.next() => frame,
        };

        match frame {
            Some(Ok(Message::Text(text))) => {
                sessions.handle_inbound(conn_id, text.as_str()).await;
            }
            Some(Ok(Message::Binary(_))) => {
                handle.touch().await;
                handle.send(ServerEvent::error(
                    "INVALID_MESSAGE",
                    "Binary frames are not supported",
                ));
            }
            Some(Ok(Message::Close(_))) | None => break,
            // Ping/pong frames are answered by axum
            Some(Ok(_)) => handle.touch().await,
            Some(Err(e)) => {
                warn!(conn_id = %conn_id, error = %e, "WebSocket error");
                break;
            }
        }
    }

    sessions.disconnect(conn_id).await;
    heartbeat_task.abort();
    if let Err(e) = outbound_task.await {
        debug!(conn_id = %conn_id, error = %e, "Outbound task ended abnormally");
    }

    info!(conn_id = %conn_id, "WebSocket connection finished");
}

/// Writes queued events to the socket until the connection closes.
///
/// Events already queued when the connection closes are still flushed.
async fn forward_outbound<S>(
    handle: Arc<ConnectionHandle>,
    mut outbound_rx: mpsc::Receiver<ServerEvent>,
    mut ws_tx: S,
) where
    S: futures::Sink<Message> + Unpin,
{
    loop {
        let event = tokio::select! {
            biased;
            event = outbound_rx.recv() => match event {
                Some(event) => event,
                None => break,
            },
            _ = handle.closed() => {
                while let Ok(event) = outbound_rx.try_recv() {
                    if !write_event(&mut ws_tx, &event).await {
                        break;
                    }
                }
                break;
            }
        };

        if !write_event(&mut ws_tx, &event).await {
            handle.close();
            break;
        }
    }

    let _ = ws_tx.close().await;
}

/// Returns `false` once the socket refuses writes.
async fn write_event<S>(ws_tx: &mut S, event: &ServerEvent) -> bool
where
    S: futures::Sink<Message> + Unpin,
{
    let text = match serialize_outbound(event) {
        Ok(text) => text,
        Err(e) => {
            error!(event = event.name(), error = %e, "Failed to serialize outbound event");
            return true;
        }
    };
    ws_tx.send(Message::Text(text.into())).await.is_ok()
}
