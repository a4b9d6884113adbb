//! Ping keepalive plus authentication and idle timeouts.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::time::{self, Instant};

use coursechat_core::config::RealtimeConfig;

use super::handle::ConnectionHandle;
use crate::message::types::ServerEvent;
use crate::session::manager::SessionManager;

/// Heartbeat configuration
#[derive(Debug, Clone)]
pub struct HeartbeatConfig {
    /// Interval between pings
    pub ping_interval: Duration,
    /// Deadline for binding an identity after the connection opens
    pub auth_timeout: Duration,
    /// Maximum time without inbound frames
    pub idle_timeout: Duration,
}

impl From<&RealtimeConfig> for HeartbeatConfig {
    fn from(config: &RealtimeConfig) -> Self {
        Self {
            ping_interval: Duration::from_secs(config.ping_interval_seconds.max(1)),
            auth_timeout: Duration::from_secs(config.auth_timeout_seconds),
            idle_timeout: Duration::from_secs(config.idle_timeout_seconds),
        }
    }
}

/// Why the heartbeat closed a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeoutReason {
    /// No identity was bound in time.
    Unauthenticated,
    /// No inbound frame arrived in time.
    Idle,
}

impl TimeoutReason {
    fn as_str(self) -> &'static str {
        match self {
            Self::Unauthenticated => "auth_timeout",
            Self::Idle => "idle_timeout",
        }
    }
}

/// Checks a connection against its deadlines.
pub async fn check_timeouts(
    handle: &ConnectionHandle,
    config: &HeartbeatConfig,
) -> Option<TimeoutReason> {
    if !handle.is_authenticated() && handle.age() >= config.auth_timeout {
        return Some(TimeoutReason::Unauthenticated);
    }
    if handle.idle_for().await >= config.idle_timeout {
        return Some(TimeoutReason::Idle);
    }
    None
}

/// Run heartbeat loop for a connection.
///
/// Sends a `ping` every interval and disconnects the connection through the
/// session manager once a deadline passes. Returns when the connection
/// closes.
pub async fn run_heartbeat(
    handle: Arc<ConnectionHandle>,
    sessions: Arc<SessionManager>,
    config: HeartbeatConfig,
) {
    let mut interval = time::interval_at(Instant::now() + config.ping_interval, config.ping_interval);

    loop {
        tokio::select! {
            _ = handle.closed() => break,
            _ = interval.tick() => {}
        }

        if let Some(reason) = check_timeouts(&handle, &config).await {
            tracing::info!(conn_id = %handle.id, reason = reason.as_str(), "Closing connection");
            sessions.disconnect(handle.id).await;
            break;
        }

        let ping = ServerEvent::Ping {
            timestamp: Utc::now().timestamp_millis(),
        };
        if !handle.send(ping) && !handle.is_alive() {
            tracing::debug!(conn_id = %handle.id, "Ping send failed, disconnecting");
            sessions.disconnect(handle.id).await;
            break;
        }
    }

    tracing::debug!(conn_id = %handle.id, "Heartbeat loop ended");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::RealtimeEngine;
    use crate::message::types::AuthenticatePayload;
    use coursechat_core::types::UserId;

    fn config() -> HeartbeatConfig {
        HeartbeatConfig {
            ping_interval: Duration::from_secs(5),
            auth_timeout: Duration::from_secs(10),
            idle_timeout: Duration::from_secs(30),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_unauthenticated_connection_times_out() {
        let engine = RealtimeEngine::in_memory(RealtimeConfig::default());
        let (handle, mut rx) = engine.sessions.connect();
        assert_eq!(rx.recv().await.map(|e| e.name()), Some("request_auth"));

        let task = tokio::spawn(run_heartbeat(handle.clone(), engine.sessions.clone(), config()));

        time::sleep(Duration::from_secs(6)).await;
        assert_eq!(rx.recv().await.map(|e| e.name()), Some("ping"));
        assert!(handle.is_alive());

        time::sleep(Duration::from_secs(5)).await;
        task.await.expect("heartbeat task");
        assert!(!handle.is_alive());
        assert_eq!(engine.sessions.connection_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_connection_times_out() {
        let engine = RealtimeEngine::in_memory(RealtimeConfig::default());
        let (handle, _rx) = engine.sessions.connect();
        engine
            .sessions
            .authenticate(
                handle.id,
                AuthenticatePayload {
                    user_id: Some("u1".into()),
                    ..Default::default()
                },
            )
            .await
            .expect("authenticate");

        let task = tokio::spawn(run_heartbeat(handle.clone(), engine.sessions.clone(), config()));

        time::sleep(Duration::from_secs(20)).await;
        assert!(handle.is_alive());
        handle.touch().await;

        time::sleep(Duration::from_secs(20)).await;
        assert!(handle.is_alive());

        time::sleep(Duration::from_secs(15)).await;
        task.await.expect("heartbeat task");
        assert!(!handle.is_alive());
        assert!(engine.sessions.identity_of(handle.id).await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_superseded_connection_left_open_hits_auth_timeout() {
        let engine = RealtimeEngine::in_memory(RealtimeConfig {
            close_superseded: false,
            ..RealtimeConfig::default()
        });
        let login = || AuthenticatePayload {
            user_id: Some("u1".into()),
            ..Default::default()
        };

        let (old, _old_rx) = engine.sessions.connect();
        engine
            .sessions
            .authenticate(old.id, login())
            .await
            .expect("authenticate");
        let task = tokio::spawn(run_heartbeat(old.clone(), engine.sessions.clone(), config()));

        // Past the auth deadline while still authenticated.
        time::sleep(Duration::from_secs(12)).await;
        assert!(old.is_alive());

        let (new, _new_rx) = engine.sessions.connect();
        engine
            .sessions
            .authenticate(new.id, login())
            .await
            .expect("authenticate");
        assert!(old.is_alive());

        // The deadline counts from connection open, so the next tick closes it.
        time::sleep(Duration::from_secs(4)).await;
        task.await.expect("heartbeat task");
        assert!(!old.is_alive());
        assert_eq!(
            engine.sessions.connection_of(&UserId::from("u1")).await,
            Some(new.id)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_loop_ends_when_connection_closes() {
        let engine = RealtimeEngine::in_memory(RealtimeConfig::default());
        let (handle, _rx) = engine.sessions.connect();

        let task = tokio::spawn(run_heartbeat(handle.clone(), engine.sessions.clone(), config()));
        handle.close();
        task.await.expect("heartbeat task");
    }
}
