//! Session scenarios driven directly through the realtime engine.

use std::sync::Arc;

use tokio::sync::mpsc::Receiver;

use coursechat_core::config::RealtimeConfig;
use coursechat_core::types::{
    ConnectionId, NotificationEvent, NotificationKind, RoomId, UserId,
};
use coursechat_realtime::RealtimeEngine;
use coursechat_realtime::message::{
    AuthenticatePayload, RoomPayload, SendMessagePayload, ServerEvent,
};
use coursechat_realtime::store::{InMemoryMessageStore, InMemoryNotificationStore};

use crate::helpers::{drain, last_count};

struct Harness {
    engine: RealtimeEngine,
    messages: Arc<InMemoryMessageStore>,
    notifications: Arc<InMemoryNotificationStore>,
}

fn harness() -> Harness {
    let messages = Arc::new(InMemoryMessageStore::new(50));
    let notifications = Arc::new(InMemoryNotificationStore::new(50));
    let engine = RealtimeEngine::new(
        RealtimeConfig::default(),
        messages.clone(),
        notifications.clone(),
    );
    Harness {
        engine,
        messages,
        notifications,
    }
}

fn auth(user: &str) -> AuthenticatePayload {
    AuthenticatePayload {
        user_id: Some(user.to_string()),
        user_name: Some(format!("{user}-name")),
        user_role: None,
    }
}

fn room(id: &str) -> RoomPayload {
    RoomPayload {
        room_id: Some(id.to_string()),
        user_id: None,
    }
}

fn text(room_id: &str, body: &str) -> SendMessagePayload {
    SendMessagePayload {
        room_id: Some(room_id.to_string()),
        text: Some(body.to_string()),
        ..Default::default()
    }
}

async fn online(engine: &RealtimeEngine, user: &str) -> (ConnectionId, Receiver<ServerEvent>) {
    let (handle, rx) = engine.sessions.connect();
    engine
        .sessions
        .authenticate(handle.id, auth(user))
        .await
        .expect("authenticate");
    (handle.id, rx)
}

#[tokio::test]
async fn test_course_presence_follows_joins_and_disconnects() {
    let h = harness();
    let sessions = &h.engine.sessions;
    let course = RoomId::from("course-42");

    let (watcher, mut watcher_rx) = sessions.connect();
    sessions
        .authenticate(watcher.id, auth("watcher"))
        .await
        .expect("auth");
    sessions.join(watcher.id, room("course-42")).await.expect("join");

    let (a, _a_rx) = online(&h.engine, "a").await;
    let (b, _b_rx) = online(&h.engine, "b").await;
    sessions.join(a, room("course-42")).await.expect("join");
    sessions.join(b, room("course-42")).await.expect("join");
    assert_eq!(sessions.count_of(&course).await, 3);

    drain(&mut watcher_rx);
    assert!(sessions.disconnect(a).await);
    assert_eq!(last_count(&drain(&mut watcher_rx), "course-42"), Some(2));

    sessions.leave(b, room("course-42")).await.expect("leave");
    assert_eq!(last_count(&drain(&mut watcher_rx), "course-42"), Some(1));
    assert!(sessions.is_consistent().await);
}

#[tokio::test]
async fn test_chat_reaches_members_and_is_persisted() {
    let h = harness();
    let sessions = &h.engine.sessions;

    let (coach, mut coach_rx) = sessions.connect();
    sessions.authenticate(coach.id, auth("coach")).await.expect("auth");
    sessions.join(coach.id, room("c1")).await.expect("join");

    let (student, mut student_rx) = sessions.connect();
    sessions
        .authenticate(student.id, auth("student"))
        .await
        .expect("auth");
    sessions.join(student.id, room("c1")).await.expect("join");

    drain(&mut coach_rx);
    drain(&mut student_rx);

    let message = sessions
        .send_message(student.id, text("c1", "when is the next session?"))
        .await
        .expect("send");

    let coach_events = drain(&mut coach_rx);
    assert!(coach_events
        .iter()
        .any(|e| matches!(e, ServerEvent::NewMessage(m) if m.id == message.id)));
    assert!(coach_events.iter().any(|e| matches!(
        e,
        ServerEvent::NewNotification(n) if n.kind == NotificationKind::Message
    )));

    let student_events = drain(&mut student_rx);
    assert!(!student_events
        .iter()
        .any(|e| matches!(e, ServerEvent::NewMessage(_))));
    assert!(student_events
        .iter()
        .any(|e| matches!(e, ServerEvent::MessageAccepted { message_id, .. } if *message_id == message.id)));

    let history = h.messages.history(&RoomId::from("c1"));
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].sender_name, "student-name");
    assert!(h.notifications.is_empty());
}

#[tokio::test]
async fn test_offline_member_gets_stored_notification() {
    let h = harness();
    let sessions = &h.engine.sessions;

    let (sender, _sender_rx) = online(&h.engine, "sender").await;
    let (absent, _absent_rx) = online(&h.engine, "absent").await;
    sessions.join(sender, room("c1")).await.expect("join");
    sessions.join(absent, room("c1")).await.expect("join");

    assert!(sessions.disconnect(absent).await);
    assert!(!sessions.disconnect(absent).await);
    assert_eq!(sessions.count_of(&RoomId::from("c1")).await, 1);

    sessions
        .send_message(sender, text("c1", "anyone here?"))
        .await
        .expect("send");
    assert!(h.notifications.is_empty());

    let user = UserId::from("absent");
    let delivered = sessions
        .notify(NotificationEvent::new(
            user.clone(),
            NotificationKind::Booking,
            "Booking confirmed",
            "Your session is booked",
            serde_json::json!({}),
        ))
        .await;
    assert!(!delivered);

    let pending = h.notifications.take_pending(&user);
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].kind, NotificationKind::Booking);
}

#[tokio::test]
async fn test_stale_disconnect_after_reconnect_keeps_presence() {
    let h = harness();
    let sessions = &h.engine.sessions;
    let course = RoomId::from("c1");

    let (first, mut first_rx) = sessions.connect();
    sessions.authenticate(first.id, auth("u1")).await.expect("auth");
    sessions.join(first.id, room("c1")).await.expect("join");

    let (second, _second_rx) = sessions.connect();
    sessions.authenticate(second.id, auth("u1")).await.expect("auth");

    let first_events = drain(&mut first_rx);
    assert!(first_events.iter().any(|e| matches!(
        e,
        ServerEvent::Error { code, .. } if code == "SESSION_SUPERSEDED"
    )));

    // The transport of the old connection reports its close late.
    sessions.disconnect(first.id).await;

    assert_eq!(sessions.connection_of(&UserId::from("u1")).await, Some(second.id));
    assert_eq!(sessions.count_of(&course).await, 1);
    assert!(sessions.rooms_of(&UserId::from("u1")).await.contains(&course));
    assert!(sessions.is_consistent().await);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_churn_leaves_consistent_state() {
    let h = harness();
    let sessions = h.engine.sessions.clone();

    let mut tasks = Vec::new();
    for i in 0..40 {
        let sessions = sessions.clone();
        tasks.push(tokio::spawn(async move {
            let (handle, _rx) = sessions.connect();
            let user = format!("user-{}", i % 20);
            let _ = sessions.authenticate(handle.id, auth(&user)).await;
            let _ = sessions.join(handle.id, room("shared")).await;
            let _ = sessions.join(handle.id, room(&format!("own-{i}"))).await;
            if i % 3 == 0 {
                sessions.disconnect(handle.id).await;
            }
        }));
    }
    for task in tasks {
        task.await.expect("task");
    }

    assert!(sessions.is_consistent().await);
    let shared = sessions.count_of(&RoomId::from("shared")).await;
    assert!(shared <= 20);
    assert_eq!(
        sessions.online_counts().await.get("shared").copied().unwrap_or(0),
        shared
    );

    h.engine.shutdown().await.expect("shutdown");
    assert_eq!(sessions.connection_count(), 0);
    assert_eq!(sessions.user_count().await, 0);
    assert_eq!(sessions.room_count().await, 0);
}
