//! End-to-end tests over a real WebSocket connection.

use std::time::Duration;

use serde_json::json;

use coursechat_core::types::RoomId;

use crate::helpers::TestServer;

#[tokio::test]
async fn test_authenticate_acknowledges_identity() {
    let server = TestServer::start().await;
    let mut client = server.client().await;

    client
        .send(json!({
            "type": "authenticate",
            "userId": "coach-1",
            "userName": "Maria",
            "userRole": "coach",
        }))
        .await;

    let ack = client.recv_type("authenticated").await;
    assert_eq!(ack["userId"], "coach-1");
    assert_eq!(ack["userName"], "Maria");
    assert_eq!(ack["role"], "coach");

    let snapshot = client.recv_type("online_users_update").await;
    assert!(snapshot["counts"].is_object());

    client.close().await;
    server.stop().await;
}

#[tokio::test]
async fn test_events_before_authenticate_are_rejected() {
    let server = TestServer::start().await;
    let mut client = server.client().await;

    client
        .send(json!({"type": "join_room", "roomId": "course1"}))
        .await;
    let err = client.recv_type("error").await;
    assert_eq!(err["code"], "UNAUTHENTICATED");

    client.send_raw("not json").await;
    let err = client.recv_type("error").await;
    assert_eq!(err["code"], "INVALID_MESSAGE");

    client.close().await;
    server.stop().await;
}

#[tokio::test]
async fn test_chat_between_two_clients() {
    let server = TestServer::start().await;
    let mut alice = server.authenticated_client("alice", "Alice").await;
    let mut bob = server.authenticated_client("bob", "Bob").await;

    alice
        .send(json!({"type": "join_room", "roomId": "course1"}))
        .await;
    alice.recv_type("room_joined").await;
    alice.recv_count("course1", 1).await;

    bob.send(json!({"type": "join_room", "roomId": "course1"}))
        .await;
    bob.recv_type("room_joined").await;
    bob.recv_count("course1", 2).await;
    alice.recv_count("course1", 2).await;

    bob.send(json!({
        "type": "send_message",
        "roomId": "course1",
        "senderId": "bob",
        "text": "hello class",
    }))
    .await;

    let message = alice.recv_type("new_message").await;
    assert_eq!(message["senderId"], "bob");
    assert_eq!(message["senderName"], "Bob");
    assert_eq!(message["text"], "hello class");

    let notification = alice.recv_type("new_notification").await;
    assert_eq!(notification["userId"], "alice");
    assert_eq!(notification["kind"], "message");
    assert_eq!(notification["data"]["roomId"], "course1");
    assert_eq!(notification["data"]["messageId"], message["id"]);

    let accepted = bob.recv_type("message_accepted").await;
    assert_eq!(accepted["messageId"], message["id"]);

    alice.close().await;
    bob.close().await;
    server.stop().await;
}

#[tokio::test]
async fn test_typing_indicator_reaches_other_members_only() {
    let server = TestServer::start().await;
    let mut alice = server.authenticated_client("alice", "Alice").await;
    let mut bob = server.authenticated_client("bob", "Bob").await;

    for client in [&mut alice, &mut bob] {
        client
            .send(json!({"type": "join_room", "roomId": "course1"}))
            .await;
        client.recv_type("room_joined").await;
    }
    alice.recv_count("course1", 2).await;
    bob.recv_count("course1", 2).await;

    alice
        .send(json!({"type": "typing_start", "roomId": "course1"}))
        .await;
    let typing = bob.recv_type("user_typing").await;
    assert_eq!(typing["userId"], "alice");
    assert_eq!(typing["userName"], "Alice");
    assert_eq!(typing["isTyping"], true);

    assert!(alice.is_quiet_for(Duration::from_millis(200)).await);

    alice.close().await;
    bob.close().await;
    server.stop().await;
}

#[tokio::test]
async fn test_presence_drops_when_client_disconnects() {
    let server = TestServer::start().await;
    let mut alice = server.authenticated_client("alice", "Alice").await;
    let mut bob = server.authenticated_client("bob", "Bob").await;

    for client in [&mut alice, &mut bob] {
        client
            .send(json!({"type": "join_room", "roomId": "course1"}))
            .await;
        client.recv_type("room_joined").await;
    }
    alice.recv_count("course1", 2).await;

    bob.close().await;
    alice.recv_count("course1", 1).await;

    let sessions = &server.state.realtime.sessions;
    assert_eq!(sessions.count_of(&RoomId::from("course1")).await, 1);
    assert!(sessions.is_consistent().await);

    alice.close().await;
    server.stop().await;
}

#[tokio::test]
async fn test_reconnect_supersedes_previous_socket() {
    let server = TestServer::start().await;
    let mut first = server.authenticated_client("alice", "Alice").await;
    first
        .send(json!({"type": "join_room", "roomId": "course1"}))
        .await;
    first.recv_type("room_joined").await;

    let mut second = server.authenticated_client("alice", "Alice").await;

    let notice = first.recv_type("error").await;
    assert_eq!(notice["code"], "SESSION_SUPERSEDED");

    // Memberships belong to the user and survive the reconnect.
    second
        .send(json!({"type": "join_room", "roomId": "course1"}))
        .await;
    second.recv_type("room_joined").await;
    second.recv_count("course1", 1).await;

    second.close().await;
    server.stop().await;
}
