//! REST surface tests.

use axum::http::StatusCode;
use axum_test::TestServer;
use parlor::chat::{self, outbox, Command, CoordinatorHandle, Inbox, MessageKind};
use parlor::config::ChatConfig;
use parlor::web::handlers::AppState;
use parlor::web::router::{create_health_router, create_router};
use serde_json::Value;
use std::sync::Arc;

fn create_test_server() -> (TestServer, CoordinatorHandle) {
    let config = ChatConfig::default();
    let (coordinator, _task) = chat::spawn(&config);
    let app_state = Arc::new(AppState::new(coordinator.clone(), config.default_room));
    let router = create_router(app_state, &[]).merge(create_health_router());
    let server = TestServer::new(router).expect("Failed to create test server");
    (server, coordinator)
}

/// Join a user and return the receiving end of its outbox.
fn join_user(
    coordinator: &CoordinatorHandle,
    session_id: &str,
    username: &str,
    room: &str,
) -> Inbox {
    let (tx, rx) = outbox();
    coordinator.connect(session_id, tx).unwrap();
    coordinator
        .command(
            session_id,
            Command::Join {
                username: username.to_string(),
                room: Some(room.to_string()),
            },
        )
        .unwrap();
    rx
}

fn say(coordinator: &CoordinatorHandle, session_id: &str, body: &str) {
    coordinator
        .command(
            session_id,
            Command::SendMessage {
                body: body.to_string(),
                message_type: MessageKind::Text,
                file_payload: None,
            },
        )
        .unwrap();
}

#[tokio::test]
async fn test_list_rooms() {
    let (server, _coordinator) = create_test_server();

    let response = server.get("/api/rooms").await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(
        body["data"],
        serde_json::json!(["general", "random", "tech", "gaming"])
    );
}

#[tokio::test]
async fn test_messages_default_room_and_named_room() {
    let (server, coordinator) = create_test_server();
    let _alice = join_user(&coordinator, "s-alice", "alice", "general");
    say(&coordinator, "s-alice", "hello general");
    coordinator
        .command(
            "s-alice",
            Command::ChangeRoom {
                room: "tech".to_string(),
            },
        )
        .unwrap();
    say(&coordinator, "s-alice", "hello tech");

    let response = server.get("/api/messages").await;
    response.assert_status_ok();
    let body: Value = response.json();
    let messages = body["data"].as_array().unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0]["content"]["body"], "hello general");
    assert_eq!(messages[0]["sender"], "alice");

    let response = server.get("/api/messages/tech").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"][0]["content"]["body"], "hello tech");
}

#[tokio::test]
async fn test_messages_unknown_room() {
    let (server, _coordinator) = create_test_server();

    let response = server.get("/api/messages/nowhere").await;

    response.assert_status(StatusCode::NOT_FOUND);
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_users_in_room() {
    let (server, coordinator) = create_test_server();
    let _alice = join_user(&coordinator, "s-alice", "alice", "general");
    let _bob = join_user(&coordinator, "s-bob", "bob", "general");
    let _carol = join_user(&coordinator, "s-carol", "carol", "tech");

    let response = server.get("/api/users/general").await;

    response.assert_status_ok();
    let body: Value = response.json();
    let users = body["data"].as_array().unwrap();
    let names: Vec<_> = users.iter().map(|u| u["username"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["alice", "bob"]);
    assert_eq!(users[0]["current_room"], "general");

    let response = server.get("/api/users/tech").await;
    let body: Value = response.json();
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let response = server.get("/api/users").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"].as_array().unwrap().len(), 2);

    let response = server.get("/api/users/nowhere").await;
    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_search_case_insensitive() {
    let (server, coordinator) = create_test_server();
    let _alice = join_user(&coordinator, "s-alice", "alice", "general");
    say(&coordinator, "s-alice", "Rust is great");
    say(&coordinator, "s-alice", "so is coffee");

    let response = server
        .get("/api/search/general")
        .add_query_param("q", "RUST")
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    let results = body["data"].as_array().unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["content"]["body"], "Rust is great");

    // sender names match too
    let response = server.get("/api/search").add_query_param("q", "ALI").await;
    let body: Value = response.json();
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_search_empty_query_returns_nothing() {
    let (server, coordinator) = create_test_server();
    let _alice = join_user(&coordinator, "s-alice", "alice", "general");
    say(&coordinator, "s-alice", "anything");

    let response = server.get("/api/search/general").await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert!(body["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_search_query_too_long() {
    let (server, _coordinator) = create_test_server();

    let response = server
        .get("/api/search/general")
        .add_query_param("q", "x".repeat(201))
        .await;

    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    assert!(body["error"]["details"]["q"].is_array());
}

#[tokio::test]
async fn test_status() {
    let (server, coordinator) = create_test_server();
    let _alice = join_user(&coordinator, "s-alice", "alice", "general");

    let response = server.get("/").await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["name"], "parlor");
    assert_eq!(body["connected_users"], 1);
    assert_eq!(body["rooms"].as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn test_health() {
    let (server, _coordinator) = create_test_server();

    let response = server.get("/health").await;

    response.assert_status_ok();
    response.assert_text("OK");
}

#[tokio::test]
async fn test_openapi_document() {
    let (server, _coordinator) = create_test_server();

    let response = server.get("/api/openapi.json").await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert!(body["paths"]["/api/rooms"].is_object());
    assert!(body["paths"]["/api/messages"].is_object());
    assert!(body["paths"]["/api/messages/{room}"].is_object());
    assert!(body["components"]["schemas"]["Message"].is_object());
}
