//! Router configuration for Web API.

use axum::{routing::get, Router};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use super::handlers::{
    get_messages, get_room_messages, get_room_users, get_status, get_users, list_rooms,
    search_messages, search_room_messages, AppState,
};
use super::middleware::create_cors_layer;
use super::openapi::openapi_json;
use super::ws::chat_ws_handler;

/// Create the main router: REST queries, status and the WebSocket endpoint.
pub fn create_router(app_state: Arc<AppState>, cors_origins: &[String]) -> Router {
    let api_routes = Router::new()
        .route("/rooms", get(list_rooms))
        .route("/messages", get(get_messages))
        .route("/messages/:room", get(get_room_messages))
        .route("/users", get(get_users))
        .route("/users/:room", get(get_room_users))
        .route("/search", get(search_messages))
        .route("/search/:room", get(search_room_messages))
        .route("/openapi.json", get(openapi_json));

    Router::new()
        .route("/", get(get_status))
        .route("/ws", get(chat_ws_handler))
        .nest("/api", api_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(create_cors_layer(cors_origins)),
        )
        .with_state(app_state)
}

/// Create a health check router.
pub fn create_health_router() -> Router {
    Router::new().route("/health", get(health_check))
}

/// Health check handler.
async fn health_check() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_health_router() {
        let _router = create_health_router();
        // Should not panic
    }
}
