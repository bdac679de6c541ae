//! OpenAPI document for the REST surface.

use axum::Json;
use utoipa::OpenApi;

use crate::chat::{Message, MessageContent, MessageKind, Session};
use crate::web::dto::StatusResponse;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Parlor API",
        description = "Query surface of the Parlor chat server. Live traffic uses the WebSocket at /ws."
    ),
    paths(
        crate::web::handlers::rooms::list_rooms,
        crate::web::handlers::rooms::get_messages,
        crate::web::handlers::rooms::get_room_messages,
        crate::web::handlers::rooms::get_users,
        crate::web::handlers::rooms::get_room_users,
        crate::web::handlers::rooms::search_messages,
        crate::web::handlers::rooms::search_room_messages,
        crate::web::handlers::status::get_status,
    ),
    components(schemas(Message, MessageContent, MessageKind, Session, StatusResponse)),
    tags(
        (name = "Rooms", description = "Room logs, members and search"),
        (name = "Status", description = "Service status")
    )
)]
pub struct ApiDoc;

/// Serve the OpenAPI document.
pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_paths() {
        let doc = ApiDoc::openapi();
        let json = serde_json::to_value(&doc).unwrap();
        let paths = json["paths"].as_object().unwrap();
        assert!(paths.contains_key("/api/rooms"));
        assert!(paths.contains_key("/api/messages"));
        assert!(paths.contains_key("/api/messages/{room}"));
        assert!(paths.contains_key("/api/users"));
        assert!(paths.contains_key("/api/users/{room}"));
        assert!(paths.contains_key("/api/search"));
        assert!(paths.contains_key("/api/search/{room}"));
        assert!(paths.contains_key("/"));
    }
}
