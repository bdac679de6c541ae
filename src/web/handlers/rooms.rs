//! Room query handlers.
//!
//! Each room-scoped endpoint comes in two routes: the bare one reads the
//! default room, the `/{room}` one reads the named room.

use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;

use super::AppState;
use crate::chat::{Message, Session};
use crate::web::dto::{ApiResponse, SearchQuery, ValidatedQuery};
use crate::web::error::ApiError;

/// List rooms.
#[utoipa::path(
    get,
    path = "/api/rooms",
    tag = "Rooms",
    responses(
        (status = 200, description = "Room names in configured order", body = ApiResponse<Vec<String>>)
    )
)]
pub async fn list_rooms(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<String>>>, ApiError> {
    let rooms = state.coordinator.rooms().await?;
    Ok(Json(ApiResponse::new(rooms)))
}

/// Get the full log of the default room.
#[utoipa::path(
    get,
    path = "/api/messages",
    tag = "Rooms",
    responses(
        (status = 200, description = "Messages, oldest first", body = ApiResponse<Vec<Message>>)
    )
)]
pub async fn get_messages(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<Message>>>, ApiError> {
    let room = state.default_room.clone();
    room_messages(&state, &room).await
}

/// Get the full log of a room.
#[utoipa::path(
    get,
    path = "/api/messages/{room}",
    tag = "Rooms",
    params(
        ("room" = String, Path, description = "Room name")
    ),
    responses(
        (status = 200, description = "Messages, oldest first", body = ApiResponse<Vec<Message>>),
        (status = 404, description = "Room not found")
    )
)]
pub async fn get_room_messages(
    State(state): State<Arc<AppState>>,
    Path(room): Path<String>,
) -> Result<Json<ApiResponse<Vec<Message>>>, ApiError> {
    room_messages(&state, &room).await
}

async fn room_messages(
    state: &AppState,
    room: &str,
) -> Result<Json<ApiResponse<Vec<Message>>>, ApiError> {
    let messages = state
        .coordinator
        .history(room)
        .await?
        .ok_or_else(|| ApiError::unknown_room(room))?;
    Ok(Json(ApiResponse::new(messages)))
}

/// Get the members of the default room.
#[utoipa::path(
    get,
    path = "/api/users",
    tag = "Rooms",
    responses(
        (status = 200, description = "Members in join order", body = ApiResponse<Vec<Session>>)
    )
)]
pub async fn get_users(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<Session>>>, ApiError> {
    let room = state.default_room.clone();
    room_users(&state, &room).await
}

/// Get the members of a room.
#[utoipa::path(
    get,
    path = "/api/users/{room}",
    tag = "Rooms",
    params(
        ("room" = String, Path, description = "Room name")
    ),
    responses(
        (status = 200, description = "Members in join order", body = ApiResponse<Vec<Session>>),
        (status = 404, description = "Room not found")
    )
)]
pub async fn get_room_users(
    State(state): State<Arc<AppState>>,
    Path(room): Path<String>,
) -> Result<Json<ApiResponse<Vec<Session>>>, ApiError> {
    room_users(&state, &room).await
}

async fn room_users(
    state: &AppState,
    room: &str,
) -> Result<Json<ApiResponse<Vec<Session>>>, ApiError> {
    let users = state
        .coordinator
        .members(room)
        .await?
        .ok_or_else(|| ApiError::unknown_room(room))?;
    Ok(Json(ApiResponse::new(users)))
}

/// Search the default room's log.
///
/// Matches body and sender case-insensitively. An empty query matches
/// nothing.
#[utoipa::path(
    get,
    path = "/api/search",
    tag = "Rooms",
    params(SearchQuery),
    responses(
        (status = 200, description = "Matches, oldest first", body = ApiResponse<Vec<Message>>),
        (status = 422, description = "Query too long")
    )
)]
pub async fn search_messages(
    State(state): State<Arc<AppState>>,
    ValidatedQuery(query): ValidatedQuery<SearchQuery>,
) -> Result<Json<ApiResponse<Vec<Message>>>, ApiError> {
    let room = state.default_room.clone();
    room_search(&state, &room, query).await
}

/// Search a room's log.
#[utoipa::path(
    get,
    path = "/api/search/{room}",
    tag = "Rooms",
    params(
        ("room" = String, Path, description = "Room name"),
        SearchQuery
    ),
    responses(
        (status = 200, description = "Matches, oldest first", body = ApiResponse<Vec<Message>>),
        (status = 404, description = "Room not found"),
        (status = 422, description = "Query too long")
    )
)]
pub async fn search_room_messages(
    State(state): State<Arc<AppState>>,
    Path(room): Path<String>,
    ValidatedQuery(query): ValidatedQuery<SearchQuery>,
) -> Result<Json<ApiResponse<Vec<Message>>>, ApiError> {
    room_search(&state, &room, query).await
}

async fn room_search(
    state: &AppState,
    room: &str,
    query: SearchQuery,
) -> Result<Json<ApiResponse<Vec<Message>>>, ApiError> {
    let q = query.q.unwrap_or_default();
    let results = state
        .coordinator
        .search(room, &q)
        .await?
        .ok_or_else(|| ApiError::unknown_room(room))?;
    tracing::debug!(room = %room, matches = results.len(), "Search completed");
    Ok(Json(ApiResponse::new(results)))
}
