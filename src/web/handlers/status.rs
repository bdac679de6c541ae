//! Service status handler.

use axum::{extract::State, Json};
use std::sync::Arc;

use super::AppState;
use crate::web::dto::StatusResponse;
use crate::web::error::ApiError;

/// Get service status.
#[utoipa::path(
    get,
    path = "/",
    tag = "Status",
    responses(
        (status = 200, description = "Service status", body = StatusResponse)
    )
)]
pub async fn get_status(
    State(state): State<Arc<AppState>>,
) -> Result<Json<StatusResponse>, ApiError> {
    let rooms = state.coordinator.rooms().await?;
    let connected_users = state.coordinator.connected_users().await?;
    Ok(Json(StatusResponse {
        name: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        rooms,
        connected_users,
    }))
}
