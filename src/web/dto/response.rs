//! Response DTOs for Web API.

use serde::Serialize;
use utoipa::ToSchema;

/// Generic API response wrapper.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    /// Response data.
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Create a new API response.
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

/// Service status.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct StatusResponse {
    /// Service name.
    pub name: String,
    /// Service version.
    pub version: String,
    /// Available rooms.
    pub rooms: Vec<String>,
    /// Number of joined sessions.
    pub connected_users: usize,
}
