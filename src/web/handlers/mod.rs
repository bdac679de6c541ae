//! API handlers for the REST surface.

pub mod rooms;
pub mod status;

pub use rooms::*;
pub use status::*;

use crate::chat::CoordinatorHandle;

/// Shared state for handlers and the WebSocket endpoint.
#[derive(Clone)]
pub struct AppState {
    /// Handle to the chat processor.
    pub coordinator: CoordinatorHandle,
    /// Room used when a request names none.
    pub default_room: String,
}

impl AppState {
    /// Create a new application state.
    pub fn new(coordinator: CoordinatorHandle, default_room: impl Into<String>) -> Self {
        Self {
            coordinator,
            default_room: default_room.into(),
        }
    }
}
