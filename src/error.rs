//! Error types for Parlor.

use thiserror::Error;

/// Common error type for Parlor.
#[derive(Error, Debug)]
pub enum ParlorError {
    /// Username is empty, too short or too long after trimming.
    #[error("invalid username: {0}")]
    InvalidUsername(String),

    /// Username is held by another live session.
    #[error("username is already taken: {0}")]
    UsernameTaken(String),

    /// Private message target could not be resolved to a live session.
    #[error("user not found: {0}")]
    RecipientNotFound(String),

    /// Message id is not present in the addressed room's log.
    ///
    /// Never reported back to the client.
    #[error("unknown message: {0}")]
    UnknownMessage(String),

    /// Room is not part of the configured room set.
    #[error("unknown room: {0}")]
    UnknownRoom(String),

    /// The connection has not joined yet.
    #[error("not joined")]
    NotJoined,

    /// The connection already joined under a username.
    #[error("already joined as {0}")]
    AlreadyJoined(String),

    /// Message body or file payload does not match the message type.
    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    /// The command processor has stopped.
    #[error("chat service unavailable")]
    Unavailable,

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl ParlorError {
    /// Short machine-readable code sent in `error` pushes.
    pub fn code(&self) -> &'static str {
        match self {
            ParlorError::InvalidUsername(_) => "invalid_username",
            ParlorError::UsernameTaken(_) => "username_taken",
            ParlorError::RecipientNotFound(_) => "recipient_not_found",
            ParlorError::UnknownMessage(_) => "unknown_message",
            ParlorError::UnknownRoom(_) => "unknown_room",
            ParlorError::NotJoined => "not_joined",
            ParlorError::AlreadyJoined(_) => "already_joined",
            ParlorError::InvalidPayload(_) => "invalid_payload",
            ParlorError::Unavailable => "unavailable",
            ParlorError::Io(_) => "io",
            ParlorError::Config(_) => "config",
        }
    }

    /// Whether the error is dropped instead of reported to the caller.
    pub fn is_silent(&self) -> bool {
        matches!(self, ParlorError::UnknownMessage(_))
    }
}

/// Result type alias for Parlor operations.
pub type Result<T> = std::result::Result<T, ParlorError>;
