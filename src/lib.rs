//! Parlor - real-time multi-room chat server
//!
//! Rooms, private messages, typing indicators, reactions, read receipts and
//! unread counters over a WebSocket event channel, with a small REST query
//! surface alongside.

pub mod chat;
pub mod config;
pub mod error;
pub mod logging;
pub mod web;

pub use chat::{Command, Coordinator, CoordinatorHandle, Message, Push, Session};
pub use config::Config;
pub use error::{ParlorError, Result};
pub use web::WebServer;
