//! WebSocket module for the chat event channel.

pub mod chat;

pub use chat::chat_ws_handler;
