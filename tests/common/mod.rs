//! Test helpers for coordinator and end-to-end tests.

#![allow(dead_code)]

use std::time::Duration;

use parlor::chat::{outbox, Command, Coordinator, Inbox, MessageKind, Push};
use parlor::config::ChatConfig;

/// Default timeout for test operations.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// One simulated connection.
pub struct TestClient {
    pub id: String,
    rx: Inbox,
}

impl TestClient {
    /// Attach a new connection to the coordinator.
    pub fn connect(coord: &mut Coordinator, id: &str) -> Self {
        let (tx, rx) = outbox();
        coord.connect(id, tx);
        Self {
            id: id.to_string(),
            rx,
        }
    }

    /// Take every push queued so far.
    pub fn drain(&mut self) -> Vec<Push> {
        let mut pushes = Vec::new();
        while let Ok(push) = self.rx.try_recv() {
            pushes.push(push);
        }
        pushes
    }
}

/// Coordinator with the default configuration.
pub fn coordinator() -> Coordinator {
    Coordinator::new(&ChatConfig::default())
}

/// Join command.
pub fn join(username: &str, room: &str) -> Command {
    Command::Join {
        username: username.to_string(),
        room: Some(room.to_string()),
    }
}

/// Plain text message command.
pub fn say(body: &str) -> Command {
    Command::SendMessage {
        body: body.to_string(),
        message_type: MessageKind::Text,
        file_payload: None,
    }
}

/// Room change command.
pub fn change_room(room: &str) -> Command {
    Command::ChangeRoom {
        room: room.to_string(),
    }
}

/// Private text message command.
pub fn whisper(to: &str, body: &str) -> Command {
    Command::PrivateMessage {
        to: to.to_string(),
        body: body.to_string(),
        message_type: MessageKind::Text,
        file_payload: None,
    }
}
