//! Command processor task.
//!
//! A single task owns the [`Coordinator`] and applies requests in arrival
//! order. Connections and REST handlers talk to it through a cloneable
//! [`CoordinatorHandle`]; queries get their answer over a oneshot channel.

use std::time::Duration;

use chrono::Utc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use super::coordinator::Coordinator;
use super::message::Message;
use super::protocol::Command;
use super::session::{Outbox, Session, SessionId};
use crate::config::ChatConfig;
use crate::{ParlorError, Result};

/// Requests accepted by the processor task.
#[derive(Debug)]
pub enum Request {
    /// A connection opened.
    Connect {
        session_id: SessionId,
        outbox: Outbox,
    },
    /// A connection sent a command.
    Command {
        session_id: SessionId,
        command: Command,
    },
    /// A connection closed.
    Disconnect { session_id: SessionId },
    /// List room names.
    ListRooms { reply: oneshot::Sender<Vec<String>> },
    /// Full log of a room.
    History {
        room: String,
        reply: oneshot::Sender<Option<Vec<Message>>>,
    },
    /// Members of a room.
    Members {
        room: String,
        reply: oneshot::Sender<Option<Vec<Session>>>,
    },
    /// Search a room's log.
    Search {
        room: String,
        query: String,
        reply: oneshot::Sender<Option<Vec<Message>>>,
    },
    /// Number of joined sessions.
    ConnectedUsers { reply: oneshot::Sender<usize> },
    /// Drop stale typing flags.
    ExpireTyping,
}

/// Cloneable handle to the processor task.
#[derive(Debug, Clone)]
pub struct CoordinatorHandle {
    tx: mpsc::UnboundedSender<Request>,
}

impl CoordinatorHandle {
    fn send(&self, request: Request) -> Result<()> {
        self.tx.send(request).map_err(|_| ParlorError::Unavailable)
    }

    async fn ask<T>(&self, build: impl FnOnce(oneshot::Sender<T>) -> Request) -> Result<T> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(build(reply_tx))?;
        reply_rx.await.map_err(|_| ParlorError::Unavailable)
    }

    /// Register a connection's outbox.
    pub fn connect(&self, session_id: &str, outbox: Outbox) -> Result<()> {
        self.send(Request::Connect {
            session_id: session_id.to_string(),
            outbox,
        })
    }

    /// Forward a command.
    pub fn command(&self, session_id: &str, command: Command) -> Result<()> {
        self.send(Request::Command {
            session_id: session_id.to_string(),
            command,
        })
    }

    /// Report a closed connection.
    pub fn disconnect(&self, session_id: &str) -> Result<()> {
        self.send(Request::Disconnect {
            session_id: session_id.to_string(),
        })
    }

    /// Room names in configured order.
    pub async fn rooms(&self) -> Result<Vec<String>> {
        self.ask(|reply| Request::ListRooms { reply }).await
    }

    /// Full log of a room, or None for an unknown room.
    pub async fn history(&self, room: &str) -> Result<Option<Vec<Message>>> {
        let room = room.to_string();
        self.ask(|reply| Request::History { room, reply }).await
    }

    /// Members of a room, or None for an unknown room.
    pub async fn members(&self, room: &str) -> Result<Option<Vec<Session>>> {
        let room = room.to_string();
        self.ask(|reply| Request::Members { room, reply }).await
    }

    /// Search a room, or None for an unknown room.
    pub async fn search(&self, room: &str, query: &str) -> Result<Option<Vec<Message>>> {
        let room = room.to_string();
        let query = query.to_string();
        self.ask(|reply| Request::Search { room, query, reply })
            .await
    }

    /// Number of joined sessions.
    pub async fn connected_users(&self) -> Result<usize> {
        self.ask(|reply| Request::ConnectedUsers { reply }).await
    }
}

/// Spawn the processor task.
///
/// When a typing timeout is configured, a second task periodically asks the
/// processor to expire stale typing flags. Both stop once every handle is
/// dropped.
pub fn spawn(config: &ChatConfig) -> (CoordinatorHandle, JoinHandle<()>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let coordinator = Coordinator::new(config);
    let task = tokio::spawn(run(coordinator, rx));
    let handle = CoordinatorHandle { tx };

    if let Some(timeout_secs) = config.typing_timeout() {
        start_typing_expiry_task(handle.tx.downgrade(), timeout_secs);
    }

    (handle, task)
}

async fn run(mut coordinator: Coordinator, mut rx: mpsc::UnboundedReceiver<Request>) {
    tracing::debug!("Chat processor started");
    while let Some(request) = rx.recv().await {
        apply(&mut coordinator, request);
    }
    tracing::debug!("Chat processor stopped");
}

fn apply(coordinator: &mut Coordinator, request: Request) {
    match request {
        Request::Connect { session_id, outbox } => coordinator.connect(&session_id, outbox),
        Request::Command {
            session_id,
            command,
        } => coordinator.handle(&session_id, command),
        Request::Disconnect { session_id } => coordinator.disconnect(&session_id),
        Request::ListRooms { reply } => {
            let _ = reply.send(coordinator.rooms());
        }
        Request::History { room, reply } => {
            let _ = reply.send(coordinator.history(&room));
        }
        Request::Members { room, reply } => {
            let _ = reply.send(coordinator.members(&room));
        }
        Request::Search { room, query, reply } => {
            let _ = reply.send(coordinator.search(&room, &query));
        }
        Request::ConnectedUsers { reply } => {
            let _ = reply.send(coordinator.connected_users());
        }
        Request::ExpireTyping => coordinator.expire_typing(Utc::now()),
    }
}

/// Interval between expiry sweeps: half the timeout, at least 250ms.
fn expiry_period(timeout_secs: u64) -> Duration {
    (Duration::from_secs(timeout_secs) / 2).max(Duration::from_millis(250))
}

fn start_typing_expiry_task(tx: mpsc::WeakUnboundedSender<Request>, timeout_secs: u64) {
    let period = expiry_period(timeout_secs);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.tick().await;

        loop {
            interval.tick().await;
            let Some(tx) = tx.upgrade() else {
                break;
            };
            if tx.send(Request::ExpireTyping).is_err() {
                break;
            }
        }
        tracing::debug!("Typing expiry task stopped");
    });
}
