//! Session registry.
//!
//! Maps each live connection to its identity and current room. It is the
//! single source of truth for who is connected, as whom, and where, and it
//! owns the outbound queue of every connection, so fan-out is expressed as
//! "enumerate sessions in a room" plus "deliver to one session".

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::mpsc::{self, error::TrySendError};
use utoipa::ToSchema;

use super::protocol::Push;
use crate::{ParlorError, Result};

/// Opaque connection identifier, stable for the connection's lifetime.
pub type SessionId = String;

/// Pushes a connection may have queued before it is dropped as stalled.
pub const OUTBOX_CAPACITY: usize = 1024;

/// Outbound queue of one connection.
pub type Outbox = mpsc::Sender<Push>;

/// Receiving end of an [`Outbox`].
pub type Inbox = mpsc::Receiver<Push>;

/// Create a connection queue holding up to [`OUTBOX_CAPACITY`] pushes.
pub fn outbox() -> (Outbox, Inbox) {
    mpsc::channel(OUTBOX_CAPACITY)
}

/// Minimum username length in characters (after trimming).
pub const MIN_USERNAME_LENGTH: usize = 2;

/// Maximum username length in characters (after trimming).
pub const MAX_USERNAME_LENGTH: usize = 20;

/// A joined session.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Session {
    /// Session id.
    pub id: SessionId,
    /// Username, unique among live sessions.
    pub username: String,
    /// Room the session is viewing.
    pub current_room: String,
    /// Last time the session issued a command.
    pub last_seen: DateTime<Utc>,
    /// Join order.
    #[serde(skip)]
    seq: u64,
}

/// Trim and check a requested username.
pub fn validate_username(raw: &str) -> Result<String> {
    let username = raw.trim();
    if username.is_empty() {
        return Err(ParlorError::InvalidUsername("username is required".to_string()));
    }
    let len = username.chars().count();
    if len < MIN_USERNAME_LENGTH {
        return Err(ParlorError::InvalidUsername(format!(
            "username must be at least {MIN_USERNAME_LENGTH} characters"
        )));
    }
    if len > MAX_USERNAME_LENGTH {
        return Err(ParlorError::InvalidUsername(format!(
            "username must be at most {MAX_USERNAME_LENGTH} characters"
        )));
    }
    Ok(username.to_string())
}

/// Registry of connections and joined sessions.
#[derive(Default)]
pub struct SessionRegistry {
    /// Outbound queues of every open connection, joined or not.
    outboxes: HashMap<SessionId, Outbox>,
    /// Joined sessions.
    sessions: HashMap<SessionId, Session>,
    /// Connections whose outbox overflowed, pending removal.
    stalled: RefCell<HashSet<SessionId>>,
    /// Next join sequence number.
    next_seq: u64,
}

impl SessionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a freshly opened connection.
    pub fn attach(&mut self, session_id: impl Into<SessionId>, outbox: Outbox) {
        self.outboxes.insert(session_id.into(), outbox);
    }

    /// Whether a connection is attached.
    pub fn is_attached(&self, session_id: &str) -> bool {
        self.outboxes.contains_key(session_id)
    }

    /// Register a connection under a username in a room.
    ///
    /// Room existence is checked by the caller.
    pub fn join(&mut self, session_id: &str, username: &str, room: &str) -> Result<&Session> {
        if let Some(existing) = self.sessions.get(session_id) {
            return Err(ParlorError::AlreadyJoined(existing.username.clone()));
        }
        let username = validate_username(username)?;
        if self.sessions.values().any(|s| s.username == username) {
            return Err(ParlorError::UsernameTaken(username));
        }

        let seq = self.next_seq;
        self.next_seq += 1;
        let session = Session {
            id: session_id.to_string(),
            username,
            current_room: room.to_string(),
            last_seen: Utc::now(),
            seq,
        };
        Ok(self
            .sessions
            .entry(session_id.to_string())
            .or_insert(session))
    }

    /// Move a session to another room.
    ///
    /// Returns the previous room, or None if the session is unknown or
    /// already in `room`.
    pub fn change_room(&mut self, session_id: &str, room: &str) -> Option<String> {
        let session = self.sessions.get_mut(session_id)?;
        if session.current_room == room {
            return None;
        }
        Some(std::mem::replace(
            &mut session.current_room,
            room.to_string(),
        ))
    }

    /// Remove a connection and its session.
    pub fn leave(&mut self, session_id: &str) -> Option<Session> {
        self.outboxes.remove(session_id);
        self.stalled.get_mut().remove(session_id);
        self.sessions.remove(session_id)
    }

    /// Look up a joined session.
    pub fn lookup(&self, session_id: &str) -> Option<&Session> {
        self.sessions.get(session_id)
    }

    /// Refresh a session's last-seen time.
    pub fn touch(&mut self, session_id: &str) {
        if let Some(session) = self.sessions.get_mut(session_id) {
            session.last_seen = Utc::now();
        }
    }

    /// Resolve a reference by exact session id, then by exact username.
    pub fn resolve(&self, reference: &str) -> Option<&Session> {
        self.sessions
            .get(reference)
            .or_else(|| self.sessions.values().find(|s| s.username == reference))
    }

    /// Sessions currently in `room`, in join order.
    ///
    /// Recomputed on every call.
    pub fn members_of(&self, room: &str) -> Vec<&Session> {
        let mut members: Vec<&Session> = self
            .sessions
            .values()
            .filter(|s| s.current_room == room)
            .collect();
        members.sort_by_key(|s| s.seq);
        members
    }

    /// All joined sessions, in join order.
    pub fn sessions(&self) -> Vec<&Session> {
        let mut all: Vec<&Session> = self.sessions.values().collect();
        all.sort_by_key(|s| s.seq);
        all
    }

    /// Number of joined sessions.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Whether no session has joined.
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Deliver a push to one connection.
    ///
    /// Returns false if the connection is gone or stalled. A connection
    /// whose outbox is full is marked stalled and gets nothing further
    /// until it is removed; see [`take_stalled`](Self::take_stalled).
    pub fn deliver(&self, session_id: &str, push: Push) -> bool {
        let Some(outbox) = self.outboxes.get(session_id) else {
            return false;
        };
        if self.stalled.borrow().contains(session_id) {
            return false;
        }
        match outbox.try_send(push) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                self.stalled.borrow_mut().insert(session_id.to_string());
                false
            }
            Err(TrySendError::Closed(_)) => false,
        }
    }

    /// Drain the set of stalled connections, sorted by id.
    pub fn take_stalled(&mut self) -> Vec<SessionId> {
        let mut ids: Vec<SessionId> = self.stalled.get_mut().drain().collect();
        ids.sort();
        ids
    }

    /// Deliver a push to every session in `room`, optionally skipping one.
    ///
    /// Returns the number of sessions reached.
    pub fn broadcast(&self, room: &str, push: &Push, except: Option<&str>) -> usize {
        self.members_of(room)
            .into_iter()
            .filter(|s| Some(s.id.as_str()) != except)
            .filter(|s| self.deliver(&s.id, push.clone()))
            .count()
    }
}
