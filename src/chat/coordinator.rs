//! Chat coordinator.
//!
//! The coordinator owns every piece of chat state and applies one command
//! at a time. Each handler runs to completion synchronously (look up,
//! mutate, then queue pushes on the affected connections), so no handler
//! ever observes another one half-done.

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info, warn};

use super::message::{Message, MessageContent, MessageDraft};
use super::notify::NotificationDispatcher;
use super::presence::{self, TypingTracker};
use super::private;
use super::protocol::{Command, Push};
use super::reactions;
use super::session::{Outbox, Session, SessionRegistry};
use super::store::RoomStore;
use super::unread::UnreadCounters;
use crate::config::ChatConfig;
use crate::{ParlorError, Result};

/// Owned chat state plus the command handlers that mutate it.
pub struct Coordinator {
    default_room: String,
    default_page_size: usize,
    max_page_size: usize,
    typing_timeout: Option<Duration>,
    sessions: SessionRegistry,
    store: RoomStore,
    typing: TypingTracker,
    unread: UnreadCounters,
    notifier: NotificationDispatcher,
}

impl Coordinator {
    /// Create a coordinator for the configured rooms.
    pub fn new(config: &ChatConfig) -> Self {
        Self {
            default_room: config.default_room.clone(),
            default_page_size: config.default_page_size.max(1),
            max_page_size: config.max_page_size.max(1),
            typing_timeout: config
                .typing_timeout()
                .map(|secs| Duration::seconds(secs as i64)),
            sessions: SessionRegistry::new(),
            store: RoomStore::new(&config.rooms, config.history_limit),
            typing: TypingTracker::new(),
            unread: UnreadCounters::new(&config.rooms),
            notifier: NotificationDispatcher::new(config.preview_length),
        }
    }

    /// Attach a new connection.
    pub fn connect(&mut self, session_id: &str, outbox: Outbox) {
        self.sessions.attach(session_id, outbox);
        debug!(session_id, "Connection attached");
    }

    /// Apply one command from a connection.
    ///
    /// Rejections are reported to that connection only.
    pub fn handle(&mut self, session_id: &str, command: Command) {
        let name = command.name();
        self.sessions.touch(session_id);

        if let Err(err) = self.dispatch(session_id, command) {
            if err.is_silent() {
                debug!(session_id, command = name, error = %err, "Command ignored");
            } else {
                debug!(session_id, command = name, error = %err, "Command rejected");
                self.sessions.deliver(session_id, Push::from(&err));
            }
        }
        self.drop_stalled();
    }

    fn dispatch(&mut self, session_id: &str, command: Command) -> Result<()> {
        match command {
            Command::Join { username, room } => self.join(session_id, &username, room.as_deref()),
            Command::Ping => {
                self.sessions.deliver(session_id, Push::Pong);
                Ok(())
            }
            Command::ChangeRoom { room } => {
                let session = self.joined(session_id)?;
                self.change_room(&session, &room)
            }
            Command::SendMessage {
                body,
                message_type,
                file_payload,
            } => {
                let session = self.joined(session_id)?;
                let content = MessageContent::from_parts(message_type, body, file_payload)?;
                self.send_message(&session, content)
            }
            Command::SetTyping { is_typing } => {
                let session = self.joined(session_id)?;
                self.set_typing(&session, is_typing);
                Ok(())
            }
            Command::PrivateMessage {
                to,
                body,
                message_type,
                file_payload,
            } => {
                let session = self.joined(session_id)?;
                let content = MessageContent::from_parts(message_type, body, file_payload)?;
                self.private_message(&session, &to, content)
            }
            Command::MarkRead { message_id, room } => {
                let session = self.joined(session_id)?;
                self.mark_read(&session, &message_id, room.as_deref())
            }
            Command::AddReaction {
                message_id,
                emoji,
                room,
            } => {
                let session = self.joined(session_id)?;
                self.react(&session, &message_id, &emoji, room.as_deref(), true)
            }
            Command::RemoveReaction {
                message_id,
                emoji,
                room,
            } => {
                let session = self.joined(session_id)?;
                self.react(&session, &message_id, &emoji, room.as_deref(), false)
            }
            Command::GetMessagesPage {
                page,
                page_size,
                room,
            } => {
                let session = self.joined(session_id)?;
                self.messages_page(&session, page, page_size, room.as_deref())
            }
        }
    }

    fn joined(&self, session_id: &str) -> Result<Session> {
        self.sessions
            .lookup(session_id)
            .cloned()
            .ok_or(ParlorError::NotJoined)
    }

    fn ensure_room(&self, room: &str) -> Result<()> {
        if self.store.has_room(room) {
            Ok(())
        } else {
            Err(ParlorError::UnknownRoom(room.to_string()))
        }
    }

    fn join(&mut self, session_id: &str, username: &str, room: Option<&str>) -> Result<()> {
        let room = room.unwrap_or(&self.default_room).to_string();
        self.ensure_room(&room)?;

        let session = self.sessions.join(session_id, username, &room)?.clone();
        self.unread.register(session_id);
        info!(session_id, username = %session.username, room = %room, "User joined");

        let history = self.store.history(&room).unwrap_or_default();
        self.sessions.deliver(
            session_id,
            Push::RoomMessages {
                room: room.clone(),
                messages: history,
            },
        );
        self.sessions.deliver(
            session_id,
            Push::RoomList {
                rooms: self.store.rooms().to_vec(),
            },
        );
        self.sessions.broadcast(
            &room,
            &Push::UserJoined {
                username: session.username.clone(),
                session_id: session.id.clone(),
                room: room.clone(),
            },
            Some(session_id),
        );
        self.broadcast_user_list(&room);
        Ok(())
    }

    fn change_room(&mut self, session: &Session, room: &str) -> Result<()> {
        self.ensure_room(room)?;
        let Some(previous) = self.sessions.change_room(&session.id, room) else {
            return Ok(());
        };

        if self.typing.clear(&previous, &session.id) {
            self.broadcast_typing(&previous, None);
        }
        self.sessions.broadcast(
            &previous,
            &Push::UserLeftRoom {
                username: session.username.clone(),
                session_id: session.id.clone(),
                room: previous.clone(),
            },
            None,
        );
        self.broadcast_user_list(&previous);

        self.unread.on_room_enter(room, &session.id);
        info!(
            session_id = %session.id,
            username = %session.username,
            from = %previous,
            to = %room,
            "User changed room"
        );

        self.sessions.deliver(
            &session.id,
            Push::RoomMessages {
                room: room.to_string(),
                messages: self.store.history(room).unwrap_or_default(),
            },
        );
        self.sessions.broadcast(
            room,
            &Push::UserJoined {
                username: session.username.clone(),
                session_id: session.id.clone(),
                room: room.to_string(),
            },
            Some(&session.id),
        );
        self.broadcast_user_list(room);
        self.sessions.deliver(
            &session.id,
            Push::RoomJoined {
                room: room.to_string(),
            },
        );
        self.sessions.deliver(
            &session.id,
            Push::UnreadCounts {
                room: room.to_string(),
                counts: self.unread.room_counts(room),
            },
        );
        Ok(())
    }

    fn send_message(&mut self, session: &Session, content: MessageContent) -> Result<()> {
        let room = session.current_room.clone();
        let message = self.store.append(
            &room,
            MessageDraft::new(&session.username, &session.id, content),
        )?;
        debug!(
            session_id = %session.id,
            room = %room,
            message_id = %message.id,
            kind = %message.content.kind(),
            "Message stored"
        );

        let changed = self
            .unread
            .on_message_delivered(&room, &session.id, self.sessions.sessions());

        self.sessions.broadcast(
            &room,
            &Push::ReceiveMessage {
                message: message.clone(),
            },
            None,
        );
        self.sessions.broadcast(
            &room,
            &Push::UnreadCounts {
                room: room.clone(),
                counts: self.unread.room_counts(&room),
            },
            None,
        );

        for (target, count) in changed {
            let context =
                self.notifier
                    .room_context(&room, &session.username, message.content.body(), count);
            self.notifier
                .notify(&self.sessions, &target, &session.id, context);
        }
        Ok(())
    }

    fn set_typing(&mut self, session: &Session, is_typing: bool) {
        let room = &session.current_room;
        self.typing
            .set(room, &session.id, &session.username, is_typing, Utc::now());
        self.broadcast_typing(room, Some(&session.id));
    }

    fn private_message(&mut self, session: &Session, to: &str, content: MessageContent) -> Result<()> {
        let message = private::send(&self.sessions, &mut self.store, session, to, content)?;
        let Some(recipient_id) = message.recipient_id.clone() else {
            return Ok(());
        };
        debug!(
            session_id = %session.id,
            recipient_id = %recipient_id,
            message_id = %message.id,
            "Private message routed"
        );

        let context = self
            .notifier
            .private_context(&session.username, message.content.body());
        let push = Push::PrivateMessage { message };
        self.sessions.deliver(&recipient_id, push.clone());
        if recipient_id != session.id {
            self.sessions.deliver(&session.id, push);
        }
        self.notifier
            .notify(&self.sessions, &recipient_id, &session.id, context);
        Ok(())
    }

    fn mark_read(&mut self, session: &Session, message_id: &str, room: Option<&str>) -> Result<()> {
        let room = room.unwrap_or(&session.current_room);
        let read_by =
            reactions::mark_read(&mut self.store, room, message_id, &session.id, Utc::now())?;
        self.sessions.broadcast(
            room,
            &Push::MessageRead {
                message_id: message_id.to_string(),
                read_by,
            },
            None,
        );
        Ok(())
    }

    fn react(
        &mut self,
        session: &Session,
        message_id: &str,
        emoji: &str,
        room: Option<&str>,
        add: bool,
    ) -> Result<()> {
        let room = room.unwrap_or(&session.current_room);
        let reactions = if add {
            reactions::add_reaction(&mut self.store, room, message_id, &session.username, emoji)?
        } else {
            reactions::remove_reaction(&mut self.store, room, message_id, &session.username, emoji)?
        };
        self.sessions.broadcast(
            room,
            &Push::MessageReaction {
                message_id: message_id.to_string(),
                reactions,
            },
            None,
        );
        Ok(())
    }

    fn messages_page(
        &self,
        session: &Session,
        page: usize,
        page_size: Option<usize>,
        room: Option<&str>,
    ) -> Result<()> {
        let room = room.unwrap_or(&session.current_room);
        let size = page_size
            .unwrap_or(self.default_page_size)
            .min(self.max_page_size)
            .max(1);
        let page = self
            .store
            .page(room, page, size)
            .ok_or_else(|| ParlorError::UnknownRoom(room.to_string()))?;
        self.sessions.deliver(
            &session.id,
            Push::MessagesPage {
                room: room.to_string(),
                messages: page.messages,
                page: page.page,
                has_more: page.has_more,
            },
        );
        Ok(())
    }

    /// Tear down a connection.
    ///
    /// The session's last room learns about the departure and gets a fresh
    /// member list. Any typing flag it held is cleared and its private
    /// conversations are dropped.
    pub fn disconnect(&mut self, session_id: &str) {
        self.remove_session(session_id);
        self.drop_stalled();
    }

    /// Disconnect every session whose outbox overflowed.
    ///
    /// Removing one session may stall another, so this repeats until no
    /// stalled session is left.
    fn drop_stalled(&mut self) {
        loop {
            let stalled = self.sessions.take_stalled();
            if stalled.is_empty() {
                break;
            }
            for session_id in stalled {
                warn!(session_id = %session_id, "Outbox full, dropping connection");
                self.remove_session(&session_id);
            }
        }
    }

    fn remove_session(&mut self, session_id: &str) {
        let Some(session) = self.sessions.leave(session_id) else {
            debug!(session_id, "Connection closed before joining");
            return;
        };
        self.unread.forget(session_id);
        let dropped = self.store.forget_conversations(session_id);
        if dropped > 0 {
            debug!(session_id, conversations = dropped, "Dropped private conversations");
        }
        let typing_rooms = self.typing.clear_session(session_id);

        let room = &session.current_room;
        self.sessions.broadcast(
            room,
            &Push::UserLeft {
                username: session.username.clone(),
                session_id: session.id.clone(),
                room: room.clone(),
            },
            None,
        );
        for typing_room in &typing_rooms {
            self.broadcast_typing(typing_room, None);
        }
        self.broadcast_user_list(room);
        info!(session_id, username = %session.username, room = %room, "User left");
    }

    /// Drop typing flags older than the configured timeout.
    ///
    /// Does nothing when no timeout is configured.
    pub fn expire_typing(&mut self, now: DateTime<Utc>) {
        let Some(timeout) = self.typing_timeout else {
            return;
        };
        for room in self.typing.expire(now, timeout) {
            debug!(room = %room, "Expired stale typing flags");
            self.broadcast_typing(&room, None);
        }
        self.drop_stalled();
    }

    fn broadcast_typing(&self, room: &str, except: Option<&str>) {
        let push = Push::TypingUsers {
            room: room.to_string(),
            usernames: self.typing.typing_users(room),
        };
        self.sessions.broadcast(room, &push, except);
    }

    fn broadcast_user_list(&self, room: &str) {
        let push = Push::UserList {
            room: room.to_string(),
            users: presence::members_of(&self.sessions, room),
        };
        self.sessions.broadcast(room, &push, None);
    }

    /// Room names in configured order.
    pub fn rooms(&self) -> Vec<String> {
        self.store.rooms().to_vec()
    }

    /// Full log of a room.
    pub fn history(&self, room: &str) -> Option<Vec<Message>> {
        self.store.history(room)
    }

    /// Members of a room, or None for an unknown room.
    pub fn members(&self, room: &str) -> Option<Vec<Session>> {
        self.store
            .has_room(room)
            .then(|| presence::members_of(&self.sessions, room))
    }

    /// Search a room's log.
    pub fn search(&self, room: &str, query: &str) -> Option<Vec<Message>> {
        self.store.search(room, query)
    }

    /// Number of joined sessions.
    pub fn connected_users(&self) -> usize {
        self.sessions.len()
    }

    /// Look up a joined session.
    pub fn session(&self, session_id: &str) -> Option<&Session> {
        self.sessions.lookup(session_id)
    }

    /// A session's unread count for a room.
    pub fn unread(&self, room: &str, session_id: &str) -> u32 {
        self.unread.get(room, session_id)
    }

    /// Usernames typing in a room.
    pub fn typing_users(&self, room: &str) -> Vec<String> {
        self.typing.typing_users(room)
    }

    /// Private conversation between two sessions.
    pub fn conversation(&self, a: &str, b: &str) -> Vec<Message> {
        self.store.conversation(&private::conversation_key(a, b))
    }
}
