//! Private message routing.

use super::message::{Message, MessageContent, MessageDraft};
use super::session::{Session, SessionRegistry};
use super::store::RoomStore;
use crate::{ParlorError, Result};

/// Key of the conversation between two sessions.
///
/// Both ids are sorted so either side addresses the same log.
pub fn conversation_key(a: &str, b: &str) -> String {
    if a <= b {
        format!("{a}_{b}")
    } else {
        format!("{b}_{a}")
    }
}

/// Resolve the recipient and store a private message.
///
/// `recipient_ref` is tried as a session id first, then as a username,
/// against live sessions only. The stored message carries the resolved
/// recipient's session id.
pub fn send(
    registry: &SessionRegistry,
    store: &mut RoomStore,
    sender: &Session,
    recipient_ref: &str,
    content: MessageContent,
) -> Result<Message> {
    let recipient = registry
        .resolve(recipient_ref)
        .ok_or_else(|| ParlorError::RecipientNotFound(recipient_ref.to_string()))?;

    let key = conversation_key(&sender.id, &recipient.id);
    let draft = MessageDraft::new(sender.username.clone(), sender.id.clone(), content);
    Ok(store.append_private(&key, &recipient.id, draft))
}
