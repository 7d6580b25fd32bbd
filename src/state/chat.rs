//! Chat log and online-user roster.
//!
//! Plain state for the chat panel: an append-only message list and the set
//! of participants currently present on the chat channel. The chat
//! coordinator owns every mutation; senders append their own messages only
//! after the transport confirms the send.

use uuid::Uuid;

use crate::event::ChatMessagePayload;

#[cfg(test)]
#[path = "chat_test.rs"]
mod chat_test;

/// A participant currently present on the chat channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OnlineUser {
    pub id: Uuid,
    pub name: String,
}

/// Messages plus roster, in arrival order.
#[derive(Debug, Clone, Default)]
pub struct ChatLog {
    messages: Vec<ChatMessagePayload>,
    online: Vec<OnlineUser>,
}

impl ChatLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message — either a confirmed local send or a peer broadcast.
    pub fn push(&mut self, message: ChatMessagePayload) {
        self.messages.push(message);
    }

    /// Seed the roster from the presence state at subscribe time.
    pub fn set_roster(&mut self, users: Vec<OnlineUser>) {
        self.online = users;
    }

    /// A participant joined the channel. Duplicate joins for the same id
    /// refresh the name rather than duplicating the entry.
    pub fn apply_join(&mut self, user: OnlineUser) {
        if let Some(existing) = self.online.iter_mut().find(|u| u.id == user.id) {
            existing.name = user.name;
        } else {
            self.online.push(user);
        }
    }

    /// A participant left the channel.
    pub fn apply_leave(&mut self, id: Uuid) {
        self.online.retain(|u| u.id != id);
    }

    #[must_use]
    pub fn messages(&self) -> &[ChatMessagePayload] {
        &self.messages
    }

    #[must_use]
    pub fn online(&self) -> &[OnlineUser] {
        &self.online
    }
}
