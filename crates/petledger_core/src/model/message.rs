//! Mailbox message model covering chat lines and lockable notes.
//!
//! # Invariants
//! - A `Chat` message is never locked and has `unlock_coins == 0`.
//! - A `Note` may be locked; once unlocked it never returns to locked.
//! - `unlock_coins` is non-negative.

use super::user::UserId;
use super::{ensure_non_negative, Coins, ValidationError};
use serde::{Deserialize, Serialize};

/// Store-assigned message identifier.
pub type MessageId = i64;

/// Who authored a mailbox message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sender {
    /// The account owner.
    User,
    /// The pet companion.
    Companion,
}

/// Mailbox message category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    /// Plain conversational line, always readable.
    Chat,
    /// Priced note that may be hidden until paid for.
    Note,
}

/// Persisted mailbox message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    /// Mailbox owner.
    pub user_id: UserId,
    pub sender: Sender,
    pub kind: MessageKind,
    pub is_locked: bool,
    pub unlock_coins: Coins,
    pub content: String,
    /// Unix epoch milliseconds.
    pub created_at: i64,
}

/// Input for appending a message to a user's mailbox.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMessage {
    pub user_id: UserId,
    pub sender: Sender,
    pub kind: MessageKind,
    pub is_locked: bool,
    pub unlock_coins: Coins,
    pub content: String,
}

impl NewMessage {
    /// Builds a chat line.
    pub fn chat(user_id: UserId, sender: Sender, content: impl Into<String>) -> Self {
        Self {
            user_id,
            sender,
            kind: MessageKind::Chat,
            is_locked: false,
            unlock_coins: 0,
            content: content.into(),
        }
    }

    /// Builds a companion note. Notes with a positive price start locked.
    pub fn note(user_id: UserId, unlock_coins: Coins, content: impl Into<String>) -> Self {
        Self {
            user_id,
            sender: Sender::Companion,
            kind: MessageKind::Note,
            is_locked: unlock_coins > 0,
            unlock_coins,
            content: content.into(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        ensure_non_negative("unlock_coins", self.unlock_coins)?;
        if self.kind == MessageKind::Chat && (self.is_locked || self.unlock_coins != 0) {
            return Err(ValidationError::ChatCannotBeLocked);
        }
        Ok(())
    }
}

/// Read projection handed to callers; locked note bodies are withheld.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageView {
    pub id: MessageId,
    pub sender: Sender,
    pub kind: MessageKind,
    pub is_locked: bool,
    pub unlock_coins: Coins,
    /// `None` while the note is locked.
    pub content: Option<String>,
    pub created_at: i64,
}

impl From<Message> for MessageView {
    fn from(message: Message) -> Self {
        let content = if message.is_locked {
            None
        } else {
            Some(message.content)
        };
        Self {
            id: message.id,
            sender: message.sender,
            kind: message.kind,
            is_locked: message.is_locked,
            unlock_coins: message.unlock_coins,
            content,
            created_at: message.created_at,
        }
    }
}
