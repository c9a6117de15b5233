//! Mailbox use-case service.
//!
//! # Responsibility
//! - Deliver companion notes and chat lines into a user's mailbox.
//! - Serve owner-scoped list/detail views with locked content withheld.
//!
//! # Invariants
//! - Views of locked notes never carry the note body.
//! - Pagination input is normalized before reaching storage.

use crate::model::message::{MessageId, MessageView, NewMessage, Sender};
use crate::model::page::{Page, PageRequest};
use crate::model::user::UserId;
use crate::model::{Coins, ValidationError};
use crate::repo::message_repo::MessageRepository;
use crate::repo::{EntityRef, RepoError};
use log::info;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Price of the paid note in the standard daily set.
pub const DAILY_PAID_NOTE_COINS: Coins = 20;

/// Service error for mailbox use-cases.
#[derive(Debug)]
pub enum MessageServiceError {
    UserNotFound(UserId),
    MessageNotFound(MessageId),
    InvalidInput(ValidationError),
    Repo(RepoError),
}

impl Display for MessageServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UserNotFound(id) => write!(f, "user not found: {id}"),
            Self::MessageNotFound(id) => write!(f, "message not found: {id}"),
            Self::InvalidInput(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for MessageServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidInput(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for MessageServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(EntityRef::User(id)) => Self::UserNotFound(id),
            RepoError::NotFound(EntityRef::Message(id)) => Self::MessageNotFound(id),
            RepoError::Validation(err) => Self::InvalidInput(err),
            other => Self::Repo(other),
        }
    }
}

/// One note of a scheduled batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyNote {
    pub unlock_coins: Coins,
    pub content: String,
}

impl DailyNote {
    /// Builds the standard daily set: the first three notes are free and the
    /// fourth costs [`DAILY_PAID_NOTE_COINS`].
    pub fn standard_set(contents: [String; 4]) -> Vec<DailyNote> {
        contents
            .into_iter()
            .enumerate()
            .map(|(index, content)| DailyNote {
                unlock_coins: if index == 3 { DAILY_PAID_NOTE_COINS } else { 0 },
                content,
            })
            .collect()
    }
}

/// Mailbox service facade over repository implementations.
pub struct MessageService<R: MessageRepository> {
    repo: R,
}

impl<R: MessageRepository> MessageService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Lists one page of the user's mailbox, newest first.
    pub fn list_messages(
        &self,
        user_id: UserId,
        only_notes: bool,
        page: i64,
        page_size: i64,
    ) -> Result<Page<MessageView>, MessageServiceError> {
        let request = PageRequest::normalize(page, page_size);
        let page = self.repo.list_messages(user_id, only_notes, request)?;
        Ok(Page {
            total: page.total,
            page: page.page,
            page_size: page.page_size,
            items: page.items.into_iter().map(MessageView::from).collect(),
        })
    }

    /// Gets one message of the user's mailbox.
    pub fn get_message(
        &self,
        user_id: UserId,
        message_id: MessageId,
    ) -> Result<MessageView, MessageServiceError> {
        self.repo
            .get_message(user_id, message_id)?
            .map(MessageView::from)
            .ok_or(MessageServiceError::MessageNotFound(message_id))
    }

    /// Delivers one companion note. Notes priced above zero start locked.
    pub fn issue_note(
        &mut self,
        user_id: UserId,
        unlock_coins: Coins,
        content: impl Into<String>,
    ) -> Result<MessageView, MessageServiceError> {
        let note = NewMessage::note(user_id, unlock_coins, content);
        let stored = self.repo.append_message(&note)?;
        info!(
            "event=note_issue module=message status=ok user_id={} message_id={} unlock_coins={} locked={}",
            user_id, stored.id, stored.unlock_coins, stored.is_locked
        );
        Ok(MessageView::from(stored))
    }

    /// Delivers a batch of notes atomically.
    pub fn issue_daily_notes(
        &mut self,
        user_id: UserId,
        notes: &[DailyNote],
    ) -> Result<Vec<MessageId>, MessageServiceError> {
        let batch: Vec<NewMessage> = notes
            .iter()
            .map(|note| NewMessage::note(user_id, note.unlock_coins, note.content.clone()))
            .collect();
        let ids = self.repo.append_messages(&batch)?;
        info!(
            "event=note_issue_batch module=message status=ok user_id={} count={}",
            user_id,
            ids.len()
        );
        Ok(ids)
    }

    /// Stores one chat line in the user's mailbox.
    pub fn append_chat(
        &mut self,
        user_id: UserId,
        sender: Sender,
        content: impl Into<String>,
    ) -> Result<MessageView, MessageServiceError> {
        let chat = NewMessage::chat(user_id, sender, content);
        let stored = self.repo.append_message(&chat)?;
        Ok(MessageView::from(stored))
    }
}

#[cfg(test)]
mod tests {
    use super::{DailyNote, DAILY_PAID_NOTE_COINS};

    #[test]
    fn standard_set_prices_only_the_last_note() {
        let set = DailyNote::standard_set([
            "a".to_string(),
            "b".to_string(),
            "c".to_string(),
            "d".to_string(),
        ]);
        let prices: Vec<_> = set.iter().map(|note| note.unlock_coins).collect();
        assert_eq!(prices, vec![0, 0, 0, DAILY_PAID_NOTE_COINS]);
    }
}
