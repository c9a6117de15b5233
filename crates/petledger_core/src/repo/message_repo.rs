//! Mailbox repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Append chat lines and companion notes to a user's mailbox.
//! - Provide owner-scoped reads and newest-first pagination.
//!
//! # Invariants
//! - Every read is scoped by `user_id`; one user never sees another's mailbox.
//! - List order is `created_at DESC, id DESC`.
//! - Batch appends are all-or-nothing.
//! - This module never flips `is_locked`; unlocking belongs to the ledger.

use crate::model::message::{Message, MessageId, MessageKind, NewMessage, Sender};
use crate::model::page::{Page, PageRequest};
use crate::model::user::UserId;
use crate::repo::{bool_to_int, int_to_bool, EntityRef, RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};

pub(crate) const MESSAGE_SELECT_SQL: &str = "SELECT
    id,
    user_id,
    sender,
    message_type,
    is_locked,
    unlock_coins,
    content,
    created_at
FROM messages";

/// Repository interface for mailbox messages.
pub trait MessageRepository {
    /// Appends one message and returns the stored row.
    fn append_message(&mut self, message: &NewMessage) -> RepoResult<Message>;
    /// Appends several messages in one transaction.
    fn append_messages(&mut self, messages: &[NewMessage]) -> RepoResult<Vec<MessageId>>;
    /// Gets one message owned by `user_id`.
    fn get_message(&self, user_id: UserId, id: MessageId) -> RepoResult<Option<Message>>;
    /// Lists one page of a mailbox, optionally notes only.
    fn list_messages(
        &self,
        user_id: UserId,
        only_notes: bool,
        page: PageRequest,
    ) -> RepoResult<Page<Message>>;
}

/// SQLite-backed mailbox repository.
pub struct SqliteMessageRepository<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqliteMessageRepository<'conn> {
    pub fn new(conn: &'conn mut Connection) -> Self {
        Self { conn }
    }
}

impl MessageRepository for SqliteMessageRepository<'_> {
    fn append_message(&mut self, message: &NewMessage) -> RepoResult<Message> {
        let id = insert_message(self.conn, message)?;
        self.get_message(message.user_id, id)?
            .ok_or(RepoError::NotFound(EntityRef::Message(id)))
    }

    fn append_messages(&mut self, messages: &[NewMessage]) -> RepoResult<Vec<MessageId>> {
        for message in messages {
            message.validate()?;
        }

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let mut ids = Vec::with_capacity(messages.len());
        for message in messages {
            ids.push(insert_message(&tx, message)?);
        }
        tx.commit()?;
        Ok(ids)
    }

    fn get_message(&self, user_id: UserId, id: MessageId) -> RepoResult<Option<Message>> {
        let mut stmt = self.conn.prepare(&format!(
            "{MESSAGE_SELECT_SQL}
             WHERE id = ?1
               AND user_id = ?2;"
        ))?;
        let mut rows = stmt.query(params![id, user_id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_message_row(row)?));
        }
        Ok(None)
    }

    fn list_messages(
        &self,
        user_id: UserId,
        only_notes: bool,
        page: PageRequest,
    ) -> RepoResult<Page<Message>> {
        let type_filter = if only_notes {
            Some(message_kind_to_db(MessageKind::Note))
        } else {
            None
        };

        let total: i64 = self.conn.query_row(
            "SELECT COUNT(*)
             FROM messages
             WHERE user_id = ?1
               AND (?2 IS NULL OR message_type = ?2);",
            params![user_id, type_filter],
            |row| row.get(0),
        )?;

        let mut stmt = self.conn.prepare(&format!(
            "{MESSAGE_SELECT_SQL}
             WHERE user_id = ?1
               AND (?2 IS NULL OR message_type = ?2)
             ORDER BY created_at DESC, id DESC
             LIMIT ?3 OFFSET ?4;"
        ))?;
        let mut rows = stmt.query(params![user_id, type_filter, page.limit(), page.offset()])?;
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(parse_message_row(row)?);
        }

        Ok(Page {
            total: u64::try_from(total).unwrap_or(0),
            page: page.page,
            page_size: page.page_size,
            items,
        })
    }
}

fn insert_message(conn: &Connection, message: &NewMessage) -> RepoResult<MessageId> {
    message.validate()?;

    let user_exists = conn
        .query_row(
            "SELECT 1 FROM users WHERE id = ?1;",
            [message.user_id],
            |_| Ok(()),
        )
        .optional()?;
    if user_exists.is_none() {
        return Err(RepoError::NotFound(EntityRef::User(message.user_id)));
    }

    conn.execute(
        "INSERT INTO messages (
            user_id,
            sender,
            message_type,
            is_locked,
            unlock_coins,
            content
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
        params![
            message.user_id,
            sender_to_db(message.sender),
            message_kind_to_db(message.kind),
            bool_to_int(message.is_locked),
            message.unlock_coins,
            message.content.as_str(),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub(crate) fn parse_message_row(row: &Row<'_>) -> RepoResult<Message> {
    let sender_value: i64 = row.get("sender")?;
    let sender = parse_sender(sender_value).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid sender `{sender_value}` in messages.sender"))
    })?;

    let type_value: i64 = row.get("message_type")?;
    let kind = parse_message_kind(type_value).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid message type `{type_value}` in messages.message_type"
        ))
    })?;

    Ok(Message {
        id: row.get("id")?,
        user_id: row.get("user_id")?,
        sender,
        kind,
        is_locked: int_to_bool("messages.is_locked", row.get("is_locked")?)?,
        unlock_coins: row.get("unlock_coins")?,
        content: row.get("content")?,
        created_at: row.get("created_at")?,
    })
}

fn sender_to_db(sender: Sender) -> i64 {
    match sender {
        Sender::User => 0,
        Sender::Companion => 1,
    }
}

fn parse_sender(value: i64) -> Option<Sender> {
    match value {
        0 => Some(Sender::User),
        1 => Some(Sender::Companion),
        _ => None,
    }
}

pub(crate) fn message_kind_to_db(kind: MessageKind) -> i64 {
    match kind {
        MessageKind::Chat => 0,
        MessageKind::Note => 1,
    }
}

fn parse_message_kind(value: i64) -> Option<MessageKind> {
    match value {
        0 => Some(MessageKind::Chat),
        1 => Some(MessageKind::Note),
        _ => None,
    }
}
