//! Append-only proof that a user paid to reveal a note.

use super::message::MessageId;
use super::user::UserId;
use super::Coins;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Store-assigned unlock record identifier.
pub type UnlockRecordId = i64;

/// Immutable unlock fact. At most one exists per `(user_id, message_id)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnlockRecord {
    pub id: UnlockRecordId,
    /// Externally quotable payment receipt.
    pub receipt: Uuid,
    pub user_id: UserId,
    pub message_id: MessageId,
    pub coins_spent: Coins,
    /// Unix epoch milliseconds.
    pub unlocked_at: i64,
}
