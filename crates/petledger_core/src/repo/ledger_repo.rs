//! Coin ledger repository: every balance-mutating transaction lives here.
//!
//! # Responsibility
//! - Debit balances for item use and note unlocks.
//! - Credit balances for grants and rewards.
//! - Append unlock records and expose unlock history.
//!
//! # Invariants
//! - Every mutating method runs in exactly one `BEGIN IMMEDIATE` transaction.
//!   SQLite has no row-level `SELECT ... FOR UPDATE`; taking the database
//!   write lock before the first read serializes concurrent read-check-write
//!   sequences, which covers both per-user and per-note ordering.
//! - Costs are read inside the same transaction that debits them.
//! - On any error the transaction is dropped uncommitted and rolls back, so
//!   no partial debit, flag flip, or record is ever visible.
//! - The debit statement re-checks `coins >= cost`; combined with the schema
//!   `CHECK (coins >= 0)` a negative balance is unrepresentable.
//! - An unlock record is inserted at most once per `(user_id, message_id)`.

use crate::model::item::ItemId;
use crate::model::message::{Message, MessageId, MessageKind};
use crate::model::page::{Page, PageRequest};
use crate::model::unlock::UnlockRecord;
use crate::model::user::UserId;
use crate::model::{Coins, ValidationError};
use crate::repo::message_repo::{message_kind_to_db, parse_message_row, MESSAGE_SELECT_SQL};
use crate::repo::{EntityRef, RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};
use uuid::Uuid;

const UNLOCK_RECORD_SELECT_SQL: &str = "SELECT
    id,
    receipt,
    user_id,
    message_id,
    coins_spent,
    unlocked_at
FROM user_unlock_records";

/// Result of a committed item purchase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemSpend {
    pub item_id: ItemId,
    /// Cost read inside the debiting transaction.
    pub cost: Coins,
    /// Balance after commit.
    pub remaining: Coins,
}

/// Result of an unlock call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnlockOutcome {
    /// Balance after commit (unchanged when the note was already unlocked).
    pub remaining: Coins,
    /// The note, now unlocked, with full content.
    pub message: Message,
    /// Record appended by this call; `None` when nothing was charged.
    pub record: Option<UnlockRecord>,
}

/// Repository interface for balance reads and mutations.
pub trait LedgerRepository {
    /// Reads the current balance without locking.
    fn balance(&self, user_id: UserId) -> RepoResult<Coins>;
    /// Debits the item's cost from the user's balance.
    fn use_item(&mut self, user_id: UserId, item_id: ItemId) -> RepoResult<ItemSpend>;
    /// Unlocks one of the user's notes, charging only on the first success.
    fn unlock_message(&mut self, user_id: UserId, message_id: MessageId)
        -> RepoResult<UnlockOutcome>;
    /// Adds `amount` coins to the user's balance and returns the new balance.
    fn credit(&mut self, user_id: UserId, amount: Coins) -> RepoResult<Coins>;
    /// Gets the unlock record for one `(user, note)` pair.
    fn find_unlock_record(
        &self,
        user_id: UserId,
        message_id: MessageId,
    ) -> RepoResult<Option<UnlockRecord>>;
    /// Lists the user's unlock records, newest first. Unknown users are
    /// `NotFound`, not an empty page.
    fn unlock_history(&self, user_id: UserId, page: PageRequest)
        -> RepoResult<Page<UnlockRecord>>;
}

/// SQLite-backed coin ledger.
pub struct SqliteLedgerRepository<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqliteLedgerRepository<'conn> {
    pub fn new(conn: &'conn mut Connection) -> Self {
        Self { conn }
    }
}

impl LedgerRepository for SqliteLedgerRepository<'_> {
    fn balance(&self, user_id: UserId) -> RepoResult<Coins> {
        read_balance(self.conn, user_id)?.ok_or(RepoError::NotFound(EntityRef::User(user_id)))
    }

    fn use_item(&mut self, user_id: UserId, item_id: ItemId) -> RepoResult<ItemSpend> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let cost: Coins = tx
            .query_row(
                "SELECT coin_cost FROM items WHERE id = ?1;",
                [item_id],
                |row| row.get(0),
            )
            .optional()?
            .ok_or(RepoError::NotFound(EntityRef::Item(item_id)))?;

        let balance =
            read_balance(&tx, user_id)?.ok_or(RepoError::NotFound(EntityRef::User(user_id)))?;
        let remaining = debit(&tx, user_id, balance, cost)?;

        tx.commit()?;
        Ok(ItemSpend {
            item_id,
            cost,
            remaining,
        })
    }

    fn unlock_message(
        &mut self,
        user_id: UserId,
        message_id: MessageId,
    ) -> RepoResult<UnlockOutcome> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let mut message = tx
            .query_row(
                &format!(
                    "{MESSAGE_SELECT_SQL}
                     WHERE id = ?1
                       AND user_id = ?2
                       AND message_type = ?3;"
                ),
                params![message_id, user_id, message_kind_to_db(MessageKind::Note)],
                |row| Ok(parse_message_row(row)),
            )
            .optional()?
            .transpose()?
            .ok_or(RepoError::NotFound(EntityRef::Message(message_id)))?;

        let balance =
            read_balance(&tx, user_id)?.ok_or(RepoError::NotFound(EntityRef::User(user_id)))?;

        if !message.is_locked {
            tx.commit()?;
            return Ok(UnlockOutcome {
                remaining: balance,
                message,
                record: None,
            });
        }

        let cost = message.unlock_coins;
        let remaining = debit(&tx, user_id, balance, cost)?;

        let flipped = tx.execute(
            "UPDATE messages
             SET is_locked = 0
             WHERE id = ?1
               AND is_locked = 1;",
            [message_id],
        )?;
        if flipped != 1 {
            return Err(RepoError::InvalidData(format!(
                "message {message_id} changed lock state inside unlock transaction"
            )));
        }

        let receipt = Uuid::new_v4();
        tx.execute(
            "INSERT INTO user_unlock_records (receipt, user_id, message_id, coins_spent)
             VALUES (?1, ?2, ?3, ?4);",
            params![receipt.to_string(), user_id, message_id, cost],
        )?;
        let record_id = tx.last_insert_rowid();
        let record = tx.query_row(
            &format!("{UNLOCK_RECORD_SELECT_SQL} WHERE id = ?1;"),
            [record_id],
            parse_unlock_record_row,
        )??;

        tx.commit()?;
        message.is_locked = false;
        Ok(UnlockOutcome {
            remaining,
            message,
            record: Some(record),
        })
    }

    fn credit(&mut self, user_id: UserId, amount: Coins) -> RepoResult<Coins> {
        if amount < 0 {
            return Err(ValidationError::NegativeCoins {
                field: "amount",
                value: amount,
            }
            .into());
        }

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let balance =
            read_balance(&tx, user_id)?.ok_or(RepoError::NotFound(EntityRef::User(user_id)))?;
        let updated = balance
            .checked_add(amount)
            .ok_or(ValidationError::BalanceOverflow { balance, amount })?;

        tx.execute(
            "UPDATE users
             SET
                coins = ?2,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1;",
            params![user_id, updated],
        )?;
        tx.commit()?;
        Ok(updated)
    }

    fn find_unlock_record(
        &self,
        user_id: UserId,
        message_id: MessageId,
    ) -> RepoResult<Option<UnlockRecord>> {
        let record = self
            .conn
            .query_row(
                &format!("{UNLOCK_RECORD_SELECT_SQL} WHERE user_id = ?1 AND message_id = ?2;"),
                params![user_id, message_id],
                parse_unlock_record_row,
            )
            .optional()?;
        record.transpose()
    }

    fn unlock_history(
        &self,
        user_id: UserId,
        page: PageRequest,
    ) -> RepoResult<Page<UnlockRecord>> {
        if read_balance(self.conn, user_id)?.is_none() {
            return Err(RepoError::NotFound(EntityRef::User(user_id)));
        }

        let total: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM user_unlock_records WHERE user_id = ?1;",
            [user_id],
            |row| row.get(0),
        )?;

        let mut stmt = self.conn.prepare(&format!(
            "{UNLOCK_RECORD_SELECT_SQL}
             WHERE user_id = ?1
             ORDER BY unlocked_at DESC, id DESC
             LIMIT ?2 OFFSET ?3;"
        ))?;
        let mut rows = stmt.query(params![user_id, page.limit(), page.offset()])?;
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(parse_unlock_record_row(row)??);
        }

        Ok(Page {
            total: u64::try_from(total).unwrap_or(0),
            page: page.page,
            page_size: page.page_size,
            items,
        })
    }
}

fn read_balance(conn: &Connection, user_id: UserId) -> RepoResult<Option<Coins>> {
    let balance = conn
        .query_row("SELECT coins FROM users WHERE id = ?1;", [user_id], |row| {
            row.get(0)
        })
        .optional()?;
    Ok(balance)
}

/// Debits `cost` from a balance already read inside the same transaction.
fn debit(conn: &Connection, user_id: UserId, balance: Coins, cost: Coins) -> RepoResult<Coins> {
    if balance < cost {
        return Err(RepoError::InsufficientCoins {
            balance,
            required: cost,
        });
    }

    let changed = conn.execute(
        "UPDATE users
         SET
            coins = coins - ?2,
            updated_at = (strftime('%s', 'now') * 1000)
         WHERE id = ?1
           AND coins >= ?2;",
        params![user_id, cost],
    )?;
    if changed != 1 {
        return Err(RepoError::InsufficientCoins {
            balance,
            required: cost,
        });
    }

    Ok(balance - cost)
}

// Returns a nested result so receipt parsing errors stay semantic instead of
// being forced through `rusqlite::Error`.
fn parse_unlock_record_row(row: &Row<'_>) -> rusqlite::Result<RepoResult<UnlockRecord>> {
    let receipt_text: String = row.get("receipt")?;
    let receipt = match Uuid::parse_str(&receipt_text) {
        Ok(receipt) => receipt,
        Err(_) => {
            return Ok(Err(RepoError::InvalidData(format!(
                "invalid uuid value `{receipt_text}` in user_unlock_records.receipt"
            ))));
        }
    };

    Ok(Ok(UnlockRecord {
        id: row.get("id")?,
        receipt,
        user_id: row.get("user_id")?,
        message_id: row.get("message_id")?,
        coins_spent: row.get("coins_spent")?,
        unlocked_at: row.get("unlocked_at")?,
    }))
}
