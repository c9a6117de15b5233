//! Coin ledger use-case service.
//!
//! # Responsibility
//! - Expose the balance-affecting operations: item spend, note unlock, credit.
//! - Translate repository failures into a caller-facing error taxonomy.
//! - Emit one metadata-only log event per ledger operation.
//!
//! # Invariants
//! - Every failure on a mutating path is propagated, never swallowed.
//! - No internal retry: a failed call has no effect and the caller decides.
//! - Log events never include note content.

use crate::model::item::ItemId;
use crate::model::message::MessageId;
use crate::model::page::{Page, PageRequest};
use crate::model::unlock::UnlockRecord;
use crate::model::user::UserId;
use crate::model::{Coins, ValidationError};
use crate::repo::ledger_repo::{LedgerRepository, UnlockOutcome};
use crate::repo::{EntityRef, RepoError};
use log::{error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

/// Coarse failure class a client can act on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerErrorKind {
    /// "This doesn't exist."
    NotFound,
    /// "You need more coins."
    InsufficientCoins,
    /// The request itself was malformed.
    InvalidInput,
    /// "Try again later."
    Database,
}

/// Service error for ledger use-cases.
#[derive(Debug)]
pub enum LedgerError {
    UserNotFound(UserId),
    ItemNotFound(ItemId),
    MessageNotFound(MessageId),
    InsufficientCoins { balance: Coins, required: Coins },
    InvalidInput(ValidationError),
    /// Opaque persistence failure; the transaction was rolled back.
    Database(RepoError),
}

impl LedgerError {
    pub fn kind(&self) -> LedgerErrorKind {
        match self {
            Self::UserNotFound(_) | Self::ItemNotFound(_) | Self::MessageNotFound(_) => {
                LedgerErrorKind::NotFound
            }
            Self::InsufficientCoins { .. } => LedgerErrorKind::InsufficientCoins,
            Self::InvalidInput(_) => LedgerErrorKind::InvalidInput,
            Self::Database(_) => LedgerErrorKind::Database,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            Self::UserNotFound(_) => "user_not_found",
            Self::ItemNotFound(_) => "item_not_found",
            Self::MessageNotFound(_) => "message_not_found",
            Self::InsufficientCoins { .. } => "insufficient_coins",
            Self::InvalidInput(_) => "invalid_input",
            Self::Database(_) => "database_error",
        }
    }
}

impl Display for LedgerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UserNotFound(id) => write!(f, "user not found: {id}"),
            Self::ItemNotFound(id) => write!(f, "item not found: {id}"),
            Self::MessageNotFound(id) => write!(f, "message not found: {id}"),
            Self::InsufficientCoins { balance, required } => {
                write!(f, "insufficient coins: balance {balance}, required {required}")
            }
            Self::InvalidInput(err) => write!(f, "{err}"),
            Self::Database(err) => write!(f, "database error: {err}"),
        }
    }
}

impl Error for LedgerError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidInput(err) => Some(err),
            Self::Database(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for LedgerError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(EntityRef::User(id)) => Self::UserNotFound(id),
            RepoError::NotFound(EntityRef::Item(id)) => Self::ItemNotFound(id),
            RepoError::NotFound(EntityRef::Message(id)) => Self::MessageNotFound(id),
            RepoError::InsufficientCoins { balance, required } => {
                Self::InsufficientCoins { balance, required }
            }
            RepoError::Validation(err) => Self::InvalidInput(err),
            other => Self::Database(other),
        }
    }
}

/// Ledger service facade over repository implementations.
pub struct LedgerService<R: LedgerRepository> {
    repo: R,
}

impl<R: LedgerRepository> LedgerService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Current balance of `user_id`.
    pub fn balance(&self, user_id: UserId) -> Result<Coins, LedgerError> {
        Ok(self.repo.balance(user_id)?)
    }

    /// Spends the item's cost from the user's balance.
    ///
    /// Returns the remaining balance. On `InsufficientCoins` the balance is
    /// unchanged.
    pub fn spend_on_item(&mut self, user_id: UserId, item_id: ItemId) -> Result<Coins, LedgerError> {
        let started_at = Instant::now();
        match self.repo.use_item(user_id, item_id) {
            Ok(spend) => {
                info!(
                    "event=ledger_spend_item module=ledger status=ok user_id={} item_id={} cost={} remaining={} duration_ms={}",
                    user_id,
                    item_id,
                    spend.cost,
                    spend.remaining,
                    started_at.elapsed().as_millis()
                );
                Ok(spend.remaining)
            }
            Err(err) => {
                let err = LedgerError::from(err);
                log_failure("ledger_spend_item", user_id, item_id, &err, started_at);
                Err(err)
            }
        }
    }

    /// Unlocks one of the user's notes.
    ///
    /// Idempotent: once the note is unlocked, repeated calls return the
    /// current balance and the note without charging again.
    pub fn unlock_note(
        &mut self,
        user_id: UserId,
        message_id: MessageId,
    ) -> Result<UnlockOutcome, LedgerError> {
        let started_at = Instant::now();
        match self.repo.unlock_message(user_id, message_id) {
            Ok(outcome) => {
                let charged = outcome
                    .record
                    .as_ref()
                    .map_or(0, |record| record.coins_spent);
                info!(
                    "event=ledger_unlock_note module=ledger status=ok user_id={} message_id={} charged={} already_unlocked={} remaining={} duration_ms={}",
                    user_id,
                    message_id,
                    charged,
                    outcome.record.is_none(),
                    outcome.remaining,
                    started_at.elapsed().as_millis()
                );
                Ok(outcome)
            }
            Err(err) => {
                let err = LedgerError::from(err);
                log_failure("ledger_unlock_note", user_id, message_id, &err, started_at);
                Err(err)
            }
        }
    }

    /// Adds a non-negative amount to the user's balance.
    pub fn credit_coins(&mut self, user_id: UserId, amount: Coins) -> Result<Coins, LedgerError> {
        let started_at = Instant::now();
        match self.repo.credit(user_id, amount) {
            Ok(balance) => {
                info!(
                    "event=ledger_credit module=ledger status=ok user_id={} amount={} balance={} duration_ms={}",
                    user_id,
                    amount,
                    balance,
                    started_at.elapsed().as_millis()
                );
                Ok(balance)
            }
            Err(err) => {
                let err = LedgerError::from(err);
                log_failure("ledger_credit", user_id, amount, &err, started_at);
                Err(err)
            }
        }
    }

    /// Gets the unlock record for one note, if the user paid for it.
    pub fn unlock_record(
        &self,
        user_id: UserId,
        message_id: MessageId,
    ) -> Result<Option<UnlockRecord>, LedgerError> {
        Ok(self.repo.find_unlock_record(user_id, message_id)?)
    }

    /// Lists the user's unlock records, newest first.
    ///
    /// Raw page input is normalized (see [`PageRequest::normalize`]).
    /// Returns `UserNotFound` when the account does not exist.
    pub fn unlock_history(
        &self,
        user_id: UserId,
        page: i64,
        page_size: i64,
    ) -> Result<Page<UnlockRecord>, LedgerError> {
        let request = PageRequest::normalize(page, page_size);
        Ok(self.repo.unlock_history(user_id, request)?)
    }
}

fn log_failure(event: &str, user_id: UserId, target: i64, err: &LedgerError, started_at: Instant) {
    let duration_ms = started_at.elapsed().as_millis();
    match err.kind() {
        LedgerErrorKind::Database => error!(
            "event={} module=ledger status=error user_id={} target={} error_code={} duration_ms={} error={}",
            event,
            user_id,
            target,
            err.code(),
            duration_ms,
            err
        ),
        _ => warn!(
            "event={} module=ledger status=rejected user_id={} target={} error_code={} duration_ms={}",
            event,
            user_id,
            target,
            err.code(),
            duration_ms
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::{LedgerError, LedgerErrorKind};
    use crate::db::DbError;
    use crate::repo::{EntityRef, RepoError};

    #[test]
    fn repo_errors_map_to_distinguishable_kinds() {
        let not_found = LedgerError::from(RepoError::NotFound(EntityRef::Item(9)));
        assert!(matches!(not_found, LedgerError::ItemNotFound(9)));
        assert_eq!(not_found.kind(), LedgerErrorKind::NotFound);

        let short = LedgerError::from(RepoError::InsufficientCoins {
            balance: 5,
            required: 10,
        });
        assert_eq!(short.kind(), LedgerErrorKind::InsufficientCoins);

        let db = LedgerError::from(RepoError::Db(DbError::Sqlite(
            rusqlite::Error::InvalidQuery,
        )));
        assert_eq!(db.kind(), LedgerErrorKind::Database);
    }
}
