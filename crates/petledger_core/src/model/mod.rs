//! Domain model for the coin economy.
//!
//! # Responsibility
//! - Define canonical data structures used by ledger business logic.
//! - Keep validation rules next to the types they protect.
//!
//! # Invariants
//! - Coin amounts stored in any model are non-negative.
//! - Identifiers are store-assigned integers and never reused.

pub mod item;
pub mod message;
pub mod page;
pub mod pet_model;
pub mod unlock;
pub mod user;

use std::error::Error;
use std::fmt::{Display, Formatter};

/// Coin amount. Signed to match SQLite `INTEGER`, but never negative at rest.
pub type Coins = i64;

/// Validation failures raised before any persistence call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A coin amount or cost was negative.
    NegativeCoins { field: &'static str, value: Coins },
    /// A required text field was empty after trimming.
    EmptyField(&'static str),
    /// A chat message was created with lock metadata.
    ChatCannotBeLocked,
    /// A credit would push the balance past `Coins::MAX`.
    BalanceOverflow { balance: Coins, amount: Coins },
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NegativeCoins { field, value } => {
                write!(f, "`{field}` must be non-negative, got {value}")
            }
            Self::EmptyField(field) => write!(f, "`{field}` cannot be empty"),
            Self::ChatCannotBeLocked => write!(f, "chat messages cannot be locked or priced"),
            Self::BalanceOverflow { balance, amount } => {
                write!(f, "crediting {amount} to balance {balance} overflows")
            }
        }
    }
}

impl Error for ValidationError {}

pub(crate) fn ensure_non_negative(field: &'static str, value: Coins) -> Result<(), ValidationError> {
    if value < 0 {
        return Err(ValidationError::NegativeCoins { field, value });
    }
    Ok(())
}

pub(crate) fn ensure_not_blank(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::EmptyField(field));
    }
    Ok(())
}
