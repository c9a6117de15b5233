//! User account model and profile patch.
//!
//! # Invariants
//! - `coins` is the account balance and is only mutated by the ledger engine.
//! - `username` is unique across users.

use super::pet_model::PetModelId;
use super::{ensure_non_negative, ensure_not_blank, Coins, ValidationError};
use serde::{Deserialize, Serialize};

/// Store-assigned user identifier.
pub type UserId = i64;

/// Persisted user account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub nickname: String,
    pub avatar: Option<String>,
    /// Selected pet model; `None` until the user picks one.
    pub model_id: Option<PetModelId>,
    /// Current spendable balance.
    pub coins: Coins,
    /// Unix epoch milliseconds.
    pub created_at: i64,
    /// Unix epoch milliseconds.
    pub updated_at: i64,
}

/// Input for account creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub nickname: String,
    pub avatar: Option<String>,
    /// Opening balance granted at registration.
    pub initial_coins: Coins,
}

impl NewUser {
    pub fn new(username: impl Into<String>, nickname: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            nickname: nickname.into(),
            avatar: None,
            initial_coins: 0,
        }
    }

    pub fn with_coins(mut self, coins: Coins) -> Self {
        self.initial_coins = coins;
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        ensure_not_blank("username", &self.username)?;
        ensure_not_blank("nickname", &self.nickname)?;
        ensure_non_negative("initial_coins", self.initial_coins)
    }
}

/// Explicit partial update of user-editable profile fields.
///
/// A field that is `None` is left untouched. For nullable columns the inner
/// option distinguishes "set to value" from "clear".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfilePatch {
    pub nickname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "double_option")]
    pub avatar: Option<Option<String>>,
}

impl ProfilePatch {
    pub fn is_empty(&self) -> bool {
        self.nickname.is_none() && self.avatar.is_none()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(nickname) = self.nickname.as_deref() {
            ensure_not_blank("nickname", nickname)?;
        }
        Ok(())
    }
}

/// Serde adapter keeping "field absent" and "field is null" apart.
mod double_option {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S>(value: &Option<Option<String>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(inner) => inner.serialize(serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<String>::deserialize(deserializer).map(Some)
    }
}
