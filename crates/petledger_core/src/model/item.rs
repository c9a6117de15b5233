//! Spendable catalog item ("prop").

use super::{ensure_non_negative, ensure_not_blank, Coins, ValidationError};
use serde::{Deserialize, Serialize};

/// Store-assigned item identifier.
pub type ItemId = i64;

/// Catalog entry with an immutable coin cost.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    pub description: Option<String>,
    pub icon_path: Option<String>,
    pub coin_cost: Coins,
    /// Unix epoch milliseconds.
    pub created_at: i64,
}

/// Input for adding an item to the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewItem {
    pub name: String,
    pub description: Option<String>,
    pub icon_path: Option<String>,
    pub coin_cost: Coins,
}

impl NewItem {
    pub fn new(name: impl Into<String>, coin_cost: Coins) -> Self {
        Self {
            name: name.into(),
            description: None,
            icon_path: None,
            coin_cost,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        ensure_not_blank("name", &self.name)?;
        ensure_non_negative("coin_cost", self.coin_cost)
    }
}
