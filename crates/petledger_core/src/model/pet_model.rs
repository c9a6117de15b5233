//! Selectable pet appearance models.

use super::{ensure_not_blank, ValidationError};
use serde::{Deserialize, Serialize};

/// Store-assigned pet model identifier.
pub type PetModelId = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PetKind {
    Cat,
    Dog,
}

/// Catalog entry a user can pick as their current pet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PetModel {
    pub id: PetModelId,
    pub name: String,
    /// Resource location of the model asset.
    pub path: String,
    pub kind: PetKind,
    /// Listed first within its kind.
    pub is_default: bool,
    pub sort_order: i64,
    /// Unix epoch milliseconds.
    pub created_at: i64,
}

/// Input for adding a pet model to the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPetModel {
    pub name: String,
    pub path: String,
    pub kind: PetKind,
    pub is_default: bool,
    pub sort_order: i64,
}

impl NewPetModel {
    pub fn new(name: impl Into<String>, path: impl Into<String>, kind: PetKind) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            kind,
            is_default: false,
            sort_order: 0,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        ensure_not_blank("name", &self.name)?;
        ensure_not_blank("path", &self.path)
    }
}
