//! Item catalog use-cases.

use crate::model::item::{Item, ItemId, NewItem};
use crate::model::pet_model::PetModelId;
use crate::model::user::UserId;
use crate::model::ValidationError;
use crate::repo::item_repo::ItemRepository;
use crate::repo::{EntityRef, RepoError};
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Service error for item and pet model catalog use-cases.
#[derive(Debug)]
pub enum CatalogError {
    ItemNotFound(ItemId),
    PetModelNotFound(PetModelId),
    UserNotFound(UserId),
    InvalidInput(ValidationError),
    Repo(RepoError),
}

impl Display for CatalogError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ItemNotFound(id) => write!(f, "item not found: {id}"),
            Self::PetModelNotFound(id) => write!(f, "pet model not found: {id}"),
            Self::UserNotFound(id) => write!(f, "user not found: {id}"),
            Self::InvalidInput(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for CatalogError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidInput(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for CatalogError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(EntityRef::Item(id)) => Self::ItemNotFound(id),
            RepoError::NotFound(EntityRef::PetModel(id)) => Self::PetModelNotFound(id),
            RepoError::NotFound(EntityRef::User(id)) => Self::UserNotFound(id),
            RepoError::Validation(err) => Self::InvalidInput(err),
            other => Self::Repo(other),
        }
    }
}

/// Thin catalog facade; items are read-only to the ledger.
pub struct CatalogService<R: ItemRepository> {
    repo: R,
}

impl<R: ItemRepository> CatalogService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn add_item(&self, item: &NewItem) -> Result<Item, CatalogError> {
        let created = self.repo.create_item(item)?;
        info!(
            "event=item_add module=catalog status=ok item_id={} coin_cost={}",
            created.id, created.coin_cost
        );
        Ok(created)
    }

    pub fn get_item(&self, id: ItemId) -> Result<Item, CatalogError> {
        self.repo.get_item(id)?.ok_or(CatalogError::ItemNotFound(id))
    }

    pub fn list_items(&self) -> Result<Vec<Item>, CatalogError> {
        Ok(self.repo.list_items()?)
    }
}
