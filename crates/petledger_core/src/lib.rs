//! Coin ledger and note-unlock engine for the pet companion backend.
//! This crate is the single source of truth for balance invariants.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{ConfigError, LedgerConfig};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::item::{Item, ItemId, NewItem};
pub use model::message::{Message, MessageId, MessageKind, MessageView, NewMessage, Sender};
pub use model::page::{Page, PageRequest};
pub use model::pet_model::{NewPetModel, PetKind, PetModel, PetModelId};
pub use model::unlock::UnlockRecord;
pub use model::user::{NewUser, ProfilePatch, User, UserId};
pub use model::{Coins, ValidationError};
pub use repo::item_repo::{ItemRepository, SqliteItemRepository};
pub use repo::ledger_repo::{ItemSpend, LedgerRepository, SqliteLedgerRepository, UnlockOutcome};
pub use repo::message_repo::{MessageRepository, SqliteMessageRepository};
pub use repo::pet_model_repo::{PetModelRepository, SqlitePetModelRepository};
pub use repo::user_repo::{SqliteUserRepository, UserRepository};
pub use repo::{EntityRef, RepoError, RepoResult};
pub use service::catalog_service::{CatalogError, CatalogService};
pub use service::ledger_service::{LedgerError, LedgerErrorKind, LedgerService};
pub use service::message_service::{DailyNote, MessageService, MessageServiceError};
pub use service::pet_model_service::PetModelService;
pub use service::profile_service::{ProfileError, ProfileService};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
