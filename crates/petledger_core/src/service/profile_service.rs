//! Account registration and profile use-cases.
//!
//! # Invariants
//! - Profile updates go through `ProfilePatch`; absent fields are untouched.
//! - Balance is never writable from this service.

use crate::model::user::{NewUser, ProfilePatch, User, UserId};
use crate::model::ValidationError;
use crate::repo::user_repo::UserRepository;
use crate::repo::{EntityRef, RepoError};
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Service error for account use-cases.
#[derive(Debug)]
pub enum ProfileError {
    UserNotFound(UserId),
    UsernameTaken(String),
    InvalidInput(ValidationError),
    Repo(RepoError),
}

impl Display for ProfileError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UserNotFound(id) => write!(f, "user not found: {id}"),
            Self::UsernameTaken(name) => write!(f, "username already taken: `{name}`"),
            Self::InvalidInput(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ProfileError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidInput(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for ProfileError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(EntityRef::User(id)) => Self::UserNotFound(id),
            RepoError::Validation(err) => Self::InvalidInput(err),
            other => Self::Repo(other),
        }
    }
}

/// Account service facade over repository implementations.
pub struct ProfileService<R: UserRepository> {
    repo: R,
}

impl<R: UserRepository> ProfileService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Registers a new account with an opening balance.
    pub fn register(&self, user: &NewUser) -> Result<User, ProfileError> {
        if self.repo.find_by_username(&user.username)?.is_some() {
            return Err(ProfileError::UsernameTaken(user.username.trim().to_string()));
        }
        let created = match self.repo.create_user(user) {
            Ok(created) => created,
            Err(RepoError::Conflict(_)) => {
                return Err(ProfileError::UsernameTaken(user.username.trim().to_string()));
            }
            Err(err) => return Err(err.into()),
        };
        info!(
            "event=user_register module=profile status=ok user_id={} initial_coins={}",
            created.id, created.coins
        );
        Ok(created)
    }

    pub fn get_profile(&self, user_id: UserId) -> Result<User, ProfileError> {
        self.repo
            .get_user(user_id)?
            .ok_or(ProfileError::UserNotFound(user_id))
    }

    /// Applies a partial profile update and returns the stored account.
    pub fn update_profile(
        &self,
        user_id: UserId,
        patch: &ProfilePatch,
    ) -> Result<User, ProfileError> {
        Ok(self.repo.update_profile(user_id, patch)?)
    }
}
