//! User account repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Create and read user accounts.
//! - Apply explicit profile patches without touching the balance column.
//!
//! # Invariants
//! - No method in this module writes `users.coins` after account creation;
//!   balance mutation belongs to the ledger repository.
//! - `update_profile` only writes the columns present in the patch.

use crate::model::user::{NewUser, ProfilePatch, User, UserId};
use crate::repo::{is_unique_violation, EntityRef, RepoError, RepoResult};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

const USER_SELECT_SQL: &str = "SELECT
    id,
    username,
    nickname,
    avatar,
    model_id,
    coins,
    created_at,
    updated_at
FROM users";

/// Repository interface for user accounts.
pub trait UserRepository {
    /// Inserts a new account and returns the stored row.
    fn create_user(&self, user: &NewUser) -> RepoResult<User>;
    /// Gets one account by id.
    fn get_user(&self, id: UserId) -> RepoResult<Option<User>>;
    /// Gets one account by unique username.
    fn find_by_username(&self, username: &str) -> RepoResult<Option<User>>;
    /// Applies the present fields of `patch` and returns the updated row.
    fn update_profile(&self, id: UserId, patch: &ProfilePatch) -> RepoResult<User>;
}

/// SQLite-backed user repository.
pub struct SqliteUserRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteUserRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl UserRepository for SqliteUserRepository<'_> {
    fn create_user(&self, user: &NewUser) -> RepoResult<User> {
        user.validate()?;

        let inserted = self.conn.execute(
            "INSERT INTO users (username, nickname, avatar, coins)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                user.username.trim(),
                user.nickname.trim(),
                user.avatar.as_deref(),
                user.initial_coins,
            ],
        );
        match inserted {
            Ok(_) => {}
            Err(err) if is_unique_violation(&err) => {
                return Err(RepoError::Conflict(format!(
                    "username `{}` already exists",
                    user.username.trim()
                )));
            }
            Err(err) => return Err(err.into()),
        }

        let id = self.conn.last_insert_rowid();
        self.get_user(id)?
            .ok_or(RepoError::NotFound(EntityRef::User(id)))
    }

    fn get_user(&self, id: UserId) -> RepoResult<Option<User>> {
        let user = self
            .conn
            .query_row(
                &format!("{USER_SELECT_SQL} WHERE id = ?1;"),
                [id],
                parse_user_row,
            )
            .optional()?;
        Ok(user)
    }

    fn find_by_username(&self, username: &str) -> RepoResult<Option<User>> {
        let user = self
            .conn
            .query_row(
                &format!("{USER_SELECT_SQL} WHERE username = ?1;"),
                [username.trim()],
                parse_user_row,
            )
            .optional()?;
        Ok(user)
    }

    fn update_profile(&self, id: UserId, patch: &ProfilePatch) -> RepoResult<User> {
        patch.validate()?;

        if !patch.is_empty() {
            let mut assignments = Vec::new();
            let mut bind_values: Vec<Value> = Vec::new();

            if let Some(nickname) = patch.nickname.as_ref() {
                assignments.push("nickname = ?");
                bind_values.push(Value::Text(nickname.trim().to_string()));
            }
            if let Some(avatar) = patch.avatar.as_ref() {
                assignments.push("avatar = ?");
                bind_values.push(match avatar {
                    Some(path) => Value::Text(path.clone()),
                    None => Value::Null,
                });
            }

            let sql = format!(
                "UPDATE users
                 SET {}, updated_at = (strftime('%s', 'now') * 1000)
                 WHERE id = ?;",
                assignments.join(", ")
            );
            bind_values.push(Value::Integer(id));

            let changed = self.conn.execute(&sql, params_from_iter(bind_values))?;
            if changed == 0 {
                return Err(RepoError::NotFound(EntityRef::User(id)));
            }
        }

        self.get_user(id)?
            .ok_or(RepoError::NotFound(EntityRef::User(id)))
    }
}

fn parse_user_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get("id")?,
        username: row.get("username")?,
        nickname: row.get("nickname")?,
        avatar: row.get("avatar")?,
        model_id: row.get("model_id")?,
        coins: row.get("coins")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}
