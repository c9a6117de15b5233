//! Pet model catalog and per-user model selection.
//!
//! # Invariants
//! - Listing order is kind, then defaults first, then `sort_order`, then id.
//! - `set_user_model` only writes `users.model_id`; the balance is untouched.

use crate::model::pet_model::{NewPetModel, PetKind, PetModel, PetModelId};
use crate::model::user::UserId;
use crate::repo::{bool_to_int, int_to_bool, EntityRef, RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension, Row};

const PET_MODEL_SELECT_SQL: &str = "SELECT
    id,
    name,
    path,
    model_type,
    is_default,
    sort_order,
    created_at
FROM pet_models";

/// Repository interface for the pet model catalog.
pub trait PetModelRepository {
    fn create_pet_model(&self, model: &NewPetModel) -> RepoResult<PetModel>;
    fn get_pet_model(&self, id: PetModelId) -> RepoResult<Option<PetModel>>;
    fn list_pet_models(&self) -> RepoResult<Vec<PetModel>>;
    /// Points the user's current model at `model_id`.
    fn set_user_model(&self, user_id: UserId, model_id: PetModelId) -> RepoResult<()>;
}

/// SQLite-backed pet model catalog.
pub struct SqlitePetModelRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqlitePetModelRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl PetModelRepository for SqlitePetModelRepository<'_> {
    fn create_pet_model(&self, model: &NewPetModel) -> RepoResult<PetModel> {
        model.validate()?;

        self.conn.execute(
            "INSERT INTO pet_models (name, path, model_type, is_default, sort_order)
             VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                model.name.trim(),
                model.path.trim(),
                pet_kind_to_db(model.kind),
                bool_to_int(model.is_default),
                model.sort_order,
            ],
        )?;

        let id = self.conn.last_insert_rowid();
        self.get_pet_model(id)?
            .ok_or(RepoError::NotFound(EntityRef::PetModel(id)))
    }

    fn get_pet_model(&self, id: PetModelId) -> RepoResult<Option<PetModel>> {
        let model = self
            .conn
            .query_row(
                &format!("{PET_MODEL_SELECT_SQL} WHERE id = ?1;"),
                [id],
                |row| Ok(parse_pet_model_row(row)),
            )
            .optional()?;
        model.transpose()
    }

    fn list_pet_models(&self) -> RepoResult<Vec<PetModel>> {
        let mut stmt = self.conn.prepare(&format!(
            "{PET_MODEL_SELECT_SQL}
             ORDER BY model_type ASC, is_default DESC, sort_order ASC, id ASC;"
        ))?;
        let mut rows = stmt.query([])?;
        let mut models = Vec::new();
        while let Some(row) = rows.next()? {
            models.push(parse_pet_model_row(row)?);
        }
        Ok(models)
    }

    fn set_user_model(&self, user_id: UserId, model_id: PetModelId) -> RepoResult<()> {
        if self.get_pet_model(model_id)?.is_none() {
            return Err(RepoError::NotFound(EntityRef::PetModel(model_id)));
        }

        let changed = self.conn.execute(
            "UPDATE users
             SET
                model_id = ?2,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1;",
            params![user_id, model_id],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(EntityRef::User(user_id)));
        }
        Ok(())
    }
}

fn parse_pet_model_row(row: &Row<'_>) -> RepoResult<PetModel> {
    let kind_value: i64 = row.get("model_type")?;
    let kind = parse_pet_kind(kind_value).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid model_type value `{kind_value}` in pet_models.model_type"
        ))
    })?;

    Ok(PetModel {
        id: row.get("id")?,
        name: row.get("name")?,
        path: row.get("path")?,
        kind,
        is_default: int_to_bool("pet_models.is_default", row.get("is_default")?)?,
        sort_order: row.get("sort_order")?,
        created_at: row.get("created_at")?,
    })
}

fn pet_kind_to_db(kind: PetKind) -> i64 {
    match kind {
        PetKind::Cat => 0,
        PetKind::Dog => 1,
    }
}

fn parse_pet_kind(value: i64) -> Option<PetKind> {
    match value {
        0 => Some(PetKind::Cat),
        1 => Some(PetKind::Dog),
        _ => None,
    }
}
