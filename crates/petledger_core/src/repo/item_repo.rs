//! Item catalog repository contracts and SQLite implementation.
//!
//! # Invariants
//! - `coin_cost` is immutable once inserted; no update path exists.

use crate::model::item::{Item, ItemId, NewItem};
use crate::repo::{EntityRef, RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension, Row};

const ITEM_SELECT_SQL: &str = "SELECT
    id,
    name,
    description,
    icon_path,
    coin_cost,
    created_at
FROM items";

/// Repository interface for the item catalog.
pub trait ItemRepository {
    fn create_item(&self, item: &NewItem) -> RepoResult<Item>;
    fn get_item(&self, id: ItemId) -> RepoResult<Option<Item>>;
    /// Lists all items ordered by id ascending.
    fn list_items(&self) -> RepoResult<Vec<Item>>;
}

/// SQLite-backed item catalog.
pub struct SqliteItemRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteItemRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl ItemRepository for SqliteItemRepository<'_> {
    fn create_item(&self, item: &NewItem) -> RepoResult<Item> {
        item.validate()?;

        self.conn.execute(
            "INSERT INTO items (name, description, icon_path, coin_cost)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                item.name.trim(),
                item.description.as_deref(),
                item.icon_path.as_deref(),
                item.coin_cost,
            ],
        )?;

        let id = self.conn.last_insert_rowid();
        self.get_item(id)?
            .ok_or(RepoError::NotFound(EntityRef::Item(id)))
    }

    fn get_item(&self, id: ItemId) -> RepoResult<Option<Item>> {
        let item = self
            .conn
            .query_row(
                &format!("{ITEM_SELECT_SQL} WHERE id = ?1;"),
                [id],
                parse_item_row,
            )
            .optional()?;
        Ok(item)
    }

    fn list_items(&self) -> RepoResult<Vec<Item>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{ITEM_SELECT_SQL} ORDER BY id ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(parse_item_row(row)?);
        }
        Ok(items)
    }
}

fn parse_item_row(row: &Row<'_>) -> rusqlite::Result<Item> {
    Ok(Item {
        id: row.get("id")?,
        name: row.get("name")?,
        description: row.get("description")?,
        icon_path: row.get("icon_path")?,
        coin_cost: row.get("coin_cost")?,
        created_at: row.get("created_at")?,
    })
}
