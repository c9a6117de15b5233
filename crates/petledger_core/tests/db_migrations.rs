use petledger_core::db::migrations::latest_version;
use petledger_core::db::{open_db, open_db_in_memory, DbError};
use rusqlite::Connection;

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    assert_table_exists(&conn, "users");
    assert_table_exists(&conn, "items");
    assert_table_exists(&conn, "messages");
    assert_table_exists(&conn, "user_unlock_records");
    assert_table_exists(&conn, "pet_models");
}

#[test]
fn opening_same_database_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ledger.db");

    let conn_first = open_db(&path).unwrap();
    conn_first
        .execute(
            "INSERT INTO users (username, nickname, coins) VALUES ('keep', 'Keep', 42);",
            [],
        )
        .unwrap();
    drop(conn_first);

    let conn_second = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_second), latest_version());
    let coins: i64 = conn_second
        .query_row("SELECT coins FROM users WHERE username = 'keep';", [], |row| {
            row.get(0)
        })
        .unwrap();
    assert_eq!(coins, 42);
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    let err = open_db(&path).unwrap_err();
    match err {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn schema_rejects_negative_balances_and_duplicate_unlocks() {
    let conn = open_db_in_memory().unwrap();

    let negative = conn.execute(
        "INSERT INTO users (username, nickname, coins) VALUES ('neg', 'Neg', -1);",
        [],
    );
    assert!(negative.is_err());

    conn.execute_batch(
        "INSERT INTO users (id, username, nickname, coins) VALUES (1, 'u', 'U', 10);
         INSERT INTO messages (id, user_id, sender, message_type, is_locked, unlock_coins, content)
         VALUES (1, 1, 1, 1, 0, 5, 'x');
         INSERT INTO user_unlock_records (receipt, user_id, message_id, coins_spent)
         VALUES ('r-1', 1, 1, 5);",
    )
    .unwrap();
    let duplicate = conn.execute(
        "INSERT INTO user_unlock_records (receipt, user_id, message_id, coins_spent)
         VALUES ('r-2', 1, 1, 5);",
        [],
    );
    assert!(duplicate.is_err());
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table_name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "table {table_name} does not exist");
}
