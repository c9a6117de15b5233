use petledger_core::db::open_db_in_memory;
use petledger_core::{
    Coins, ItemId, ItemRepository, LedgerError, LedgerErrorKind, LedgerService, NewItem, NewUser,
    SqliteItemRepository, SqliteLedgerRepository, SqliteUserRepository, UserId, UserRepository,
    ValidationError,
};
use rusqlite::Connection;

fn seed_user(conn: &Connection, username: &str, coins: Coins) -> UserId {
    SqliteUserRepository::new(conn)
        .create_user(&NewUser::new(username, username).with_coins(coins))
        .unwrap()
        .id
}

fn seed_item(conn: &Connection, name: &str, cost: Coins) -> ItemId {
    SqliteItemRepository::new(conn)
        .create_item(&NewItem::new(name, cost))
        .unwrap()
        .id
}

fn unlock_record_count(conn: &Connection) -> i64 {
    conn.query_row("SELECT COUNT(*) FROM user_unlock_records;", [], |row| {
        row.get(0)
    })
    .unwrap()
}

#[test]
fn spend_debits_cost_then_rejects_overspend_without_mutation() {
    let mut conn = open_db_in_memory().unwrap();
    let user = seed_user(&conn, "mika", 100);
    let treat = seed_item(&conn, "treat", 30);
    let castle = seed_item(&conn, "castle", 80);

    let mut ledger = LedgerService::new(SqliteLedgerRepository::new(&mut conn));
    assert_eq!(ledger.spend_on_item(user, treat).unwrap(), 70);

    let err = ledger.spend_on_item(user, castle).unwrap_err();
    assert!(matches!(
        err,
        LedgerError::InsufficientCoins {
            balance: 70,
            required: 80
        }
    ));
    assert_eq!(err.kind(), LedgerErrorKind::InsufficientCoins);
    assert_eq!(ledger.balance(user).unwrap(), 70);
}

#[test]
fn spend_can_drain_balance_to_exactly_zero() {
    let mut conn = open_db_in_memory().unwrap();
    let user = seed_user(&conn, "exact", 45);
    let item = seed_item(&conn, "collar", 45);

    let mut ledger = LedgerService::new(SqliteLedgerRepository::new(&mut conn));
    assert_eq!(ledger.spend_on_item(user, item).unwrap(), 0);
    assert!(matches!(
        ledger.spend_on_item(user, item).unwrap_err(),
        LedgerError::InsufficientCoins {
            balance: 0,
            required: 45
        }
    ));
}

#[test]
fn free_item_leaves_balance_untouched() {
    let mut conn = open_db_in_memory().unwrap();
    let user = seed_user(&conn, "free", 12);
    let item = seed_item(&conn, "pat", 0);

    let mut ledger = LedgerService::new(SqliteLedgerRepository::new(&mut conn));
    assert_eq!(ledger.spend_on_item(user, item).unwrap(), 12);
}

#[test]
fn unknown_item_is_not_found_and_balance_is_unchanged() {
    let mut conn = open_db_in_memory().unwrap();
    let user = seed_user(&conn, "ghost-item", 50);

    let mut ledger = LedgerService::new(SqliteLedgerRepository::new(&mut conn));
    let err = ledger.spend_on_item(user, 404).unwrap_err();
    assert!(matches!(err, LedgerError::ItemNotFound(404)));
    assert_eq!(err.kind(), LedgerErrorKind::NotFound);
    assert_eq!(ledger.balance(user).unwrap(), 50);
}

#[test]
fn unknown_user_is_not_found() {
    let mut conn = open_db_in_memory().unwrap();
    let item = seed_item(&conn, "ball", 5);

    let mut ledger = LedgerService::new(SqliteLedgerRepository::new(&mut conn));
    let err = ledger.spend_on_item(777, item).unwrap_err();
    assert!(matches!(err, LedgerError::UserNotFound(777)));
    assert_eq!(err.kind(), LedgerErrorKind::NotFound);
}

#[test]
fn item_spend_never_writes_unlock_records() {
    let mut conn = open_db_in_memory().unwrap();
    let user = seed_user(&conn, "norecord", 10);
    let item = seed_item(&conn, "snack", 3);

    {
        let mut ledger = LedgerService::new(SqliteLedgerRepository::new(&mut conn));
        ledger.spend_on_item(user, item).unwrap();
    }
    assert_eq!(unlock_record_count(&conn), 0);
}

#[test]
fn credit_adds_coins_and_rejects_negative_amounts() {
    let mut conn = open_db_in_memory().unwrap();
    let user = seed_user(&conn, "earner", 5);
    let item = seed_item(&conn, "bed", 25);

    let mut ledger = LedgerService::new(SqliteLedgerRepository::new(&mut conn));
    assert_eq!(ledger.credit_coins(user, 20).unwrap(), 25);
    assert_eq!(ledger.spend_on_item(user, item).unwrap(), 0);

    let err = ledger.credit_coins(user, -3).unwrap_err();
    assert!(matches!(
        err,
        LedgerError::InvalidInput(ValidationError::NegativeCoins { .. })
    ));
    assert_eq!(err.kind(), LedgerErrorKind::InvalidInput);
    assert_eq!(ledger.balance(user).unwrap(), 0);

    assert!(matches!(
        ledger.credit_coins(999, 1).unwrap_err(),
        LedgerError::UserNotFound(999)
    ));
}

#[test]
fn credit_overflow_is_rejected_without_mutation() {
    let mut conn = open_db_in_memory().unwrap();
    let user = seed_user(&conn, "whale", Coins::MAX - 1);

    let mut ledger = LedgerService::new(SqliteLedgerRepository::new(&mut conn));
    let err = ledger.credit_coins(user, 2).unwrap_err();
    assert!(matches!(
        err,
        LedgerError::InvalidInput(ValidationError::BalanceOverflow { .. })
    ));
    assert_eq!(ledger.balance(user).unwrap(), Coins::MAX - 1);
}
