use petledger_core::db::{open_db_with, DbOptions};
use petledger_core::{
    Coins, ItemRepository, LedgerError, LedgerService, MessageService, NewItem, NewUser,
    SqliteItemRepository, SqliteLedgerRepository, SqliteMessageRepository, SqliteUserRepository,
    UserRepository,
};
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

fn options() -> DbOptions {
    DbOptions {
        busy_timeout: Duration::from_secs(30),
    }
}

fn open(path: &Path) -> Connection {
    open_db_with(path, &options()).unwrap()
}

fn db_path(dir: &tempfile::TempDir) -> PathBuf {
    dir.path().join("ledger.db")
}

#[test]
fn concurrent_spends_by_one_user_never_lose_updates_or_overdraw() {
    const THREADS: usize = 8;
    const ATTEMPTS_PER_THREAD: usize = 5;
    const INITIAL: Coins = 100;
    const COST: Coins = 7;

    let dir = tempfile::tempdir().unwrap();
    let path = db_path(&dir);
    let (user, item) = {
        let conn = open(&path);
        let user = SqliteUserRepository::new(&conn)
            .create_user(&NewUser::new("busy", "Busy").with_coins(INITIAL))
            .unwrap()
            .id;
        let item = SqliteItemRepository::new(&conn)
            .create_item(&NewItem::new("kibble", COST))
            .unwrap()
            .id;
        (user, item)
    };

    let barrier = Arc::new(Barrier::new(THREADS));
    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let path = path.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let mut conn = open(&path);
                let mut ledger = LedgerService::new(SqliteLedgerRepository::new(&mut conn));
                barrier.wait();

                let mut successes = Vec::new();
                for _ in 0..ATTEMPTS_PER_THREAD {
                    match ledger.spend_on_item(user, item) {
                        Ok(remaining) => {
                            assert!(remaining >= 0);
                            successes.push(remaining);
                        }
                        Err(LedgerError::InsufficientCoins { balance, required }) => {
                            assert!(balance < required);
                        }
                        Err(other) => panic!("unexpected ledger error: {other}"),
                    }
                }
                successes
            })
        })
        .collect();

    let mut remainders: Vec<Coins> = handles
        .into_iter()
        .flat_map(|handle| handle.join().unwrap())
        .collect();

    let expected_successes = (INITIAL / COST) as usize;
    assert_eq!(remainders.len(), expected_successes);

    // Each committed spend observed a distinct balance.
    remainders.sort_unstable();
    remainders.dedup();
    assert_eq!(remainders.len(), expected_successes);

    let mut conn = open(&path);
    let ledger = LedgerService::new(SqliteLedgerRepository::new(&mut conn));
    assert_eq!(
        ledger.balance(user).unwrap(),
        INITIAL - COST * expected_successes as Coins
    );
}

#[test]
fn concurrent_unlocks_of_one_note_charge_exactly_once() {
    const THREADS: usize = 4;

    let dir = tempfile::tempdir().unwrap();
    let path = db_path(&dir);
    let (user, note) = {
        let mut conn = open(&path);
        let user = SqliteUserRepository::new(&conn)
            .create_user(&NewUser::new("racer", "Racer").with_coins(30))
            .unwrap()
            .id;
        let note = MessageService::new(SqliteMessageRepository::new(&mut conn))
            .issue_note(user, 20, "only once")
            .unwrap()
            .id;
        (user, note)
    };

    let barrier = Arc::new(Barrier::new(THREADS));
    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let path = path.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let mut conn = open(&path);
                let mut ledger = LedgerService::new(SqliteLedgerRepository::new(&mut conn));
                barrier.wait();
                ledger.unlock_note(user, note).unwrap()
            })
        })
        .collect();

    let outcomes: Vec<_> = handles
        .into_iter()
        .map(|handle| handle.join().unwrap())
        .collect();

    let charged = outcomes
        .iter()
        .filter(|outcome| outcome.record.is_some())
        .count();
    assert_eq!(charged, 1);
    for outcome in &outcomes {
        assert_eq!(outcome.remaining, 10);
        assert!(!outcome.message.is_locked);
    }

    let conn = open(&path);
    let records: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM user_unlock_records WHERE message_id = ?1;",
            [note],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(records, 1);
}

#[test]
fn spends_by_different_users_are_independent() {
    const USERS: usize = 4;

    let dir = tempfile::tempdir().unwrap();
    let path = db_path(&dir);
    let (users, item) = {
        let conn = open(&path);
        let repo = SqliteUserRepository::new(&conn);
        let users: Vec<_> = (0..USERS)
            .map(|idx| {
                repo.create_user(&NewUser::new(format!("user{idx}"), "U").with_coins(50))
                    .unwrap()
                    .id
            })
            .collect();
        let item = SqliteItemRepository::new(&conn)
            .create_item(&NewItem::new("toy", 10))
            .unwrap()
            .id;
        (users, item)
    };

    let handles: Vec<_> = users
        .iter()
        .map(|&user| {
            let path = path.clone();
            thread::spawn(move || {
                let mut conn = open(&path);
                let mut ledger = LedgerService::new(SqliteLedgerRepository::new(&mut conn));
                (0..3)
                    .map(|_| ledger.spend_on_item(user, item).unwrap())
                    .last()
                    .unwrap()
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), 20);
    }
}
