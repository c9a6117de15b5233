use petledger_core::db::open_db_in_memory;
use petledger_core::{
    DailyNote, EntityRef, MessageKind, MessageRepository, MessageService, MessageServiceError,
    NewMessage, NewUser, RepoError, Sender, SqliteMessageRepository, SqliteUserRepository, UserId,
    UserRepository, ValidationError,
};
use rusqlite::Connection;

fn seed_user(conn: &Connection, username: &str) -> UserId {
    SqliteUserRepository::new(conn)
        .create_user(&NewUser::new(username, username).with_coins(50))
        .unwrap()
        .id
}

fn message_count(conn: &Connection) -> i64 {
    conn.query_row("SELECT COUNT(*) FROM messages;", [], |row| row.get(0))
        .unwrap()
}

#[test]
fn list_withholds_locked_note_content_and_filters_notes() {
    let mut conn = open_db_in_memory().unwrap();
    let user = seed_user(&conn, "reader");

    let mut service = MessageService::new(SqliteMessageRepository::new(&mut conn));
    service.append_chat(user, Sender::User, "hello").unwrap();
    let free = service.issue_note(user, 0, "free words").unwrap();
    let paid = service.issue_note(user, 20, "paid words").unwrap();
    assert!(!free.is_locked);
    assert!(paid.is_locked);
    assert_eq!(paid.content, None);

    let everything = service.list_messages(user, false, 1, 10).unwrap();
    assert_eq!(everything.total, 3);
    let ids: Vec<_> = everything.items.iter().map(|item| item.id).collect();
    assert_eq!(ids[0], paid.id);
    assert_eq!(everything.items[0].content, None);
    assert_eq!(everything.items[1].content.as_deref(), Some("free words"));
    assert_eq!(everything.items[2].kind, MessageKind::Chat);

    let notes = service.list_messages(user, true, 1, 10).unwrap();
    assert_eq!(notes.total, 2);
    assert!(notes
        .items
        .iter()
        .all(|item| item.kind == MessageKind::Note));
}

#[test]
fn list_normalizes_page_input() {
    let mut conn = open_db_in_memory().unwrap();
    let user = seed_user(&conn, "pager");

    let mut service = MessageService::new(SqliteMessageRepository::new(&mut conn));
    for idx in 0..25 {
        service
            .append_chat(user, Sender::Companion, format!("line {idx}"))
            .unwrap();
    }

    let defaulted = service.list_messages(user, false, 0, 0).unwrap();
    assert_eq!(defaulted.page, 1);
    assert_eq!(defaulted.page_size, 20);
    assert_eq!(defaulted.items.len(), 20);
    assert_eq!(defaulted.total, 25);

    let capped = service.list_messages(user, false, 1, 500).unwrap();
    assert_eq!(capped.page_size, 100);
    assert_eq!(capped.items.len(), 25);

    let tail = service.list_messages(user, false, 2, 20).unwrap();
    assert_eq!(tail.items.len(), 5);
    assert_eq!(tail.items[4].content.as_deref(), Some("line 0"));
}

#[test]
fn mailbox_reads_are_owner_scoped() {
    let mut conn = open_db_in_memory().unwrap();
    let owner = seed_user(&conn, "owner");
    let stranger = seed_user(&conn, "stranger");

    let mut service = MessageService::new(SqliteMessageRepository::new(&mut conn));
    let note = service.issue_note(owner, 5, "mine").unwrap();

    assert!(matches!(
        service.get_message(stranger, note.id).unwrap_err(),
        MessageServiceError::MessageNotFound(id) if id == note.id
    ));
    assert_eq!(service.list_messages(stranger, false, 1, 20).unwrap().total, 0);
    assert_eq!(service.get_message(owner, note.id).unwrap().unlock_coins, 5);
}

#[test]
fn daily_batch_issues_one_paid_note_and_rejects_bad_input() {
    let mut conn = open_db_in_memory().unwrap();
    let user = seed_user(&conn, "daily");

    {
        let mut service = MessageService::new(SqliteMessageRepository::new(&mut conn));
        let set = DailyNote::standard_set([
            "morning".to_string(),
            "cheer".to_string(),
            "reminder".to_string(),
            "evening".to_string(),
        ]);
        let ids = service.issue_daily_notes(user, &set).unwrap();
        assert_eq!(ids.len(), 4);

        let listed = service.list_messages(user, true, 1, 20).unwrap();
        let locked = listed.items.iter().filter(|item| item.is_locked).count();
        assert_eq!(locked, 1);

        let bad_batch = vec![
            DailyNote {
                unlock_coins: 0,
                content: "fine".to_string(),
            },
            DailyNote {
                unlock_coins: -1,
                content: "broken".to_string(),
            },
        ];
        let err = service.issue_daily_notes(user, &bad_batch).unwrap_err();
        assert!(matches!(
            err,
            MessageServiceError::InvalidInput(ValidationError::NegativeCoins { .. })
        ));

        let err = service.issue_daily_notes(424242, &set).unwrap_err();
        assert!(matches!(err, MessageServiceError::UserNotFound(424242)));
    }
    assert_eq!(message_count(&conn), 4);
}

#[test]
fn batch_append_rolls_back_rows_written_before_a_failure() {
    let mut conn = open_db_in_memory().unwrap();
    let user = seed_user(&conn, "batch");

    {
        let mut repo = SqliteMessageRepository::new(&mut conn);
        let batch = vec![
            NewMessage::note(user, 0, "lands first"),
            NewMessage::note(user + 1000, 20, "no such owner"),
        ];
        let err = repo.append_messages(&batch).unwrap_err();
        assert!(matches!(err, RepoError::NotFound(EntityRef::User(id)) if id == user + 1000));
    }

    assert_eq!(message_count(&conn), 0);
}

#[test]
fn issuing_to_unknown_user_is_not_found() {
    let mut conn = open_db_in_memory().unwrap();
    let mut service = MessageService::new(SqliteMessageRepository::new(&mut conn));
    assert!(matches!(
        service.issue_note(31337, 10, "lost").unwrap_err(),
        MessageServiceError::UserNotFound(31337)
    ));
}
