use alarm_core::db::migrations::latest_version;
use alarm_core::db::{open_db, open_db_in_memory};
use alarm_core::{
    AlarmDraft, AlarmListQuery, AlarmStore, InMemoryAlarmStore, RepoError, SqliteAlarmStore,
};
use rusqlite::Connection;

fn wake_up() -> AlarmDraft {
    let mut draft = AlarmDraft::new("06:30").unwrap();
    draft.title = "Wake Up".to_string();
    draft.repeat_days = vec![1, 2, 3, 4, 5];
    draft.snooze_duration = 10;
    draft
}

fn assert_store_contract(store: &dyn AlarmStore) {
    let created = store.create(&wake_up()).unwrap();
    assert_eq!(created.to_draft(), wake_up());

    let loaded = store.get(created.id).unwrap().unwrap();
    assert_eq!(loaded, created);

    let mut replacement = wake_up();
    replacement.time = "07:15".to_string();
    replacement.enabled = false;
    let updated = store.update(created.id, &replacement).unwrap().unwrap();
    assert_eq!(updated.id, created.id);
    assert_eq!(store.get(created.id).unwrap().unwrap(), updated);

    assert!(store.update(created.id + 1000, &replacement).unwrap().is_none());
    assert!(store.get(created.id + 1000).unwrap().is_none());

    assert!(store.delete(created.id).unwrap());
    assert!(!store.delete(created.id).unwrap());
    assert!(store.get(created.id).unwrap().is_none());

    let next = store.create(&wake_up()).unwrap();
    assert!(next.id > created.id, "deleted ids must not be reused");
}

fn assert_paging_contract(store: &dyn AlarmStore) {
    let mut ids = Vec::new();
    for time in ["05:00", "06:00", "07:00", "08:00", "09:00"] {
        ids.push(store.create(&AlarmDraft::new(time).unwrap()).unwrap().id);
    }

    let all = store.list(&AlarmListQuery::default()).unwrap();
    let listed: Vec<_> = all.iter().map(|alarm| alarm.id).collect();
    assert_eq!(listed, ids);

    let page = store.list(&AlarmListQuery { skip: 1, limit: 2 }).unwrap();
    let paged: Vec<_> = page.iter().map(|alarm| alarm.id).collect();
    assert_eq!(paged, ids[1..3]);

    assert!(store
        .list(&AlarmListQuery { skip: 5, limit: 10 })
        .unwrap()
        .is_empty());
    assert!(store
        .list(&AlarmListQuery { skip: 0, limit: 0 })
        .unwrap()
        .is_empty());
}

#[test]
fn sqlite_store_satisfies_contract() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteAlarmStore::try_new(&conn).unwrap();
    assert_store_contract(&store);
}

#[test]
fn memory_store_satisfies_contract() {
    assert_store_contract(&InMemoryAlarmStore::new());
}

#[test]
fn sqlite_store_pages_in_creation_order() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteAlarmStore::try_new(&conn).unwrap();
    assert_paging_contract(&store);
}

#[test]
fn memory_store_pages_in_creation_order() {
    assert_paging_contract(&InMemoryAlarmStore::new());
}

#[test]
fn sqlite_store_rejects_invalid_drafts_before_writing() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteAlarmStore::try_new(&conn).unwrap();

    let mut invalid = wake_up();
    invalid.time = "25:99".to_string();
    assert!(matches!(
        store.create(&invalid),
        Err(RepoError::Validation(_))
    ));

    let created = store.create(&wake_up()).unwrap();
    let mut invalid = wake_up();
    invalid.repeat_days = vec![9];
    assert!(matches!(
        store.update(created.id, &invalid),
        Err(RepoError::Validation(_))
    ));
    assert_eq!(store.get(created.id).unwrap().unwrap(), created);
}

#[test]
fn sqlite_store_surfaces_corrupt_rows() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteAlarmStore::try_new(&conn).unwrap();
    let created = store.create(&wake_up()).unwrap();

    conn.execute(
        "UPDATE alarms SET time = 'noon' WHERE id = ?1;",
        [created.id],
    )
    .unwrap();
    assert!(matches!(
        store.get(created.id),
        Err(RepoError::InvalidData(_))
    ));

    conn.execute(
        "UPDATE alarms SET time = '06:30', repeat_days = 'weekdays' WHERE id = ?1;",
        [created.id],
    )
    .unwrap();
    assert!(matches!(
        store.list(&AlarmListQuery::default()),
        Err(RepoError::InvalidData(_))
    ));
}

#[test]
fn sqlite_store_persists_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("alarms.db");

    let created = {
        let conn = open_db(&path).unwrap();
        let store = SqliteAlarmStore::try_new(&conn).unwrap();
        store.create(&wake_up()).unwrap()
    };

    let conn = open_db(&path).unwrap();
    let store = SqliteAlarmStore::try_new(&conn).unwrap();
    assert_eq!(store.get(created.id).unwrap().unwrap(), created);
}

#[test]
fn store_rejects_uninitialized_connection() {
    let conn = Connection::open_in_memory().unwrap();

    match SqliteAlarmStore::try_new(&conn) {
        Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version: 0,
        }) => assert_eq!(expected_version, latest_version()),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("expected uninitialized connection error"),
    }
}

#[test]
fn store_rejects_connection_without_alarms_table() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(&format!("PRAGMA user_version = {};", latest_version()))
        .unwrap();

    assert!(matches!(
        SqliteAlarmStore::try_new(&conn),
        Err(RepoError::MissingRequiredTable("alarms"))
    ));
}

#[test]
fn store_rejects_connection_missing_alarm_column() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(
        "CREATE TABLE alarms (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            time TEXT NOT NULL,
            enabled INTEGER NOT NULL
        );",
    )
    .unwrap();
    conn.execute_batch(&format!("PRAGMA user_version = {};", latest_version()))
        .unwrap();

    assert!(matches!(
        SqliteAlarmStore::try_new(&conn),
        Err(RepoError::MissingRequiredColumn {
            table: "alarms",
            column: "repeat_days"
        })
    ));
}
