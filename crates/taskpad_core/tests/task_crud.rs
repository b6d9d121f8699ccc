use std::collections::HashSet;
use taskpad_core::db::migrations::latest_version;
use taskpad_core::db::open_db_in_memory;
use taskpad_core::{RepoError, SqliteTaskRepository, Task, TaskFilter, TaskRepository};
use rusqlite::Connection;
use uuid::Uuid;

#[test]
fn create_and_get_roundtrip() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTaskRepository::try_new(&conn).unwrap();

    let created = repo.create_task("Buy milk", "2%").unwrap();

    let loaded = repo.get_task(created.id).unwrap().unwrap();
    assert_eq!(loaded, created);
    assert!(!loaded.favorite);
    assert!(!loaded.completed);
}

#[test]
fn create_allows_empty_strings() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTaskRepository::try_new(&conn).unwrap();

    let created = repo.create_task("", "").unwrap();
    let loaded = repo.get_task(created.id).unwrap().unwrap();
    assert_eq!(loaded.title, "");
    assert_eq!(loaded.description, "");
}

#[test]
fn created_ids_are_unique() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTaskRepository::try_new(&conn).unwrap();

    let ids: HashSet<_> = (0..8)
        .map(|n| repo.create_task(&format!("task {n}"), "dup check").unwrap().id)
        .collect();
    assert_eq!(ids.len(), 8);
}

#[test]
fn update_replaces_full_record() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTaskRepository::try_new(&conn).unwrap();

    let mut task = repo.create_task("draft", "first pass").unwrap();
    task.title = "final".to_string();
    task.description = "second pass".to_string();
    task.favorite = true;
    repo.update_task(&task).unwrap();

    let loaded = repo.get_task(task.id).unwrap().unwrap();
    assert_eq!(loaded, task);
}

#[test]
fn update_not_found_returns_not_found() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTaskRepository::try_new(&conn).unwrap();

    let ghost = Task::new("missing", "never stored");
    let err = repo.update_task(&ghost).unwrap_err();
    assert!(matches!(err, RepoError::NotFound(id) if id == ghost.id));
}

#[test]
fn flag_toggles_are_idempotent() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTaskRepository::try_new(&conn).unwrap();

    let task = repo.create_task("toggle me", "twice").unwrap();

    repo.set_completed(task.id, true).unwrap();
    let after_first = repo.get_task(task.id).unwrap().unwrap();
    repo.set_completed(task.id, true).unwrap();
    let after_second = repo.get_task(task.id).unwrap().unwrap();

    assert!(after_first.completed);
    assert_eq!(after_first, after_second);

    repo.set_favorite(task.id, true).unwrap();
    repo.set_favorite(task.id, true).unwrap();
    assert!(repo.get_task(task.id).unwrap().unwrap().favorite);
}

#[test]
fn delete_is_final_for_every_mutation() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTaskRepository::try_new(&conn).unwrap();

    let task = repo.create_task("short lived", "gone soon").unwrap();
    repo.delete_task(task.id).unwrap();

    assert!(repo.get_task(task.id).unwrap().is_none());
    assert!(matches!(
        repo.update_task(&task).unwrap_err(),
        RepoError::NotFound(_)
    ));
    assert!(matches!(
        repo.set_favorite(task.id, true).unwrap_err(),
        RepoError::NotFound(_)
    ));
    assert!(matches!(
        repo.set_completed(task.id, true).unwrap_err(),
        RepoError::NotFound(_)
    ));
    assert!(matches!(
        repo.delete_task(task.id).unwrap_err(),
        RepoError::NotFound(_)
    ));
}

#[test]
fn list_filters_partition_the_collection() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTaskRepository::try_new(&conn).unwrap();

    let kept = repo.create_task("still open", "a").unwrap();
    let done = repo.create_task("finished", "b").unwrap();
    repo.set_completed(done.id, true).unwrap();

    let all: HashSet<_> = repo
        .list_tasks(TaskFilter::All)
        .unwrap()
        .into_iter()
        .map(|t| t.id)
        .collect();
    let active: HashSet<_> = repo
        .list_tasks(TaskFilter::Active)
        .unwrap()
        .into_iter()
        .map(|t| t.id)
        .collect();
    let completed: HashSet<_> = repo
        .list_tasks(TaskFilter::Completed)
        .unwrap()
        .into_iter()
        .map(|t| t.id)
        .collect();

    assert_eq!(active, HashSet::from([kept.id]));
    assert_eq!(completed, HashSet::from([done.id]));
    assert!(active.is_disjoint(&completed));
    assert_eq!(
        all,
        active.union(&completed).copied().collect::<HashSet<_>>()
    );
}

#[test]
fn repository_rejects_uninitialized_connection() {
    let conn = Connection::open_in_memory().unwrap();

    let result = SqliteTaskRepository::try_new(&conn);
    match result {
        Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version: 0,
        }) => assert!(expected_version > 0),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("expected uninitialized connection error"),
    }
}

#[test]
fn repository_rejects_connection_without_required_tasks_table() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(&format!("PRAGMA user_version = {};", latest_version()))
        .unwrap();

    let result = SqliteTaskRepository::try_new(&conn);
    assert!(matches!(
        result,
        Err(RepoError::MissingRequiredTable("tasks"))
    ));
}

#[test]
fn repository_rejects_connection_missing_required_tasks_column() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(
        "CREATE TABLE tasks (
            uuid TEXT PRIMARY KEY NOT NULL,
            title TEXT NOT NULL DEFAULT '',
            description TEXT NOT NULL DEFAULT '',
            completed INTEGER NOT NULL DEFAULT 0
        );",
    )
    .unwrap();
    conn.execute_batch(&format!("PRAGMA user_version = {};", latest_version()))
        .unwrap();

    let result = SqliteTaskRepository::try_new(&conn);
    assert!(matches!(
        result,
        Err(RepoError::MissingRequiredColumn {
            table: "tasks",
            column: "favorite"
        })
    ));
}

#[test]
fn rows_with_corrupt_flags_are_rejected_on_read() {
    let conn = open_db_in_memory().unwrap();
    conn.execute(
        "INSERT INTO tasks (uuid, title, description, favorite, completed)
         VALUES (?1, 'bad row', '', 7, 0);",
        [Uuid::new_v4().to_string()],
    )
    .unwrap();

    let repo = SqliteTaskRepository::try_new(&conn).unwrap();
    let err = repo.list_tasks(TaskFilter::All).unwrap_err();
    assert!(matches!(err, RepoError::InvalidData(_)));
}
