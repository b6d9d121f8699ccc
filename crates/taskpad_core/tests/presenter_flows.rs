use std::time::Duration;
use taskpad_core::{EditorState, TaskEditorPresenter, TaskListPresenter, TaskStore};

const DELIVERY_TIMEOUT: Duration = Duration::from_secs(5);

/// Commands are applied in arrival order, so a subscription created after
/// earlier commands observes their effects in its initial snapshot. Waiting
/// for that snapshot is a barrier for everything issued before it.
fn drain_store(store: &TaskStore) {
    store
        .observe_active()
        .wait_next(DELIVERY_TIMEOUT)
        .expect("store worker should answer")
        .expect("initial snapshot should succeed");
}

#[test]
fn list_presenter_starts_loading_then_reaches_success() {
    let store = TaskStore::open_in_memory().unwrap();
    let mut presenter = TaskListPresenter::new(store.handle());

    assert!(presenter.active_tasks().is_loading());
    assert!(presenter.completed_tasks().is_loading());

    drain_store(&store);
    presenter.poll();

    assert_eq!(presenter.active_tasks().success(), Some(&vec![]));
    assert_eq!(presenter.completed_tasks().success(), Some(&vec![]));
}

#[test]
fn list_presenter_tracks_store_mutations() {
    let store = TaskStore::open_in_memory().unwrap();
    let mut presenter = TaskListPresenter::new(store.handle());

    let task = store.create("Buy milk", "2%").wait().unwrap();
    presenter.poll();

    let active = presenter.active_tasks().success().unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].id, task.id);

    presenter.on_set_completed(&task, true);
    drain_store(&store);
    presenter.poll();

    assert_eq!(presenter.active_tasks().success(), Some(&vec![]));
    let completed = presenter.completed_tasks().success().unwrap();
    assert_eq!(completed.len(), 1);
    assert!(completed[0].completed);

    presenter.on_set_favorite(&task, true);
    drain_store(&store);
    presenter.poll();
    assert!(presenter.completed_tasks().success().unwrap()[0].favorite);

    presenter.on_delete(&task);
    drain_store(&store);
    presenter.poll();
    assert_eq!(presenter.completed_tasks().success(), Some(&vec![]));
}

#[test]
fn stale_intents_are_absorbed_without_state_change() {
    let store = TaskStore::open_in_memory().unwrap();
    let mut presenter = TaskListPresenter::new(store.handle());

    let task = store.create("soon gone", "stale target").wait().unwrap();
    presenter.on_delete(&task);
    // The UI acts on a snapshot that still shows the task.
    presenter.on_delete(&task);
    presenter.on_set_completed(&task, true);

    drain_store(&store);
    presenter.poll();

    assert_eq!(presenter.active_tasks().success(), Some(&vec![]));
    assert_eq!(presenter.completed_tasks().success(), Some(&vec![]));
}

#[test]
fn list_presenter_reports_error_when_store_is_gone() {
    let store = TaskStore::open_in_memory().unwrap();
    let handle = store.handle();
    drop(store);

    let mut presenter = TaskListPresenter::new(handle);
    presenter.poll();

    assert!(presenter.active_tasks().is_error());
    assert!(presenter.completed_tasks().is_error());
}

#[test]
fn success_state_survives_store_shutdown() {
    let store = TaskStore::open_in_memory().unwrap();
    let mut presenter = TaskListPresenter::new(store.handle());

    store.create("lasting", "snapshot").wait().unwrap();
    presenter.poll();
    assert!(presenter.active_tasks().is_success());

    drop(store);
    presenter.poll();

    // The last good snapshot stays up; no regression to Loading or Error.
    let active = presenter.active_tasks().success().unwrap();
    assert_eq!(active.len(), 1);
}

#[test]
fn editor_gates_save_on_non_blank_fields() {
    let store = TaskStore::open_in_memory().unwrap();
    let mut editor = TaskEditorPresenter::new(store.handle());

    assert!(!editor.can_save());
    assert!(!editor.save());

    editor.begin(None);
    assert_eq!(editor.state(), EditorState::Editing);
    assert!(!editor.can_save());

    editor.set_description("notes");
    assert!(!editor.can_save());

    editor.set_title("   ");
    assert!(!editor.can_save());

    editor.set_title("Buy milk");
    editor.set_description("2%");
    assert!(editor.can_save());

    editor.set_description("  \t ");
    assert!(!editor.can_save());
    assert!(!editor.save());
}

#[test]
fn editor_creates_task_on_save() {
    let store = TaskStore::open_in_memory().unwrap();
    let mut editor = TaskEditorPresenter::new(store.handle());

    editor.begin(None);
    editor.set_title("Buy milk");
    editor.set_description("2%");

    assert!(editor.save());
    assert!(editor.is_saving());
    assert!(!editor.save(), "a second dispatch while in flight is refused");

    drain_store(&store);
    editor.poll();

    assert_eq!(editor.state(), EditorState::Saved);
    let saved = editor.saved_task().unwrap();
    assert_eq!(saved.title, "Buy milk");
    assert!(!saved.completed);

    let active = store
        .observe_active()
        .wait_next(DELIVERY_TIMEOUT)
        .unwrap()
        .unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].id, saved.id);
}

#[test]
fn editor_update_preserves_untouched_flags() {
    let store = TaskStore::open_in_memory().unwrap();
    let created = store.create("draft title", "draft body").wait().unwrap();
    store.set_favorite(created.id, true).wait().unwrap();

    let current = store
        .observe_active()
        .wait_next(DELIVERY_TIMEOUT)
        .unwrap()
        .unwrap()
        .remove(0);
    assert!(current.favorite);

    let mut editor = TaskEditorPresenter::new(store.handle());
    editor.begin(Some(current));
    assert_eq!(editor.title(), "draft title");
    editor.set_title("final title");

    assert!(editor.save());
    drain_store(&store);
    editor.poll();

    assert_eq!(editor.state(), EditorState::Saved);
    let saved = editor.saved_task().unwrap();
    assert_eq!(saved.id, created.id);
    assert_eq!(saved.title, "final title");
    assert!(saved.favorite, "favorite must survive an edit session");

    let active = store
        .observe_active()
        .wait_next(DELIVERY_TIMEOUT)
        .unwrap()
        .unwrap();
    assert_eq!(active[0].title, "final title");
    assert!(active[0].favorite);
}

#[test]
fn editor_save_failure_keeps_buffer_for_retry() {
    let store = TaskStore::open_in_memory().unwrap();
    let ghost = taskpad_core::Task::new("edited after delete", "stale screen");

    let mut editor = TaskEditorPresenter::new(store.handle());
    editor.begin(Some(ghost.clone()));
    editor.set_description("new body");

    assert!(editor.save());
    drain_store(&store);
    editor.poll();

    assert_eq!(editor.state(), EditorState::Editing);
    assert!(!editor.is_saving());
    assert!(editor.last_error().unwrap().contains("not found"));
    assert_eq!(editor.title(), "edited after delete");
    assert_eq!(editor.description(), "new body");
    assert!(editor.can_save(), "the user may retry the save");
}

#[test]
fn editor_sessions_are_independent() {
    let store = TaskStore::open_in_memory().unwrap();
    let mut editor = TaskEditorPresenter::new(store.handle());

    editor.begin(None);
    editor.set_title("first");
    editor.set_description("session");
    assert!(editor.save());
    drain_store(&store);
    editor.poll();
    assert_eq!(editor.state(), EditorState::Saved);

    editor.begin(None);
    assert_eq!(editor.state(), EditorState::Editing);
    assert_eq!(editor.title(), "");
    assert_eq!(editor.description(), "");
    assert!(editor.last_error().is_none());

    editor.discard();
    assert_eq!(editor.state(), EditorState::Idle);
}
