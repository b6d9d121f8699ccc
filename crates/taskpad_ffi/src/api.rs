//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose stable, use-case-level functions to Dart via FRB.
//! - Keep error semantics simple for the UI shell.
//!
//! # Invariants
//! - Exported functions must not panic across the FFI boundary.
//! - Store mutations fail with a message instead of throwing; the shell
//!   decides whether to retry.

use log::info;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Duration;
use taskpad_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, ping as ping_inner,
    StoreError, Task, TaskStore,
};
use uuid::Uuid;

const STORE_DB_FILE_NAME: &str = "taskpad.sqlite3";
const SNAPSHOT_TIMEOUT: Duration = Duration::from_secs(5);

static STORE_STATE: OnceLock<StoreState> = OnceLock::new();

struct StoreState {
    db_dir: PathBuf,
    store: TaskStore,
}

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Sync call; may perform small file-system setup work.
/// - Safe to call repeatedly with the same `level + log_dir` (idempotent).
/// - Never panics; returns empty string on success and error message on
///   failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// Opens the process-wide task store under `db_dir`.
///
/// # FFI contract
/// - Sync call; opens the database and starts the store worker.
/// - Safe to call repeatedly with the same `db_dir` (idempotent).
/// - Re-initialization with a different directory returns an error message.
/// - Never panics; returns empty string on success.
#[flutter_rust_bridge::frb(sync)]
pub fn init_store(db_dir: String) -> String {
    let trimmed = db_dir.trim();
    if trimmed.is_empty() {
        return "db_dir cannot be empty".to_string();
    }
    let dir = PathBuf::from(trimmed);

    if let Some(state) = STORE_STATE.get() {
        return confirm_same_dir(state, &dir);
    }

    if let Err(err) = std::fs::create_dir_all(&dir) {
        return format!("failed to create store directory `{}`: {err}", dir.display());
    }
    let store = match TaskStore::open(dir.join(STORE_DB_FILE_NAME)) {
        Ok(store) => store,
        Err(err) => return err.to_string(),
    };

    match STORE_STATE.set(StoreState {
        db_dir: dir.clone(),
        store,
    }) {
        Ok(()) => {
            info!(
                "event=ffi_store_init module=ffi status=ok db_dir={}",
                dir.display()
            );
            String::new()
        }
        // Lost an init race; the winner's state decides.
        Err(_) => match STORE_STATE.get() {
            Some(state) => confirm_same_dir(state, &dir),
            None => "store initialization raced and failed".to_string(),
        },
    }
}

fn confirm_same_dir(state: &StoreState, dir: &Path) -> String {
    if state.db_dir == dir {
        String::new()
    } else {
        format!(
            "store already initialized at `{}`; refusing to switch to `{}`",
            state.db_dir.display(),
            dir.display()
        )
    }
}

/// One task row crossing the FFI boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskItem {
    /// Stable task ID in string form.
    pub id: String,
    pub title: String,
    pub description: String,
    pub favorite: bool,
    pub completed: bool,
}

impl From<Task> for TaskItem {
    fn from(task: Task) -> Self {
        Self {
            id: task.id.to_string(),
            title: task.title,
            description: task.description,
            favorite: task.favorite,
            completed: task.completed,
        }
    }
}

/// Generic action response envelope for task mutations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskActionResponse {
    /// Whether the operation succeeded.
    pub ok: bool,
    /// ID of the affected task, when known.
    pub task_id: Option<String>,
    /// Human-readable response message for diagnostics/UI.
    pub message: String,
}

impl TaskActionResponse {
    fn success(message: impl Into<String>, task_id: String) -> Self {
        Self {
            ok: true,
            task_id: Some(task_id),
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            task_id: None,
            message: message.into(),
        }
    }
}

/// List response envelope for the two live views.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskListResponse {
    /// Current matching set; empty on failure.
    pub items: Vec<TaskItem>,
    /// Whether the snapshot was produced successfully.
    pub ok: bool,
    /// Human-readable response message for diagnostics/UI.
    pub message: String,
}

/// Creates a new task with default flags.
///
/// # FFI contract
/// - Sync call; blocks until the store worker committed the row.
/// - Never panics; failures are reported in the envelope.
#[flutter_rust_bridge::frb(sync)]
pub fn task_add(title: String, description: String) -> TaskActionResponse {
    let store = match active_store() {
        Ok(store) => store,
        Err(message) => return TaskActionResponse::failure(message),
    };

    match store.create(title, description).wait() {
        Ok(task) => TaskActionResponse::success("task created", task.id.to_string()),
        Err(err) => TaskActionResponse::failure(err.to_string()),
    }
}

/// Replaces the full record identified by `id`.
///
/// # FFI contract
/// - Sync call; blocks until the store worker committed the row.
/// - `NotFound` is reported in the envelope so the shell can refresh.
#[flutter_rust_bridge::frb(sync)]
pub fn task_update(
    id: String,
    title: String,
    description: String,
    favorite: bool,
    completed: bool,
) -> TaskActionResponse {
    with_task_id(&id, |store, task_id| {
        let task = Task {
            id: task_id,
            title,
            description,
            favorite,
            completed,
        };
        store.update(task).wait().map(|_| ())
    })
}

/// Sets the `favorite` flag of one task.
#[flutter_rust_bridge::frb(sync)]
pub fn task_set_favorite(id: String, value: bool) -> TaskActionResponse {
    with_task_id(&id, |store, task_id| store.set_favorite(task_id, value).wait())
}

/// Sets the `completed` flag of one task, moving it between the active and
/// completed views.
#[flutter_rust_bridge::frb(sync)]
pub fn task_set_completed(id: String, value: bool) -> TaskActionResponse {
    with_task_id(&id, |store, task_id| store.set_completed(task_id, value).wait())
}

/// Permanently deletes one task.
#[flutter_rust_bridge::frb(sync)]
pub fn task_delete(id: String) -> TaskActionResponse {
    with_task_id(&id, |store, task_id| store.delete(task_id).wait())
}

/// Returns the current active (not completed) tasks.
///
/// # FFI contract
/// - Sync call; blocks until the store worker answered.
/// - Never panics; failures yield an empty list plus a message.
#[flutter_rust_bridge::frb(sync)]
pub fn tasks_active() -> TaskListResponse {
    snapshot_response(|store| store.observe_active())
}

/// Returns the current completed tasks.
///
/// # FFI contract
/// - Sync call; blocks until the store worker answered.
/// - Never panics; failures yield an empty list plus a message.
#[flutter_rust_bridge::frb(sync)]
pub fn tasks_completed() -> TaskListResponse {
    snapshot_response(|store| store.observe_completed())
}

fn active_store() -> Result<&'static TaskStore, String> {
    STORE_STATE
        .get()
        .map(|state| &state.store)
        .ok_or_else(|| "store not initialized; call init_store first".to_string())
}

fn with_task_id(
    id: &str,
    operation: impl FnOnce(&TaskStore, taskpad_core::TaskId) -> Result<(), StoreError>,
) -> TaskActionResponse {
    let store = match active_store() {
        Ok(store) => store,
        Err(message) => return TaskActionResponse::failure(message),
    };
    let task_id = match Uuid::parse_str(id) {
        Ok(task_id) => task_id,
        Err(_) => return TaskActionResponse::failure(format!("invalid task id `{id}`")),
    };

    match operation(store, task_id) {
        Ok(()) => TaskActionResponse::success("task updated", task_id.to_string()),
        Err(err) => TaskActionResponse::failure(err.to_string()),
    }
}

fn snapshot_response(
    observe: impl FnOnce(&TaskStore) -> taskpad_core::TaskSubscription,
) -> TaskListResponse {
    let store = match active_store() {
        Ok(store) => store,
        Err(message) => {
            return TaskListResponse {
                items: Vec::new(),
                ok: false,
                message,
            }
        }
    };

    match observe(store).wait_next(SNAPSHOT_TIMEOUT) {
        Some(Ok(tasks)) => TaskListResponse {
            items: tasks.into_iter().map(TaskItem::from).collect(),
            ok: true,
            message: "ok".to_string(),
        },
        Some(Err(err)) => TaskListResponse {
            items: Vec::new(),
            ok: false,
            message: err.to_string(),
        },
        None => TaskListResponse {
            items: Vec::new(),
            ok: false,
            message: "timed out waiting for store snapshot".to_string(),
        },
    }
}
