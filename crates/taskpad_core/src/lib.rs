//! Core domain logic for TaskPad.
//! This crate is the single source of truth for task state and its
//! observable views; UI shells stay purely presentational.

pub mod db;
pub mod logging;
pub mod model;
pub mod presenter;
pub mod repo;
pub mod store;

pub use logging::{default_log_level, init_logging, logging_status};
pub use model::request_state::RequestState;
pub use model::task::{Task, TaskId};
pub use presenter::task_editor::{EditorState, TaskEditorPresenter};
pub use presenter::task_list::TaskListPresenter;
pub use repo::task_repo::{
    RepoError, RepoResult, SqliteTaskRepository, TaskFilter, TaskRepository,
};
pub use store::{Pending, StoreError, StoreHandle, StoreResult, TaskStore, TaskSubscription};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
