//! Task store: sole owner of durable task state.
//!
//! # Responsibility
//! - Serialize every mutation on one dedicated worker thread owning the
//!   SQLite connection.
//! - Push live active/completed snapshots to subscribers after every commit.
//!
//! # Invariants
//! - Mutations issued against the same record apply in issuance order.
//! - A dispatched mutation always runs to completion, even when the caller
//!   detaches from its outcome.
//! - Subscribers always receive the final state after a burst of mutations.

use crate::db::open_db;
use crate::model::task::{Task, TaskId};
use crate::repo::task_repo::{RepoError, TaskFilter};
use log::{error, info};
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;
use std::sync::mpsc::{channel, Receiver, Sender, TryRecvError};
use std::thread::JoinHandle;

mod subscription;
mod worker;

pub use subscription::TaskSubscription;

use worker::Command;

pub type StoreResult<T> = Result<T, StoreError>;

/// Store-level error surfaced to presenters and the FFI layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A mutating operation referenced an id absent from the store.
    NotFound(TaskId),
    /// The database failed to open, the worker is gone, or storage failed.
    Unavailable(String),
}

impl StoreError {
    fn worker_gone() -> Self {
        Self::Unavailable("task store worker is gone".to_string())
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(id) => write!(f, "task not found: {id}"),
            Self::Unavailable(message) => write!(f, "task store unavailable: {message}"),
        }
    }
}

impl Error for StoreError {}

impl From<RepoError> for StoreError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::NotFound(id),
            other => Self::Unavailable(other.to_string()),
        }
    }
}

/// One-shot completion of a dispatched mutation.
///
/// Dropping it detaches the caller: the worker still runs the command to
/// completion and logs the outcome.
pub struct Pending<T> {
    rx: Receiver<StoreResult<T>>,
}

impl<T> Pending<T> {
    /// Blocks until the worker has committed or rejected the mutation.
    pub fn wait(self) -> StoreResult<T> {
        self.rx
            .recv()
            .unwrap_or_else(|_| Err(StoreError::worker_gone()))
    }

    /// Polls for the outcome without blocking.
    pub fn try_take(&mut self) -> Option<StoreResult<T>> {
        match self.rx.try_recv() {
            Ok(outcome) => Some(outcome),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(StoreError::worker_gone())),
        }
    }

    /// Explicit fire-and-forget marker.
    pub fn detach(self) {}
}

/// Cheaply cloneable handle to a running store worker.
///
/// Handles are injected into presenters at construction time; the worker
/// stays up as long as the owning [`TaskStore`] lives.
#[derive(Clone)]
pub struct StoreHandle {
    tx: Sender<Command>,
}

impl StoreHandle {
    /// Persists a new task with default flags; never fails for valid
    /// strings (empty strings are allowed).
    pub fn create(
        &self,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Pending<Task> {
        let (done, rx) = channel();
        let _ = self.tx.send(Command::Create {
            title: title.into(),
            description: description.into(),
            done,
        });
        Pending { rx }
    }

    /// Full-record replace identified by `task.id`; completes with
    /// `NotFound` when the id no longer exists.
    pub fn update(&self, task: Task) -> Pending<Task> {
        let (done, rx) = channel();
        let _ = self.tx.send(Command::Update { task, done });
        Pending { rx }
    }

    pub fn set_favorite(&self, id: TaskId, value: bool) -> Pending<()> {
        let (done, rx) = channel();
        let _ = self.tx.send(Command::SetFavorite { id, value, done });
        Pending { rx }
    }

    pub fn set_completed(&self, id: TaskId, value: bool) -> Pending<()> {
        let (done, rx) = channel();
        let _ = self.tx.send(Command::SetCompleted { id, value, done });
        Pending { rx }
    }

    /// Permanent removal; completes with `NotFound` when already gone.
    pub fn delete(&self, id: TaskId) -> Pending<()> {
        let (done, rx) = channel();
        let _ = self.tx.send(Command::Delete { id, done });
        Pending { rx }
    }

    /// Live view of tasks with `completed == false`.
    pub fn observe_active(&self) -> TaskSubscription {
        self.subscribe(TaskFilter::Active)
    }

    /// Live view of tasks with `completed == true`.
    pub fn observe_completed(&self) -> TaskSubscription {
        self.subscribe(TaskFilter::Completed)
    }

    fn subscribe(&self, filter: TaskFilter) -> TaskSubscription {
        let (snapshots, rx) = channel();
        let _ = self.tx.send(Command::Subscribe { filter, snapshots });
        TaskSubscription::new(rx)
    }
}

/// Running store: worker thread plus the handle used to reach it.
///
/// Dropping the store shuts the worker down; commands enqueued by surviving
/// handles after that complete with `Unavailable`.
pub struct TaskStore {
    handle: StoreHandle,
    worker: Option<JoinHandle<()>>,
}

impl TaskStore {
    /// Opens (or creates) a task database file and starts the worker.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let conn = open_db(path).map_err(|err| StoreError::Unavailable(err.to_string()))?;
        Self::start(conn)
    }

    /// Starts a store over a fresh in-memory database.
    pub fn open_in_memory() -> StoreResult<Self> {
        let conn =
            crate::db::open_db_in_memory().map_err(|err| StoreError::Unavailable(err.to_string()))?;
        Self::start(conn)
    }

    fn start(conn: Connection) -> StoreResult<Self> {
        let (tx, commands) = channel();
        let (ready_tx, ready_rx) = channel();

        let worker = std::thread::Builder::new()
            .name("taskpad-store".to_string())
            .spawn(move || worker::run(conn, commands, ready_tx))
            .map_err(|err| {
                StoreError::Unavailable(format!("failed to spawn store worker: {err}"))
            })?;

        match ready_rx.recv() {
            Ok(Ok(())) => {
                info!("event=store_open module=store status=ok");
                Ok(Self {
                    handle: StoreHandle { tx },
                    worker: Some(worker),
                })
            }
            Ok(Err(err)) => {
                error!("event=store_open module=store status=error error={err}");
                let _ = worker.join();
                Err(err)
            }
            Err(_) => {
                error!("event=store_open module=store status=error error=worker_exited");
                let _ = worker.join();
                Err(StoreError::worker_gone())
            }
        }
    }

    /// Returns a handle suitable for constructor injection into presenters.
    pub fn handle(&self) -> StoreHandle {
        self.handle.clone()
    }

    pub fn create(
        &self,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Pending<Task> {
        self.handle.create(title, description)
    }

    pub fn update(&self, task: Task) -> Pending<Task> {
        self.handle.update(task)
    }

    pub fn set_favorite(&self, id: TaskId, value: bool) -> Pending<()> {
        self.handle.set_favorite(id, value)
    }

    pub fn set_completed(&self, id: TaskId, value: bool) -> Pending<()> {
        self.handle.set_completed(id, value)
    }

    pub fn delete(&self, id: TaskId) -> Pending<()> {
        self.handle.delete(id)
    }

    pub fn observe_active(&self) -> TaskSubscription {
        self.handle.observe_active()
    }

    pub fn observe_completed(&self) -> TaskSubscription {
        self.handle.observe_completed()
    }
}

impl Drop for TaskStore {
    fn drop(&mut self) {
        let _ = self.handle.tx.send(Command::Shutdown);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}
