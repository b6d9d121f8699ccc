//! Store worker: command loop over the owned connection.
//!
//! # Responsibility
//! - Apply commands strictly in arrival order.
//! - Push fresh view snapshots to subscribers after every successful commit,
//!   before acknowledging the caller.
//!
//! # Invariants
//! - The connection never leaves this thread.
//! - `NotFound` outcomes are logged even when the caller has detached.

use super::subscription::SubscriberRegistry;
use super::{StoreError, StoreResult};
use crate::model::task::{Task, TaskId};
use crate::repo::task_repo::{SqliteTaskRepository, TaskFilter, TaskRepository};
use log::{debug, error, info, warn};
use rusqlite::Connection;
use std::sync::mpsc::{Receiver, Sender};

pub(super) enum Command {
    Create {
        title: String,
        description: String,
        done: Sender<StoreResult<Task>>,
    },
    Update {
        task: Task,
        done: Sender<StoreResult<Task>>,
    },
    SetFavorite {
        id: TaskId,
        value: bool,
        done: Sender<StoreResult<()>>,
    },
    SetCompleted {
        id: TaskId,
        value: bool,
        done: Sender<StoreResult<()>>,
    },
    Delete {
        id: TaskId,
        done: Sender<StoreResult<()>>,
    },
    Subscribe {
        filter: TaskFilter,
        snapshots: Sender<StoreResult<Vec<Task>>>,
    },
    Shutdown,
}

pub(super) fn run(
    conn: Connection,
    commands: Receiver<Command>,
    ready: Sender<StoreResult<()>>,
) {
    let repo = match SqliteTaskRepository::try_new(&conn) {
        Ok(repo) => {
            let _ = ready.send(Ok(()));
            repo
        }
        Err(err) => {
            let _ = ready.send(Err(err.into()));
            return;
        }
    };

    let mut subscribers = SubscriberRegistry::new();

    while let Ok(command) = commands.recv() {
        match command {
            Command::Shutdown => break,
            Command::Subscribe { filter, snapshots } => {
                handle_subscribe(&repo, &mut subscribers, filter, snapshots);
            }
            Command::Create {
                title,
                description,
                done,
            } => {
                let outcome = repo
                    .create_task(&title, &description)
                    .map_err(StoreError::from);
                finish(&repo, &mut subscribers, "create", outcome, done);
            }
            Command::Update { task, done } => {
                let outcome = repo
                    .update_task(&task)
                    .map(|()| task)
                    .map_err(StoreError::from);
                finish(&repo, &mut subscribers, "update", outcome, done);
            }
            Command::SetFavorite { id, value, done } => {
                let outcome = repo.set_favorite(id, value).map_err(StoreError::from);
                finish(&repo, &mut subscribers, "set_favorite", outcome, done);
            }
            Command::SetCompleted { id, value, done } => {
                let outcome = repo.set_completed(id, value).map_err(StoreError::from);
                finish(&repo, &mut subscribers, "set_completed", outcome, done);
            }
            Command::Delete { id, done } => {
                let outcome = repo.delete_task(id).map_err(StoreError::from);
                finish(&repo, &mut subscribers, "delete", outcome, done);
            }
        }
    }

    info!("event=store_close module=store status=ok");
}

fn handle_subscribe(
    repo: &SqliteTaskRepository<'_>,
    subscribers: &mut SubscriberRegistry,
    filter: TaskFilter,
    snapshots: Sender<StoreResult<Vec<Task>>>,
) {
    let view = view_name(filter);
    let initial = repo.list_tasks(filter).map_err(StoreError::from);
    let established = initial.is_ok();

    if snapshots.send(initial).is_err() {
        debug!("event=store_subscribe module=store status=noop view={view} reason=receiver_gone");
        return;
    }

    if established {
        subscribers.register(filter, snapshots);
        info!(
            "event=store_subscribe module=store status=ok view={view} subscribers={}",
            subscribers.len()
        );
    } else {
        // The failure was already delivered as the initial snapshot; a
        // subscription that never produced data is not kept live.
        warn!("event=store_subscribe module=store status=error view={view}");
    }
}

fn finish<T>(
    repo: &SqliteTaskRepository<'_>,
    subscribers: &mut SubscriberRegistry,
    op: &str,
    outcome: StoreResult<T>,
    done: Sender<StoreResult<T>>,
) {
    match &outcome {
        Ok(_) => {
            debug!("event=store_mutation module=store op={op} status=ok");
            subscribers.broadcast(repo);
        }
        // Stale ids from an already-converged UI are expected; keep them
        // visible in the log without failing anything upstream.
        Err(StoreError::NotFound(id)) => {
            info!("event=store_mutation module=store op={op} status=noop reason=not_found id={id}");
        }
        Err(err) => {
            error!("event=store_mutation module=store op={op} status=error error={err}");
        }
    }

    let _ = done.send(outcome);
}

fn view_name(filter: TaskFilter) -> &'static str {
    match filter {
        TaskFilter::All => "all",
        TaskFilter::Active => "active",
        TaskFilter::Completed => "completed",
    }
}
