//! Live-query subscriptions and the worker-side subscriber registry.
//!
//! # Responsibility
//! - Deliver an always-current snapshot of one membership filter to each
//!   subscriber, starting with the state at subscribe time.
//! - Prune subscribers whose receiving end has been dropped.
//!
//! # Invariants
//! - Snapshots for one subscriber arrive in commit order.
//! - A subscriber that stops polling never blocks the worker.

use super::{StoreError, StoreResult};
use crate::model::task::Task;
use crate::repo::task_repo::{TaskFilter, TaskRepository};
use std::cell::Cell;
use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::time::Duration;

/// Receiving end of a live view.
///
/// Dropping the subscription tears it down; the worker notices on its next
/// delivery attempt and forgets the subscriber.
pub struct TaskSubscription {
    rx: Receiver<StoreResult<Vec<Task>>>,
    gone_reported: Cell<bool>,
}

impl TaskSubscription {
    pub(super) fn new(rx: Receiver<StoreResult<Vec<Task>>>) -> Self {
        Self {
            rx,
            gone_reported: Cell::new(false),
        }
    }

    /// Drains every queued delivery and returns the most recent one.
    ///
    /// Returns `None` when nothing new arrived since the last call. A dead
    /// worker is reported as `Unavailable` exactly once.
    pub fn poll_latest(&self) -> Option<StoreResult<Vec<Task>>> {
        let mut latest = None;
        loop {
            match self.rx.try_recv() {
                Ok(delivery) => latest = Some(delivery),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    if latest.is_none() && !self.gone_reported.replace(true) {
                        return Some(Err(StoreError::worker_gone()));
                    }
                    break;
                }
            }
        }
        latest
    }

    /// Blocks for the next delivery, up to `timeout`.
    ///
    /// Returns `None` on timeout; a dead worker is reported as
    /// `Unavailable` exactly once.
    pub fn wait_next(&self, timeout: Duration) -> Option<StoreResult<Vec<Task>>> {
        match self.rx.recv_timeout(timeout) {
            Ok(delivery) => Some(delivery),
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => {
                if self.gone_reported.replace(true) {
                    None
                } else {
                    Some(Err(StoreError::worker_gone()))
                }
            }
        }
    }
}

struct Subscriber {
    filter: TaskFilter,
    snapshots: Sender<StoreResult<Vec<Task>>>,
}

/// Worker-owned registry of live subscribers.
pub(super) struct SubscriberRegistry {
    subscribers: Vec<Subscriber>,
}

impl SubscriberRegistry {
    pub(super) fn new() -> Self {
        Self {
            subscribers: Vec::new(),
        }
    }

    pub(super) fn register(
        &mut self,
        filter: TaskFilter,
        snapshots: Sender<StoreResult<Vec<Task>>>,
    ) {
        self.subscribers.push(Subscriber { filter, snapshots });
    }

    pub(super) fn len(&self) -> usize {
        self.subscribers.len()
    }

    /// Re-evaluates every registered filter and pushes fresh snapshots.
    ///
    /// Subscribers whose channel is disconnected are dropped here.
    pub(super) fn broadcast<R: TaskRepository>(&mut self, repo: &R) {
        self.subscribers.retain(|subscriber| {
            let snapshot = repo.list_tasks(subscriber.filter).map_err(StoreError::from);
            subscriber.snapshots.send(snapshot).is_ok()
        });
    }
}
