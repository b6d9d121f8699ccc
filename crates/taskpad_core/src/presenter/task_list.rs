//! Home-screen presenter: the two live task views plus list intents.
//!
//! # Responsibility
//! - Expose `Loading | Error | Success` snapshots of the active and
//!   completed views.
//! - Forward favorite/complete/delete intents to the store fire-and-forget.
//!
//! # Invariants
//! - A view that reached `Success` never regresses to `Loading`.
//! - `NotFound` from a stale intent is absorbed (the store logs it), never
//!   surfaced to the shell.

use crate::model::request_state::RequestState;
use crate::model::task::Task;
use crate::store::{StoreHandle, TaskSubscription};
use log::warn;

/// Presenter for the task list screen.
///
/// The UI shell calls [`poll`](Self::poll) from its binding loop and renders
/// the returned snapshots; intents may be issued at any time.
pub struct TaskListPresenter {
    store: StoreHandle,
    active: ViewSlot,
    completed: ViewSlot,
}

impl TaskListPresenter {
    /// Subscribes to both live views; snapshots start as `Loading` until
    /// the first delivery is polled in.
    pub fn new(store: StoreHandle) -> Self {
        let active = ViewSlot::new(store.observe_active(), "active");
        let completed = ViewSlot::new(store.observe_completed(), "completed");
        Self {
            store,
            active,
            completed,
        }
    }

    /// Drains pending deliveries from both subscriptions and re-derives the
    /// exposed snapshots.
    pub fn poll(&mut self) {
        self.active.poll();
        self.completed.poll();
    }

    pub fn active_tasks(&self) -> &RequestState<Vec<Task>> {
        &self.active.state
    }

    pub fn completed_tasks(&self) -> &RequestState<Vec<Task>> {
        &self.completed.state
    }

    pub fn on_set_favorite(&self, task: &Task, value: bool) {
        self.store.set_favorite(task.id, value).detach();
    }

    pub fn on_set_completed(&self, task: &Task, value: bool) {
        self.store.set_completed(task.id, value).detach();
    }

    pub fn on_delete(&self, task: &Task) {
        self.store.delete(task.id).detach();
    }
}

struct ViewSlot {
    subscription: TaskSubscription,
    state: RequestState<Vec<Task>>,
    view: &'static str,
}

impl ViewSlot {
    fn new(subscription: TaskSubscription, view: &'static str) -> Self {
        Self {
            subscription,
            state: RequestState::Loading,
            view,
        }
    }

    fn poll(&mut self) {
        let Some(delivery) = self.subscription.poll_latest() else {
            return;
        };

        match delivery {
            Ok(items) => self.state = RequestState::Success(items),
            Err(err) if self.state.is_loading() => {
                warn!(
                    "event=view_query module=presenter status=error view={} error={err}",
                    self.view
                );
                self.state = RequestState::Error(err.to_string());
            }
            Err(err) => {
                // Past the first delivery the last good snapshot stays up.
                warn!(
                    "event=view_query module=presenter status=stale view={} error={err}",
                    self.view
                );
            }
        }
    }
}
