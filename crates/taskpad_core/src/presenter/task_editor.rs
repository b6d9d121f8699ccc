//! Editor presenter: one create-or-edit session at a time.
//!
//! # Responsibility
//! - Hold the in-progress title/description buffer for a single task.
//! - Commit an add-or-update to the store on save.
//!
//! # Invariants
//! - `save` is refused while either buffered field is blank.
//! - A session ends in `Saved` or is discarded back to `Idle`; a new
//!   `begin` always starts a fresh session.
//! - Save failures keep the buffer intact so the shell can offer retry.

use crate::model::task::Task;
use crate::store::{Pending, StoreHandle};
use log::{debug, warn};

/// Observable lifecycle of the editing session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorState {
    Idle,
    Editing,
    Saved,
}

/// Presenter for the task editor screen.
pub struct TaskEditorPresenter {
    store: StoreHandle,
    session: Session,
}

enum Session {
    Idle,
    Editing(EditBuffer),
    Saved(Task),
}

struct EditBuffer {
    /// Present in edit mode; `None` means the session creates a new task.
    original: Option<Task>,
    title: String,
    description: String,
    pending: Option<Pending<Task>>,
    last_error: Option<String>,
}

impl TaskEditorPresenter {
    pub fn new(store: StoreHandle) -> Self {
        Self {
            store,
            session: Session::Idle,
        }
    }

    /// Starts a fresh session, editing `existing` or creating a new task.
    ///
    /// In edit mode the original record is retained in full, so flags the
    /// editor does not touch (`favorite`, `completed`) survive the save.
    pub fn begin(&mut self, existing: Option<Task>) {
        let mode = if existing.is_some() { "edit" } else { "create" };
        debug!("event=editor_begin module=presenter mode={mode}");

        let (title, description) = existing
            .as_ref()
            .map(|task| (task.title.clone(), task.description.clone()))
            .unwrap_or_default();

        self.session = Session::Editing(EditBuffer {
            original: existing,
            title,
            description,
            pending: None,
            last_error: None,
        });
    }

    pub fn set_title(&mut self, text: impl Into<String>) {
        if let Session::Editing(buffer) = &mut self.session {
            buffer.title = text.into();
        }
    }

    pub fn set_description(&mut self, text: impl Into<String>) {
        if let Session::Editing(buffer) = &mut self.session {
            buffer.description = text.into();
        }
    }

    pub fn title(&self) -> &str {
        match &self.session {
            Session::Editing(buffer) => &buffer.title,
            _ => "",
        }
    }

    pub fn description(&self) -> &str {
        match &self.session {
            Session::Editing(buffer) => &buffer.description,
            _ => "",
        }
    }

    /// True iff a session is active and both fields are non-blank after
    /// trimming whitespace. This is the only validation in the system.
    pub fn can_save(&self) -> bool {
        match &self.session {
            Session::Editing(buffer) => {
                !buffer.title.trim().is_empty() && !buffer.description.trim().is_empty()
            }
            _ => false,
        }
    }

    /// Dispatches the buffered fields to the store.
    ///
    /// Returns `false` without dispatching when no session is active, a
    /// save is already in flight, or `can_save()` is false. The outcome is
    /// observed through [`poll`](Self::poll).
    pub fn save(&mut self) -> bool {
        if !self.can_save() {
            return false;
        }
        let Session::Editing(buffer) = &mut self.session else {
            return false;
        };
        if buffer.pending.is_some() {
            return false;
        }

        buffer.last_error = None;
        let pending = match &buffer.original {
            Some(original) => {
                let mut task = original.clone();
                task.title = buffer.title.clone();
                task.description = buffer.description.clone();
                self.store.update(task)
            }
            None => self
                .store
                .create(buffer.title.clone(), buffer.description.clone()),
        };
        buffer.pending = Some(pending);
        true
    }

    /// Drains the in-flight save outcome, if any.
    ///
    /// On success the session transitions to `Saved`; on failure it stays
    /// `Editing` with [`last_error`](Self::last_error) set.
    pub fn poll(&mut self) {
        let outcome = match &mut self.session {
            Session::Editing(buffer) => buffer.pending.as_mut().and_then(Pending::try_take),
            _ => None,
        };

        match outcome {
            Some(Ok(task)) => {
                debug!("event=editor_save module=presenter status=ok id={}", task.id);
                self.session = Session::Saved(task);
            }
            Some(Err(err)) => {
                warn!("event=editor_save module=presenter status=error error={err}");
                if let Session::Editing(buffer) = &mut self.session {
                    buffer.pending = None;
                    buffer.last_error = Some(err.to_string());
                }
            }
            None => {}
        }
    }

    /// Abandons the current session without touching the store.
    pub fn discard(&mut self) {
        self.session = Session::Idle;
    }

    pub fn state(&self) -> EditorState {
        match &self.session {
            Session::Idle => EditorState::Idle,
            Session::Editing(_) => EditorState::Editing,
            Session::Saved(_) => EditorState::Saved,
        }
    }

    pub fn is_saving(&self) -> bool {
        matches!(&self.session, Session::Editing(buffer) if buffer.pending.is_some())
    }

    pub fn last_error(&self) -> Option<&str> {
        match &self.session {
            Session::Editing(buffer) => buffer.last_error.as_deref(),
            _ => None,
        }
    }

    /// The committed record once the session reached `Saved`.
    pub fn saved_task(&self) -> Option<&Task> {
        match &self.session {
            Session::Saved(task) => Some(task),
            _ => None,
        }
    }
}
