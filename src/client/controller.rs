use std::{fmt, str::FromStr};

use super::http::TodoApi;
use super::state::{reduce, Notification, SortOptions, TodoEvent, TodoState, ViewFilter};
use crate::api::dtos::todo::{CreateTodoDTO, UpdateTodoDTO};
use crate::errors::TodoError;
use crate::models::todo_model::{Todo, TodoId};

/// How the local list is reconciled after a successful mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationPolicy {
    /// Apply the server's answer to the local list without a round trip
    Optimistic,
    /// Fetch the current view again
    RefetchOnMutation,
}

impl MutationPolicy {
    /// Policy named by `TODO_MUTATION_POLICY`, `Optimistic` when unset
    pub fn from_env() -> Self {
        match std::env::var("TODO_MUTATION_POLICY") {
            Ok(raw) => raw.parse().unwrap_or_else(|e| {
                log::warn!("{}, using optimistic", e);
                MutationPolicy::Optimistic
            }),
            Err(_) => MutationPolicy::Optimistic,
        }
    }
}

impl Default for MutationPolicy {
    fn default() -> Self {
        MutationPolicy::Optimistic
    }
}

impl fmt::Display for MutationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MutationPolicy::Optimistic => f.write_str("optimistic"),
            MutationPolicy::RefetchOnMutation => f.write_str("refetch"),
        }
    }
}

impl FromStr for MutationPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "optimistic" => Ok(MutationPolicy::Optimistic),
            "refetch" => Ok(MutationPolicy::RefetchOnMutation),
            other => Err(format!("unknown mutation policy '{}'", other)),
        }
    }
}

/// Drives a `TodoApi` and keeps a `TodoState` in sync with it
pub struct TodoController<A: TodoApi> {
    api: A,
    policy: MutationPolicy,
    state: TodoState,
}

impl<A: TodoApi> TodoController<A> {
    pub fn new(api: A, policy: MutationPolicy) -> Self {
        Self {
            api,
            policy,
            state: TodoState::default(),
        }
    }

    pub fn state(&self) -> &TodoState {
        &self.state
    }

    pub fn policy(&self) -> MutationPolicy {
        self.policy
    }

    fn dispatch(&mut self, event: TodoEvent) {
        let state = std::mem::take(&mut self.state);
        self.state = reduce(state, event);
    }

    fn notify_success(&mut self, message: &str) {
        self.dispatch(TodoEvent::Notified(Notification::success(message)));
    }

    fn fail<T>(&mut self, error: TodoError, fallback: &str) -> Result<T, TodoError> {
        log::debug!("{}: {}", fallback, error);
        self.dispatch(TodoEvent::Notified(Notification::error(
            error.user_message(fallback),
        )));
        Err(error)
    }

    /// Reconcile the local list with a successful mutation
    fn reconcile(&mut self, event: TodoEvent) {
        match self.policy {
            MutationPolicy::Optimistic => self.dispatch(event),
            MutationPolicy::RefetchOnMutation => {
                if let Err(e) = self.fetch() {
                    log::warn!("refetch after mutation failed: {}", e);
                }
            }
        }
    }

    /// Load the current view from the server
    pub fn fetch(&mut self) -> Result<(), TodoError> {
        self.dispatch(TodoEvent::FetchStarted);

        match self.api.list(&self.state.query()) {
            Ok(todos) => {
                self.dispatch(TodoEvent::Fetched(todos));
                Ok(())
            }
            Err(e) => {
                self.dispatch(TodoEvent::FetchFailed(e.user_message("Failed to fetch todos")));
                Err(e)
            }
        }
    }

    /// Switch to the given view and fetch it, whatever was shown before
    pub fn load(&mut self, filter: ViewFilter, sort: SortOptions) -> Result<(), TodoError> {
        self.dispatch(TodoEvent::FilterChanged(filter));
        self.dispatch(TodoEvent::SortChanged(sort));
        self.fetch()
    }

    pub fn set_filter(&mut self, filter: ViewFilter) -> Result<(), TodoError> {
        if self.state.filter == filter {
            return Ok(());
        }

        self.dispatch(TodoEvent::FilterChanged(filter));
        self.fetch()
    }

    pub fn set_sort(&mut self, sort: SortOptions) -> Result<(), TodoError> {
        if self.state.sort == sort {
            return Ok(());
        }

        self.dispatch(TodoEvent::SortChanged(sort));
        self.fetch()
    }

    pub fn create(&mut self, todo: &CreateTodoDTO) -> Result<Todo, TodoError> {
        match self.api.create(todo) {
            Ok(created) => {
                self.notify_success("Todo created successfully");
                self.reconcile(TodoEvent::Added(created.clone()));
                Ok(created)
            }
            Err(e) => self.fail(e, "Failed to create todo"),
        }
    }

    pub fn update(&mut self, id: &TodoId, patch: &UpdateTodoDTO) -> Result<Todo, TodoError> {
        match self.api.update(id, patch) {
            Ok(updated) => {
                self.notify_success("Todo updated successfully");
                self.reconcile(TodoEvent::Updated(updated.clone()));
                Ok(updated)
            }
            Err(e) => self.fail(e, "Failed to update todo"),
        }
    }

    pub fn toggle(&mut self, id: &TodoId) -> Result<Todo, TodoError> {
        match self.api.toggle(id) {
            Ok(toggled) => {
                self.reconcile(TodoEvent::Updated(toggled.clone()));
                Ok(toggled)
            }
            Err(e) => self.fail(e, "Failed to toggle todo"),
        }
    }

    pub fn delete(&mut self, id: &TodoId) -> Result<(), TodoError> {
        match self.api.delete(id) {
            Ok(()) => {
                self.notify_success("Todo deleted successfully");
                self.reconcile(TodoEvent::Removed(*id));
                Ok(())
            }
            Err(e) => self.fail(e, "Failed to delete todo"),
        }
    }

    pub fn clear_completed(&mut self) -> Result<usize, TodoError> {
        match self.api.delete_completed() {
            Ok(count) => {
                self.notify_success("Completed todos cleared");
                self.reconcile(TodoEvent::CompletedCleared);
                Ok(count)
            }
            Err(e) => self.fail(e, "Failed to clear completed todos"),
        }
    }

    pub fn dismiss_notification(&mut self) {
        self.dispatch(TodoEvent::NotificationDismissed);
    }
}
