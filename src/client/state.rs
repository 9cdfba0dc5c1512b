use std::{fmt, str::FromStr};

use crate::models::todo_model::{SortField, SortOrder, Todo, TodoId, TodoQuery};

/// Which rows the view asks the server for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewFilter {
    All,
    Active,
    Completed,
}

impl ViewFilter {
    pub const ALL: [ViewFilter; 3] = [ViewFilter::All, ViewFilter::Active, ViewFilter::Completed];

    /// Value of the `completed` query parameter
    pub fn completed(self) -> Option<bool> {
        match self {
            ViewFilter::All => None,
            ViewFilter::Active => Some(false),
            ViewFilter::Completed => Some(true),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ViewFilter::All => "all",
            ViewFilter::Active => "active",
            ViewFilter::Completed => "completed",
        }
    }
}

impl Default for ViewFilter {
    fn default() -> Self {
        ViewFilter::All
    }
}

impl fmt::Display for ViewFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ViewFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(ViewFilter::All),
            "active" => Ok(ViewFilter::Active),
            "completed" => Ok(ViewFilter::Completed),
            _ => Err(String::from("Filter must be all, active, or completed")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SortOptions {
    pub field: SortField,
    pub order: SortOrder,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Error,
}

/// Transient message shown after an operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: String,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Error,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TodoStats {
    pub total: usize,
    pub active: usize,
    pub completed: usize,
}

/// Local view of the caller's todos
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TodoState {
    pub todos: Vec<Todo>,
    pub loading: bool,
    pub filter: ViewFilter,
    pub sort: SortOptions,
    pub notification: Option<Notification>,
}

impl TodoState {
    /// Query sent to the server for the current view
    pub fn query(&self) -> TodoQuery {
        TodoQuery {
            completed: self.filter.completed(),
            priority: None,
            sort_field: self.sort.field,
            sort_order: self.sort.order,
        }
    }

    pub fn stats(&self) -> TodoStats {
        let completed = self.todos.iter().filter(|todo| todo.completed).count();

        TodoStats {
            total: self.todos.len(),
            active: self.todos.len() - completed,
            completed,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TodoEvent {
    FetchStarted,
    Fetched(Vec<Todo>),
    FetchFailed(String),
    Added(Todo),
    Updated(Todo),
    Removed(TodoId),
    CompletedCleared,
    FilterChanged(ViewFilter),
    SortChanged(SortOptions),
    Notified(Notification),
    NotificationDismissed,
}

/// Next state of the view after `event`
pub fn reduce(mut state: TodoState, event: TodoEvent) -> TodoState {
    match event {
        TodoEvent::FetchStarted => {
            state.loading = true;
        }
        TodoEvent::Fetched(todos) => {
            state.todos = todos;
            state.loading = false;
        }
        TodoEvent::FetchFailed(message) => {
            state.loading = false;
            state.notification = Some(Notification::error(message));
        }
        TodoEvent::Added(todo) => {
            state.todos.insert(0, todo);
        }
        TodoEvent::Updated(todo) => {
            if let Some(existing) = state.todos.iter_mut().find(|t| t.id == todo.id) {
                *existing = todo;
            }
        }
        TodoEvent::Removed(id) => {
            state.todos.retain(|todo| todo.id != id);
        }
        TodoEvent::CompletedCleared => {
            state.todos.retain(|todo| !todo.completed);
        }
        TodoEvent::FilterChanged(filter) => {
            state.filter = filter;
        }
        TodoEvent::SortChanged(sort) => {
            state.sort = sort;
        }
        TodoEvent::Notified(notification) => {
            state.notification = Some(notification);
        }
        TodoEvent::NotificationDismissed => {
            state.notification = None;
        }
    }

    state
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::models::{
        identity::Identity,
        todo_model::{NewTodo, Priority},
    };

    fn todo(title: &str, completed: bool) -> Todo {
        let owner = Identity::new(uuid::Uuid::new_v4());
        let mut todo = Todo::create(
            NewTodo {
                title: title.to_string(),
                ..Default::default()
            },
            &owner,
            chrono::Utc::now().naive_utc(),
        );
        todo.completed = completed;
        todo
    }

    fn loaded(todos: Vec<Todo>) -> TodoState {
        reduce(TodoState::default(), TodoEvent::Fetched(todos))
    }

    #[test]
    fn test_fetch_cycle() {
        let state = reduce(TodoState::default(), TodoEvent::FetchStarted);
        assert!(state.loading);

        let state = reduce(state, TodoEvent::Fetched(vec![todo("a", false)]));
        assert!(!state.loading);
        assert_eq!(state.todos.len(), 1);

        let state = reduce(state, TodoEvent::FetchStarted);
        let state = reduce(state, TodoEvent::FetchFailed("Failed to fetch todos".to_string()));
        assert!(!state.loading);
        // previous snapshot survives a failed fetch
        assert_eq!(state.todos.len(), 1);
        assert_eq!(
            state.notification,
            Some(Notification::error("Failed to fetch todos"))
        );
    }

    #[test]
    fn test_added_is_prepended() {
        let state = loaded(vec![todo("old", false)]);

        let state = reduce(state, TodoEvent::Added(todo("new", false)));

        let titles: Vec<&str> = state.todos.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["new", "old"]);
    }

    #[test]
    fn test_updated_replaces_by_id() {
        let first = todo("first", false);
        let second = todo("second", false);
        let state = loaded(vec![first.clone(), second.clone()]);

        let mut changed = second.clone();
        changed.priority = Priority::High;
        changed.completed = true;

        let state = reduce(state, TodoEvent::Updated(changed.clone()));
        assert_eq!(state.todos, vec![first.clone(), changed]);

        // unknown ids are ignored
        let state = reduce(state.clone(), TodoEvent::Updated(todo("stranger", false)));
        assert_eq!(state.todos.len(), 2);
    }

    #[test]
    fn test_removed_and_completed_cleared() {
        let keep = todo("keep", false);
        let drop = todo("drop", false);
        let done = todo("done", true);
        let state = loaded(vec![keep.clone(), drop.clone(), done]);

        let state = reduce(state, TodoEvent::Removed(drop.id));
        assert_eq!(state.todos.len(), 2);

        let state = reduce(state, TodoEvent::CompletedCleared);
        assert_eq!(state.todos, vec![keep]);
    }

    #[test]
    fn test_query_follows_filter_and_sort() {
        let state = reduce(TodoState::default(), TodoEvent::FilterChanged(ViewFilter::Active));
        let state = reduce(
            state,
            TodoEvent::SortChanged(SortOptions {
                field: SortField::Priority,
                order: SortOrder::Asc,
            }),
        );

        assert_eq!(
            state.query(),
            TodoQuery {
                completed: Some(false),
                priority: None,
                sort_field: SortField::Priority,
                sort_order: SortOrder::Asc,
            }
        );
        assert_eq!(TodoState::default().query(), TodoQuery::default());
    }

    #[test]
    fn test_stats() {
        let state = loaded(vec![todo("a", false), todo("b", true), todo("c", false)]);

        assert_eq!(
            state.stats(),
            TodoStats {
                total: 3,
                active: 2,
                completed: 1
            }
        );
    }

    #[test]
    fn test_notification_dismissed() {
        let state = reduce(
            TodoState::default(),
            TodoEvent::Notified(Notification::success("Todo created successfully")),
        );
        assert_eq!(state.notification.as_ref().map(|n| n.kind), Some(NotificationKind::Success));

        let state = reduce(state, TodoEvent::NotificationDismissed);
        assert_eq!(state.notification, None);
    }

    #[test]
    fn test_filter_parsing() {
        assert_eq!("active".parse::<ViewFilter>(), Ok(ViewFilter::Active));
        assert!("done".parse::<ViewFilter>().is_err());
    }
}
