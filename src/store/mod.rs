//! Persistence of todo records.
//!
//! Every operation is scoped to the caller: a record owned by another
//! identity behaves exactly like a missing one.

mod memory_store;
mod pg_store;

pub use memory_store::MemoryTodoStore;
pub use pg_store::PgTodoStore;

use chrono::Timelike;

use crate::api::errors::TodoApiError;
use crate::models::{
    identity::Identity,
    todo_model::{NewTodo, Todo, TodoId, TodoPatch, TodoQuery},
};

pub trait TodoStore: Send + Sync {
    /// Owned todos matching `query`, in the requested order
    fn list(&self, owner: &Identity, query: &TodoQuery) -> Result<Vec<Todo>, TodoApiError>;

    fn get(&self, owner: &Identity, todo_id: &TodoId) -> Result<Todo, TodoApiError>;

    fn create(&self, owner: &Identity, new_todo: NewTodo) -> Result<Todo, TodoApiError>;

    /// Apply `patch` to an owned todo and return the stored result
    fn update(
        &self,
        owner: &Identity,
        todo_id: &TodoId,
        patch: TodoPatch,
    ) -> Result<Todo, TodoApiError>;

    /// Flip `completed` on an owned todo
    fn toggle(&self, owner: &Identity, todo_id: &TodoId) -> Result<Todo, TodoApiError>;

    fn delete(&self, owner: &Identity, todo_id: &TodoId) -> Result<(), TodoApiError>;

    /// Remove every completed todo of `owner`, returning how many were removed
    fn delete_all_completed(&self, owner: &Identity) -> Result<usize, TodoApiError>;
}

/// Timestamp used for `created_at` / `updated_at`.
///
/// Truncated to microseconds, the resolution Postgres stores.
pub(crate) fn now() -> chrono::NaiveDateTime {
    let now = chrono::Utc::now().naive_utc();
    let micros = now.timestamp_subsec_micros();
    now.with_nanosecond(micros * 1_000).unwrap_or(now)
}
