use std::sync::{Mutex, MutexGuard};

use super::{now, TodoStore};
use crate::api::errors::TodoApiError;
use crate::models::{
    identity::Identity,
    todo_model::{NewTodo, SortField, SortOrder, Todo, TodoId, TodoPatch, TodoQuery},
};

/// Process local store, kept in insertion order
#[derive(Debug, Default)]
pub struct MemoryTodoStore {
    todos: Mutex<Vec<Todo>>,
}

impl MemoryTodoStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Vec<Todo>>, TodoApiError> {
        self.todos
            .lock()
            .map_err(|_| TodoApiError::InternalServerError(String::from("todo store lock poisoned")))
    }

    fn owned_mut<'a>(
        todos: &'a mut [Todo],
        owner: &Identity,
        todo_id: &TodoId,
    ) -> Result<&'a mut Todo, TodoApiError> {
        todos
            .iter_mut()
            .find(|todo| todo.id == *todo_id && todo.is_owned_by(owner))
            .ok_or_else(TodoApiError::todo_not_found)
    }
}

impl TodoStore for MemoryTodoStore {
    fn list(&self, owner: &Identity, query: &TodoQuery) -> Result<Vec<Todo>, TodoApiError> {
        let todos = self.lock()?;

        let mut list: Vec<Todo> = todos
            .iter()
            .filter(|todo| todo.is_owned_by(owner) && query.matches(todo))
            .cloned()
            .collect();

        // full ties follow insertion order in the requested direction
        if query.sort_field == SortField::CreatedAt && query.sort_order == SortOrder::Desc {
            list.reverse();
        }
        list.sort_by(|a, b| query.compare(a, b));

        Ok(list)
    }

    fn get(&self, owner: &Identity, todo_id: &TodoId) -> Result<Todo, TodoApiError> {
        self.lock()?
            .iter()
            .find(|todo| todo.id == *todo_id && todo.is_owned_by(owner))
            .cloned()
            .ok_or_else(TodoApiError::todo_not_found)
    }

    fn create(&self, owner: &Identity, new_todo: NewTodo) -> Result<Todo, TodoApiError> {
        let todo = Todo::create(new_todo, owner, now());

        self.lock()?.push(todo.clone());

        log::debug!("created todo {} for {}", todo.id, owner);

        Ok(todo)
    }

    fn update(
        &self,
        owner: &Identity,
        todo_id: &TodoId,
        patch: TodoPatch,
    ) -> Result<Todo, TodoApiError> {
        let mut todos = self.lock()?;
        let todo = Self::owned_mut(&mut todos, owner, todo_id)?;

        patch.apply(todo, now());

        Ok(todo.clone())
    }

    fn toggle(&self, owner: &Identity, todo_id: &TodoId) -> Result<Todo, TodoApiError> {
        let mut todos = self.lock()?;
        let todo = Self::owned_mut(&mut todos, owner, todo_id)?;

        todo.toggle(now());

        Ok(todo.clone())
    }

    fn delete(&self, owner: &Identity, todo_id: &TodoId) -> Result<(), TodoApiError> {
        let mut todos = self.lock()?;

        let position = todos
            .iter()
            .position(|todo| todo.id == *todo_id && todo.is_owned_by(owner))
            .ok_or_else(TodoApiError::todo_not_found)?;

        todos.remove(position);

        Ok(())
    }

    fn delete_all_completed(&self, owner: &Identity) -> Result<usize, TodoApiError> {
        let mut todos = self.lock()?;
        let before = todos.len();

        todos.retain(|todo| !(todo.completed && todo.is_owned_by(owner)));

        Ok(before - todos.len())
    }
}
