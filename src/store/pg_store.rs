use std::convert::TryFrom;

use diesel::{dsl::not, pg::Pg, prelude::*, r2d2::ConnectionManager};

use super::{now, TodoStore};
use crate::api::errors::TodoApiError;
use crate::models::{
    identity::Identity,
    todo_model::{NewTodo, Priority, SortField, SortOrder, Todo, TodoId, TodoPatch, TodoQuery},
    Pool,
};
use crate::schema::todos;

/// Row of the `todos` table. Field order follows `schema.rs`.
#[derive(Debug, Clone, Insertable, Queryable)]
#[table_name = "todos"]
pub struct TodoRow {
    pub id: uuid::Uuid,
    pub title: String,
    pub description: Option<String>,
    pub priority: i16,
    pub completed: bool,
    pub due_date: Option<chrono::NaiveDate>,
    pub user_id: uuid::Uuid,
    pub created_at: chrono::NaiveDateTime,
    pub updated_at: chrono::NaiveDateTime,
}

impl From<&Todo> for TodoRow {
    fn from(todo: &Todo) -> Self {
        Self {
            id: *todo.id.as_uuid(),
            title: todo.title.clone(),
            description: todo.description.clone(),
            priority: todo.priority.rank(),
            completed: todo.completed,
            due_date: todo.due_date,
            user_id: todo.user_id,
            created_at: todo.created_at,
            updated_at: todo.updated_at,
        }
    }
}

impl TryFrom<TodoRow> for Todo {
    type Error = TodoApiError;

    fn try_from(row: TodoRow) -> Result<Self, Self::Error> {
        let priority = Priority::from_rank(row.priority).ok_or_else(|| {
            TodoApiError::InternalServerError(format!(
                "todo {} has unknown priority rank {}",
                row.id, row.priority
            ))
        })?;

        Ok(Todo {
            id: row.id.into(),
            title: row.title,
            description: row.description,
            priority,
            completed: row.completed,
            due_date: row.due_date,
            user_id: row.user_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Postgres backed store using a blocking r2d2 pool.
///
/// Call from `web::block`, never directly on an async worker.
pub struct PgTodoStore {
    pool: Pool,
}

impl PgTodoStore {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    pub fn connect(database_url: &str) -> Result<Self, TodoApiError> {
        let manager = ConnectionManager::<PgConnection>::new(database_url);
        let pool = Pool::builder().build(manager)?;

        Ok(Self::new(pool))
    }

    fn find_owned(
        conn: &PgConnection,
        owner: &Identity,
        todo_id: &TodoId,
    ) -> Result<TodoRow, TodoApiError> {
        use crate::schema::todos::dsl::*;

        todos
            .filter(id.eq(todo_id.as_uuid()))
            .filter(user_id.eq(owner.id()))
            .first::<TodoRow>(conn)
            .optional()?
            .ok_or_else(TodoApiError::todo_not_found)
    }
}

impl TodoStore for PgTodoStore {
    fn list(&self, owner: &Identity, query: &TodoQuery) -> Result<Vec<Todo>, TodoApiError> {
        use crate::schema::todos::dsl::*;

        let conn = &self.pool.get()?;

        let mut statement: crate::schema::todos::BoxedQuery<'_, Pg> =
            todos.filter(user_id.eq(owner.id())).into_boxed();

        if let Some(done) = query.completed {
            statement = statement.filter(completed.eq(done));
        }

        if let Some(wanted) = query.priority {
            statement = statement.filter(priority.eq(wanted.rank()));
        }

        statement = match (query.sort_field, query.sort_order) {
            (SortField::CreatedAt, SortOrder::Asc) => statement.order((created_at.asc(), id.asc())),
            (SortField::CreatedAt, SortOrder::Desc) => {
                statement.order((created_at.desc(), id.asc()))
            }
            (SortField::Priority, SortOrder::Asc) => {
                statement.order((priority.asc(), created_at.asc(), id.asc()))
            }
            (SortField::Priority, SortOrder::Desc) => {
                statement.order((priority.desc(), created_at.asc(), id.asc()))
            }
        };

        statement
            .load::<TodoRow>(conn)?
            .into_iter()
            .map(Todo::try_from)
            .collect()
    }

    fn get(&self, owner: &Identity, todo_id: &TodoId) -> Result<Todo, TodoApiError> {
        let conn = &self.pool.get()?;

        Todo::try_from(Self::find_owned(conn, owner, todo_id)?)
    }

    fn create(&self, owner: &Identity, new_todo: NewTodo) -> Result<Todo, TodoApiError> {
        use crate::schema::todos::dsl::*;

        let conn = &self.pool.get()?;

        let row = TodoRow::from(&Todo::create(new_todo, owner, now()));

        let inserted = diesel::insert_into(todos)
            .values(&row)
            .get_result::<TodoRow>(conn)?;

        log::debug!("created todo {} for {}", inserted.id, owner);

        Todo::try_from(inserted)
    }

    fn update(
        &self,
        owner: &Identity,
        todo_id: &TodoId,
        patch: TodoPatch,
    ) -> Result<Todo, TodoApiError> {
        use crate::schema::todos::dsl::*;

        let conn = &self.pool.get()?;

        conn.transaction::<_, TodoApiError, _>(|| {
            let mut todo = Todo::try_from(Self::find_owned(conn, owner, todo_id)?)?;
            patch.apply(&mut todo, now());

            let saved = diesel::update(
                todos
                    .filter(id.eq(todo_id.as_uuid()))
                    .filter(user_id.eq(owner.id())),
            )
            .set((
                title.eq(todo.title.clone()),
                description.eq(todo.description.clone()),
                priority.eq(todo.priority.rank()),
                completed.eq(todo.completed),
                due_date.eq(todo.due_date),
                updated_at.eq(todo.updated_at),
            ))
            .get_result::<TodoRow>(conn)?;

            Todo::try_from(saved)
        })
    }

    fn toggle(&self, owner: &Identity, todo_id: &TodoId) -> Result<Todo, TodoApiError> {
        use crate::schema::todos::dsl::*;

        let conn = &self.pool.get()?;

        let row = diesel::update(
            todos
                .filter(id.eq(todo_id.as_uuid()))
                .filter(user_id.eq(owner.id())),
        )
        .set((completed.eq(not(completed)), updated_at.eq(now())))
        .get_result::<TodoRow>(conn)
        .optional()?
        .ok_or_else(TodoApiError::todo_not_found)?;

        Todo::try_from(row)
    }

    fn delete(&self, owner: &Identity, todo_id: &TodoId) -> Result<(), TodoApiError> {
        use crate::schema::todos::dsl::*;

        let conn = &self.pool.get()?;

        let deleted = diesel::delete(
            todos
                .filter(id.eq(todo_id.as_uuid()))
                .filter(user_id.eq(owner.id())),
        )
        .execute(conn)?;

        if deleted > 0 {
            Ok(())
        } else {
            Err(TodoApiError::todo_not_found())
        }
    }

    fn delete_all_completed(&self, owner: &Identity) -> Result<usize, TodoApiError> {
        use crate::schema::todos::dsl::*;

        let conn = &self.pool.get()?;

        let deleted = diesel::delete(
            todos
                .filter(user_id.eq(owner.id()))
                .filter(completed.eq(true)),
        )
        .execute(conn)?;

        log::info!("removed {} completed todos for {}", deleted, owner);

        Ok(deleted)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_row_conversion_keeps_every_field() {
        let owner = Identity::new(uuid::Uuid::new_v4());
        let todo = Todo::create(
            NewTodo {
                title: "Renew passport".to_string(),
                description: Some("before June".to_string()),
                priority: Priority::High,
                due_date: chrono::NaiveDate::from_ymd_opt(2024, 6, 1),
            },
            &owner,
            now(),
        );

        let row = TodoRow::from(&todo);
        assert_eq!(row.priority, 2);

        assert_eq!(Todo::try_from(row).unwrap(), todo);
    }

    #[test]
    fn test_unknown_rank_is_an_internal_error() {
        let owner = Identity::new(uuid::Uuid::new_v4());
        let todo = Todo::create(NewTodo::default(), &owner, now());
        let row = TodoRow {
            priority: 9,
            ..TodoRow::from(&todo)
        };

        assert!(matches!(
            Todo::try_from(row),
            Err(TodoApiError::InternalServerError(_))
        ));
    }
}
