use std::{cmp::Ordering, fmt, str::FromStr};

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::identity::Identity;

/// Store assigned identifier of a todo
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TodoId(uuid::Uuid);

impl TodoId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &uuid::Uuid {
        &self.0
    }
}

impl Default for TodoId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<uuid::Uuid> for TodoId {
    fn from(id: uuid::Uuid) -> Self {
        Self(id)
    }
}

impl FromStr for TodoId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        uuid::Uuid::parse_str(s.trim()).map(Self)
    }
}

impl fmt::Display for TodoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Importance of a todo. Variant order is the sort order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::Low, Priority::Medium, Priority::High];

    /// Numeric rank persisted in the `priority` column
    pub fn rank(self) -> i16 {
        match self {
            Priority::Low => 0,
            Priority::Medium => 1,
            Priority::High => 2,
        }
    }

    pub fn from_rank(rank: i16) -> Option<Self> {
        match rank {
            0 => Some(Priority::Low),
            1 => Some(Priority::Medium),
            2 => Some(Priority::High),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }
}

impl Default for Priority {
    fn default() -> Self {
        Priority::Medium
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            _ => Err(String::from("Priority must be low, medium, or high")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    pub id: TodoId,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub priority: Priority,
    pub completed: bool,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    pub user_id: uuid::Uuid,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Todo {
    /// Build a fresh record owned by `owner`
    pub fn create(new_todo: NewTodo, owner: &Identity, now: NaiveDateTime) -> Self {
        Self {
            id: TodoId::new(),
            title: new_todo.title,
            description: new_todo.description,
            priority: new_todo.priority,
            completed: false,
            due_date: new_todo.due_date,
            user_id: *owner.id(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_owned_by(&self, owner: &Identity) -> bool {
        self.user_id == *owner.id()
    }

    /// A todo is overdue once its due date has passed and it is still open
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        !self.completed && self.due_date.map_or(false, |due| due < today)
    }

    pub fn toggle(&mut self, now: NaiveDateTime) {
        self.completed = !self.completed;
        self.updated_at = now;
    }
}

/// Validated input for creating a todo
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NewTodo {
    pub title: String,
    pub description: Option<String>,
    pub priority: Priority,
    pub due_date: Option<NaiveDate>,
}

/// Validated partial update. `None` keeps the stored value; for the nullable
/// fields `Some(None)` clears it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TodoPatch {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub priority: Option<Priority>,
    pub completed: Option<bool>,
    pub due_date: Option<Option<NaiveDate>>,
}

impl TodoPatch {
    pub fn apply(self, todo: &mut Todo, now: NaiveDateTime) {
        if let Some(title) = self.title {
            todo.title = title;
        }
        if let Some(description) = self.description {
            todo.description = description;
        }
        if let Some(priority) = self.priority {
            todo.priority = priority;
        }
        if let Some(completed) = self.completed {
            todo.completed = completed;
        }
        if let Some(due_date) = self.due_date {
            todo.due_date = due_date;
        }
        todo.updated_at = now;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortField {
    #[serde(rename = "createdAt")]
    CreatedAt,
    #[serde(rename = "priority")]
    Priority,
}

impl SortField {
    pub fn as_str(self) -> &'static str {
        match self {
            SortField::CreatedAt => "createdAt",
            SortField::Priority => "priority",
        }
    }
}

impl Default for SortField {
    fn default() -> Self {
        SortField::CreatedAt
    }
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "createdAt" => Ok(SortField::CreatedAt),
            "priority" => Ok(SortField::Priority),
            _ => Err(String::from("sortBy must be createdAt or priority")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

impl Default for SortOrder {
    fn default() -> Self {
        SortOrder::Desc
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            _ => Err(String::from("order must be asc or desc")),
        }
    }
}

/// Filter and ordering for listing a caller's todos
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TodoQuery {
    pub completed: Option<bool>,
    pub priority: Option<Priority>,
    pub sort_field: SortField,
    pub sort_order: SortOrder,
}

impl TodoQuery {
    pub fn matches(&self, todo: &Todo) -> bool {
        self.completed.map_or(true, |done| todo.completed == done)
            && self.priority.map_or(true, |priority| todo.priority == priority)
    }

    /// Ordering of two records under this query.
    ///
    /// Priority ties fall back to creation time, oldest first.
    pub fn compare(&self, a: &Todo, b: &Todo) -> Ordering {
        match self.sort_field {
            SortField::CreatedAt => {
                let ordering = a.created_at.cmp(&b.created_at);
                match self.sort_order {
                    SortOrder::Asc => ordering,
                    SortOrder::Desc => ordering.reverse(),
                }
            }
            SortField::Priority => {
                let ordering = a.priority.cmp(&b.priority);
                let ordering = match self.sort_order {
                    SortOrder::Asc => ordering,
                    SortOrder::Desc => ordering.reverse(),
                };
                ordering.then_with(|| a.created_at.cmp(&b.created_at))
            }
        }
    }

    /// Query string pairs understood by `GET /todos`
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("sortBy", self.sort_field.to_string()),
            ("order", self.sort_order.to_string()),
        ];

        if let Some(completed) = self.completed {
            params.push(("completed", completed.to_string()));
        }

        if let Some(priority) = self.priority {
            params.push(("priority", priority.to_string()));
        }

        params
    }
}
