use std::convert::TryFrom;

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use super::{
    dtos::todo::{CreateTodoDTO, ListTodosQuery, UpdateTodoDTO},
    errors::{FieldError, TodoApiError},
};
use crate::models::todo_model::{NewTodo, Priority, TodoPatch, TodoQuery};

pub const TITLE_MAX_CHARS: usize = 200;
pub const DESCRIPTION_MAX_CHARS: usize = 1000;

fn title(raw: &str, empty_message: &str, errors: &mut Vec<FieldError>) -> Option<String> {
    let trimmed = raw.trim();

    if trimmed.is_empty() {
        errors.push(FieldError::new("title", empty_message));
        None
    } else if trimmed.chars().count() > TITLE_MAX_CHARS {
        errors.push(FieldError::new(
            "title",
            format!("Title cannot exceed {} characters", TITLE_MAX_CHARS),
        ));
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Empty descriptions are stored as absent
fn description(raw: &str, errors: &mut Vec<FieldError>) -> Option<String> {
    let trimmed = raw.trim();

    if trimmed.chars().count() > DESCRIPTION_MAX_CHARS {
        errors.push(FieldError::new(
            "description",
            format!("Description cannot exceed {} characters", DESCRIPTION_MAX_CHARS),
        ));
        return None;
    }

    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn priority(raw: &str, errors: &mut Vec<FieldError>) -> Option<Priority> {
    raw.parse::<Priority>()
        .map_err(|message| errors.push(FieldError::new("priority", message)))
        .ok()
}

/// Parse an ISO 8601 date, date-time or RFC 3339 timestamp, keeping the date.
pub fn parse_due_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc3339(raw)
                .ok()
                .map(|dt| dt.naive_local().date())
        })
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
                .ok()
                .map(|dt| dt.date())
        })
}

/// `Ok(None)` for a blank value, which means "no due date"
fn due_date(raw: &str, errors: &mut Vec<FieldError>) -> Option<Option<NaiveDate>> {
    if raw.trim().is_empty() {
        return Some(None);
    }

    match parse_due_date(raw) {
        Some(date) => Some(Some(date)),
        None => {
            errors.push(FieldError::new("dueDate", "Due date must be a valid date"));
            None
        }
    }
}

impl TryFrom<CreateTodoDTO> for NewTodo {
    type Error = TodoApiError;

    fn try_from(dto: CreateTodoDTO) -> Result<Self, Self::Error> {
        let mut errors = Vec::new();

        let title = title(
            dto.title.as_deref().unwrap_or_default(),
            "Title is required",
            &mut errors,
        );
        let description = dto
            .description
            .as_deref()
            .and_then(|raw| description(raw, &mut errors));
        let priority = dto
            .priority
            .as_deref()
            .map(|raw| priority(raw, &mut errors));
        let due_date = dto
            .due_date
            .as_deref()
            .map(|raw| due_date(raw, &mut errors));

        match title {
            Some(title) if errors.is_empty() => Ok(NewTodo {
                title,
                description,
                priority: priority.flatten().unwrap_or_default(),
                due_date: due_date.flatten().flatten(),
            }),
            _ => Err(TodoApiError::ValidationFailed(errors)),
        }
    }
}

impl TryFrom<UpdateTodoDTO> for TodoPatch {
    type Error = TodoApiError;

    fn try_from(dto: UpdateTodoDTO) -> Result<Self, Self::Error> {
        let mut errors = Vec::new();

        let patch = TodoPatch {
            title: dto.title.and_then(|value| match value {
                Some(raw) => title(&raw, "Title cannot be empty", &mut errors),
                None => {
                    errors.push(FieldError::new("title", "Title cannot be empty"));
                    None
                }
            }),
            description: dto
                .description
                .map(|value| value.and_then(|raw| description(&raw, &mut errors))),
            priority: dto.priority.and_then(|value| match value {
                Some(raw) => priority(&raw, &mut errors),
                None => {
                    errors.push(FieldError::new(
                        "priority",
                        "Priority must be low, medium, or high",
                    ));
                    None
                }
            }),
            completed: dto.completed.and_then(|value| {
                if value.is_none() {
                    errors.push(FieldError::new("completed", "Completed must be a boolean"));
                }
                value
            }),
            due_date: dto.due_date.and_then(|value| match value {
                Some(raw) => due_date(&raw, &mut errors),
                None => Some(None),
            }),
        };

        if errors.is_empty() {
            Ok(patch)
        } else {
            Err(TodoApiError::ValidationFailed(errors))
        }
    }
}

impl TryFrom<ListTodosQuery> for TodoQuery {
    type Error = TodoApiError;

    fn try_from(params: ListTodosQuery) -> Result<Self, Self::Error> {
        let mut errors = Vec::new();
        let mut query = TodoQuery::default();

        if let Some(completed) = params.completed.as_deref() {
            match completed {
                "true" => query.completed = Some(true),
                "false" => query.completed = Some(false),
                _ => errors.push(FieldError::new(
                    "completed",
                    "completed must be true or false",
                )),
            }
        }

        if let Some(raw) = params.priority.as_deref().filter(|raw| !raw.is_empty()) {
            query.priority = priority(raw, &mut errors);
        }

        if let Some(raw) = params.sort_by.as_deref() {
            match raw.parse() {
                Ok(field) => query.sort_field = field,
                Err(message) => errors.push(FieldError::new("sortBy", message)),
            }
        }

        if let Some(raw) = params.order.as_deref() {
            match raw.parse() {
                Ok(order) => query.sort_order = order,
                Err(message) => errors.push(FieldError::new("order", message)),
            }
        }

        if errors.is_empty() {
            Ok(query)
        } else {
            Err(TodoApiError::ValidationFailed(errors))
        }
    }
}
