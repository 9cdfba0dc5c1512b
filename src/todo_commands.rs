use std::{fmt, str::FromStr};

use anyhow::{anyhow, Context};
use chrono::NaiveDate;
use inquire::{Confirm, Select, Text};

use crate::{
    api::{auth_utils::encode_token, dtos::todo::CreateTodoDTO, dtos::todo::UpdateTodoDTO},
    client::{
        state::NotificationKind, HttpTodoApi, MutationPolicy, SortOptions, TodoApi,
        TodoController, TodoState, ViewFilter,
    },
    errors::TodoError,
    models::{
        identity::Identity,
        todo_model::{Priority, SortField, SortOrder, Todo, TodoId},
    },
    utils::{clear_token, get_saved_token, save_token},
};

type Controller = TodoController<HttpTodoApi>;

fn controller(policy: MutationPolicy) -> anyhow::Result<Controller> {
    let token = get_saved_token()?;

    Ok(TodoController::new(HttpTodoApi::new(token), policy))
}

fn parse_id(raw: &str) -> anyhow::Result<TodoId> {
    TodoId::from_str(raw).with_context(|| format!("'{}' is not a valid todo ID", raw))
}

/// One line of the todo list
pub fn format_todo(todo: &Todo, today: NaiveDate) -> String {
    let mut line = format!(
        "[{}] {} ({}",
        if todo.completed { "x" } else { " " },
        todo.title,
        todo.priority
    );

    if let Some(due) = todo.due_date {
        line.push_str(&format!(", due {}", due));
    }

    if todo.is_overdue(today) {
        line.push_str(", overdue");
    }

    line.push_str(&format!(")  {}", todo.id));

    line
}

fn print_state(state: &TodoState) {
    let today = chrono::Local::now().date_naive();
    let stats = state.stats();

    println!(
        "\n{} todos ({} active, {} completed), filter: {}, sort: {} {}",
        stats.total, stats.active, stats.completed, state.filter, state.sort.field, state.sort.order
    );

    if state.todos.is_empty() {
        println!("  nothing to show");
    }

    for todo in state.todos.iter() {
        println!("  {}", format_todo(todo, today));

        if let Some(description) = &todo.description {
            println!("        {}", description);
        }
    }
}

fn print_notification(state: &TodoState) {
    if let Some(notification) = &state.notification {
        match notification.kind {
            NotificationKind::Success => println!("{}", notification.message),
            NotificationKind::Error => eprintln!("{}", notification.message),
        }
    }
}

/// Runs a command and reports its failure. An unauthorized answer drops
/// the saved token.
pub fn report(result: anyhow::Result<()>) {
    if let Err(e) = result {
        match e.downcast_ref::<TodoError>() {
            Some(error @ TodoError::Unauthorized(_)) => {
                if let Err(e) = clear_token() {
                    log::warn!("could not remove saved token: {}", e);
                }
                eprintln!("{}", error.user_message("Login first"));
            }
            _ => eprintln!("{:#}", e),
        }
    }
}

fn prompt_due_date(current: Option<NaiveDate>) -> anyhow::Result<Option<NaiveDate>> {
    let current = current.map(|date| date.to_string()).unwrap_or_default();

    loop {
        let raw = Text::new("Due date")
            .with_default(current.as_str())
            .with_help_message("YYYY-MM-DD, leave empty for none")
            .prompt()?;

        if raw.trim().is_empty() {
            return Ok(None);
        }

        match NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d") {
            Ok(date) => return Ok(Some(date)),
            Err(_) => eprintln!("Due date must be a valid date"),
        }
    }
}

fn prompt_priority(current: Priority) -> anyhow::Result<Priority> {
    let cursor = Priority::ALL
        .iter()
        .position(|priority| *priority == current)
        .unwrap_or(1);

    Ok(Select::new("Priority", Priority::ALL.to_vec())
        .with_starting_cursor(cursor)
        .prompt()?)
}

fn prompt_new_todo() -> anyhow::Result<CreateTodoDTO> {
    let title = Text::new("Title")
        .with_help_message("Title for your new todo")
        .prompt()?;

    let description = Text::new("Description")
        .with_help_message("Optional")
        .prompt()?;

    let priority = prompt_priority(Priority::default())?;
    let due_date = prompt_due_date(None)?;

    Ok(CreateTodoDTO {
        title: Some(title),
        description: Some(description).filter(|d| !d.trim().is_empty()),
        priority: Some(priority.to_string()),
        due_date: due_date.map(|date| date.to_string()),
    })
}

/// Asks for every field of `todo` and keeps only the ones that changed
fn prompt_changes(todo: &Todo) -> anyhow::Result<UpdateTodoDTO> {
    let mut patch = UpdateTodoDTO::default();

    let title = Text::new("Title").with_default(&todo.title).prompt()?;
    if title != todo.title {
        patch.title = Some(Some(title));
    }

    let current_description = todo.description.clone().unwrap_or_default();
    let description = Text::new("Description")
        .with_default(&current_description)
        .with_help_message("Leave empty to remove")
        .prompt()?;
    if description.trim() != current_description {
        patch.description = Some(Some(description).filter(|d| !d.trim().is_empty()));
    }

    let priority = prompt_priority(todo.priority)?;
    if priority != todo.priority {
        patch.priority = Some(Some(priority.to_string()));
    }

    let completed = Confirm::new("Completed")
        .with_default(todo.completed)
        .prompt()?;
    if completed != todo.completed {
        patch.completed = Some(Some(completed));
    }

    let due_date = prompt_due_date(todo.due_date)?;
    if due_date != todo.due_date {
        patch.due_date = Some(due_date.map(|date| date.to_string()));
    }

    Ok(patch)
}

/// Save a bearer token issued by the auth service
pub fn login() -> anyhow::Result<()> {
    let token = Text::new("Token")
        .with_help_message("Bearer token issued by the auth service")
        .prompt()?;

    let token = token.trim();
    if token.is_empty() {
        return Err(anyhow!("Token cannot be empty"));
    }

    save_token(token)?;

    println!("You are now logged in");

    Ok(())
}

pub fn logout() -> anyhow::Result<()> {
    clear_token()?;

    println!("Logged out");

    Ok(())
}

/// Sign a development token for `user` with the configured secret
pub fn issue_token(user: &str, days: i64, save: bool) -> anyhow::Result<()> {
    let user = uuid::Uuid::parse_str(user.trim())
        .with_context(|| format!("'{}' is not a valid user id", user))?;

    let token = encode_token(&Identity::new(user), chrono::Duration::days(days))?;

    if save {
        save_token(&token)?;
        log::info!("saved token for {}", user);
    }

    println!("{}", token);

    Ok(())
}

/// List the todos of the logged in user
pub fn list_todos(filter: ViewFilter, sort: SortOptions) -> anyhow::Result<()> {
    let mut controller = controller(MutationPolicy::default())?;

    controller.load(filter, sort)?;

    print_state(controller.state());

    Ok(())
}

/// Prompt user to create new todo
pub fn create_todo() -> anyhow::Result<()> {
    let mut controller = controller(MutationPolicy::default())?;
    let todo = prompt_new_todo()?;

    let result = controller.create(&todo);
    print_notification(controller.state());

    let created = result?;
    println!("{}", format_todo(&created, chrono::Local::now().date_naive()));

    Ok(())
}

pub fn edit_todo(id: &str) -> anyhow::Result<()> {
    let id = parse_id(id)?;
    let api = HttpTodoApi::new(get_saved_token()?);
    let todo = api.get(&id)?;

    let patch = prompt_changes(&todo)?;

    let mut controller = TodoController::new(api, MutationPolicy::default());
    let result = controller.update(&id, &patch);
    print_notification(controller.state());

    result.map(|_| ()).map_err(Into::into)
}

pub fn toggle_todo(id: &str) -> anyhow::Result<()> {
    let id = parse_id(id)?;
    let mut controller = controller(MutationPolicy::default())?;

    let result = controller.toggle(&id);
    print_notification(controller.state());

    let todo = result?;
    println!(
        "Todo marked as {}",
        if todo.completed { "completed" } else { "incomplete" }
    );

    Ok(())
}

pub fn delete_todo(id: &str) -> anyhow::Result<()> {
    let id = parse_id(id)?;
    let mut controller = controller(MutationPolicy::default())?;

    let result = controller.delete(&id);
    print_notification(controller.state());

    result.map_err(Into::into)
}

pub fn clear_completed() -> anyhow::Result<()> {
    let mut controller = controller(MutationPolicy::default())?;

    let result = controller.clear_completed();
    print_notification(controller.state());

    let count = result?;
    println!("{} completed todos deleted", count);

    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ShellAction {
    Refresh,
    Create,
    Edit,
    Toggle,
    Delete,
    ClearCompleted,
    Filter,
    Sort,
    Quit,
}

impl ShellAction {
    const ALL: [ShellAction; 9] = [
        ShellAction::Refresh,
        ShellAction::Create,
        ShellAction::Edit,
        ShellAction::Toggle,
        ShellAction::Delete,
        ShellAction::ClearCompleted,
        ShellAction::Filter,
        ShellAction::Sort,
        ShellAction::Quit,
    ];

    /// Actions that work on one selected todo
    fn needs_todo(self) -> bool {
        matches!(self, ShellAction::Edit | ShellAction::Toggle | ShellAction::Delete)
    }
}

impl fmt::Display for ShellAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ShellAction::Refresh => "Refresh",
            ShellAction::Create => "Create todo",
            ShellAction::Edit => "Edit todo",
            ShellAction::Toggle => "Toggle todo",
            ShellAction::Delete => "Delete todo",
            ShellAction::ClearCompleted => "Clear completed",
            ShellAction::Filter => "Change filter",
            ShellAction::Sort => "Change sort",
            ShellAction::Quit => "Quit",
        };

        f.write_str(label)
    }
}

struct TodoChoice {
    id: TodoId,
    line: String,
}

impl fmt::Display for TodoChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.line)
    }
}

fn pick_todo(state: &TodoState) -> anyhow::Result<Option<TodoId>> {
    if state.todos.is_empty() {
        println!("No todos in this view");
        return Ok(None);
    }

    let today = chrono::Local::now().date_naive();
    let choices = state
        .todos
        .iter()
        .map(|todo| TodoChoice {
            id: todo.id,
            line: format_todo(todo, today),
        })
        .collect();

    Ok(Some(Select::new("Todo", choices).prompt()?.id))
}

fn pick_sort(current: SortOptions) -> anyhow::Result<SortOptions> {
    let fields = vec![SortField::CreatedAt, SortField::Priority];
    let orders = vec![SortOrder::Desc, SortOrder::Asc];

    let field = Select::new("Sort by", fields)
        .with_starting_cursor(if current.field == SortField::Priority { 1 } else { 0 })
        .prompt()?;
    let order = Select::new("Order", orders)
        .with_starting_cursor(if current.order == SortOrder::Asc { 1 } else { 0 })
        .prompt()?;

    Ok(SortOptions { field, order })
}

/// Runs one shell action. Failures are already reported through the
/// notification, only an unauthorized answer ends the shell.
fn run_action(controller: &mut Controller, action: ShellAction) -> anyhow::Result<()> {
    let selected = if action.needs_todo() {
        match pick_todo(controller.state())? {
            Some(id) => Some(id),
            None => return Ok(()),
        }
    } else {
        None
    };

    let result = match (action, selected) {
        (ShellAction::Refresh, _) => controller.fetch(),
        (ShellAction::Create, _) => {
            let todo = prompt_new_todo()?;
            controller.create(&todo).map(|_| ())
        }
        (ShellAction::Edit, Some(id)) => {
            let current = controller
                .state()
                .todos
                .iter()
                .find(|todo| todo.id == id)
                .cloned()
                .ok_or_else(|| anyhow!("Todo not found"))?;
            let patch = prompt_changes(&current)?;
            controller.update(&id, &patch).map(|_| ())
        }
        (ShellAction::Toggle, Some(id)) => controller.toggle(&id).map(|_| ()),
        (ShellAction::Delete, Some(id)) => {
            if Confirm::new("Delete this todo?").with_default(false).prompt()? {
                controller.delete(&id)
            } else {
                Ok(())
            }
        }
        (ShellAction::ClearCompleted, _) => controller.clear_completed().map(|_| ()),
        (ShellAction::Filter, _) => {
            let filter = Select::new("Show", ViewFilter::ALL.to_vec()).prompt()?;
            controller.set_filter(filter)
        }
        (ShellAction::Sort, _) => {
            let sort = pick_sort(controller.state().sort)?;
            controller.set_sort(sort)
        }
        _ => Ok(()),
    };

    match result {
        Err(error @ TodoError::Unauthorized(_)) => Err(error.into()),
        _ => Ok(()),
    }
}

/// Interactive loop over the todo view
pub fn shell(policy: MutationPolicy) -> anyhow::Result<()> {
    let mut controller = controller(policy)?;
    log::debug!("shell started with {} policy", controller.policy());

    if let Err(error @ TodoError::Unauthorized(_)) = controller.fetch() {
        return Err(error.into());
    }

    loop {
        print_state(controller.state());
        print_notification(controller.state());
        controller.dismiss_notification();

        let action = Select::new("Action", ShellAction::ALL.to_vec()).prompt()?;

        if action == ShellAction::Quit {
            break;
        }

        run_action(&mut controller, action)?;
    }

    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::models::todo_model::NewTodo;

    fn todo(due_date: Option<NaiveDate>, completed: bool) -> Todo {
        let owner = Identity::new(uuid::Uuid::new_v4());
        let mut todo = Todo::create(
            NewTodo {
                title: "Renew passport".to_string(),
                priority: Priority::High,
                due_date,
                ..Default::default()
            },
            &owner,
            chrono::Utc::now().naive_utc(),
        );
        todo.completed = completed;
        todo
    }

    #[test]
    fn test_format_overdue_todo() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 2).unwrap();
        let todo = todo(NaiveDate::from_ymd_opt(2024, 6, 1), false);

        assert_eq!(
            format_todo(&todo, today),
            format!("[ ] Renew passport (high, due 2024-06-01, overdue)  {}", todo.id)
        );
    }

    #[test]
    fn test_format_completed_todo_is_never_overdue() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 2).unwrap();
        let todo = todo(NaiveDate::from_ymd_opt(2024, 6, 1), true);

        assert_eq!(
            format_todo(&todo, today),
            format!("[x] Renew passport (high, due 2024-06-01)  {}", todo.id)
        );
    }

    #[test]
    fn test_parse_id() {
        assert!(parse_id("not-a-uuid").is_err());

        let id = TodoId::new();
        assert_eq!(parse_id(&id.to_string()).unwrap(), id);
    }
}
