#[macro_use]
extern crate diesel;

use api::api::start_server;
use clap::{Parser, Subcommand};
use dotenv::dotenv;

use crate::client::{MutationPolicy, SortOptions, ViewFilter};
use crate::config::ServerConfig;
use crate::models::todo_model::{SortField, SortOrder};
use crate::todo_commands::report;

mod api;
mod client;
mod config;
mod errors;
mod models;
mod schema;
mod store;
mod todo_commands;
mod utils;

#[derive(Debug, Subcommand)]
enum Commands {
    /// Save a bearer token issued by the auth service
    Login,
    Logout,
    /// Sign a development token with the configured JWT secret
    IssueToken {
        #[clap(long)]
        user: String,
        #[clap(long, default_value = "7")]
        days: i64,
        /// Also save it as the login token
        #[clap(long)]
        save: bool,
    },
    #[clap(alias = "ls")]
    List {
        #[clap(long, default_value = "all")]
        filter: ViewFilter,
        #[clap(long = "sort-by", default_value = "createdAt")]
        sort_by: SortField,
        #[clap(long, default_value = "desc")]
        order: SortOrder,
    },
    #[clap(alias = "c")]
    Create,
    Edit {
        id: String,
    },
    Toggle {
        id: String,
    },
    #[clap(alias = "rm")]
    Delete {
        id: String,
    },
    ClearCompleted,
    /// Interactive todo list
    Shell {
        /// optimistic or refetch, defaults to TODO_MUTATION_POLICY
        #[clap(long)]
        policy: Option<MutationPolicy>,
    },
}

#[derive(Debug, Parser)]
#[clap(author, version, about, long_about = "Manage todos from command line")]
struct TodoArgs {
    #[clap(short = 's', long = "start-server")]
    start_server: bool,

    /// Keep todos in memory even when DATABASE_URL is set
    #[clap(long = "in-memory")]
    in_memory: bool,

    #[clap(subcommand)]
    command: Option<Commands>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("todo_tracker=info,actix_web=info"),
    )
    .init();

    let args = TodoArgs::parse();

    if args.start_server {
        let config = ServerConfig::from_env();
        println!("Starting Server on {}", config.bind_address);
        start_server(config, args.in_memory)?;

        return Ok(());
    }

    match args.command {
        Some(Commands::Login) => report(todo_commands::login()),
        Some(Commands::Logout) => report(todo_commands::logout()),
        Some(Commands::IssueToken { user, days, save }) => {
            report(todo_commands::issue_token(&user, days, save))
        }
        Some(Commands::List {
            filter,
            sort_by,
            order,
        }) => report(todo_commands::list_todos(
            filter,
            SortOptions {
                field: sort_by,
                order,
            },
        )),
        Some(Commands::Create) => report(todo_commands::create_todo()),
        Some(Commands::Edit { id }) => report(todo_commands::edit_todo(&id)),
        Some(Commands::Toggle { id }) => report(todo_commands::toggle_todo(&id)),
        Some(Commands::Delete { id }) => report(todo_commands::delete_todo(&id)),
        Some(Commands::ClearCompleted) => report(todo_commands::clear_completed()),
        Some(Commands::Shell { policy }) => report(todo_commands::shell(
            policy.unwrap_or_else(MutationPolicy::from_env),
        )),
        None => {}
    }

    Ok(())
}
