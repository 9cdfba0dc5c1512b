use std::sync::Arc;

use actix_web::{self, middleware::Logger, web, App, HttpServer};

use super::{errors::TodoApiError, todos_handler};
use crate::config::ServerConfig;
use crate::store::{MemoryTodoStore, PgTodoStore, TodoStore};

/// Routes of the todo API, mounted under `/api`
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/todos")
            .route("", web::get().to(todos_handler::get_todos))
            .route("", web::post().to(todos_handler::create_todo))
            .route("", web::delete().to(todos_handler::delete_completed_todos))
            .route("/{id}", web::get().to(todos_handler::get_todo))
            .route("/{id}", web::put().to(todos_handler::update_todo))
            .route("/{id}", web::delete().to(todos_handler::delete_todo))
            .route("/{id}/toggle", web::patch().to(todos_handler::toggle_todo)),
    );
}

/// Malformed JSON bodies are answered with the regular error envelope
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .error_handler(|err, _| TodoApiError::BadRequest(format!("Invalid request body: {}", err)).into())
}

pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default()
        .error_handler(|err, _| TodoApiError::BadRequest(format!("Invalid query string: {}", err)).into())
}

fn open_store(config: &ServerConfig, in_memory: bool) -> std::io::Result<Arc<dyn TodoStore>> {
    match (&config.database_url, in_memory) {
        (Some(database_url), false) => {
            let store = PgTodoStore::connect(database_url).map_err(|err| {
                std::io::Error::new(
                    std::io::ErrorKind::Other,
                    format!("Failed to connect to PG database: {}", err),
                )
            })?;
            log::info!("using postgres todo store");
            Ok(Arc::new(store))
        }
        _ => {
            log::warn!("using in-memory todo store, data is lost on shutdown");
            Ok(Arc::new(MemoryTodoStore::new()))
        }
    }
}

async fn serve(config: ServerConfig, store: Arc<dyn TodoStore>) -> std::io::Result<()> {
    log::info!("starting todo api on {}", config.bind_address);

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(web::Data::from(store.clone()))
            .app_data(json_config())
            .app_data(query_config())
            .service(web::scope("/api").configure(configure))
    })
    .workers(config.workers)
    .bind(config.bind_address.as_str())?
    .run()
    .await
}

/// Run the API server until it is stopped
pub fn start_server(config: ServerConfig, in_memory: bool) -> std::io::Result<()> {
    let store = open_store(&config, in_memory)?;

    actix_web::rt::System::new().block_on(serve(config, store))
}
