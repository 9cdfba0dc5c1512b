lazy_static::lazy_static! {
    /// Host and port of the todo API, used by both the server and the client
    pub static ref API_URL: String = std::env::var("API_URL").unwrap_or_else(|_| String::from("localhost:5900"));

    /// HMAC secret shared with the auth service that signs bearer tokens
    pub static ref JWT_SECRET: String = std::env::var("JWT_SECRET").unwrap_or_else(|_| String::from("secure jwt secret"));
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_address: String,
    /// Postgres connection string. The in-memory store is used without one.
    pub database_url: Option<String>,
    pub workers: usize,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let workers = match std::env::var("SERVER_WORKERS") {
            Ok(raw) => raw.parse().unwrap_or_else(|_| {
                log::warn!("SERVER_WORKERS={} is not a number, using 1", raw);
                1
            }),
            Err(_) => 1,
        };

        Self {
            bind_address: API_URL.clone(),
            database_url: std::env::var("DATABASE_URL")
                .ok()
                .filter(|url| !url.trim().is_empty()),
            workers,
        }
    }
}
