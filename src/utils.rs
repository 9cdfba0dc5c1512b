use std::{
    io::Write,
    path::{Path, PathBuf},
};

use crate::config::API_URL;
use crate::errors::TodoError;

/// Location of the saved login token, `~/todo/credentials`
pub fn credentials_path() -> Result<PathBuf, TodoError> {
    let mut path = dirs::home_dir()
        .ok_or_else(|| TodoError::Credentials(String::from("home directory not found")))?;

    path.push("todo");
    path.push("credentials");

    Ok(path)
}

/// Get token saved to credentials
pub fn get_saved_token() -> Result<String, TodoError> {
    read_token(&credentials_path()?)
}

/// Saves login token at ~/todo/credentials
pub fn save_token(token: &str) -> Result<(), TodoError> {
    write_token(&credentials_path()?, token)
}

/// Forget the saved token. Missing credentials are not an error.
pub fn clear_token() -> Result<(), TodoError> {
    remove_token(&credentials_path()?)
}

fn read_token(path: &Path) -> Result<String, TodoError> {
    if !path.exists() {
        return Err(TodoError::Unauthorized(None));
    }

    let contents = std::fs::read_to_string(path)?;

    let json: serde_json::Value = serde_json::from_str(contents.as_str())
        .map_err(|e| TodoError::Credentials(e.to_string()))?;

    json.get("token")
        .and_then(|token| token.as_str())
        .filter(|token| !token.is_empty())
        .map(String::from)
        .ok_or_else(|| TodoError::Credentials(String::from("no token in credentials file")))
}

fn write_token(path: &Path, token: &str) -> Result<(), TodoError> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }

    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(path)?;

    let data = serde_json::json!({ "token": token });

    file.write_all(data.to_string().as_bytes())?;

    Ok(())
}

fn remove_token(path: &Path) -> Result<(), TodoError> {
    match std::fs::remove_file(path) {
        Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e.into()),
        _ => Ok(()),
    }
}

pub fn make_api_url(resource: &str) -> String {
    format!("http://{}/api/{}", API_URL.as_str(), resource)
}
