use std::fmt::Display;

/// Errors raised on the client side of the todo API
#[derive(Debug, Clone, PartialEq)]
pub enum TodoError {
    /// Server answered with a failure envelope
    Api { status: u16, message: Option<String> },
    /// Missing, expired or rejected bearer token, with the server's reason
    Unauthorized(Option<String>),
    HttpError(String),
    Credentials(String),
    UnexpectedResponse(String),
}

impl TodoError {
    /// Message shown to the user, the server's message when it sent one
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            TodoError::Api {
                message: Some(message),
                ..
            } if !message.trim().is_empty() => message.clone(),
            TodoError::Unauthorized(Some(message)) if !message.trim().is_empty() => {
                format!("{}, login first", message)
            }
            TodoError::Unauthorized(_) => String::from("Login first"),
            _ => String::from(fallback),
        }
    }
}

impl Display for TodoError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Api {
                status,
                message: Some(message),
            } => write!(f, "{} ({})", message, status),
            Self::Api {
                status,
                message: None,
            } => write!(f, "Request failed with status {}", status),
            Self::Unauthorized(Some(message)) => write!(f, "Unauthorized: {}", message),
            Self::Unauthorized(None) => write!(f, "Not logged in or token expired"),
            Self::HttpError(e) => write!(f, "{}", e),
            Self::Credentials(e) => write!(f, "Credentials error: {}", e),
            Self::UnexpectedResponse(e) => write!(f, "Unexpected response: {}", e),
        }
    }
}

impl std::error::Error for TodoError {}

impl From<reqwest::Error> for TodoError {
    fn from(e: reqwest::Error) -> Self {
        TodoError::HttpError(e.to_string())
    }
}

impl From<std::io::Error> for TodoError {
    fn from(e: std::io::Error) -> Self {
        TodoError::Credentials(e.to_string())
    }
}

impl From<serde_json::Error> for TodoError {
    fn from(e: serde_json::Error) -> Self {
        TodoError::UnexpectedResponse(e.to_string())
    }
}
