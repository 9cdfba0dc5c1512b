use actix_web::{http, HttpResponse, ResponseError};
use derive_more::Display;
use diesel::result::Error as DBError;
use jsonwebtoken::errors::ErrorKind;
use serde::{Deserialize, Serialize};
use std::convert::From;
use uuid::Error as ParseError;

use super::dtos::todo::ApiResponse;

#[derive(Debug)]
pub enum AuthError {
    ///Token is invalid
    InvalidToken,
    NoAuthorizationHeader,
    InvalidAuthorizationHeader,
    TokenExpired,
    /// Token subject is not a user id
    InvalidSubject,
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidAuthorizationHeader => {
                write!(f, "Authorization header is not in valid format")
            }
            Self::NoAuthorizationHeader => write!(f, "No Authorization Header"),
            Self::InvalidToken => write!(f, "Invalid JWT Token"),
            Self::TokenExpired => write!(f, "Token Expired"),
            Self::InvalidSubject => write!(f, "Token subject is not a valid user id"),
        }
    }
}

impl std::error::Error for AuthError {}

/// A single field level validation failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Display)]
pub enum TodoApiError {
    #[display(fmt = "Internal Server Error: {}", _0)]
    InternalServerError(String),

    #[display(fmt = "BadRequest: {}", _0)]
    BadRequest(String),

    #[display(fmt = "Validation failed")]
    ValidationFailed(Vec<FieldError>),

    #[display(fmt = "Invalid {} ID", _0)]
    InvalidId(String),

    #[display(fmt = "Database Connection Error")]
    DatabaseConnectionError,

    #[display(fmt = "Authentication Error: {}", _0)]
    AuthError(AuthError),

    #[display(fmt = "{} Not Found", _0)]
    NotFound(String),
}

impl TodoApiError {
    pub fn todo_not_found() -> Self {
        TodoApiError::NotFound(String::from("Todo"))
    }

    pub fn invalid_todo_id() -> Self {
        TodoApiError::InvalidId(String::from("todo"))
    }

    /// Message returned to the caller. Internal details stay in the logs.
    pub fn public_message(&self) -> String {
        match self {
            TodoApiError::InternalServerError(_) | TodoApiError::DatabaseConnectionError => {
                String::from("Server error")
            }
            TodoApiError::BadRequest(message) => message.clone(),
            TodoApiError::ValidationFailed(_) => String::from("Validation failed"),
            TodoApiError::InvalidId(resource) => format!("Invalid {} ID", resource),
            TodoApiError::AuthError(e) => e.to_string(),
            TodoApiError::NotFound(resource) => format!("{} not found", resource),
        }
    }
}

impl ResponseError for TodoApiError {
    fn status_code(&self) -> actix_web::http::StatusCode {
        match self {
            TodoApiError::InternalServerError(_) | TodoApiError::DatabaseConnectionError => {
                http::StatusCode::INTERNAL_SERVER_ERROR
            }
            TodoApiError::AuthError(_) => http::StatusCode::UNAUTHORIZED,
            TodoApiError::BadRequest(_)
            | TodoApiError::ValidationFailed(_)
            | TodoApiError::InvalidId(_) => http::StatusCode::BAD_REQUEST,
            TodoApiError::NotFound(_) => http::StatusCode::NOT_FOUND,
        }
    }

    fn error_response(&self) -> HttpResponse<actix_web::body::BoxBody> {
        let status = self.status_code();

        if status.is_server_error() {
            log::error!("{}", self);
        } else {
            log::debug!("request rejected: {}", self);
        }

        let mut body = ApiResponse::<()>::failure(self.public_message());

        if let TodoApiError::ValidationFailed(errors) = self {
            body.errors = Some(errors.clone());
        }

        HttpResponse::build(status).json(body)
    }
}

impl From<jsonwebtoken::errors::Error> for AuthError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.into_kind() {
            ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            _ => AuthError::InvalidToken,
        }
    }
}

impl From<AuthError> for TodoApiError {
    fn from(err: AuthError) -> Self {
        TodoApiError::AuthError(err)
    }
}

impl From<ParseError> for TodoApiError {
    fn from(_: ParseError) -> Self {
        TodoApiError::invalid_todo_id()
    }
}

impl From<r2d2::Error> for TodoApiError {
    fn from(err: r2d2::Error) -> Self {
        log::error!("database pool error: {}", err);
        TodoApiError::DatabaseConnectionError
    }
}

impl From<jsonwebtoken::errors::Error> for TodoApiError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        TodoApiError::AuthError(err.into())
    }
}

impl From<DBError> for TodoApiError {
    fn from(error: DBError) -> Self {
        match error {
            DBError::NotFound => TodoApiError::todo_not_found(),
            other => TodoApiError::InternalServerError(other.to_string()),
        }
    }
}
