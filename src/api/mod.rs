pub mod api;
pub mod auth;
pub mod auth_utils;
pub mod dtos;
pub mod errors;
mod todos_handler;
pub mod validation;
