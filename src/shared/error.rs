//! Error handling module
//!
//! This module provides centralized error handling for the crate.

use serde_json::Value;
use thiserror::Error;

/// Application error types
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Environment file error at {path}: {reason}")]
    EnvFile { path: String, reason: String },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Key material error: {0}")]
    Key(String),

    #[error("Invalid filter: {0}")]
    Filter(String),

    #[error("JSON serialization error: {0}")]
    Json(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// GraphQL error extension code for this error
    pub fn graphql_code(&self) -> &'static str {
        match self {
            AppError::Filter(_) | AppError::Validation(_) | AppError::Json(_) => "BAD_USER_INPUT",
            _ => "INTERNAL_SERVER_ERROR",
        }
    }

    /// Convert to a GraphQL error object
    ///
    /// Internal failures are reported with a generic message so that file
    /// paths and key material never reach API clients.
    pub fn to_graphql_error(&self) -> Value {
        let message = match self.graphql_code() {
            "BAD_USER_INPUT" => self.to_string(),
            _ => "Internal server error".to_string(),
        };

        serde_json::json!({
            "message": message,
            "extensions": {
                "code": self.graphql_code()
            }
        })
    }
}

/// Application result type
pub type AppResult<T> = Result<T, AppError>;

impl From<::config::ConfigError> for AppError {
    fn from(err: ::config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Json(err.to_string())
    }
}

impl From<jsonwebtoken::errors::Error> for AppError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        AppError::Key(err.to_string())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::Validation(err.to_string())
    }
}
