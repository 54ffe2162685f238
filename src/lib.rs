//! Configuration and query translation core for GraphQL CRUD API backends
//!
//! Loads the `.<mode>.env` file for the current deployment mode, normalizes
//! PEM key material stored with escaped newlines, and compiles declarative
//! list filters into parameterized SQL.

pub mod config;
pub mod query;
pub mod shared;

#[cfg(test)]
mod tests;

pub use config::{AppConfig, EnvLoader, EnvMode, EnvNormalizer};
pub use query::{FilterCompiler, FilterNode, QueryOptions, SelectBuilder};
pub use shared::error::{AppError, AppResult};

/// Application result type
pub type Result<T> = std::result::Result<T, shared::error::AppError>;
