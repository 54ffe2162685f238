//! Shared utilities and common functionality
//!
//! This module contains error handling, logging and name validation
//! used across the configuration and query layers.

pub mod error;
pub mod logging;
pub mod validation;

pub use error::{AppError, AppResult};
pub use logging::LoggingUtils;
pub use validation::ValidationUtils;
