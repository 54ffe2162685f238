//! Validation utilities module
//!
//! Name checks shared by the configuration layer and the query compiler.

use crate::shared::error::AppError;
use regex::Regex;
use std::sync::OnceLock;

/// Longest identifier Postgres accepts without truncation
pub const MAX_IDENTIFIER_LEN: usize = 63;

fn identifier_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier pattern is valid"))
}

/// Validation utilities for the crate
pub struct ValidationUtils;

impl ValidationUtils {
    /// Validate a SQL identifier used as a table, column or filter field
    pub fn validate_identifier(name: &str) -> crate::Result<()> {
        if name.is_empty() {
            return Err(AppError::Validation("Identifier cannot be empty".to_string()));
        }

        if name.len() > MAX_IDENTIFIER_LEN {
            return Err(AppError::Validation(format!(
                "Identifier '{}' too long (max {} characters)",
                name, MAX_IDENTIFIER_LEN
            )));
        }

        if !identifier_pattern().is_match(name) {
            return Err(AppError::Validation(format!(
                "Identifier '{}' contains invalid characters",
                name
            )));
        }

        Ok(())
    }

    /// Validate an environment variable name
    ///
    /// Dots are rejected because the `config` crate reads them as nesting.
    pub fn validate_env_key(key: &str) -> crate::Result<()> {
        if !identifier_pattern().is_match(key) {
            return Err(AppError::Validation(format!(
                "Invalid environment variable name '{}'",
                key
            )));
        }

        Ok(())
    }

    /// Quote an identifier for SQL after validating it
    pub fn quote_identifier(name: &str) -> crate::Result<String> {
        Self::validate_identifier(name)?;
        Ok(format!("\"{}\"", name))
    }

    /// Escape LIKE wildcards so the input matches literally
    pub fn escape_like_pattern(input: &str) -> String {
        input
            .replace('\\', "\\\\")
            .replace('%', "\\%")
            .replace('_', "\\_")
    }
}
