//! Logging utilities module
//!
//! This module provides centralized logging functionality and utilities.

use std::path::Path;
use tracing::{debug, info, warn};

/// Logging utilities for the crate
pub struct LoggingUtils;

impl LoggingUtils {
    /// Initialize logging with the given default level
    ///
    /// `RUST_LOG` takes precedence over `level` when it is set.
    pub fn initialize(level: &str) -> crate::Result<()> {
        use tracing_subscriber::{fmt, EnvFilter};

        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(level));

        let subscriber = fmt::Subscriber::builder()
            .with_env_filter(filter)
            .with_target(false)
            .with_thread_ids(true)
            .with_thread_names(true)
            .with_file(true)
            .with_line_number(true)
            .with_ansi(false)
            .finish();

        tracing::subscriber::set_global_default(subscriber)
            .map_err(|e| crate::shared::error::AppError::Internal(format!("Failed to initialize logging: {}", e)))?;

        Ok(())
    }

    /// Log the env file selected for the current mode
    pub fn log_env_file_resolved(mode: &str, path: &Path, exists: bool) {
        info!(
            mode = %mode,
            path = %path.display(),
            exists = exists,
            "Resolved environment file"
        );
    }

    /// Log a lowercase key folded onto its canonical name
    pub fn log_alias_merged(alias: &str, canonical: &str) {
        debug!(
            alias = %alias,
            canonical = %canonical,
            "Merged lowercase environment key"
        );
    }

    /// Log a lowercase key overwriting an already present canonical key
    pub fn log_alias_overwrites_canonical(alias: &str, canonical: &str) {
        warn!(
            alias = %alias,
            canonical = %canonical,
            "Both canonical and lowercase keys are set; lowercase value wins"
        );
    }

    /// Log a successfully loaded configuration
    pub fn log_config_loaded(mode: &str, entries: usize, summary: &serde_json::Value) {
        info!(
            mode = %mode,
            entries = entries,
            summary = %summary,
            "Configuration loaded"
        );
    }
}
