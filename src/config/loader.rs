//! Environment file loading
//!
//! Reads the `.<mode>.env` file for the selected mode, overlays the process
//! environment and runs the normalizer over the result.

use crate::config::app_config::AppConfig;
use crate::config::defaults::default_log_level;
use crate::config::env_path::{resolve_env_file_path, EnvMode};
use crate::config::normalizer::{ConfigMap, EnvNormalizer};
use crate::shared::error::AppError;
use crate::shared::logging::LoggingUtils;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Builder for loading configuration from an env file
#[derive(Debug, Clone)]
pub struct EnvLoader {
    base_dir: PathBuf,
    mode: EnvMode,
    normalizer: EnvNormalizer,
    include_process_env: bool,
    require_file: bool,
}

impl EnvLoader {
    /// Loader rooted at `base_dir` for the mode found in the process environment
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
            mode: EnvMode::from_env(),
            normalizer: EnvNormalizer::default(),
            include_process_env: true,
            require_file: false,
        }
    }

    pub fn with_mode(mut self, mode: EnvMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_normalizer(mut self, normalizer: EnvNormalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    /// Overlay process variables on top of file values (default: on)
    pub fn with_process_env(mut self, enabled: bool) -> Self {
        self.include_process_env = enabled;
        self
    }

    /// Fail when the env file does not exist (default: off)
    pub fn require_file(mut self, required: bool) -> Self {
        self.require_file = required;
        self
    }

    pub fn mode(&self) -> &EnvMode {
        &self.mode
    }

    pub fn env_file_path(&self) -> PathBuf {
        resolve_env_file_path(&self.base_dir, &self.mode)
    }

    /// Merged file and process entries, before normalization
    pub fn load_raw(&self) -> crate::Result<ConfigMap> {
        let path = self.env_file_path();
        let exists = path.is_file();
        LoggingUtils::log_env_file_resolved(self.mode.as_str(), &path, exists);

        let mut map = ConfigMap::new();

        if exists {
            read_env_file(&path, &mut map)?;
        } else if self.require_file {
            return Err(AppError::EnvFile {
                path: path.display().to_string(),
                reason: "file not found".to_string(),
            });
        } else {
            debug!(path = %path.display(), "Environment file not found, continuing without it");
        }

        if self.include_process_env {
            for (key, value) in std::env::vars_os() {
                // non UTF-8 variables cannot be represented in the mapping
                if let (Ok(key), Ok(value)) = (key.into_string(), value.into_string()) {
                    map.insert(key, Value::String(value));
                }
            }
        }

        Ok(map)
    }

    /// Merged entries after normalization
    pub fn load_map(&self) -> crate::Result<ConfigMap> {
        let raw = self.load_raw()?;
        Ok(self.normalizer.normalize(&raw))
    }

    /// Typed, validated configuration
    pub fn load(&self) -> crate::Result<AppConfig> {
        let map = self.load_map()?;
        let config = AppConfig::from_map(&map)?;

        LoggingUtils::log_config_loaded(self.mode.as_str(), map.len(), &config.redacted_summary());

        Ok(config)
    }

    /// Log level configured for this mode, or the default when loading fails
    ///
    /// Meant to run before a subscriber is installed, so the events emitted
    /// while loading are discarded.
    pub fn log_level(&self) -> String {
        self.load()
            .map(|config| config.log_level)
            .unwrap_or_else(|_| default_log_level())
    }
}

fn read_env_file(path: &Path, map: &mut ConfigMap) -> crate::Result<()> {
    let env_file_error = |reason: String| AppError::EnvFile {
        path: path.display().to_string(),
        reason,
    };

    let entries = dotenvy::from_path_iter(path).map_err(|e| env_file_error(e.to_string()))?;
    for entry in entries {
        let (key, value) = entry.map_err(|e| env_file_error(e.to_string()))?;
        map.insert(key, Value::String(value));
    }

    Ok(())
}
