//! Application configuration structures
//!
//! Every field accepts both its lowercase name and the canonical uppercase
//! env variable name, so a normalized env mapping deserializes directly.

use crate::config::defaults::*;
use crate::config::keys::fingerprint;
use crate::config::loader::EnvLoader;
use crate::config::normalizer::ConfigMap;
use crate::config::validation::ConfigValidator;
use crate::shared::error::AppError;
use crate::shared::validation::ValidationUtils;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::Validate;

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AppConfig {
    /// HTTP port of the API
    #[serde(alias = "PORT", default = "default_port")]
    #[validate(range(min = 1))]
    pub port: u16,

    /// Database host
    #[serde(alias = "DB_HOST", default = "default_db_host")]
    #[validate(length(min = 1))]
    pub db_host: String,

    /// Database port
    #[serde(alias = "DB_PORT", default = "default_db_port")]
    #[validate(range(min = 1))]
    pub db_port: u16,

    /// Database user
    #[serde(alias = "DB_USERNAME", default = "default_db_username")]
    #[validate(length(min = 1))]
    pub db_username: String,

    /// Database password
    #[serde(alias = "DB_PASSWORD", default, skip_serializing)]
    pub db_password: String,

    /// Database name
    #[serde(alias = "DB_NAME", default = "default_db_name")]
    #[validate(length(min = 1))]
    pub db_name: String,

    /// Let the ORM synchronize the schema on startup
    #[serde(alias = "DB_SYNCHRONIZE", default)]
    pub db_synchronize: bool,

    /// Default log level (overridden by `RUST_LOG`)
    #[serde(alias = "LOG_LEVEL", default = "default_log_level")]
    #[validate(length(min = 1))]
    pub log_level: String,

    /// Upper bound for page sizes in list queries
    #[serde(alias = "QUERY_MAX_LIMIT", default = "default_query_max_limit")]
    #[validate(range(min = 1, max = 10000))]
    pub query_max_limit: u32,

    /// PEM private key for signing access tokens
    #[serde(alias = "JWT_PRIVATE_KEY", default, skip_serializing)]
    pub jwt_private_key: Option<String>,

    /// PEM public key for verifying access tokens
    #[serde(alias = "JWT_PUBLIC_KEY", default, skip_serializing)]
    pub jwt_public_key: Option<String>,

    /// PEM private key for signing refresh tokens
    #[serde(alias = "JWT_REFRESH_TOKEN_PRIVATE_KEY", default, skip_serializing)]
    pub jwt_refresh_token_private_key: Option<String>,

    /// Access token lifetime in seconds
    #[serde(alias = "JWT_ACCESS_TOKEN_TTL_SECONDS", default = "default_access_token_ttl_seconds")]
    #[validate(range(min = 1))]
    pub jwt_access_token_ttl_seconds: u64,

    /// Refresh token lifetime in seconds
    #[serde(alias = "JWT_REFRESH_TOKEN_TTL_SECONDS", default = "default_refresh_token_ttl_seconds")]
    #[validate(range(min = 1))]
    pub jwt_refresh_token_ttl_seconds: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            db_host: default_db_host(),
            db_port: default_db_port(),
            db_username: default_db_username(),
            db_password: String::new(),
            db_name: default_db_name(),
            db_synchronize: false,
            log_level: default_log_level(),
            query_max_limit: default_query_max_limit(),
            jwt_private_key: None,
            jwt_public_key: None,
            jwt_refresh_token_private_key: None,
            jwt_access_token_ttl_seconds: default_access_token_ttl_seconds(),
            jwt_refresh_token_ttl_seconds: default_refresh_token_ttl_seconds(),
        }
    }
}

impl AppConfig {
    /// Load configuration for the current mode from the working directory
    pub fn load() -> crate::Result<Self> {
        EnvLoader::new(".").load()
    }

    /// Build a validated configuration from a normalized env mapping
    ///
    /// Entries whose names are not plain identifiers and `null` values are
    /// skipped. Every value reaches the source as a string; numbers and
    /// booleans are parsed from it only where the field is typed so.
    pub fn from_map(map: &ConfigMap) -> crate::Result<Self> {
        let source: ::config::Map<String, String> = map
            .iter()
            .filter(|(key, _)| ValidationUtils::validate_env_key(key).is_ok())
            .filter_map(|(key, value)| env_string(value).map(|text| (key.clone(), text)))
            .collect();

        let settings = ::config::Config::builder()
            .add_source(::config::Environment::default().source(Some(source)))
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build configuration: {}", e)))?;

        let config: AppConfig = settings
            .try_deserialize()
            .map_err(|e| AppError::Config(format!("Failed to deserialize configuration: {}", e)))?;

        config.validate_config()?;

        Ok(config)
    }

    /// Validate the entire configuration
    pub fn validate_config(&self) -> crate::Result<()> {
        self.validate()?;
        ConfigValidator::validate_config(self)
    }

    /// Get server address as string
    pub fn server_address(&self) -> String {
        format!("0.0.0.0:{}", self.port)
    }

    /// Postgres connection URL
    pub fn database_url(&self) -> String {
        if self.db_password.is_empty() {
            format!(
                "postgres://{}@{}:{}/{}",
                self.db_username, self.db_host, self.db_port, self.db_name
            )
        } else {
            format!(
                "postgres://{}:{}@{}:{}/{}",
                self.db_username, self.db_password, self.db_host, self.db_port, self.db_name
            )
        }
    }

    /// Whether an access token key pair is configured
    pub fn has_access_keys(&self) -> bool {
        self.jwt_private_key.is_some() && self.jwt_public_key.is_some()
    }

    /// Loggable view of the configuration; secrets appear as fingerprints
    pub fn redacted_summary(&self) -> Value {
        let key = |pem: &Option<String>| pem.as_deref().map(fingerprint);

        serde_json::json!({
            "port": self.port,
            "db_host": self.db_host,
            "db_port": self.db_port,
            "db_username": self.db_username,
            "db_password": if self.db_password.is_empty() { "<empty>" } else { "<redacted>" },
            "db_name": self.db_name,
            "db_synchronize": self.db_synchronize,
            "log_level": self.log_level,
            "query_max_limit": self.query_max_limit,
            "jwt_private_key": key(&self.jwt_private_key),
            "jwt_public_key": key(&self.jwt_public_key),
            "jwt_refresh_token_private_key": key(&self.jwt_refresh_token_private_key),
            "jwt_access_token_ttl_seconds": self.jwt_access_token_ttl_seconds,
            "jwt_refresh_token_ttl_seconds": self.jwt_refresh_token_ttl_seconds,
        })
    }
}

/// String form of a mapping value as an env source would see it
fn env_string(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) => Some(text.clone()),
        other => Some(other.to_string()),
    }
}
