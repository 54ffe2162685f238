//! Configuration management module
//!
//! This module handles all configuration concerns: choosing the env file
//! for the deployment mode, loading and normalizing it, validation, and
//! turning key material into usable keys.

pub mod app_config;
pub mod defaults;
pub mod env_path;
pub mod keys;
pub mod loader;
pub mod normalizer;
pub mod validation;

pub use app_config::AppConfig;
pub use env_path::{env_file_path, resolve_env_file_path, EnvMode};
pub use keys::JwtKeyMaterial;
pub use loader::EnvLoader;
pub use normalizer::{ConfigMap, EnvNormalizer, KeyRule};
pub use validation::ConfigValidator;
