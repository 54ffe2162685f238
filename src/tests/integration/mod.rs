//! Integration tests for env file loading
//!
//! Each test works in its own temporary directory. Tests that touch the
//! process environment hold `env_guard::lock()`.

use crate::config::keys::JWT_ALGORITHM;
use crate::config::{EnvLoader, EnvMode, EnvNormalizer, JwtKeyMaterial};
use crate::query::{QueryOptions, SelectBuilder};
use crate::shared::error::AppError;
use crate::tests::env_guard;
use crate::tests::fixtures::{escaped, write_env_file, JWT_PRIVATE_PEM, JWT_PUBLIC_PEM, JWT_REFRESH_PRIVATE_PEM};
use jsonwebtoken::{decode, encode, Header, Validation};
use serde_json::{json, Value};
use tempfile::TempDir;

fn isolated_loader(dir: &TempDir, mode: EnvMode) -> EnvLoader {
    EnvLoader::new(dir.path()).with_mode(mode).with_process_env(false)
}

#[test]
fn test_loads_mode_specific_file() {
    let dir = TempDir::new().unwrap();
    write_env_file(dir.path(), "test", &["PORT=4000".to_string(), "DB_NAME=crud_test".to_string()]);
    write_env_file(dir.path(), "production", &["PORT=80".to_string()]);

    let config = isolated_loader(&dir, EnvMode::Test).load().unwrap();

    assert_eq!(config.port, 4000);
    assert_eq!(config.db_name, "crud_test");
}

#[test]
fn test_escaped_keys_are_usable_after_loading() {
    let dir = TempDir::new().unwrap();
    write_env_file(
        dir.path(),
        "development",
        &[
            "# single quotes keep the \\n markers literal".to_string(),
            format!("JWT_PRIVATE_KEY='{}'", escaped(JWT_PRIVATE_PEM)),
            format!("jwt_public_key='{}'", escaped(JWT_PUBLIC_PEM)),
            format!("jwt_refresh_token_private_key='{}'", escaped(JWT_REFRESH_PRIVATE_PEM)),
        ],
    );

    let loader = isolated_loader(&dir, EnvMode::Development);

    let raw = loader.load_raw().unwrap();
    assert!(raw["JWT_PRIVATE_KEY"].as_str().unwrap().contains("\\n"));

    let map = loader.load_map().unwrap();
    assert!(!map.contains_key("jwt_public_key"));
    assert_eq!(map["JWT_PUBLIC_KEY"], JWT_PUBLIC_PEM.trim());

    let config = loader.load().unwrap();
    assert_eq!(config.jwt_private_key.as_deref(), Some(JWT_PRIVATE_PEM.trim()));
    assert_eq!(config.jwt_refresh_token_private_key.as_deref(), Some(JWT_REFRESH_PRIVATE_PEM.trim()));

    let keys = JwtKeyMaterial::from_config(&config).unwrap().unwrap();
    let claims = json!({ "sub": "42", "exp": 4_102_444_800u64 });
    let token = encode(&Header::new(JWT_ALGORITHM), &claims, keys.access_encoding_key()).unwrap();
    let decoded = decode::<Value>(&token, keys.access_decoding_key(), &Validation::new(JWT_ALGORITHM)).unwrap();

    assert_eq!(decoded.claims["sub"], "42");
}

#[test]
fn test_without_normalizer_rules_keys_fail_validation() {
    let dir = TempDir::new().unwrap();
    write_env_file(
        dir.path(),
        "test",
        &[
            format!("JWT_PRIVATE_KEY='{}'", escaped(JWT_PRIVATE_PEM)),
            format!("JWT_PUBLIC_KEY='{}'", escaped(JWT_PUBLIC_PEM)),
        ],
    );

    let error = isolated_loader(&dir, EnvMode::Test)
        .with_normalizer(EnvNormalizer::new(Vec::new()))
        .load()
        .unwrap_err();

    assert!(matches!(error, AppError::Validation(_)));
    assert!(error.to_string().contains("escaped newlines"));
}

#[test]
fn test_double_quoted_keys_are_accepted() {
    let dir = TempDir::new().unwrap();
    write_env_file(
        dir.path(),
        "test",
        &[
            format!("JWT_PRIVATE_KEY=\"{}\"", escaped(JWT_PRIVATE_PEM)),
            format!("JWT_PUBLIC_KEY=\"{}\"", escaped(JWT_PUBLIC_PEM)),
        ],
    );

    let config = isolated_loader(&dir, EnvMode::Test).load().unwrap();
    assert!(config.has_access_keys());
    assert!(JwtKeyMaterial::from_config(&config).unwrap().is_some());
}

#[test]
fn test_missing_file_uses_defaults() {
    let dir = TempDir::new().unwrap();

    let config = isolated_loader(&dir, EnvMode::Production).load().unwrap();

    assert_eq!(config.port, 8000);
    assert!(config.jwt_private_key.is_none());
}

#[test]
fn test_missing_required_file_is_an_error() {
    let dir = TempDir::new().unwrap();

    let error = isolated_loader(&dir, EnvMode::Production)
        .require_file(true)
        .load()
        .unwrap_err();

    match error {
        AppError::EnvFile { path, reason } => {
            assert!(path.ends_with(".production.env"));
            assert_eq!(reason, "file not found");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_malformed_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    write_env_file(dir.path(), "test", &["PORT=3000".to_string(), "not a valid line".to_string()]);

    let error = isolated_loader(&dir, EnvMode::Test).load_raw().unwrap_err();
    assert!(matches!(error, AppError::EnvFile { .. }));
}

#[test]
fn test_process_env_overrides_file() {
    let _guard = env_guard::lock();
    let dir = TempDir::new().unwrap();
    write_env_file(
        dir.path(),
        "test",
        &[
            "CRUD_API_CONFIG_TEST_OVERRIDE=file".to_string(),
            "CRUD_API_CONFIG_TEST_FILE_ONLY=kept".to_string(),
        ],
    );

    std::env::set_var("CRUD_API_CONFIG_TEST_OVERRIDE", "process");
    let map = EnvLoader::new(dir.path()).with_mode(EnvMode::Test).load_raw();
    std::env::remove_var("CRUD_API_CONFIG_TEST_OVERRIDE");

    let map = map.unwrap();
    assert_eq!(map["CRUD_API_CONFIG_TEST_OVERRIDE"], "process");
    assert_eq!(map["CRUD_API_CONFIG_TEST_FILE_ONLY"], "kept");
}

#[test]
fn test_mode_is_read_from_process_env() {
    let _guard = env_guard::lock();
    let dir = TempDir::new().unwrap();
    let previous: Vec<_> = crate::config::env_path::ENV_MODE_VARS
        .iter()
        .map(|var| (*var, std::env::var(var).ok()))
        .collect();

    std::env::remove_var("NODE_ENV");
    std::env::set_var("APP_ENV", "production");
    let production = EnvLoader::new(dir.path()).env_file_path();

    std::env::remove_var("APP_ENV");
    std::env::set_var("NODE_ENV", "test");
    let test = EnvLoader::new(dir.path()).env_file_path();

    std::env::remove_var("NODE_ENV");
    let development = crate::config::env_file_path(dir.path());

    for (var, value) in previous {
        match value {
            Some(value) => std::env::set_var(var, value),
            None => std::env::remove_var(var),
        }
    }

    assert_eq!(production, dir.path().join(".production.env"));
    assert_eq!(test, dir.path().join(".test.env"));
    assert_eq!(development, dir.path().join(".development.env"));
}

#[test]
fn test_loaded_limit_drives_list_statements() {
    let dir = TempDir::new().unwrap();
    write_env_file(dir.path(), "test", &["QUERY_MAX_LIMIT=25".to_string()]);
    let config = isolated_loader(&dir, EnvMode::Test).load().unwrap();

    let options = QueryOptions::from_value(json!({
        "where": { "category_id": { "$in": [1, 2] } },
        "pagination": { "limit": 1000 }
    }))
    .unwrap();
    let fragment = SelectBuilder::for_config("equipment", &config).select(&options).unwrap();

    assert_eq!(
        fragment.sql,
        "SELECT * FROM \"equipment\" WHERE \"category_id\" IN ($1, $2) LIMIT $3 OFFSET $4"
    );
    assert_eq!(fragment.params, vec![json!(1), json!(2), json!(25), json!(0)]);
}

#[test]
fn test_log_level_is_read_from_env_file() {
    let dir = TempDir::new().unwrap();
    write_env_file(dir.path(), "test", &["LOG_LEVEL=debug".to_string()]);

    assert_eq!(isolated_loader(&dir, EnvMode::Test).log_level(), "debug");
}

#[test]
fn test_log_level_falls_back_when_loading_fails() {
    let dir = TempDir::new().unwrap();
    write_env_file(
        dir.path(),
        "test",
        &["LOG_LEVEL=debug".to_string(), "PORT=not-a-port".to_string()],
    );

    assert_eq!(isolated_loader(&dir, EnvMode::Test).log_level(), "info");
}
