//! Test fixtures: RSA key material and env file builders

use crate::config::AppConfig;
use std::path::{Path, PathBuf};

pub const JWT_PRIVATE_PEM: &str = include_str!("jwt_private.pem");
pub const JWT_PUBLIC_PEM: &str = include_str!("jwt_public.pem");
pub const JWT_REFRESH_PRIVATE_PEM: &str = include_str!("jwt_refresh_private.pem");

/// PEM text in the single-line form used inside env files
pub fn escaped(pem: &str) -> String {
    pem.trim().replace('\n', "\\n")
}

/// Default configuration with the access key pair set
pub fn keyed_config() -> AppConfig {
    AppConfig {
        jwt_private_key: Some(JWT_PRIVATE_PEM.to_string()),
        jwt_public_key: Some(JWT_PUBLIC_PEM.to_string()),
        ..AppConfig::default()
    }
}

/// Write `lines` as `<dir>/.<mode>.env` and return the path
pub fn write_env_file(dir: &Path, mode: &str, lines: &[String]) -> PathBuf {
    let path = dir.join(format!(".{}.env", mode));
    std::fs::write(&path, lines.join("\n")).expect("write env file");
    path
}
