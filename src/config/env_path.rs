//! Environment file path resolution
//!
//! Maps the deployment mode to a `.<mode>.env` file under a base directory.

use std::fmt;
use std::path::{Component, Path, PathBuf};

/// Variables consulted, in order, for the deployment mode
pub const ENV_MODE_VARS: [&str; 2] = ["APP_ENV", "NODE_ENV"];

/// Named deployment context used to select a configuration file
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum EnvMode {
    #[default]
    Development,
    Production,
    Test,
    /// Any other mode name, kept verbatim
    Custom(String),
}

impl EnvMode {
    /// Interpret a raw mode signal
    ///
    /// An absent or blank signal selects `Development`.
    pub fn from_signal(signal: Option<&str>) -> Self {
        match signal.map(str::trim) {
            None | Some("") => EnvMode::Development,
            Some("development") => EnvMode::Development,
            Some("production") => EnvMode::Production,
            Some("test") => EnvMode::Test,
            Some(other) => EnvMode::Custom(other.to_string()),
        }
    }

    /// Read the mode from the process environment
    pub fn from_env() -> Self {
        let signal = ENV_MODE_VARS
            .iter()
            .filter_map(|var| std::env::var(var).ok())
            .find(|value| !value.trim().is_empty());

        Self::from_signal(signal.as_deref())
    }

    pub fn as_str(&self) -> &str {
        match self {
            EnvMode::Development => "development",
            EnvMode::Production => "production",
            EnvMode::Test => "test",
            EnvMode::Custom(name) => name,
        }
    }

    /// File name for this mode, e.g. `.production.env`
    pub fn file_name(&self) -> String {
        format!(".{}.env", self.as_str())
    }
}

impl fmt::Display for EnvMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for EnvMode {
    fn from(value: &str) -> Self {
        Self::from_signal(Some(value))
    }
}

/// Absolute path of the env file for `mode` under `dest`
///
/// The file name is appended after a `/` separator even when `dest` is
/// empty, so `""` resolves to `/.<mode>.env`.
pub fn resolve_env_file_path(dest: impl AsRef<Path>, mode: &EnvMode) -> PathBuf {
    let mut joined = dest.as_ref().as_os_str().to_os_string();
    joined.push("/");
    joined.push(mode.file_name());
    let joined = PathBuf::from(joined);
    let anchored = if joined.is_absolute() {
        joined
    } else {
        match std::env::current_dir() {
            Ok(cwd) => cwd.join(joined),
            Err(_) => joined,
        }
    };

    normalize_lexically(&anchored)
}

/// Env file path for the mode found in the process environment
pub fn env_file_path(dest: impl AsRef<Path>) -> PathBuf {
    resolve_env_file_path(dest, &EnvMode::from_env())
}

/// Fold `.` and `..` without touching the filesystem
fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                // `..` at the root stays at the root
                if matches!(out.components().next_back(), Some(Component::Normal(_))) {
                    out.pop();
                } else if !out.has_root() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
