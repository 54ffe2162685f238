//! Environment mapping normalization
//!
//! PEM key material is commonly stored in env files as a single line with
//! literal `\n` markers. The normalizer turns those markers back into real
//! newlines and folds lowercase variants of the targeted keys onto their
//! canonical uppercase names.

use crate::shared::logging::LoggingUtils;
use serde_json::{Map, Value};
use std::borrow::Cow;

/// Loaded configuration, keyed by variable name
pub type ConfigMap = Map<String, Value>;

/// Canonical names of the JWT key variables
pub const JWT_KEY_NAMES: [&str; 3] = [
    "JWT_PRIVATE_KEY",
    "JWT_PUBLIC_KEY",
    "JWT_REFRESH_TOKEN_PRIVATE_KEY",
];

/// One targeted key: its canonical name and the alias folded onto it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyRule {
    canonical: String,
    alias: String,
}

impl KeyRule {
    /// Rule whose alias is the lowercase form of `canonical`
    pub fn new(canonical: impl Into<String>) -> Self {
        let canonical = canonical.into();
        let alias = canonical.to_lowercase();
        Self { canonical, alias }
    }

    pub fn with_alias(canonical: impl Into<String>, alias: impl Into<String>) -> Self {
        Self {
            canonical: canonical.into(),
            alias: alias.into(),
        }
    }

    pub fn canonical(&self) -> &str {
        &self.canonical
    }

    pub fn alias(&self) -> &str {
        &self.alias
    }

    fn has_distinct_alias(&self) -> bool {
        self.alias != self.canonical
    }
}

/// Rewrites a configuration mapping for the targeted keys
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvNormalizer {
    rules: Vec<KeyRule>,
}

impl Default for EnvNormalizer {
    fn default() -> Self {
        Self::with_keys(JWT_KEY_NAMES)
    }
}

impl EnvNormalizer {
    pub fn new(rules: Vec<KeyRule>) -> Self {
        Self { rules }
    }

    /// Build rules from canonical names, aliasing each to its lowercase form
    pub fn with_keys<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            rules: keys.into_iter().map(KeyRule::new).collect(),
        }
    }

    pub fn rules(&self) -> &[KeyRule] {
        &self.rules
    }

    /// Return a normalized copy of `input`
    ///
    /// Escapes are converted for every targeted key first, then aliases are
    /// folded. When both names are present the alias value replaces the
    /// canonical one.
    pub fn normalize(&self, input: &ConfigMap) -> ConfigMap {
        let mut output = input.clone();

        for rule in &self.rules {
            for key in [rule.canonical(), rule.alias()] {
                if let Some(Value::String(text)) = output.get_mut(key) {
                    let converted = match unescape_newlines(text) {
                        Cow::Owned(converted) => Some(converted),
                        Cow::Borrowed(_) => None,
                    };
                    if let Some(converted) = converted {
                        *text = converted;
                    }
                }
            }
        }

        for rule in self.rules.iter().filter(|rule| rule.has_distinct_alias()) {
            if let Some(value) = output.remove(rule.alias()) {
                if output.contains_key(rule.canonical()) {
                    LoggingUtils::log_alias_overwrites_canonical(rule.alias(), rule.canonical());
                } else {
                    LoggingUtils::log_alias_merged(rule.alias(), rule.canonical());
                }
                output.insert(rule.canonical().to_string(), value);
            }
        }

        output
    }
}

/// Replace each literal `\n` two-character sequence with a newline
pub fn unescape_newlines(text: &str) -> Cow<'_, str> {
    if text.contains("\\n") {
        Cow::Owned(text.replace("\\n", "\n"))
    } else {
        Cow::Borrowed(text)
    }
}
