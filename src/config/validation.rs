//! Configuration validation module
//!
//! This module provides additional validation logic for configuration
//! beyond the basic validator crate validation.

use crate::config::AppConfig;
use crate::shared::error::AppError;
use regex::Regex;
use std::sync::OnceLock;

fn pem_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?s)-----BEGIN ([A-Z0-9 ]+)-----\r?\n.+?\r?\n-----END ([A-Z0-9 ]+)-----")
            .expect("PEM pattern is valid")
    })
}

/// Kind of key a PEM value is expected to hold
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PemKind {
    Private,
    Public,
}

impl PemKind {
    fn label_suffix(self) -> &'static str {
        match self {
            PemKind::Private => "PRIVATE KEY",
            PemKind::Public => "PUBLIC KEY",
        }
    }
}

/// Configuration validator for additional validation logic
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the complete configuration
    pub fn validate_config(config: &AppConfig) -> crate::Result<()> {
        Self::validate_key_pairing(config)?;

        let keys = [
            ("JWT_PRIVATE_KEY", &config.jwt_private_key, PemKind::Private),
            ("JWT_PUBLIC_KEY", &config.jwt_public_key, PemKind::Public),
            ("JWT_REFRESH_TOKEN_PRIVATE_KEY", &config.jwt_refresh_token_private_key, PemKind::Private),
        ];
        for (name, value, kind) in keys {
            if let Some(pem) = value {
                Self::validate_pem(name, pem, kind)?;
            }
        }

        Self::validate_token_ttls(config)?;

        Ok(())
    }

    /// Validate that a value holds a PEM block of the expected kind
    pub fn validate_pem(name: &str, value: &str, kind: PemKind) -> crate::Result<()> {
        if !value.contains('\n') && value.contains("\\n") {
            return Err(AppError::Validation(format!(
                "{} still contains escaped newlines; normalize the environment before use",
                name
            )));
        }

        let captures = pem_pattern().captures(value).ok_or_else(|| {
            AppError::Validation(format!("{} is not a PEM encoded key", name))
        })?;

        let begin = &captures[1];
        let end = &captures[2];
        if begin != end {
            return Err(AppError::Validation(format!(
                "{} has mismatched PEM labels: BEGIN {} / END {}",
                name, begin, end
            )));
        }

        if !begin.ends_with(kind.label_suffix()) {
            return Err(AppError::Validation(format!(
                "{} must hold a {}, found {}",
                name,
                kind.label_suffix().to_lowercase(),
                begin
            )));
        }

        Ok(())
    }

    /// Private and public access keys come as a pair
    fn validate_key_pairing(config: &AppConfig) -> crate::Result<()> {
        match (&config.jwt_private_key, &config.jwt_public_key) {
            (Some(_), None) => Err(AppError::Validation(
                "JWT_PRIVATE_KEY is set but JWT_PUBLIC_KEY is missing".to_string(),
            )),
            (None, Some(_)) => Err(AppError::Validation(
                "JWT_PUBLIC_KEY is set but JWT_PRIVATE_KEY is missing".to_string(),
            )),
            _ => Ok(()),
        }
    }

    fn validate_token_ttls(config: &AppConfig) -> crate::Result<()> {
        if config.jwt_refresh_token_ttl_seconds < config.jwt_access_token_ttl_seconds {
            return Err(AppError::Validation(
                "Refresh token TTL cannot be shorter than access token TTL".to_string(),
            ));
        }

        Ok(())
    }
}
