//! JWT key material
//!
//! Converts the PEM values of a loaded configuration into `jsonwebtoken`
//! keys for RS256 signing and verification.

use crate::config::AppConfig;
use crate::shared::error::AppError;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey};
use sha2::{Digest, Sha256};

/// Algorithm used with the configured RSA keys
pub const JWT_ALGORITHM: Algorithm = Algorithm::RS256;

/// Short SHA-256 fingerprint of key text, safe to log
pub fn fingerprint(pem: &str) -> String {
    let digest = Sha256::digest(pem.trim().as_bytes());
    hex::encode(&digest[..8])
}

/// Signing and verification keys built from configuration
pub struct JwtKeyMaterial {
    access_encoding: EncodingKey,
    access_decoding: DecodingKey,
    refresh_encoding: Option<EncodingKey>,
    access_fingerprint: String,
}

impl JwtKeyMaterial {
    /// Build keys from `config`; `None` when no access key pair is set
    pub fn from_config(config: &AppConfig) -> crate::Result<Option<Self>> {
        let (private_pem, public_pem) = match (&config.jwt_private_key, &config.jwt_public_key) {
            (Some(private_pem), Some(public_pem)) => (private_pem, public_pem),
            (None, None) => return Ok(None),
            _ => {
                return Err(AppError::Key(
                    "JWT_PRIVATE_KEY and JWT_PUBLIC_KEY must be configured together".to_string(),
                ))
            }
        };

        let access_encoding = EncodingKey::from_rsa_pem(private_pem.as_bytes())
            .map_err(|e| AppError::Key(format!("Invalid JWT_PRIVATE_KEY: {}", e)))?;
        let access_decoding = DecodingKey::from_rsa_pem(public_pem.as_bytes())
            .map_err(|e| AppError::Key(format!("Invalid JWT_PUBLIC_KEY: {}", e)))?;

        let refresh_encoding = config
            .jwt_refresh_token_private_key
            .as_deref()
            .map(|pem| {
                EncodingKey::from_rsa_pem(pem.as_bytes()).map_err(|e| {
                    AppError::Key(format!("Invalid JWT_REFRESH_TOKEN_PRIVATE_KEY: {}", e))
                })
            })
            .transpose()?;

        tracing::debug!(
            fingerprint = %fingerprint(private_pem),
            has_refresh_key = refresh_encoding.is_some(),
            "Loaded JWT key material"
        );

        Ok(Some(Self {
            access_encoding,
            access_decoding,
            refresh_encoding,
            access_fingerprint: fingerprint(private_pem),
        }))
    }

    pub fn access_encoding_key(&self) -> &EncodingKey {
        &self.access_encoding
    }

    pub fn access_decoding_key(&self) -> &DecodingKey {
        &self.access_decoding
    }

    /// Refresh signing key, falling back to the access key
    pub fn refresh_encoding_key(&self) -> &EncodingKey {
        self.refresh_encoding.as_ref().unwrap_or(&self.access_encoding)
    }

    pub fn has_dedicated_refresh_key(&self) -> bool {
        self.refresh_encoding.is_some()
    }

    pub fn access_fingerprint(&self) -> &str {
        &self.access_fingerprint
    }
}

impl std::fmt::Debug for JwtKeyMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtKeyMaterial")
            .field("access_fingerprint", &self.access_fingerprint)
            .field("has_dedicated_refresh_key", &self.has_dedicated_refresh_key())
            .finish()
    }
}
