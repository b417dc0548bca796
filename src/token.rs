use std::sync::Arc;

use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, encode};
use serde::{Deserialize, Serialize};

use crate::models::User;

/// Lifetime of every issued token (7 days). Fixed, not configurable per call.
pub const TOKEN_LIFETIME_SECS: i64 = 7 * 24 * 60 * 60;

/// Claims
///
/// Payload carried inside every JWT issued by this service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    /// Subject (sub): the numeric user id, rendered as a string per RFC 7519.
    pub sub: String,
    /// The role asserted at issuance time.
    pub role: String,
    /// Issued At (iat), seconds since the epoch.
    pub iat: i64,
    /// Expiration Time (exp): iat + 7 days.
    pub exp: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("JWT signing secret is empty")]
    EmptySecret,
    #[error("failed to sign token: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),
}

/// TokenKeys
///
/// The process-wide HS256 key material. Built once at startup from `AppConfig::jwt_secret`
/// and shared read-only (behind an `Arc`) by the issuer and the authorization gate.
pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl TokenKeys {
    /// Fails on an empty secret. Callers treat this as fatal at startup.
    pub fn from_secret(secret: &str) -> Result<Self, TokenError> {
        if secret.trim().is_empty() {
            return Err(TokenError::EmptySecret);
        }

        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked by the gate against its own clock, after the signature.
        validation.validate_exp = false;
        validation.leeway = 0;

        Ok(Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        })
    }

    pub fn decoding_key(&self) -> &DecodingKey {
        &self.decoding
    }

    pub fn validation(&self) -> &Validation {
        &self.validation
    }
}

/// TokenIssuer
///
/// Turns a verified identity into a signed, time-bounded token.
#[derive(Clone)]
pub struct TokenIssuer {
    keys: Arc<TokenKeys>,
}

impl TokenIssuer {
    pub fn new(keys: Arc<TokenKeys>) -> Self {
        Self { keys }
    }

    pub fn issue(&self, user: &User) -> Result<String, TokenError> {
        self.issue_at(user, Utc::now().timestamp())
    }

    /// Signs claims for `user` as if issued at `now` (seconds since the epoch).
    pub fn issue_at(&self, user: &User, now: i64) -> Result<String, TokenError> {
        let claims = Claims {
            sub: user.id.to_string(),
            role: user.role.clone(),
            iat: now,
            exp: now + TOKEN_LIFETIME_SECS,
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.keys.encoding)?;
        Ok(token)
    }
}
