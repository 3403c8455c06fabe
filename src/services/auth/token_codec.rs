//! Signed, time-bounded credentials (HS256 JWT).
//!
//! The codec is stateless: its output depends only on the input claims, the
//! process-wide secret and the clock. Access and refresh tokens share one wire
//! format and are told apart by the `type` claim alone, so `verify` always
//! compares it against the caller's expectation.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error};
use uuid::Uuid;

use crate::config::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

impl TokenType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Access => "access",
            Self::Refresh => "refresh",
        }
    }
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a presented token was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("token has expired")]
    Expired,
    #[error("invalid token")]
    MalformedOrTampered,
    #[error("invalid token type, expected {expected}")]
    WrongType { expected: TokenType },
}

#[derive(Debug, Error)]
#[error("failed to sign token: {0}")]
pub struct SignError(#[from] jsonwebtoken::errors::Error);

/// Caller-supplied part of a token; the codec adds type, expiry, iat and jti.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClaimsData {
    pub sub: String,
    pub permissions: BTreeSet<String>,
}

impl ClaimsData {
    pub fn new<I, S>(sub: impl Into<String>, permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            sub: sub.into(),
            permissions: permissions.into_iter().map(Into::into).collect(),
        }
    }

    pub fn subject_only(sub: impl Into<String>) -> Self {
        Self {
            sub: sub.into(),
            permissions: BTreeSet::new(),
        }
    }
}

/// Decoded, verified token payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Claims {
    pub sub: String,
    pub permissions: BTreeSet<String>,
    #[serde(rename = "type")]
    pub token_type: TokenType,
    pub exp: i64,
    pub iat: i64,
    pub jti: Uuid,
}

impl Claims {
    /// Seconds left before expiry, never less than zero.
    pub fn remaining_seconds(&self, now: DateTime<Utc>) -> u64 {
        u64::try_from(self.exp.saturating_sub(now.timestamp())).unwrap_or(0)
    }
}

// `type` stays a plain string on the way in so that any mismatch, including
// values this codec never mints, reports as WrongType rather than a parse error.
#[derive(Debug, Clone, Deserialize)]
struct WireClaims {
    sub: String,
    #[serde(default)]
    permissions: BTreeSet<String>,
    #[serde(rename = "type")]
    token_type: String,
    exp: i64,
    iat: i64,
    jti: Uuid,
}

#[derive(Clone)]
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    access_ttl_seconds: u64,
    refresh_ttl_seconds: u64,
}

impl fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Do not print key material
        f.debug_struct("TokenCodec")
            .field("algorithm", &Algorithm::HS256)
            .field("access_ttl_seconds", &self.access_ttl_seconds)
            .field("refresh_ttl_seconds", &self.refresh_ttl_seconds)
            .finish()
    }
}

impl TokenCodec {
    pub fn new(
        secret: &[u8],
        access_ttl_seconds: u64,
        refresh_ttl_seconds: u64,
    ) -> Result<Self, ConfigError> {
        if secret.is_empty() {
            return Err(ConfigError::Missing("JWT_SECRET_KEY"));
        }

        // Expiry is checked against an explicit clock in `verify_at`, with no leeway.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            access_ttl_seconds,
            refresh_ttl_seconds,
        })
    }

    pub fn access_ttl_seconds(&self) -> u64 {
        self.access_ttl_seconds
    }

    pub fn issue(
        &self,
        data: &ClaimsData,
        ttl_seconds: u64,
        token_type: TokenType,
    ) -> Result<String, SignError> {
        self.issue_at(data, ttl_seconds, token_type, Utc::now())
    }

    pub fn issue_at(
        &self,
        data: &ClaimsData,
        ttl_seconds: u64,
        token_type: TokenType,
        now: DateTime<Utc>,
    ) -> Result<String, SignError> {
        let iat = now.timestamp();
        let ttl = i64::try_from(ttl_seconds).unwrap_or(i64::MAX);

        let claims = Claims {
            sub: data.sub.clone(),
            permissions: data.permissions.clone(),
            token_type,
            exp: iat.saturating_add(ttl),
            iat,
            jti: Uuid::new_v4(),
        };

        let mut header = Header::new(Algorithm::HS256);
        header.typ = Some("JWT".to_string());
        jsonwebtoken::encode(&header, &claims, &self.encoding_key).map_err(|e| {
            error!(error = %e, token_type = %token_type, "failed to sign token");
            SignError(e)
        })
    }

    pub fn issue_access(&self, data: &ClaimsData) -> Result<String, SignError> {
        self.issue(data, self.access_ttl_seconds, TokenType::Access)
    }

    pub fn issue_refresh(&self, data: &ClaimsData) -> Result<String, SignError> {
        self.issue(data, self.refresh_ttl_seconds, TokenType::Refresh)
    }

    pub fn verify(&self, token: &str, expected: TokenType) -> Result<Claims, AuthError> {
        self.verify_at(token, expected, Utc::now())
    }

    /// Signature and structure first, then expiry, then the type tag.
    pub fn verify_at(
        &self,
        token: &str,
        expected: TokenType,
        now: DateTime<Utc>,
    ) -> Result<Claims, AuthError> {
        let data = jsonwebtoken::decode::<WireClaims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| {
                debug!(error = %e, "token rejected");
                AuthError::MalformedOrTampered
            })?;
        let wire = data.claims;

        if now.timestamp() >= wire.exp {
            return Err(AuthError::Expired);
        }

        if wire.token_type != expected.as_str() {
            debug!(expected = %expected, got = %wire.token_type, "token type mismatch");
            return Err(AuthError::WrongType { expected });
        }

        Ok(Claims {
            sub: wire.sub,
            permissions: wire.permissions,
            token_type: expected,
            exp: wire.exp,
            iat: wire.iat,
            jti: wire.jti,
        })
    }

    /// Signs and verifies a short-lived throwaway token with the loaded key.
    pub fn self_check(&self) -> bool {
        let subject = ClaimsData::subject_only("readiness");
        self.issue(&subject, 60, TokenType::Access)
            .ok()
            .and_then(|token| self.verify(&token, TokenType::Access).ok())
            .is_some_and(|claims| claims.sub == subject.sub)
    }

    /// True for expired and for invalid tokens alike.
    pub fn is_expired(&self, token: &str) -> bool {
        let now = Utc::now().timestamp();
        match jsonwebtoken::decode::<WireClaims>(token, &self.decoding_key, &self.validation) {
            Ok(data) => now >= data.claims.exp,
            Err(_) => true,
        }
    }
}
