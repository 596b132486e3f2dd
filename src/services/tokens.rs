// SPDX-License-Identifier: MIT

//! Access/refresh token issuance and verification.
//!
//! Two independent secrets and lifetimes: a leaked short-lived access token
//! does not compromise re-authentication, and a refresh token is never
//! accepted where an access token is expected (and vice versa) because the
//! signatures do not cross-verify.

use crate::config::Config;
use crate::models::User;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Claims carried by an access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Subject: user document ID
    pub sub: String,
    pub email: String,
    #[serde(rename = "userName")]
    pub user_name: String,
    #[serde(rename = "fullName")]
    pub full_name: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

/// Claims carried by a refresh token: identity key only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshClaims {
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

/// Token verification failures, distinguished for logging; callers that only
/// care about accept/reject collapse all of these to 401.
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("token expired")]
    Expired,

    #[error("invalid token signature")]
    Invalid,

    #[error("malformed token")]
    Malformed,

    #[error("token creation failed: {0}")]
    Creation(String),
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;
        match err.kind() {
            ErrorKind::ExpiredSignature => TokenError::Expired,
            ErrorKind::InvalidToken
            | ErrorKind::Base64(_)
            | ErrorKind::Json(_)
            | ErrorKind::Utf8(_) => TokenError::Malformed,
            _ => TokenError::Invalid,
        }
    }
}

/// Signs and verifies session tokens. Pure with respect to shared state:
/// depends only on the secrets bound at construction and the system clock.
pub struct TokenIssuer {
    access_encoding: EncodingKey,
    access_decoding: DecodingKey,
    access_ttl_secs: i64,
    refresh_encoding: EncodingKey,
    refresh_decoding: DecodingKey,
    refresh_ttl_secs: i64,
}

impl TokenIssuer {
    pub fn new(config: &Config) -> Self {
        Self {
            access_encoding: EncodingKey::from_secret(config.access_token_secret.as_bytes()),
            access_decoding: DecodingKey::from_secret(config.access_token_secret.as_bytes()),
            access_ttl_secs: config.access_token_expiry_secs,
            refresh_encoding: EncodingKey::from_secret(config.refresh_token_secret.as_bytes()),
            refresh_decoding: DecodingKey::from_secret(config.refresh_token_secret.as_bytes()),
            refresh_ttl_secs: config.refresh_token_expiry_secs,
        }
    }

    /// Sign an access token carrying the user's identity claims.
    pub fn issue_access_token(&self, user: &User) -> Result<String, TokenError> {
        let now = chrono::Utc::now().timestamp();
        let claims = AccessClaims {
            sub: user.id.clone(),
            email: user.email.clone(),
            user_name: user.user_name.clone(),
            full_name: user.full_name.clone(),
            iat: now,
            exp: now + self.access_ttl_secs,
        };

        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &self.access_encoding,
        )
        .map_err(|e| TokenError::Creation(e.to_string()))
    }

    /// Sign a refresh token carrying only the identity's primary key.
    pub fn issue_refresh_token(&self, user_id: &str) -> Result<String, TokenError> {
        let now = chrono::Utc::now().timestamp();
        let claims = RefreshClaims {
            sub: user_id.to_string(),
            iat: now,
            exp: now + self.refresh_ttl_secs,
        };

        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &self.refresh_encoding,
        )
        .map_err(|e| TokenError::Creation(e.to_string()))
    }

    /// Check signature and expiry of an access token.
    pub fn verify_access(&self, token: &str) -> Result<AccessClaims, TokenError> {
        let data = decode::<AccessClaims>(token, &self.access_decoding, &validation())?;
        Ok(data.claims)
    }

    /// Check signature and expiry of a refresh token.
    pub fn verify_refresh(&self, token: &str) -> Result<RefreshClaims, TokenError> {
        let data = decode::<RefreshClaims>(token, &self.refresh_decoding, &validation())?;
        Ok(data.claims)
    }
}

fn validation() -> Validation {
    let mut validation = Validation::new(Algorithm::HS256);
    // Expiry means expiry; no clock-skew grace window.
    validation.leeway = 0;
    validation
}
