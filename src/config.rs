// SPDX-License-Identifier: MIT

//! Application configuration loaded once at startup from environment variables.
//!
//! Secrets and token lifetimes are bound into this struct at process start and
//! treated as immutable afterwards; no component reads the environment at
//! request time.

use std::env;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port
    pub port: u16,
    /// GCP project ID for Firestore
    pub gcp_project_id: String,
    /// Allowed cross-origin frontend URL
    pub cors_origin: String,
    /// Base URL under which uploaded media is served back
    pub public_base_url: String,
    /// Directory uploaded media files are written to
    pub upload_dir: String,
    /// Upstream reverse-geocoding API base URL
    pub geocode_base_url: String,
    /// Whether session cookies carry the Secure attribute
    pub cookie_secure: bool,

    // --- Secrets and work factors ---
    /// Signing secret for short-lived access tokens
    pub access_token_secret: String,
    /// Access token lifetime in seconds
    pub access_token_expiry_secs: i64,
    /// Signing secret for refresh tokens (independent of the access secret)
    pub refresh_token_secret: String,
    /// Refresh token lifetime in seconds
    pub refresh_token_expiry_secs: i64,
    /// bcrypt cost factor for password hashing
    pub bcrypt_cost: u32,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Signing secrets are required; everything else has a development
    /// default.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Ok(Self {
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),
            cors_origin: env::var("CORS_ORIGIN")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            public_base_url: env::var("PUBLIC_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:8080".to_string()),
            upload_dir: env::var("UPLOAD_DIR").unwrap_or_else(|_| "uploads".to_string()),
            geocode_base_url: env::var("GEOCODE_BASE_URL")
                .unwrap_or_else(|_| "https://nominatim.openstreetmap.org".to_string()),
            cookie_secure: env::var("COOKIE_SECURE")
                .map(|v| v != "false" && v != "0")
                .unwrap_or(true),

            access_token_secret: env::var("ACCESS_TOKEN_SECRET")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("ACCESS_TOKEN_SECRET"))?,
            access_token_expiry_secs: env::var("ACCESS_TOKEN_EXPIRY_SECS")
                .unwrap_or_else(|_| "900".to_string())
                .parse()
                .map_err(|_| ConfigError::Invalid("ACCESS_TOKEN_EXPIRY_SECS"))?,
            refresh_token_secret: env::var("REFRESH_TOKEN_SECRET")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("REFRESH_TOKEN_SECRET"))?,
            refresh_token_expiry_secs: env::var("REFRESH_TOKEN_EXPIRY_SECS")
                .unwrap_or_else(|_| "864000".to_string())
                .parse()
                .map_err(|_| ConfigError::Invalid("REFRESH_TOKEN_EXPIRY_SECS"))?,
            bcrypt_cost: env::var("BCRYPT_COST")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .map_err(|_| ConfigError::Invalid("BCRYPT_COST"))?,
        })
    }

    /// Fixed config for tests: known secrets, short expiries, minimum bcrypt
    /// cost so hashing-heavy tests stay fast.
    pub fn test_default() -> Self {
        Self {
            port: 8080,
            gcp_project_id: "test-project".to_string(),
            cors_origin: "http://localhost:5173".to_string(),
            public_base_url: "http://localhost:8080".to_string(),
            upload_dir: std::env::temp_dir()
                .join("voltcast-test-uploads")
                .to_string_lossy()
                .into_owned(),
            geocode_base_url: "http://localhost:9999".to_string(),
            cookie_secure: false,
            access_token_secret: "test_access_secret_32_bytes_min!".to_string(),
            access_token_expiry_secs: 900,
            refresh_token_secret: "test_refresh_secret_32_bytes_m!!".to_string(),
            refresh_token_expiry_secs: 864_000,
            bcrypt_cost: 4,
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    // Single test: env vars are process-global, so the missing-secret case and
    // the happy path run in sequence rather than as parallel tests.
    #[test]
    fn test_config_from_env() {
        env::remove_var("ACCESS_TOKEN_SECRET");
        env::set_var("REFRESH_TOKEN_SECRET", "refresh_secret_for_tests_32byte!");

        let err = Config::from_env().unwrap_err();
        assert!(matches!(err, ConfigError::Missing("ACCESS_TOKEN_SECRET")));

        env::set_var("ACCESS_TOKEN_SECRET", "access_secret_for_tests_32bytes!");
        env::remove_var("ACCESS_TOKEN_EXPIRY_SECS");
        env::remove_var("BCRYPT_COST");

        let config = Config::from_env().expect("Config should load");

        assert_eq!(
            config.access_token_secret,
            "access_secret_for_tests_32bytes!"
        );
        assert_eq!(config.access_token_expiry_secs, 900);
        assert_eq!(config.bcrypt_cost, 10);
        assert_eq!(config.port, 8080);
    }
}
