//! Application configuration loaded from environment variables.
//!
//! A `.env` file is honoured for local development.

use std::env;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Environment Variables (non-sensitive) ---
    /// Realtime database URL, e.g. `https://my-app-default-rtdb.firebaseio.com`
    pub firebase_database_url: String,
    /// Web API key for the identity provider (public)
    pub firebase_api_key: String,
    /// Frontend URL allowed by CORS
    pub frontend_url: String,
    /// Server port
    pub port: u16,
    /// Use in-memory backends instead of the hosted services
    pub offline: bool,
    /// Mark cookies `Secure`
    pub secure_cookies: bool,

    // --- Secrets ---
    /// Database secret appended to REST requests, if rules require one
    pub firebase_database_secret: Option<String>,
    /// JWT signing key for session tokens (raw bytes)
    pub jwt_signing_key: Vec<u8>,
    /// Admin area username
    pub admin_username: String,
    /// Admin area password
    pub admin_password: String,
}

impl Config {
    /// Config for tests: offline backends and fixed secrets.
    pub fn test_default() -> Self {
        Self {
            firebase_database_url: "http://localhost:9000".to_string(),
            firebase_api_key: "test_api_key".to_string(),
            frontend_url: "http://localhost:3000".to_string(),
            port: 8080,
            offline: true,
            secure_cookies: false,
            firebase_database_secret: None,
            jwt_signing_key: b"test_jwt_key_32_bytes_minimum!!!".to_vec(),
            admin_username: "admin".to_string(),
            admin_password: "admin-password".to_string(),
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let offline = env::var("TODOBOARD_OFFLINE")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        // Hosted-service settings are only required when actually online.
        let online_var = |name: &'static str| -> Result<String, ConfigError> {
            match env::var(name) {
                Ok(v) => Ok(v.trim().to_string()),
                Err(_) if offline => Ok(String::new()),
                Err(_) => Err(ConfigError::Missing(name)),
            }
        };

        let jwt_signing_key = env::var("JWT_SIGNING_KEY")
            .map_err(|_| ConfigError::Missing("JWT_SIGNING_KEY"))?
            .into_bytes();
        if jwt_signing_key.len() < 32 {
            return Err(ConfigError::Invalid(
                "JWT_SIGNING_KEY",
                "must be at least 32 bytes".to_string(),
            ));
        }

        Ok(Self {
            firebase_database_url: online_var("FIREBASE_DATABASE_URL")?,
            firebase_api_key: online_var("FIREBASE_API_KEY")?,
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            offline,
            secure_cookies: env::var("SECURE_COOKIES")
                .map(|v| v != "0" && !v.eq_ignore_ascii_case("false"))
                .unwrap_or(!offline),

            // Secrets
            firebase_database_secret: env::var("FIREBASE_DATABASE_SECRET")
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty()),
            jwt_signing_key,
            admin_username: env::var("ADMIN_USERNAME")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("ADMIN_USERNAME"))?,
            admin_password: env::var("ADMIN_PASSWORD")
                .map_err(|_| ConfigError::Missing("ADMIN_PASSWORD"))?,
        })
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1}")]
    Invalid(&'static str, String),
}
