// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.

use std::env;
use std::str::FromStr;

/// Minimum length of the signing secret, in bytes.
pub const MIN_SECRET_KEY_LEN: usize = 32;

/// Which document store backs the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseBackend {
    /// Google Cloud Firestore (or its emulator).
    Firestore,
    /// In-process store; data is lost on restart.
    Memory,
}

impl FromStr for DatabaseBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "firestore" => Ok(Self::Firestore),
            "memory" => Ok(Self::Memory),
            other => Err(ConfigError::Invalid {
                var: "DATABASE_BACKEND",
                reason: format!("unknown backend '{}' (expected firestore or memory)", other),
            }),
        }
    }
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Public URL the app is served from. An `https` URL turns on `Secure` cookies.
    pub base_url: String,
    /// Bind address
    pub host: String,
    /// Server port
    pub port: u16,
    /// Document store backend
    pub database_backend: DatabaseBackend,
    /// GCP project ID (Firestore)
    pub gcp_project_id: String,
    /// Session lifetime in hours
    pub session_ttl_hours: i64,

    // --- Secrets ---
    /// Key used to sign session tokens and the cookie-preferences cookie (raw bytes)
    pub secret_key: Vec<u8>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let secret_key = env::var("SECRET_KEY")
            .map(|v| v.trim().to_string())
            .map_err(|_| ConfigError::Missing("SECRET_KEY"))?
            .into_bytes();
        if secret_key.len() < MIN_SECRET_KEY_LEN {
            return Err(ConfigError::Invalid {
                var: "SECRET_KEY",
                reason: format!("must be at least {} bytes", MIN_SECRET_KEY_LEN),
            });
        }

        let port = match env::var("PORT") {
            Ok(raw) => raw.parse().map_err(|_| ConfigError::Invalid {
                var: "PORT",
                reason: format!("'{}' is not a valid port", raw),
            })?,
            Err(_) => 5001,
        };

        let session_ttl_hours = match env::var("SESSION_TTL_HOURS") {
            Ok(raw) => match raw.parse::<i64>() {
                Ok(hours) if hours > 0 => hours,
                _ => {
                    return Err(ConfigError::Invalid {
                        var: "SESSION_TTL_HOURS",
                        reason: format!("'{}' is not a positive number of hours", raw),
                    })
                }
            },
            Err(_) => 24 * 7,
        };

        Ok(Self {
            base_url: env::var("BASE_URL")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| "http://localhost:5001".to_string()),
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port,
            database_backend: env::var("DATABASE_BACKEND")
                .map(|v| v.parse())
                .unwrap_or(Ok(DatabaseBackend::Firestore))?,
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),
            session_ttl_hours,
            secret_key,
        })
    }

    /// Deterministic config for tests.
    pub fn test_default() -> Self {
        Self {
            base_url: "http://localhost:5001".to_string(),
            host: "127.0.0.1".to_string(),
            port: 5001,
            database_backend: DatabaseBackend::Memory,
            gcp_project_id: "test-project".to_string(),
            session_ttl_hours: 24,
            secret_key: b"test_secret_key_32_bytes_minimum!!".to_vec(),
        }
    }

    /// Whether cookies must carry the `Secure` attribute.
    pub fn secure_cookies(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}
