//! User model for storage and API.

use serde::{Deserialize, Serialize};

use crate::models::CookiePreferences;

/// User account stored in the `users` collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Opaque user ID (also used as document ID)
    pub id: String,
    /// Display name as entered at registration
    pub username: String,
    /// Lower-cased username used for uniqueness checks and lookups
    pub username_key: String,
    /// Lower-cased email address
    pub email: String,
    /// Argon2 PHC string
    pub password_hash: String,
    /// When the account was created (RFC 3339)
    pub created_at: String,
    /// Last successful login (RFC 3339)
    #[serde(default)]
    pub last_login: Option<String>,
    /// Cookie consent choices, saved when the user changes them while logged in
    #[serde(default)]
    pub cookie_preferences: Option<CookiePreferences>,
}

impl User {
    /// Normalize a username for lookups.
    pub fn username_key_for(username: &str) -> String {
        username.trim().to_lowercase()
    }

    /// Normalize an email address for lookups.
    pub fn normalize_email(email: &str) -> String {
        email.trim().to_lowercase()
    }
}
