// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Signed mirror of the cookie preferences.
//!
//! The cookie value is `base64url(json) "." hex(hmac_sha256(secret, base64url(json)))`.
//! It is readable by page scripts but cannot be altered without the secret.

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::config::Config;
use crate::error::AppError;
use crate::models::{CookiePreferences, CookiePreferencesUpdate};

type HmacSha256 = Hmac<Sha256>;

/// Name of the preferences cookie.
pub const PREFERENCES_COOKIE: &str = "cookie_preferences";

fn sign(payload: &str, secret: &[u8]) -> Result<HmacSha256, AppError> {
    let mut mac = HmacSha256::new_from_slice(secret)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("HMAC init failed: {}", e)))?;
    mac.update(payload.as_bytes());
    Ok(mac)
}

/// Serialize and sign preferences into a cookie value.
pub fn encode_preferences(prefs: &CookiePreferences, secret: &[u8]) -> Result<String, AppError> {
    let json = serde_json::to_vec(prefs).map_err(|e| {
        AppError::Internal(anyhow::anyhow!("Failed to serialize preferences: {}", e))
    })?;
    let payload = URL_SAFE_NO_PAD.encode(json);
    let signature = sign(&payload, secret)?.finalize().into_bytes();

    Ok(format!("{}.{}", payload, hex::encode(signature)))
}

/// Verify and decode a cookie value. Returns `None` for anything tampered or malformed.
pub fn decode_preferences(value: &str, secret: &[u8]) -> Option<CookiePreferences> {
    let (payload, signature_hex) = value.split_once('.')?;
    let signature = hex::decode(signature_hex).ok()?;

    if sign(payload, secret).ok()?.verify_slice(&signature).is_err() {
        tracing::warn!("Cookie preferences signature mismatch, ignoring cookie");
        return None;
    }

    let json = URL_SAFE_NO_PAD.decode(payload).ok()?;
    let prefs: CookiePreferences = serde_json::from_slice(&json).ok()?;
    Some(prefs.merge(&CookiePreferencesUpdate::default()))
}

/// Read the preferences cookie from the jar, if present and valid.
pub fn preferences_from_jar(jar: &CookieJar, secret: &[u8]) -> Option<CookiePreferences> {
    jar.get(PREFERENCES_COOKIE)
        .and_then(|cookie| decode_preferences(cookie.value(), secret))
}

/// Build the preferences cookie. Its lifetime follows the chosen retention period.
pub fn preferences_cookie(
    prefs: &CookiePreferences,
    config: &Config,
) -> Result<Cookie<'static>, AppError> {
    let value = encode_preferences(prefs, &config.secret_key)?;

    Ok(Cookie::build((PREFERENCES_COOKIE, value))
        .path("/")
        .same_site(SameSite::Lax)
        .secure(config.secure_cookies())
        .http_only(false)
        .max_age(time::Duration::days(prefs.retention_period.days()))
        .build())
}
