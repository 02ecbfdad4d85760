// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Signed-cookie sessions.
//!
//! The whole session lives in an HS256 JWT stored in the `habit_session`
//! cookie. [`load_session`] decodes it (or starts a fresh anonymous session)
//! and puts a [`Session`] handle into the request extensions; handlers
//! mutate the handle and the middleware re-issues the cookie only when
//! something changed.

use crate::config::Config;
use crate::error::AppError;
use crate::models::{CookiePreferences, User};
use crate::AppState;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderValue},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "habit_session";

/// Severity of a flash message; doubles as the CSS class in templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashLevel {
    Success,
    Info,
    Error,
}

impl FlashLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            FlashLevel::Success => "success",
            FlashLevel::Info => "info",
            FlashLevel::Error => "error",
        }
    }
}

/// One-shot message shown on the next rendered page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub level: FlashLevel,
    pub message: String,
}

/// Everything stored in the session cookie.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    pub csrf_token: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub flashes: Vec<Flash>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cookie_preferences: Option<CookiePreferences>,
}

impl SessionData {
    /// An anonymous session with a fresh CSRF token.
    pub fn anonymous() -> Self {
        Self {
            csrf_token: new_csrf_token(),
            ..Self::default()
        }
    }
}

/// JWT claims wrapping the session data.
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sess: SessionData,
    /// Expiration time (Unix timestamp)
    exp: usize,
    /// Issued at (Unix timestamp)
    iat: usize,
}

/// Generate a random CSRF token (64 hex characters).
pub fn new_csrf_token() -> String {
    let mut bytes = [0u8; 32];
    rand::rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Sign session data into a token valid for `ttl_hours`.
pub fn encode_session(
    data: &SessionData,
    signing_key: &[u8],
    ttl_hours: i64,
) -> anyhow::Result<String> {
    let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs() as usize;
    let ttl_secs = usize::try_from(ttl_hours.max(1))? * 60 * 60;

    let claims = Claims {
        sess: data.clone(),
        iat: now,
        exp: now + ttl_secs,
    };

    Ok(encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(signing_key),
    )?)
}

/// Verify a session token. Expired, tampered or malformed tokens yield `None`.
pub fn decode_session(token: &str, signing_key: &[u8]) -> Option<SessionData> {
    let key = DecodingKey::from_secret(signing_key);
    let validation = Validation::new(Algorithm::HS256);

    match decode::<Claims>(token, &key, &validation) {
        Ok(token_data) => Some(token_data.claims.sess),
        Err(e) => {
            tracing::debug!(error = %e, "Discarding invalid session cookie");
            None
        }
    }
}

/// Build the session cookie.
pub fn session_cookie(token: String, config: &Config) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(config.secure_cookies())
        .max_age(time::Duration::hours(config.session_ttl_hours))
        .build()
}

struct SessionState {
    data: SessionData,
    dirty: bool,
}

/// Handle to the current request's session. Clones share state.
#[derive(Clone)]
pub struct Session {
    inner: Arc<Mutex<SessionState>>,
}

impl Session {
    fn new(data: SessionData, dirty: bool) -> Self {
        Self {
            inner: Arc::new(Mutex::new(SessionState { data, dirty })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn user_id(&self) -> Option<String> {
        self.lock().data.user_id.clone()
    }

    pub fn username(&self) -> Option<String> {
        self.lock().data.username.clone()
    }

    pub fn csrf_token(&self) -> String {
        self.lock().data.csrf_token.clone()
    }

    /// Attach a user to the session. The CSRF token is rotated.
    pub fn login(&self, user: &User) {
        let mut state = self.lock();
        state.data.user_id = Some(user.id.clone());
        state.data.username = Some(user.username.clone());
        state.data.csrf_token = new_csrf_token();
        if let Some(prefs) = &user.cookie_preferences {
            state.data.cookie_preferences = Some(prefs.clone());
        }
        state.dirty = true;
    }

    /// Drop identity and preferences. Pending flashes survive so the logout
    /// message can be shown.
    pub fn clear(&self) {
        let mut state = self.lock();
        let flashes = std::mem::take(&mut state.data.flashes);
        state.data = SessionData {
            flashes,
            ..SessionData::anonymous()
        };
        state.dirty = true;
    }

    pub fn flash(&self, level: FlashLevel, message: impl Into<String>) {
        let mut state = self.lock();
        state.data.flashes.push(Flash {
            level,
            message: message.into(),
        });
        state.dirty = true;
    }

    /// Remove and return pending flash messages.
    pub fn take_flashes(&self) -> Vec<Flash> {
        let mut state = self.lock();
        if state.data.flashes.is_empty() {
            return Vec::new();
        }
        state.dirty = true;
        std::mem::take(&mut state.data.flashes)
    }

    pub fn cookie_preferences(&self) -> Option<CookiePreferences> {
        self.lock().data.cookie_preferences.clone()
    }

    pub fn set_cookie_preferences(&self, prefs: CookiePreferences) {
        let mut state = self.lock();
        state.data.cookie_preferences = Some(prefs);
        state.dirty = true;
    }

    fn take_changes(&self) -> Option<SessionData> {
        let mut state = self.lock();
        if !state.dirty {
            return None;
        }
        state.dirty = false;
        Some(state.data.clone())
    }
}

impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<Session>().cloned().ok_or_else(|| {
            AppError::Internal(anyhow::anyhow!("Session middleware is not installed"))
        })
    }
}

/// Middleware that loads the session and writes it back when it changed.
pub async fn load_session(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let existing = jar
        .get(SESSION_COOKIE)
        .and_then(|cookie| decode_session(cookie.value(), &state.config.secret_key));

    // A brand new session is dirty so that its CSRF token reaches the client.
    let session = match existing {
        Some(data) => Session::new(data, false),
        None => Session::new(SessionData::anonymous(), true),
    };
    request.extensions_mut().insert(session.clone());

    let mut response = next.run(request).await;

    if let Some(data) = session.take_changes() {
        let config = &state.config;
        let token = match encode_session(&data, &config.secret_key, config.session_ttl_hours) {
            Ok(token) => token,
            Err(e) => {
                tracing::error!(error = %e, "Failed to encode session");
                return response;
            }
        };

        match HeaderValue::from_str(&session_cookie(token, &state.config).to_string()) {
            Ok(value) => {
                response.headers_mut().append(header::SET_COOKIE, value);
            }
            Err(e) => tracing::error!(error = %e, "Session cookie is not a valid header value"),
        }
    }

    response
}
