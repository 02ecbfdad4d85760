// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Account routes: login, registration and logout.

use axum::{
    extract::State,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Router,
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use std::borrow::Cow;
use std::sync::Arc;
use validator::{Validate, ValidationError};

use crate::error::{AppError, Result};
use crate::middleware::{FlashLevel, Session};
use crate::models::{new_document_id, User};
use crate::routes::cookies::effective_preferences;
use crate::routes::validation_message;
use crate::services::consent::preferences_cookie;
use crate::services::password::{hash_password, verify_password, MIN_PASSWORD_LENGTH};
use crate::time_utils::now_rfc3339;
use crate::views::{render, Layout, LoginTemplate, RegisterTemplate};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/login", get(login_form).post(login))
        .route("/register", get(register_form).post(register))
        .route("/logout", post(logout))
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    /// Username or email address
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterForm {
    #[serde(default)]
    #[validate(
        length(
            min = 3,
            max = 30,
            message = "Username must be between 3 and 30 characters"
        ),
        custom(function = "validate_username_chars")
    )]
    pub username: String,
    #[serde(default)]
    #[validate(email(message = "Please enter a valid email address"))]
    pub email: String,
    #[serde(default)]
    #[validate(length(
        min = MIN_PASSWORD_LENGTH,
        message = "Password must be at least 8 characters"
    ))]
    pub password: String,
    #[serde(default)]
    #[validate(must_match(other = "password", message = "Passwords do not match"))]
    pub confirm_password: String,
}

const REGISTER_FIELDS: &[&str] = &["username", "email", "password", "confirm_password"];

fn validate_username_chars(username: &str) -> std::result::Result<(), ValidationError> {
    if username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        Ok(())
    } else {
        Err(ValidationError::new("username_chars").with_message(Cow::Borrowed(
            "Username may only contain letters, numbers and underscores",
        )))
    }
}

async fn run_blocking<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Password task failed: {}", e)))
}

// ─── Login ───────────────────────────────────────────────────

async fn login_form(
    State(state): State<Arc<AppState>>,
    session: Session,
    jar: CookieJar,
) -> Result<Response> {
    if session.user_id().is_some() {
        return Ok(Redirect::to("/").into_response());
    }

    let prefs = effective_preferences(&state, &session, &jar);
    let template = LoginTemplate {
        layout: Layout::new("Log in", &session, &prefs),
    };
    Ok(render(&template)?.into_response())
}

async fn lookup_login_user(state: &AppState, identifier: &str) -> Result<Option<User>> {
    if identifier.contains('@') {
        state.db.find_user_by_email(identifier).await
    } else {
        state.db.find_user_by_username(identifier).await
    }
}

/// Check credentials and attach the user to the session.
async fn login(
    State(state): State<Arc<AppState>>,
    session: Session,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    let identifier = form.username.trim().to_string();
    if identifier.is_empty() || form.password.is_empty() {
        session.flash(FlashLevel::Error, "Please enter your username and password");
        return Ok(Redirect::to("/login").into_response());
    }

    let user = match lookup_login_user(&state, &identifier).await {
        Ok(user) => user,
        Err(e) => {
            tracing::error!(error = %e, "User lookup failed during login");
            session.flash(FlashLevel::Error, "Login is temporarily unavailable");
            return Ok(Redirect::to("/login").into_response());
        }
    };

    let verified = match &user {
        Some(user) => {
            let password = form.password.clone();
            let hash = user.password_hash.clone();
            run_blocking(move || verify_password(&password, &hash)).await?
        }
        None => false,
    };

    let Some(user) = user.filter(|_| verified) else {
        tracing::info!("Failed login attempt");
        session.flash(FlashLevel::Error, "Invalid username or password");
        return Ok(Redirect::to("/login").into_response());
    };

    if let Err(e) = state.db.record_login(&user.id, &now_rfc3339()).await {
        tracing::warn!(error = %e, user_id = %user.id, "Failed to record last login");
    }

    session.login(&user);
    session.flash(FlashLevel::Success, format!("Welcome back, {}!", user.username));
    tracing::info!(user_id = %user.id, "User logged in");

    let jar = match &user.cookie_preferences {
        Some(prefs) => jar.add(preferences_cookie(prefs, &state.config)?),
        None => jar,
    };

    Ok((jar, Redirect::to("/")).into_response())
}

// ─── Registration ────────────────────────────────────────────

async fn register_form(
    State(state): State<Arc<AppState>>,
    session: Session,
    jar: CookieJar,
) -> Result<Response> {
    if session.user_id().is_some() {
        return Ok(Redirect::to("/").into_response());
    }

    let prefs = effective_preferences(&state, &session, &jar);
    let template = RegisterTemplate {
        layout: Layout::new("Register", &session, &prefs),
    };
    Ok(render(&template)?.into_response())
}

/// Create an account. On success the visitor is sent to the login form.
async fn register(
    State(state): State<Arc<AppState>>,
    session: Session,
    Form(form): Form<RegisterForm>,
) -> Result<Redirect> {
    let form = RegisterForm {
        username: form.username.trim().to_string(),
        email: User::normalize_email(&form.email),
        ..form
    };

    if let Err(errors) = form.validate() {
        session.flash(FlashLevel::Error, validation_message(&errors, REGISTER_FIELDS));
        return Ok(Redirect::to("/register"));
    }

    if state.db.find_user_by_username(&form.username).await?.is_some() {
        session.flash(FlashLevel::Error, "Username already exists");
        return Ok(Redirect::to("/register"));
    }
    if state.db.find_user_by_email(&form.email).await?.is_some() {
        session.flash(FlashLevel::Error, "Email already registered");
        return Ok(Redirect::to("/register"));
    }

    let password = form.password;
    let password_hash = run_blocking(move || hash_password(&password)).await??;

    let user = User {
        id: new_document_id(),
        username_key: User::username_key_for(&form.username),
        username: form.username,
        email: form.email,
        password_hash,
        created_at: now_rfc3339(),
        last_login: None,
        cookie_preferences: None,
    };

    match state.db.create_user(&user).await {
        Ok(()) => {
            tracing::info!(user_id = %user.id, "User registered");
            session.flash(FlashLevel::Success, "Registration successful! Please log in.");
            Ok(Redirect::to("/login"))
        }
        Err(AppError::Conflict(message)) => {
            session.flash(FlashLevel::Error, message);
            Ok(Redirect::to("/register"))
        }
        Err(e) => Err(e),
    }
}

// ─── Logout ──────────────────────────────────────────────────

async fn logout(session: Session) -> Redirect {
    if let Some(user_id) = session.user_id() {
        tracing::info!(%user_id, "User logged out");
    }
    session.clear();
    session.flash(FlashLevel::Info, "You have been logged out");
    Redirect::to("/login")
}
