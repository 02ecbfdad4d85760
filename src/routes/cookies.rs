// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Cookie consent: banner choices, the settings page and the JSON endpoint.
//!
//! Preferences live in the session. They are mirrored into a signed
//! `cookie_preferences` cookie so they survive logout, and into the user
//! document for logged-in users so they follow the account.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, HeaderMap},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Json, Router,
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::middleware::{FlashLevel, Session};
use crate::models::{CookiePreferences, CookiePreferencesUpdate, RetentionPeriod};
use crate::services::consent::{preferences_cookie, preferences_from_jar};
use crate::time_utils::now_rfc3339;
use crate::views::{render, CookieSettingsTemplate, Layout, RetentionOption};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/cookie-settings",
            get(cookie_settings_page).post(save_cookie_settings),
        )
        .route("/cookie-consent", post(cookie_consent))
        .route(
            "/api/cookie-preferences",
            get(get_preferences).post(update_preferences),
        )
}

/// Preferences in effect for this request: session first, then the signed
/// cookie, then defaults.
pub fn effective_preferences(
    state: &AppState,
    session: &Session,
    jar: &CookieJar,
) -> CookiePreferences {
    session
        .cookie_preferences()
        .or_else(|| preferences_from_jar(jar, &state.config.secret_key))
        .unwrap_or_default()
}

/// Store preferences everywhere they are mirrored and return the updated jar.
async fn save_preferences(
    state: &AppState,
    session: &Session,
    jar: CookieJar,
    prefs: &CookiePreferences,
) -> Result<CookieJar> {
    session.set_cookie_preferences(prefs.clone());

    if let Some(user_id) = session.user_id() {
        if let Err(e) = state.db.set_user_cookie_preferences(&user_id, prefs).await {
            // The session and cookie copies still apply for this browser.
            tracing::warn!(error = %e, %user_id, "Failed to store cookie preferences on user");
        }
    }

    tracing::debug!(
        analytics = prefs.analytics,
        preferences = prefs.preferences,
        functional = prefs.functional,
        third_party = prefs.third_party,
        retention = prefs.retention_period.as_str(),
        "Cookie preferences saved"
    );

    Ok(jar.add(preferences_cookie(prefs, &state.config)?))
}

// ─── Settings page ───────────────────────────────────────────

async fn cookie_settings_page(
    State(state): State<Arc<AppState>>,
    session: Session,
    jar: CookieJar,
) -> Result<Response> {
    let prefs = effective_preferences(&state, &session, &jar);
    let template = CookieSettingsTemplate {
        layout: Layout::new("Cookie settings", &session, &prefs),
        retention_options: RetentionOption::all(prefs.retention_period),
        consent_date: prefs.consent_date.clone().unwrap_or_default(),
        prefs,
    };
    Ok(render(&template)?.into_response())
}

/// Checkbox form. Unchecked boxes are simply absent from the body.
#[derive(Debug, Default, Deserialize)]
pub struct CookieSettingsForm {
    pub functional: Option<String>,
    pub preferences: Option<String>,
    pub analytics: Option<String>,
    pub third_party: Option<String>,
    pub retention_period: Option<String>,
}

impl CookieSettingsForm {
    fn to_update(&self) -> CookiePreferencesUpdate {
        CookiePreferencesUpdate {
            analytics: Some(self.analytics.is_some()),
            preferences: Some(self.preferences.is_some()),
            functional: Some(self.functional.is_some()),
            third_party: Some(self.third_party.is_some()),
            retention_period: self
                .retention_period
                .as_deref()
                .and_then(RetentionPeriod::parse),
        }
    }
}

async fn save_cookie_settings(
    State(state): State<Arc<AppState>>,
    session: Session,
    jar: CookieJar,
    Form(form): Form<CookieSettingsForm>,
) -> Result<(CookieJar, Redirect)> {
    let prefs = effective_preferences(&state, &session, &jar)
        .merge(&form.to_update())
        .with_consent(now_rfc3339());

    let jar = save_preferences(&state, &session, jar, &prefs).await?;
    session.flash(FlashLevel::Success, "Cookie preferences saved");

    Ok((jar, Redirect::to("/cookie-settings")))
}

// ─── Banner ──────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ConsentForm {
    #[serde(default)]
    pub action: String,
}

/// Same-origin page the banner was submitted from, or `/`.
fn back_to(headers: &HeaderMap, base_url: &str) -> String {
    headers
        .get(header::REFERER)
        .and_then(|value| value.to_str().ok())
        .and_then(|referer| referer.strip_prefix(base_url))
        .filter(|path| path.starts_with('/') && !path.starts_with("//"))
        .map(str::to_string)
        .unwrap_or_else(|| "/".to_string())
}

async fn cookie_consent(
    State(state): State<Arc<AppState>>,
    session: Session,
    jar: CookieJar,
    headers: HeaderMap,
    Form(form): Form<ConsentForm>,
) -> Result<Response> {
    let base = match form.action.as_str() {
        "accept_all" => CookiePreferences::accept_all(),
        "necessary_only" => CookiePreferences::necessary_only(),
        other => {
            return Err(AppError::BadRequest(format!(
                "Unknown consent action: {}",
                other
            )))
        }
    };

    // Keep the retention period chosen earlier, if any.
    let current = effective_preferences(&state, &session, &jar);
    let prefs = CookiePreferences {
        retention_period: current.retention_period,
        ..base
    }
    .with_consent(now_rfc3339());

    let jar = save_preferences(&state, &session, jar, &prefs).await?;
    let target = back_to(&headers, &state.config.base_url);

    Ok((jar, Redirect::to(&target)).into_response())
}

// ─── JSON ────────────────────────────────────────────────────

async fn get_preferences(
    State(state): State<Arc<AppState>>,
    session: Session,
    jar: CookieJar,
) -> Json<CookiePreferences> {
    Json(effective_preferences(&state, &session, &jar))
}

/// Merge a partial update. Requires the `X-CSRF-Token` header.
async fn update_preferences(
    State(state): State<Arc<AppState>>,
    session: Session,
    jar: CookieJar,
    payload: std::result::Result<Json<CookiePreferencesUpdate>, JsonRejection>,
) -> Result<(CookieJar, Json<CookiePreferences>)> {
    let Json(update) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;

    let prefs = effective_preferences(&state, &session, &jar)
        .merge(&update)
        .with_consent(now_rfc3339());

    let jar = save_preferences(&state, &session, jar, &prefs).await?;
    Ok((jar, Json(prefs)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn with_referer(referer: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::REFERER, HeaderValue::from_str(referer).unwrap());
        headers
    }

    #[test]
    fn test_back_to_same_origin_page() {
        let headers = with_referer("http://localhost:5001/cookie-settings");
        assert_eq!(back_to(&headers, "http://localhost:5001"), "/cookie-settings");
    }

    #[test]
    fn test_back_to_rejects_foreign_referer() {
        let headers = with_referer("https://evil.example.com/phish");
        assert_eq!(back_to(&headers, "http://localhost:5001"), "/");

        let headers = with_referer("http://localhost:5001.evil.example.com/");
        assert_eq!(back_to(&headers, "http://localhost:5001"), "/");

        assert_eq!(back_to(&HeaderMap::new(), "http://localhost:5001"), "/");
    }

    #[test]
    fn test_settings_form_unchecked_boxes_turn_off() {
        let form = CookieSettingsForm {
            analytics: Some("on".to_string()),
            retention_period: Some("90_days".to_string()),
            ..Default::default()
        };

        let prefs = CookiePreferences::accept_all().merge(&form.to_update());

        assert!(prefs.analytics);
        assert!(!prefs.functional);
        assert!(!prefs.third_party);
        assert_eq!(prefs.retention_period, RetentionPeriod::Days90);
    }

    #[test]
    fn test_settings_form_ignores_unknown_retention() {
        let form = CookieSettingsForm {
            retention_period: Some("forever".to_string()),
            ..Default::default()
        };
        let prefs = CookiePreferences::default().merge(&form.to_update());
        assert_eq!(prefs.retention_period, RetentionPeriod::OneYear);
    }
}
