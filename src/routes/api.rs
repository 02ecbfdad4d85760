// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! JSON API for logged-in users.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{CookiePreferences, HabitSummary, ProgressStats};
use crate::services::{recommend, Recommendation};
use crate::time_utils::today;
use crate::AppState;
use axum::{extract::State, routing::get, Extension, Json, Router};
use serde::Serialize;
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// API routes (require a logged-in session).
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/me", get(get_me))
        .route("/api/habits", get(get_habits))
        .route("/api/stats", get(get_stats))
        .route("/api/recommendations", get(get_recommendations))
}

// ─── User Profile ────────────────────────────────────────────

/// Current user response.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UserResponse {
    pub id: String,
    pub username: String,
    pub email: String,
    pub created_at: String,
    pub last_login: Option<String>,
    pub cookie_preferences: Option<CookiePreferences>,
}

/// Get current user profile. The password hash never leaves the server.
async fn get_me(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<UserResponse>> {
    let profile = state
        .db
        .get_user(&user.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", user.user_id)))?;

    Ok(Json(UserResponse {
        id: profile.id,
        username: profile.username,
        email: profile.email,
        created_at: profile.created_at,
        last_login: profile.last_login,
        cookie_preferences: profile.cookie_preferences,
    }))
}

// ─── Habits ──────────────────────────────────────────────────

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct HabitsResponse {
    pub habits: Vec<HabitSummary>,
}

async fn get_habits(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<HabitsResponse>> {
    let today = today();
    let habits = state.db.list_habits(&user.user_id).await?;

    Ok(Json(HabitsResponse {
        habits: habits
            .iter()
            .map(|habit| HabitSummary::from_habit(habit, today))
            .collect(),
    }))
}

// ─── Progress ────────────────────────────────────────────────

async fn get_stats(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<ProgressStats>> {
    let habits = state.db.list_habits(&user.user_id).await?;
    Ok(Json(ProgressStats::compute(&habits, today())))
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct RecommendationsResponse {
    pub recommendations: Vec<Recommendation>,
}

async fn get_recommendations(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<RecommendationsResponse>> {
    let habits = state.db.list_habits(&user.user_id).await?;
    let stats = ProgressStats::compute(&habits, today());

    Ok(Json(RecommendationsResponse {
        recommendations: recommend(&habits, &stats),
    }))
}
