// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Habit pages: dashboard, add, complete, edit, delete.
//!
//! All handlers run behind `require_user` and scope every database call by
//! the logged-in user's ID.

use crate::error::Result;
use crate::middleware::{AuthUser, FlashLevel, Session};
use crate::models::{
    habit::{MAX_DESCRIPTION_LEN, MAX_NAME_LEN},
    is_valid_document_id, CompletionOutcome, Habit, HabitSummary, ProgressStats,
};
use crate::routes::cookies::effective_preferences;
use crate::routes::validation_message;
use crate::services::recommend;
use crate::time_utils::{now_rfc3339, today};
use crate::views::{render, EditHabitTemplate, IndexTemplate, Layout};
use crate::AppState;
use axum::{
    extract::{Path, State},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Extension, Form, Router,
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(index))
        .route("/add_habit", post(add_habit))
        .route("/complete_habit/{habit_id}", post(complete_habit))
        .route(
            "/edit_habit/{habit_id}",
            get(edit_habit_form).post(edit_habit),
        )
        .route("/delete_habit/{habit_id}", post(delete_habit))
}

/// Name/description form shared by the add and edit pages.
#[derive(Debug, Deserialize, Validate)]
pub struct HabitForm {
    #[serde(default)]
    #[validate(length(
        min = 1,
        max = MAX_NAME_LEN,
        message = "Habit name is required and must be at most 100 characters"
    ))]
    pub habit_name: String,
    #[serde(default)]
    #[validate(length(
        max = MAX_DESCRIPTION_LEN,
        message = "Description must be at most 500 characters"
    ))]
    pub habit_description: String,
}

impl HabitForm {
    fn normalized(self) -> Self {
        Self {
            habit_name: self.habit_name.trim().to_string(),
            habit_description: self.habit_description.trim().to_string(),
        }
    }

    fn description(&self) -> Option<&str> {
        Some(self.habit_description.as_str()).filter(|d| !d.is_empty())
    }
}

fn home() -> Response {
    Redirect::to("/").into_response()
}

// ─── Dashboard ───────────────────────────────────────────────

/// Dashboard: the user's habits, today's progress and suggestions.
async fn index(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    session: Session,
    jar: CookieJar,
) -> Result<Html<String>> {
    let today = today();

    let habits = match state.db.list_habits(&user.user_id).await {
        Ok(habits) => habits,
        Err(e) => {
            tracing::error!(error = %e, user_id = %user.user_id, "Failed to load habits");
            session.flash(FlashLevel::Error, "Error loading habits");
            Vec::new()
        }
    };

    let stats = ProgressStats::compute(&habits, today);
    let recommendations = recommend(&habits, &stats);
    let prefs = effective_preferences(&state, &session, &jar);

    let template = IndexTemplate {
        layout: Layout::new("My habits", &session, &prefs),
        habits: habits
            .iter()
            .map(|habit| HabitSummary::from_habit(habit, today).into())
            .collect(),
        stats,
        recommendations,
    };

    render(&template)
}

// ─── Add ─────────────────────────────────────────────────────

async fn add_habit(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    session: Session,
    Form(form): Form<HabitForm>,
) -> Response {
    let form = form.normalized();
    if let Err(errors) = form.validate() {
        session.flash(
            FlashLevel::Error,
            validation_message(&errors, &["habit_name", "habit_description"]),
        );
        return home();
    }

    let habit = Habit::new(
        &user.user_id,
        &form.habit_name,
        form.description(),
        now_rfc3339(),
    );

    match state.db.insert_habit(&habit).await {
        Ok(()) => {
            tracing::info!(user_id = %user.user_id, habit_id = %habit.id, "Habit added");
            session.flash(FlashLevel::Success, "Habit added!");
        }
        Err(e) => {
            tracing::error!(error = %e, user_id = %user.user_id, "Failed to add habit");
            session.flash(FlashLevel::Error, "Error adding habit");
        }
    }

    home()
}

// ─── Complete ────────────────────────────────────────────────

/// Mark a habit done for today. Completing twice on the same day is a no-op.
async fn complete_habit(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    session: Session,
    Path(habit_id): Path<String>,
) -> Response {
    if !is_valid_document_id(&habit_id) {
        session.flash(FlashLevel::Error, "Habit not found");
        return home();
    }

    match state
        .db
        .complete_habit(&habit_id, &user.user_id, today())
        .await
    {
        Ok(CompletionOutcome::Completed) => {
            session.flash(FlashLevel::Success, "Habit completed!");
        }
        Ok(CompletionOutcome::AlreadyCompleted) => {
            session.flash(FlashLevel::Info, "Habit was already completed today");
        }
        Ok(CompletionOutcome::NotFound) => {
            tracing::warn!(
                user_id = %user.user_id,
                %habit_id,
                "Complete requested for unknown habit"
            );
            session.flash(FlashLevel::Error, "Habit not found");
        }
        Err(e) => {
            tracing::error!(error = %e, %habit_id, "Failed to complete habit");
            session.flash(FlashLevel::Error, "Error completing habit");
        }
    }

    home()
}

// ─── Edit ────────────────────────────────────────────────────

async fn edit_habit_form(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    session: Session,
    jar: CookieJar,
    Path(habit_id): Path<String>,
) -> Result<Response> {
    let habit = if is_valid_document_id(&habit_id) {
        state.db.get_habit(&habit_id, &user.user_id).await?
    } else {
        None
    };

    let Some(habit) = habit else {
        session.flash(FlashLevel::Error, "Habit not found");
        return Ok(home());
    };

    let prefs = effective_preferences(&state, &session, &jar);
    let template = EditHabitTemplate {
        layout: Layout::new("Edit habit", &session, &prefs),
        habit: HabitSummary::from_habit(&habit, today()).into(),
    };

    Ok(render(&template)?.into_response())
}

async fn edit_habit(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    session: Session,
    Path(habit_id): Path<String>,
    Form(form): Form<HabitForm>,
) -> Response {
    // Checked first: the ID is echoed into the redirect below
    if !is_valid_document_id(&habit_id) {
        session.flash(FlashLevel::Error, "Habit not found");
        return home();
    }

    let form = form.normalized();
    if let Err(errors) = form.validate() {
        session.flash(
            FlashLevel::Error,
            validation_message(&errors, &["habit_name", "habit_description"]),
        );
        return Redirect::to(&format!("/edit_habit/{}", habit_id)).into_response();
    }

    match state
        .db
        .update_habit(&habit_id, &user.user_id, &form.habit_name, form.description())
        .await
    {
        Ok(true) => session.flash(FlashLevel::Success, "Habit updated"),
        Ok(false) => session.flash(FlashLevel::Error, "Habit not found"),
        Err(e) => {
            tracing::error!(error = %e, %habit_id, "Failed to update habit");
            session.flash(FlashLevel::Error, "Error updating habit");
        }
    }

    home()
}

// ─── Delete ──────────────────────────────────────────────────

async fn delete_habit(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    session: Session,
    Path(habit_id): Path<String>,
) -> Response {
    if !is_valid_document_id(&habit_id) {
        session.flash(FlashLevel::Error, "Habit not found");
        return home();
    }

    match state.db.delete_habit(&habit_id, &user.user_id).await {
        Ok(true) => session.flash(FlashLevel::Success, "Habit deleted"),
        Ok(false) => session.flash(FlashLevel::Error, "Habit not found"),
        Err(e) => {
            tracing::error!(error = %e, %habit_id, "Failed to delete habit");
            session.flash(FlashLevel::Error, "Error deleting habit");
        }
    }

    home()
}
