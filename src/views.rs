// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Server-rendered pages (askama templates under `templates/`).

use askama::Template;
use axum::response::Html;

use crate::error::AppError;
use crate::middleware::session::{Flash, Session};
use crate::models::{CookiePreferences, HabitSummary, ProgressStats, RetentionPeriod};
use crate::services::Recommendation;

/// Data every page needs for the shared layout.
pub struct Layout {
    pub title: String,
    /// Empty for anonymous visitors.
    pub username: String,
    pub csrf_token: String,
    pub flashes: Vec<Flash>,
    pub show_cookie_banner: bool,
}

impl Layout {
    /// Build the layout, consuming pending flash messages.
    pub fn new(title: &str, session: &Session, prefs: &CookiePreferences) -> Self {
        Self {
            title: title.to_string(),
            username: session.username().unwrap_or_default(),
            csrf_token: session.csrf_token(),
            flashes: session.take_flashes(),
            show_cookie_banner: !prefs.consent_given,
        }
    }
}

/// A habit row on the dashboard or the edit form.
pub struct HabitView {
    pub id: String,
    pub name: String,
    pub description: String,
    pub done_today: bool,
    pub streak: u32,
    pub total_completions: u32,
}

impl From<HabitSummary> for HabitView {
    fn from(summary: HabitSummary) -> Self {
        Self {
            id: summary.id,
            name: summary.name,
            description: summary.description.unwrap_or_default(),
            done_today: summary.completed_today,
            streak: summary.current_streak,
            total_completions: summary.total_completions,
        }
    }
}

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub layout: Layout,
    pub habits: Vec<HabitView>,
    pub stats: ProgressStats,
    pub recommendations: Vec<Recommendation>,
}

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub layout: Layout,
}

#[derive(Template)]
#[template(path = "register.html")]
pub struct RegisterTemplate {
    pub layout: Layout,
}

#[derive(Template)]
#[template(path = "edit_habit.html")]
pub struct EditHabitTemplate {
    pub layout: Layout,
    pub habit: HabitView,
}

/// An entry in the retention-period dropdown.
pub struct RetentionOption {
    pub value: &'static str,
    pub label: &'static str,
    pub selected: bool,
}

impl RetentionOption {
    pub fn all(current: RetentionPeriod) -> Vec<Self> {
        [
            (RetentionPeriod::Days30, "30 days"),
            (RetentionPeriod::Days90, "90 days"),
            (RetentionPeriod::OneYear, "1 year"),
        ]
        .into_iter()
        .map(|(period, label)| RetentionOption {
            value: period.as_str(),
            label,
            selected: period == current,
        })
        .collect()
    }
}

#[derive(Template)]
#[template(path = "cookie_settings.html")]
pub struct CookieSettingsTemplate {
    pub layout: Layout,
    pub prefs: CookiePreferences,
    pub retention_options: Vec<RetentionOption>,
    pub consent_date: String,
}

/// Render a template into an HTML response.
pub fn render<T: Template>(template: &T) -> Result<Html<String>, AppError> {
    Ok(Html(template.render()?))
}
