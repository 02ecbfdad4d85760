//! Progress statistics computed from a user's habits.
//!
//! Nothing here is stored; every figure is recomputed from the habit list on
//! each request.

use chrono::{Days, NaiveDate};
use serde::Serialize;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::models::Habit;
use crate::time_utils::date_key;

/// Length of the weekly window, today included.
pub const WEEK_DAYS: u64 = 7;

/// Daily and weekly completion figures for one user.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ProgressStats {
    pub date: String,
    pub total_habits: u32,
    pub completed_today: u32,
    /// Share of habits done today, 0–100, one decimal.
    pub daily_percentage: f64,
    /// Completions over the last seven days, today included.
    pub weekly_completions: u32,
    /// `total_habits * 7`
    pub weekly_possible: u32,
    pub weekly_percentage: f64,
    /// Longest current streak across all habits.
    pub best_streak: u32,
    /// Oldest day first.
    pub last_seven_days: Vec<DayProgress>,
}

/// Completions on a single day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct DayProgress {
    pub date: String,
    pub completed: u32,
}

/// A habit as shown to its owner.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct HabitSummary {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub created_at: String,
    pub completed_today: bool,
    pub current_streak: u32,
    pub total_completions: u32,
}

impl HabitSummary {
    pub fn from_habit(habit: &Habit, today: NaiveDate) -> Self {
        Self {
            id: habit.id.clone(),
            name: habit.name.clone(),
            description: habit.description.clone(),
            created_at: habit.created_at.clone(),
            completed_today: habit.is_completed_on(today),
            current_streak: habit.current_streak(today),
            total_completions: habit.completed_dates.len() as u32,
        }
    }
}

fn percentage(part: u32, whole: u32) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    let raw = f64::from(part) / f64::from(whole) * 100.0;
    (raw * 10.0).round() / 10.0
}

impl ProgressStats {
    /// Compute progress for `habits` as of `today`.
    pub fn compute(habits: &[Habit], today: NaiveDate) -> Self {
        let total_habits = habits.len() as u32;
        let week_start = today
            .checked_sub_days(Days::new(WEEK_DAYS - 1))
            .unwrap_or(today);

        let completed_today = habits.iter().filter(|h| h.is_completed_on(today)).count() as u32;

        let weekly_completions = habits
            .iter()
            .map(|h| h.completions_between(week_start, today) as u32)
            .sum();
        let weekly_possible = total_habits * WEEK_DAYS as u32;

        let last_seven_days = week_start
            .iter_days()
            .take_while(|day| *day <= today)
            .map(|day| {
                let key = date_key(day);
                DayProgress {
                    completed: habits
                        .iter()
                        .filter(|h| h.completed_dates.contains(&key))
                        .count() as u32,
                    date: key,
                }
            })
            .collect();

        let best_streak = habits
            .iter()
            .map(|h| h.current_streak(today))
            .max()
            .unwrap_or(0);

        Self {
            date: date_key(today),
            total_habits,
            completed_today,
            daily_percentage: percentage(completed_today, total_habits),
            weekly_completions,
            weekly_possible,
            weekly_percentage: percentage(weekly_completions, weekly_possible),
            best_streak,
            last_seven_days,
        }
    }
}
