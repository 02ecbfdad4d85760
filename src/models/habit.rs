// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Habit model for storage and API.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::time_utils::date_key;

/// Maximum habit name length, in characters.
pub const MAX_NAME_LEN: u64 = 100;
/// Maximum habit description length, in characters.
pub const MAX_DESCRIPTION_LEN: u64 = 500;

/// Habit stored in the `habits` collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Habit {
    /// Opaque habit ID (also used as document ID)
    pub id: String,
    /// Owning user ID. Every query on habits filters on this field.
    pub user_id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Creation timestamp (RFC 3339)
    pub created_at: String,
    /// Days on which the habit was done ("YYYY-MM-DD")
    #[serde(default)]
    pub completed_dates: BTreeSet<String>,
}

/// Result of marking a habit done for a day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionOutcome {
    /// The date was added to the completion set.
    Completed,
    /// The date was already in the completion set; nothing changed.
    AlreadyCompleted,
    /// No habit with that ID belongs to the user.
    NotFound,
}

impl Habit {
    /// Create a new habit with an empty completion set.
    pub fn new(user_id: &str, name: &str, description: Option<&str>, created_at: String) -> Self {
        Self {
            id: crate::models::new_document_id(),
            user_id: user_id.to_string(),
            name: name.to_string(),
            description: description.map(str::to_string),
            created_at,
            completed_dates: BTreeSet::new(),
        }
    }

    /// Whether the habit was done on `date`.
    pub fn is_completed_on(&self, date: NaiveDate) -> bool {
        self.completed_dates.contains(&date_key(date))
    }

    /// Add `date` to the completion set.
    ///
    /// Returns `false` if the habit was already done that day.
    pub fn mark_completed(&mut self, date: NaiveDate) -> bool {
        self.completed_dates.insert(date_key(date))
    }

    /// Number of consecutive days the habit has been done, counting back from
    /// `today`. A streak that ended yesterday is still current until today is over.
    pub fn current_streak(&self, today: NaiveDate) -> u32 {
        let mut day = if self.is_completed_on(today) {
            today
        } else {
            match today.checked_sub_days(Days::new(1)) {
                Some(yesterday) => yesterday,
                None => return 0,
            }
        };

        let mut streak = 0;
        while self.is_completed_on(day) {
            streak += 1;
            day = match day.checked_sub_days(Days::new(1)) {
                Some(previous) => previous,
                None => break,
            };
        }
        streak
    }

    /// Number of completions between `start` and `end`, inclusive.
    pub fn completions_between(&self, start: NaiveDate, end: NaiveDate) -> usize {
        self.completed_dates
            .range(date_key(start)..=date_key(end))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn habit_with(dates: &[&str]) -> Habit {
        let mut habit = Habit::new("user-1", "Drink water", None, "2026-01-01T00:00:00Z".into());
        habit.completed_dates = dates.iter().map(|d| d.to_string()).collect();
        habit
    }

    #[test]
    fn test_mark_completed_is_idempotent() {
        let mut habit = habit_with(&[]);
        let today = date(2026, 2, 10);

        assert!(habit.mark_completed(today));
        assert!(!habit.mark_completed(today));
        assert_eq!(habit.completed_dates.len(), 1);
        assert!(habit.is_completed_on(today));
    }

    #[test]
    fn test_streak_counts_back_from_today() {
        let habit = habit_with(&["2026-02-08", "2026-02-09", "2026-02-10"]);
        assert_eq!(habit.current_streak(date(2026, 2, 10)), 3);
    }

    #[test]
    fn test_streak_still_current_when_today_pending() {
        let habit = habit_with(&["2026-02-08", "2026-02-09"]);
        assert_eq!(habit.current_streak(date(2026, 2, 10)), 2);
    }

    #[test]
    fn test_streak_broken_by_gap() {
        let habit = habit_with(&["2026-02-06", "2026-02-07", "2026-02-09", "2026-02-10"]);
        assert_eq!(habit.current_streak(date(2026, 2, 10)), 2);
        assert_eq!(habit.current_streak(date(2026, 2, 12)), 0);
    }

    #[test]
    fn test_streak_across_month_boundary() {
        let habit = habit_with(&["2026-01-30", "2026-01-31", "2026-02-01"]);
        assert_eq!(habit.current_streak(date(2026, 2, 1)), 3);
    }

    #[test]
    fn test_completions_between_is_inclusive() {
        let habit = habit_with(&["2026-02-01", "2026-02-04", "2026-02-07", "2026-02-08"]);
        assert_eq!(
            habit.completions_between(date(2026, 2, 1), date(2026, 2, 7)),
            3
        );
    }
}
