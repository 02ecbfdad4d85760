// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process document store with the same semantics as the Firestore backend.
//!
//! Used for local development (`DATABASE_BACKEND=memory`) and tests.

use crate::error::AppError;
use crate::models::{CompletionOutcome, CookiePreferences, Habit, User};
use chrono::NaiveDate;
use dashmap::DashMap;
use std::sync::{Arc, Mutex, PoisonError};

#[derive(Default)]
struct Collections {
    users: DashMap<String, User>,
    habits: DashMap<String, Habit>,
    /// Serializes account creation so the uniqueness checks and the insert
    /// happen as one step.
    registration: Mutex<()>,
}

/// In-memory database. Clones share the same data.
#[derive(Clone, Default)]
pub struct MemoryDb {
    inner: Arc<Collections>,
}

impl MemoryDb {
    pub fn new() -> Self {
        Self::default()
    }

    // ─── User Operations ─────────────────────────────────────────

    pub fn create_user(&self, user: &User) -> Result<(), AppError> {
        let _guard = self
            .inner
            .registration
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        for existing in self.inner.users.iter() {
            if existing.username_key == user.username_key {
                return Err(AppError::Conflict("Username already exists".to_string()));
            }
            if existing.email == user.email {
                return Err(AppError::Conflict("Email already registered".to_string()));
            }
        }

        self.inner.users.insert(user.id.clone(), user.clone());
        Ok(())
    }

    pub fn get_user(&self, user_id: &str) -> Result<Option<User>, AppError> {
        Ok(self.inner.users.get(user_id).map(|u| u.value().clone()))
    }

    pub fn find_user<F>(&self, predicate: F) -> Result<Option<User>, AppError>
    where
        F: Fn(&User) -> bool,
    {
        Ok(self
            .inner
            .users
            .iter()
            .find(|entry| predicate(entry.value()))
            .map(|entry| entry.value().clone()))
    }

    pub fn record_login(&self, user_id: &str, at: &str) -> Result<(), AppError> {
        let mut user = self
            .inner
            .users
            .get_mut(user_id)
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))?;
        user.last_login = Some(at.to_string());
        Ok(())
    }

    pub fn set_user_cookie_preferences(
        &self,
        user_id: &str,
        preferences: &CookiePreferences,
    ) -> Result<(), AppError> {
        let mut user = self
            .inner
            .users
            .get_mut(user_id)
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))?;
        user.cookie_preferences = Some(preferences.clone());
        Ok(())
    }

    // ─── Habit Operations ────────────────────────────────────────

    pub fn list_habits(&self, user_id: &str) -> Vec<Habit> {
        self.inner
            .habits
            .iter()
            .filter(|entry| entry.user_id == user_id)
            .map(|entry| entry.value().clone())
            .collect()
    }

    pub fn get_habit(&self, habit_id: &str, user_id: &str) -> Result<Option<Habit>, AppError> {
        Ok(self
            .inner
            .habits
            .get(habit_id)
            .filter(|habit| habit.user_id == user_id)
            .map(|habit| habit.value().clone()))
    }

    pub fn insert_habit(&self, habit: &Habit) -> Result<(), AppError> {
        self.inner.habits.insert(habit.id.clone(), habit.clone());
        Ok(())
    }

    pub fn complete_habit(
        &self,
        habit_id: &str,
        user_id: &str,
        date: NaiveDate,
    ) -> Result<CompletionOutcome, AppError> {
        let Some(mut habit) = self.inner.habits.get_mut(habit_id) else {
            return Ok(CompletionOutcome::NotFound);
        };
        if habit.user_id != user_id {
            return Ok(CompletionOutcome::NotFound);
        }

        if habit.mark_completed(date) {
            Ok(CompletionOutcome::Completed)
        } else {
            Ok(CompletionOutcome::AlreadyCompleted)
        }
    }

    pub fn update_habit(
        &self,
        habit_id: &str,
        user_id: &str,
        name: &str,
        description: Option<&str>,
    ) -> Result<bool, AppError> {
        let Some(mut habit) = self.inner.habits.get_mut(habit_id) else {
            return Ok(false);
        };
        if habit.user_id != user_id {
            return Ok(false);
        }

        habit.name = name.to_string();
        habit.description = description.map(str::to_string);
        Ok(true)
    }

    pub fn delete_habit(&self, habit_id: &str, user_id: &str) -> Result<bool, AppError> {
        Ok(self
            .inner
            .habits
            .remove_if(habit_id, |_, habit| habit.user_id == user_id)
            .is_some())
    }
}
