//! Database layer (Firestore, or an in-memory store for development and tests).

pub mod firestore;
pub mod memory;

pub use firestore::FirestoreDb;
pub use memory::MemoryDb;

use crate::error::AppError;
use crate::models::{CompletionOutcome, CookiePreferences, Habit, User};
use chrono::NaiveDate;

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    pub const HABITS: &str = "habits";
}

/// Handle to whichever document store the application runs on.
#[derive(Clone)]
pub enum Database {
    Firestore(FirestoreDb),
    Memory(MemoryDb),
}

impl Database {
    // ─── User Operations ─────────────────────────────────────────

    /// Store a new user. Fails with `Conflict` if the username or email is taken.
    pub async fn create_user(&self, user: &User) -> Result<(), AppError> {
        match self {
            Database::Firestore(db) => db.create_user(user).await,
            Database::Memory(db) => db.create_user(user),
        }
    }

    pub async fn get_user(&self, user_id: &str) -> Result<Option<User>, AppError> {
        match self {
            Database::Firestore(db) => db.get_user(user_id).await,
            Database::Memory(db) => db.get_user(user_id),
        }
    }

    /// Look up a user by username (case-insensitive).
    pub async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let key = User::username_key_for(username);
        match self {
            Database::Firestore(db) => db.find_user_by_field("username_key", &key).await,
            Database::Memory(db) => db.find_user(|u| u.username_key == key),
        }
    }

    /// Look up a user by email (case-insensitive).
    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let email = User::normalize_email(email);
        match self {
            Database::Firestore(db) => db.find_user_by_field("email", &email).await,
            Database::Memory(db) => db.find_user(|u| u.email == email),
        }
    }

    /// Update the last-login timestamp.
    pub async fn record_login(&self, user_id: &str, at: &str) -> Result<(), AppError> {
        match self {
            Database::Firestore(db) => db.record_login(user_id, at).await,
            Database::Memory(db) => db.record_login(user_id, at),
        }
    }

    pub async fn set_user_cookie_preferences(
        &self,
        user_id: &str,
        preferences: &CookiePreferences,
    ) -> Result<(), AppError> {
        match self {
            Database::Firestore(db) => db.set_user_cookie_preferences(user_id, preferences).await,
            Database::Memory(db) => db.set_user_cookie_preferences(user_id, preferences),
        }
    }

    // ─── Habit Operations ────────────────────────────────────────

    /// All habits owned by `user_id`, newest first.
    pub async fn list_habits(&self, user_id: &str) -> Result<Vec<Habit>, AppError> {
        let mut habits = match self {
            Database::Firestore(db) => db.list_habits(user_id).await?,
            Database::Memory(db) => db.list_habits(user_id),
        };
        // RFC 3339 UTC strings sort chronologically.
        habits.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(habits)
    }

    /// Fetch a habit only if `user_id` owns it.
    pub async fn get_habit(
        &self,
        habit_id: &str,
        user_id: &str,
    ) -> Result<Option<Habit>, AppError> {
        match self {
            Database::Firestore(db) => db.get_habit(habit_id, user_id).await,
            Database::Memory(db) => db.get_habit(habit_id, user_id),
        }
    }

    pub async fn insert_habit(&self, habit: &Habit) -> Result<(), AppError> {
        match self {
            Database::Firestore(db) => db.insert_habit(habit).await,
            Database::Memory(db) => db.insert_habit(habit),
        }
    }

    /// Add `date` to the habit's completion set, at most once per day.
    pub async fn complete_habit(
        &self,
        habit_id: &str,
        user_id: &str,
        date: NaiveDate,
    ) -> Result<CompletionOutcome, AppError> {
        match self {
            Database::Firestore(db) => db.complete_habit(habit_id, user_id, date).await,
            Database::Memory(db) => db.complete_habit(habit_id, user_id, date),
        }
    }

    /// Rename / re-describe a habit. Returns `false` if the user owns no such habit.
    pub async fn update_habit(
        &self,
        habit_id: &str,
        user_id: &str,
        name: &str,
        description: Option<&str>,
    ) -> Result<bool, AppError> {
        match self {
            Database::Firestore(db) => db.update_habit(habit_id, user_id, name, description).await,
            Database::Memory(db) => db.update_habit(habit_id, user_id, name, description),
        }
    }

    /// Delete a habit. Returns `false` if the user owns no such habit.
    pub async fn delete_habit(&self, habit_id: &str, user_id: &str) -> Result<bool, AppError> {
        match self {
            Database::Firestore(db) => db.delete_habit(habit_id, user_id).await,
            Database::Memory(db) => db.delete_habit(habit_id, user_id),
        }
    }
}
