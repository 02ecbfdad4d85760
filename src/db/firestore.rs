// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Users (accounts and their cookie preferences)
//! - Habits (owned by a user, with a set of completion dates)
//!
//! Every habit operation checks the stored `user_id` against the caller
//! before returning or writing anything.

use crate::db::collections;
use crate::error::AppError;
use crate::models::{CompletionOutcome, CookiePreferences, Habit, User};
use chrono::NaiveDate;
use firestore::{paths, FirestoreConsistencySelector, FirestoreTransaction};

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // If the emulator environment variable is set, use unauthenticated connection
        // to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a client with no connection.
    ///
    /// All database operations will return an error if called. The server
    /// falls back to this when Firestore is unreachable at startup.
    pub fn new_offline() -> Self {
        Self { client: None }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    // ─── User Operations ─────────────────────────────────────────

    /// Store a new user after checking username and email are free.
    ///
    /// The checks and the write are separate requests; two registrations
    /// racing for the same name can both pass the check.
    pub async fn create_user(&self, user: &User) -> Result<(), AppError> {
        if self
            .find_user_by_field("username_key", &user.username_key)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict("Username already exists".to_string()));
        }
        if self.find_user_by_field("email", &user.email).await?.is_some() {
            return Err(AppError::Conflict("Email already registered".to_string()));
        }

        let _: User = self
            .get_client()?
            .fluent()
            .insert()
            .into(collections::USERS)
            .document_id(&user.id)
            .object(user)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        tracing::info!(user_id = %user.id, "User created");
        Ok(())
    }

    /// Get a user by ID.
    pub async fn get_user(&self, user_id: &str) -> Result<Option<User>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(user_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find the first user whose `field` equals `value`.
    pub async fn find_user_by_field(
        &self,
        field: &'static str,
        value: &str,
    ) -> Result<Option<User>, AppError> {
        let users: Vec<User> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::USERS)
            .filter(|q| q.for_all([q.field(field).eq(value)]))
            .limit(1)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(users.into_iter().next())
    }

    /// Write only `fields` of `user` to an existing user document.
    async fn update_user_fields<I>(&self, user: &User, fields: I) -> Result<(), AppError>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .fields(fields)
            .in_col(collections::USERS)
            .document_id(&user.id)
            .object(user)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Update the last-login timestamp.
    pub async fn record_login(&self, user_id: &str, at: &str) -> Result<(), AppError> {
        let mut user = self
            .get_user(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))?;
        user.last_login = Some(at.to_string());
        self.update_user_fields(&user, paths!(User::{last_login}))
            .await
    }

    /// Save cookie preferences on the user document.
    pub async fn set_user_cookie_preferences(
        &self,
        user_id: &str,
        preferences: &CookiePreferences,
    ) -> Result<(), AppError> {
        let mut user = self
            .get_user(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))?;
        user.cookie_preferences = Some(preferences.clone());
        self.update_user_fields(&user, paths!(User::{cookie_preferences}))
            .await
    }

    // ─── Habit Operations ────────────────────────────────────────

    /// Get all habits owned by a user (unordered).
    pub async fn list_habits(&self, user_id: &str) -> Result<Vec<Habit>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::HABITS)
            .filter(|q| q.for_all([q.field("user_id").eq(user_id)]))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a habit by ID, only if `user_id` owns it.
    pub async fn get_habit(
        &self,
        habit_id: &str,
        user_id: &str,
    ) -> Result<Option<Habit>, AppError> {
        let habit: Option<Habit> = self
            .get_client()?
            .fluent()
            .select()
            .by_id_in(collections::HABITS)
            .obj()
            .one(habit_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(habit.filter(|h| h.user_id == user_id))
    }

    /// Store a habit document.
    pub async fn insert_habit(&self, habit: &Habit) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::HABITS)
            .document_id(&habit.id)
            .object(habit)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Read a habit inside `transaction`, so a concurrent write to it makes the
    /// commit fail. Habits owned by someone else read as missing.
    async fn read_owned_habit(
        client: &firestore::FirestoreDb,
        transaction: &FirestoreTransaction<'_>,
        habit_id: &str,
        user_id: &str,
    ) -> Result<Option<Habit>, AppError> {
        let transactional = client.clone_with_consistency_selector(
            FirestoreConsistencySelector::Transaction(transaction.transaction_id().clone()),
        );
        let habit: Option<Habit> = transactional
            .fluent()
            .select()
            .by_id_in(collections::HABITS)
            .obj()
            .one(habit_id)
            .await
            .map_err(|e| {
                AppError::Database(format!("Failed to read habit in transaction: {}", e))
            })?;

        Ok(habit.filter(|h| h.user_id == user_id))
    }

    /// Add `date` to a habit's completion set.
    ///
    /// Only `completed_dates` is written, inside a transaction that also holds
    /// the ownership and duplicate checks.
    pub async fn complete_habit(
        &self,
        habit_id: &str,
        user_id: &str,
        date: NaiveDate,
    ) -> Result<CompletionOutcome, AppError> {
        let client = self.get_client()?;

        let mut transaction = client
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        let Some(mut habit) = Self::read_owned_habit(client, &transaction, habit_id, user_id).await?
        else {
            let _ = transaction.rollback().await;
            return Ok(CompletionOutcome::NotFound);
        };

        if !habit.mark_completed(date) {
            tracing::debug!(habit_id, "Habit already completed today (idempotent skip)");
            let _ = transaction.rollback().await;
            return Ok(CompletionOutcome::AlreadyCompleted);
        }

        client
            .fluent()
            .update()
            .fields(paths!(Habit::{completed_dates}))
            .in_col(collections::HABITS)
            .document_id(&habit.id)
            .object(&habit)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add habit to transaction: {}", e))
            })?;

        transaction
            .commit()
            .await
            .map_err(|e| AppError::Database(format!("Transaction commit failed: {}", e)))?;

        tracing::info!(habit_id, user_id, "Habit completed");
        Ok(CompletionOutcome::Completed)
    }

    /// Update name and description of a habit the user owns.
    pub async fn update_habit(
        &self,
        habit_id: &str,
        user_id: &str,
        name: &str,
        description: Option<&str>,
    ) -> Result<bool, AppError> {
        let client = self.get_client()?;

        let mut transaction = client
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        let Some(mut habit) = Self::read_owned_habit(client, &transaction, habit_id, user_id).await?
        else {
            let _ = transaction.rollback().await;
            return Ok(false);
        };

        habit.name = name.to_string();
        habit.description = description.map(str::to_string);

        // Completions recorded meanwhile are left alone
        client
            .fluent()
            .update()
            .fields(paths!(Habit::{name, description}))
            .in_col(collections::HABITS)
            .document_id(&habit.id)
            .object(&habit)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add habit to transaction: {}", e))
            })?;

        transaction
            .commit()
            .await
            .map_err(|e| AppError::Database(format!("Transaction commit failed: {}", e)))?;

        tracing::info!(habit_id, user_id, "Habit updated");
        Ok(true)
    }

    /// Delete a habit the user owns.
    pub async fn delete_habit(&self, habit_id: &str, user_id: &str) -> Result<bool, AppError> {
        if self.get_habit(habit_id, user_id).await?.is_none() {
            return Ok(false);
        }

        self.get_client()?
            .fluent()
            .delete()
            .from(collections::HABITS)
            .document_id(habit_id)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        tracing::info!(habit_id, user_id, "Habit deleted");
        Ok(true)
    }
}
