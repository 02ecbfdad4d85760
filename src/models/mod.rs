// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod cookies;
pub mod habit;
pub mod stats;
pub mod user;

pub use cookies::{CookiePreferences, CookiePreferencesUpdate, RetentionPeriod};
pub use habit::{CompletionOutcome, Habit};
pub use stats::{DayProgress, HabitSummary, ProgressStats};
pub use user::User;

use rand::RngCore;

/// Generate an opaque random document ID (32 lowercase hex characters).
pub fn new_document_id() -> String {
    let mut bytes = [0u8; 16];
    rand::rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Whether `raw` has the shape of an ID produced by [`new_document_id`].
pub fn is_valid_document_id(raw: &str) -> bool {
    raw.len() == 32 && raw.bytes().all(|b| b.is_ascii_hexdigit())
}
