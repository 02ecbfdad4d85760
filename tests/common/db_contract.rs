// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Behaviour every `Database` backend must share.
//! Run against the in-memory store always and against the Firestore emulator when available.

#![allow(dead_code)]

use chrono::NaiveDate;
use habit_tracker::db::Database;
use habit_tracker::error::AppError;
use habit_tracker::models::{new_document_id, CompletionOutcome, CookiePreferences, Habit, User};

/// Short random suffix so emulator runs never collide.
pub fn unique(prefix: &str) -> String {
    format!("{}_{}", prefix, &new_document_id()[..8])
}

pub fn test_user(username: &str) -> User {
    User {
        id: new_document_id(),
        username: username.to_string(),
        username_key: User::username_key_for(username),
        email: User::normalize_email(&format!("{}@example.com", username)),
        password_hash: "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA".to_string(),
        created_at: "2026-01-15T10:00:00Z".to_string(),
        last_login: None,
        cookie_preferences: None,
    }
}

fn date(raw: &str) -> NaiveDate {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").unwrap()
}

pub async fn user_lifecycle(db: &Database) {
    let username = unique("Ana");
    let user = test_user(&username);

    assert!(db.get_user(&user.id).await.unwrap().is_none());
    db.create_user(&user).await.unwrap();

    let fetched = db.get_user(&user.id).await.unwrap().expect("user stored");
    assert_eq!(fetched.username, username);
    assert_eq!(fetched.email, user.email);

    // Lookups ignore case
    let by_name = db
        .find_user_by_username(&username.to_uppercase())
        .await
        .unwrap()
        .expect("found by username");
    assert_eq!(by_name.id, user.id);
    let by_email = db
        .find_user_by_email(&user.email.to_uppercase())
        .await
        .unwrap()
        .expect("found by email");
    assert_eq!(by_email.id, user.id);

    db.record_login(&user.id, "2026-02-01T09:00:00Z").await.unwrap();
    let prefs = CookiePreferences::accept_all().with_consent("2026-02-01T09:01:00Z".into());
    db.set_user_cookie_preferences(&user.id, &prefs).await.unwrap();

    let updated = db.get_user(&user.id).await.unwrap().unwrap();
    assert_eq!(updated.last_login.as_deref(), Some("2026-02-01T09:00:00Z"));
    assert_eq!(updated.cookie_preferences, Some(prefs));
    assert_eq!(updated.password_hash, user.password_hash, "other fields kept");

    // Duplicates
    let mut same_name = test_user(&username.to_lowercase());
    same_name.email = format!("{}@elsewhere.example.com", unique("x"));
    match db.create_user(&same_name).await {
        Err(AppError::Conflict(msg)) => assert_eq!(msg, "Username already exists"),
        other => panic!("expected username conflict, got {:?}", other),
    }

    let mut same_email = test_user(&unique("Other"));
    same_email.email = user.email.clone();
    match db.create_user(&same_email).await {
        Err(AppError::Conflict(msg)) => assert_eq!(msg, "Email already registered"),
        other => panic!("expected email conflict, got {:?}", other),
    }
}

pub async fn habit_lifecycle(db: &Database) {
    let owner = test_user(&unique("owner"));
    let other = test_user(&unique("other"));
    db.create_user(&owner).await.unwrap();
    db.create_user(&other).await.unwrap();

    let older = Habit::new(&owner.id, "Walk", Some("20 minutes"), "2026-01-01T08:00:00Z".into());
    let newer = Habit::new(&owner.id, "Read", None, "2026-01-05T08:00:00Z".into());
    let foreign = Habit::new(&other.id, "Swim", None, "2026-01-03T08:00:00Z".into());
    for habit in [&older, &newer, &foreign] {
        db.insert_habit(habit).await.unwrap();
    }

    let listed: Vec<_> = db
        .list_habits(&owner.id)
        .await
        .unwrap()
        .into_iter()
        .map(|h| h.name)
        .collect();
    assert_eq!(listed, vec!["Read", "Walk"]);

    // Ownership is enforced on every operation
    assert!(db.get_habit(&foreign.id, &owner.id).await.unwrap().is_none());
    assert_eq!(
        db.complete_habit(&foreign.id, &owner.id, date("2026-01-06"))
            .await
            .unwrap(),
        CompletionOutcome::NotFound
    );
    assert!(!db
        .update_habit(&foreign.id, &owner.id, "Hijacked", None)
        .await
        .unwrap());
    assert!(!db.delete_habit(&foreign.id, &owner.id).await.unwrap());
    assert_eq!(
        db.get_habit(&foreign.id, &other.id).await.unwrap().unwrap().name,
        "Swim"
    );

    // Completion is idempotent per day
    let day = date("2026-01-06");
    assert_eq!(
        db.complete_habit(&older.id, &owner.id, day).await.unwrap(),
        CompletionOutcome::Completed
    );
    assert_eq!(
        db.complete_habit(&older.id, &owner.id, day).await.unwrap(),
        CompletionOutcome::AlreadyCompleted
    );
    assert_eq!(
        db.complete_habit(&older.id, &owner.id, date("2026-01-07"))
            .await
            .unwrap(),
        CompletionOutcome::Completed
    );
    assert_eq!(
        db.complete_habit(&new_document_id(), &owner.id, day)
            .await
            .unwrap(),
        CompletionOutcome::NotFound
    );

    let walk = db.get_habit(&older.id, &owner.id).await.unwrap().unwrap();
    assert_eq!(
        walk.completed_dates.iter().cloned().collect::<Vec<_>>(),
        vec!["2026-01-06", "2026-01-07"]
    );

    // Update keeps completions
    assert!(db
        .update_habit(&older.id, &owner.id, "Long walk", None)
        .await
        .unwrap());
    let walk = db.get_habit(&older.id, &owner.id).await.unwrap().unwrap();
    assert_eq!(walk.name, "Long walk");
    assert_eq!(walk.description, None);
    assert_eq!(walk.completed_dates.len(), 2);

    assert!(db.delete_habit(&older.id, &owner.id).await.unwrap());
    assert!(db.get_habit(&older.id, &owner.id).await.unwrap().is_none());
    assert!(!db.delete_habit(&older.id, &owner.id).await.unwrap());
    assert_eq!(db.list_habits(&owner.id).await.unwrap().len(), 1);
}
