// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Canned suggestions derived from habit names and today's progress.
//!
//! The checks run in a fixed order and only look for keywords in habit
//! names; there is no scoring.

use serde::Serialize;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::models::{Habit, ProgressStats};

/// Upper bound on the number of messages returned.
pub const MAX_RECOMMENDATIONS: usize = 5;

/// A single suggestion shown on the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Recommendation {
    pub category: &'static str,
    pub message: &'static str,
}

struct Category {
    name: &'static str,
    keywords: &'static [&'static str],
    suggestion: &'static str,
}

/// Checked in this order. Keywords are lower-case and matched as substrings.
const CATEGORIES: &[Category] = &[
    Category {
        name: "hydration",
        keywords: &["water", "drink", "hydrat", "agua", "beber"],
        suggestion: "Try tracking your water intake: a glass of water after waking up is an easy win.",
    },
    Category {
        name: "exercise",
        keywords: &[
            "exercise", "run", "walk", "gym", "workout", "yoga", "bike", "swim", "ejercicio",
            "correr", "caminar", "gimnasio",
        ],
        suggestion: "Add some movement: even a 10-minute walk counts as exercise.",
    },
    Category {
        name: "reading",
        keywords: &["read", "book", "study", "leer", "libro", "estudiar"],
        suggestion: "Reading a few pages a day adds up. Consider a reading habit.",
    },
    Category {
        name: "mindfulness",
        keywords: &[
            "meditat", "mindful", "breath", "journal", "gratitude", "meditar", "respirar", "diario",
        ],
        suggestion: "A few minutes of meditation or journaling can help you stay consistent.",
    },
    Category {
        name: "sleep",
        keywords: &["sleep", "bed", "wake", "dormir", "despertar"],
        suggestion: "Consistent sleep makes every other habit easier. Try a fixed bedtime.",
    },
];

fn mentions_any(names: &[String], keywords: &[&str]) -> bool {
    names
        .iter()
        .any(|name| keywords.iter().any(|keyword| name.contains(keyword)))
}

/// Build the recommendation list for a user's habits.
pub fn recommend(habits: &[Habit], stats: &ProgressStats) -> Vec<Recommendation> {
    if habits.is_empty() {
        return vec![Recommendation {
            category: "getting_started",
            message: "Start small: add one habit you can do every day.",
        }];
    }

    let mut recommendations = Vec::new();

    if stats.completed_today == stats.total_habits {
        recommendations.push(Recommendation {
            category: "progress",
            message: "Every habit done today. Great work!",
        });
    } else if stats.daily_percentage < 50.0 {
        recommendations.push(Recommendation {
            category: "progress",
            message: "There is still time today. Pick the easiest habit and start there.",
        });
    }

    let names: Vec<String> = habits.iter().map(|h| h.name.to_lowercase()).collect();
    for category in CATEGORIES {
        if !mentions_any(&names, category.keywords) {
            recommendations.push(Recommendation {
                category: category.name,
                message: category.suggestion,
            });
        }
    }

    if stats.weekly_percentage >= 80.0 {
        recommendations.push(Recommendation {
            category: "consistency",
            message: "Over 80% this week. Your consistency is paying off.",
        });
    }

    recommendations.truncate(MAX_RECOMMENDATIONS);
    recommendations
}
