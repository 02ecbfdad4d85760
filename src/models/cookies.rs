// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Cookie consent preferences.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// How long optional cookies may be kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum RetentionPeriod {
    #[serde(rename = "30_days")]
    Days30,
    #[serde(rename = "90_days")]
    Days90,
    #[default]
    #[serde(rename = "1_year")]
    OneYear,
}

impl RetentionPeriod {
    pub fn days(self) -> i64 {
        match self {
            RetentionPeriod::Days30 => 30,
            RetentionPeriod::Days90 => 90,
            RetentionPeriod::OneYear => 365,
        }
    }

    /// Value used in forms and JSON.
    pub fn as_str(self) -> &'static str {
        match self {
            RetentionPeriod::Days30 => "30_days",
            RetentionPeriod::Days90 => "90_days",
            RetentionPeriod::OneYear => "1_year",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "30_days" => Some(RetentionPeriod::Days30),
            "90_days" => Some(RetentionPeriod::Days90),
            "1_year" => Some(RetentionPeriod::OneYear),
            _ => None,
        }
    }
}

/// A visitor's cookie choices.
///
/// Stored in the session, mirrored into a signed cookie and, for logged-in
/// users, into the user document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct CookiePreferences {
    /// Session and security cookies; cannot be turned off.
    #[serde(default = "always_true")]
    pub necessary: bool,
    #[serde(default)]
    pub analytics: bool,
    #[serde(default)]
    pub preferences: bool,
    #[serde(default = "always_true")]
    pub functional: bool,
    #[serde(default)]
    pub third_party: bool,
    #[serde(default)]
    pub retention_period: RetentionPeriod,
    #[serde(default)]
    pub consent_given: bool,
    /// When consent was last recorded (RFC 3339)
    #[serde(default)]
    pub consent_date: Option<String>,
}

fn always_true() -> bool {
    true
}

impl Default for CookiePreferences {
    fn default() -> Self {
        Self {
            necessary: true,
            analytics: false,
            preferences: false,
            functional: true,
            third_party: false,
            retention_period: RetentionPeriod::default(),
            consent_given: false,
            consent_date: None,
        }
    }
}

/// Partial update supplied by the client. Absent fields keep their current value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CookiePreferencesUpdate {
    pub analytics: Option<bool>,
    pub preferences: Option<bool>,
    pub functional: Option<bool>,
    pub third_party: Option<bool>,
    pub retention_period: Option<RetentionPeriod>,
}

impl CookiePreferences {
    /// Every optional category enabled.
    pub fn accept_all() -> Self {
        Self {
            analytics: true,
            preferences: true,
            functional: true,
            third_party: true,
            ..Self::default()
        }
    }

    /// Only the cookies the site cannot work without.
    pub fn necessary_only() -> Self {
        Self {
            analytics: false,
            preferences: false,
            functional: false,
            third_party: false,
            ..Self::default()
        }
    }

    /// Overlay the fields present in `update` on these preferences.
    pub fn merge(mut self, update: &CookiePreferencesUpdate) -> Self {
        if let Some(analytics) = update.analytics {
            self.analytics = analytics;
        }
        if let Some(preferences) = update.preferences {
            self.preferences = preferences;
        }
        if let Some(functional) = update.functional {
            self.functional = functional;
        }
        if let Some(third_party) = update.third_party {
            self.third_party = third_party;
        }
        if let Some(retention_period) = update.retention_period {
            self.retention_period = retention_period;
        }
        self.necessary = true;
        self
    }

    /// Record that the visitor made an explicit choice at `now`.
    pub fn with_consent(mut self, now: String) -> Self {
        self.necessary = true;
        self.consent_given = true;
        self.consent_date = Some(now);
        self
    }
}
