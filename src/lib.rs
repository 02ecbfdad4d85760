// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Habit Tracker: a small personal habit-tracking web application.
//!
//! Users register, log in and keep a list of habits, marking each one as
//! done for the current day. Pages are server-rendered; a small JSON API
//! exposes the same data plus progress statistics and cookie preferences.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;
pub mod views;

use config::Config;
use db::Database;
use metrics_exporter_prometheus::PrometheusHandle;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: Database,
    /// Prometheus exporter handle; `None` when no recorder is installed.
    pub metrics: Option<PrometheusHandle>,
}
