// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Habit Tracker web server
//!
//! Server-rendered habit tracking with a small JSON API, backed by Firestore
//! (or an in-memory store for local development).

use habit_tracker::{
    config::{Config, DatabaseBackend},
    db::{Database, FirestoreDb, MemoryDb},
    AppState,
};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging()?;

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(
        port = config.port,
        backend = ?config.database_backend,
        "Starting Habit Tracker"
    );

    let db = connect_database(&config).await;
    let metrics = install_metrics_recorder();

    // Build shared state
    let state = Arc::new(AppState {
        config: config.clone(),
        db,
        metrics,
    });

    // Build router
    let app = habit_tracker::routes::create_router(state);

    // Start server
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, base_url = %config.base_url, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Open the configured backend. If Firestore is unreachable the server still
/// starts; pages show a database error until it is restarted.
async fn connect_database(config: &Config) -> Database {
    match config.database_backend {
        DatabaseBackend::Memory => {
            tracing::warn!("Using in-memory database; data is lost on restart");
            Database::Memory(MemoryDb::new())
        }
        DatabaseBackend::Firestore => match FirestoreDb::new(&config.gcp_project_id).await {
            Ok(db) => Database::Firestore(db),
            Err(e) => {
                tracing::error!(error = %e, "Firestore unavailable, running in offline mode");
                Database::Firestore(FirestoreDb::new_offline())
            }
        },
    }
}

fn install_metrics_recorder() -> Option<PrometheusHandle> {
    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => Some(handle),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to install metrics recorder");
            None
        }
    }
}

/// Initialize structured JSON logging.
fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("habit_tracker=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .with(format)
        .try_init()?;

    Ok(())
}
