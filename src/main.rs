// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Trip Planner API Server
//!
//! Local backend for the trip planner app: follows the signed-in account and
//! its trips, and serves the trip, itinerary, expense and packing screens.

use std::sync::Arc;
use trip_planner::{
    config::Config,
    db::FirestoreDb,
    services::{FirebaseAuth, SessionHandle, TripService},
    AppState,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging()?;

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(port = config.port, "Starting Trip Planner API");

    // Initialize Firestore database
    let db = FirestoreDb::new(&config.gcp_project_id).await?;

    let auth = FirebaseAuth::new(&config.identity_toolkit_url, &config.firebase_api_key);
    tracing::info!(url = %config.identity_toolkit_url, "Identity provider initialized");

    // Follow the signed-in account and its trips for the life of the process
    let session = SessionHandle::spawn(
        Arc::new(auth.clone()),
        Arc::new(db.clone()),
        (&config).into(),
    );
    tokio::spawn(log_shell_changes(session.clone()));

    let state = Arc::new(AppState {
        config: config.clone(),
        auth: auth.clone(),
        identity: Arc::new(auth),
        session: session.clone(),
        trips: TripService::new(db, config.invite_code_attempts),
    });

    let app = trip_planner::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    session.shutdown().await;
    tracing::info!("Session stopped");
    Ok(())
}

/// Log each change of the view the shell should render.
async fn log_shell_changes(session: SessionHandle) {
    let mut state = session.subscribe();
    let mut shell = state.borrow_and_update().shell();

    while state.changed().await.is_ok() {
        let snapshot = state.borrow_and_update().clone();
        if snapshot.shell() != shell {
            shell = snapshot.shell();
            tracing::info!(
                shell = ?shell,
                uid = snapshot.identity.as_ref().map(|i| i.uid.as_str()),
                trips = snapshot.trips.len(),
                "Session shell changed"
            );
        }
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
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
                .add_directive("trip_planner=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .with(format)
        .init();
    Ok(())
}
