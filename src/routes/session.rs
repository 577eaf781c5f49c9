// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session state for the presentation shell.

use axum::{
    extract::State,
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::services::{SessionState, Shell};
use crate::AppState;

/// Readable without authentication: the shell needs it to pick a navigator.
pub fn public_routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/session", get(get_session))
}

/// Require a signed-in identity (applied in routes/mod.rs).
pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/session/select", post(select_trip))
}

/// Session snapshot plus the view the shell should render.
#[derive(Serialize)]
pub struct SessionResponse {
    pub shell: Shell,
    #[serde(flatten)]
    pub state: SessionState,
}

impl From<SessionState> for SessionResponse {
    fn from(state: SessionState) -> Self {
        Self {
            shell: state.shell(),
            state,
        }
    }
}

async fn get_session(State(state): State<Arc<AppState>>) -> Json<SessionResponse> {
    Json(state.session.snapshot().into())
}

#[derive(Deserialize)]
pub struct SelectTripRequest {
    trip_id: String,
}

/// Switch the selected trip to one of the caller's current trips.
async fn select_trip(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<SelectTripRequest>,
) -> Result<Json<SessionResponse>> {
    let trip = state
        .session
        .snapshot()
        .trips
        .into_iter()
        .find(|trip| trip.id == body.trip_id)
        .ok_or_else(|| AppError::NotFound(format!("Trip {} not found", body.trip_id)))?;

    tracing::debug!(uid = %user.uid(), trip_id = %trip.id, "Selecting trip");

    let updated = state.session.select(trip).await?;
    Ok(Json(updated.into()))
}
