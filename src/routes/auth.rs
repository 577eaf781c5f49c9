// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Email/password authentication routes.

use axum::{extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::Result;
use crate::models::Identity;
use crate::validation;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/sign-in", post(sign_in))
        .route("/auth/sign-up", post(sign_up))
        .route("/auth/sign-out", post(sign_out))
}

#[derive(Deserialize)]
pub struct CredentialsRequest {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

#[derive(Serialize)]
pub struct AuthResponse {
    pub identity: Identity,
}

#[derive(Serialize)]
pub struct SignOutResponse {
    pub success: bool,
}

/// Sign in with an existing account.
///
/// Responds once the session follows the new identity, so the next
/// protected request is already authorized.
async fn sign_in(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CredentialsRequest>,
) -> Result<Json<AuthResponse>> {
    let credentials = validation::credentials(&body.email, &body.password, false)?;
    let identity = state.auth.sign_in(&credentials).await?;
    state.session.wait_for_identity(Some(&identity.uid)).await?;
    Ok(Json(AuthResponse { identity }))
}

/// Create an account and sign in to it.
async fn sign_up(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CredentialsRequest>,
) -> Result<Json<AuthResponse>> {
    let credentials = validation::credentials(&body.email, &body.password, true)?;
    let identity = state.auth.sign_up(&credentials).await?;
    state.session.wait_for_identity(Some(&identity.uid)).await?;
    Ok(Json(AuthResponse { identity }))
}

async fn sign_out(State(state): State<Arc<AppState>>) -> Result<Json<SignOutResponse>> {
    state.identity.sign_out().await?;
    state.session.wait_for_identity(None).await?;
    Ok(Json(SignOutResponse { success: true }))
}
