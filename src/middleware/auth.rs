// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session authentication middleware.
//!
//! Requests are authorized against the identity held by the running session,
//! the same identity the presentation shell uses to pick its navigator.

use crate::error::AppError;
use crate::models::Identity;
use crate::AppState;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

/// Authenticated user extracted from the session.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub identity: Identity,
}

impl AuthUser {
    pub fn uid(&self) -> &str {
        &self.identity.uid
    }
}

/// Middleware that requires a signed-in identity.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let session = state.session.snapshot();

    let identity = match session.identity {
        Some(identity) => identity,
        None if session.is_loading => return Err(AppError::SessionLoading),
        None => return Err(AppError::Unauthorized),
    };

    request.extensions_mut().insert(AuthUser { identity });

    Ok(next.run(request).await)
}
