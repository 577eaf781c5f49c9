// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Trip Planner: shared trips with itinerary, expenses and a packing list.
//!
//! The core of this crate is the session composer, which combines the
//! signed-in identity with the live list of trips that identity belongs to
//! and keeps a selected trip for the presentation shell.

pub mod codes;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;
pub mod validation;

use config::Config;
use services::{FirebaseAuth, IdentityProvider, SessionHandle, TripService};
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    /// Email/password account operations
    pub auth: FirebaseAuth,
    /// Identity source the session follows
    pub identity: Arc<dyn IdentityProvider>,
    pub session: SessionHandle,
    pub trips: TripService,
}
