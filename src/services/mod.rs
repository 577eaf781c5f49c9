// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod identity;
pub mod membership;
pub mod session;
pub mod trips;

pub use identity::{FirebaseAuth, IdentityProvider, IdentityStream, IdentityUpdate};
pub use membership::{MembershipStream, MembershipUpdate, TripMembershipSource};
pub use session::{SessionComposer, SessionHandle, SessionOptions, SessionState, Shell};
pub use trips::TripService;
