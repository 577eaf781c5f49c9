// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod expense;
pub mod identity;
pub mod itinerary;
pub mod packing;
pub mod trip;

pub use expense::{Expense, NewExpense};
pub use identity::Identity;
pub use itinerary::{ItineraryItem, NewItineraryItem};
pub use packing::{NewPackingItem, PackingItem};
pub use trip::{JoinOutcome, NewTrip, Trip};
