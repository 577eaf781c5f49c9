// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Trip model for storage and API.

use serde::{Deserialize, Serialize};

/// Shared planning unit stored in the `trips` collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trip {
    /// Document ID (also stored as a field)
    pub id: String,
    /// Trip name as entered by the creator
    pub name: String,
    /// Short shareable code used to join the trip
    pub invite_code: String,
    /// UID of the creator
    pub created_by: String,
    /// Creator's display label at creation time
    pub creator_name: String,
    /// UIDs of every member, creator included
    pub members: Vec<String>,
    /// Free-form start date
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    /// Free-form end date
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    /// When the trip was created (RFC 3339)
    pub created_at: String,
}

impl Trip {
    pub fn has_member(&self, uid: &str) -> bool {
        self.members.iter().any(|m| m == uid)
    }
}

/// Fields a user supplies when creating a trip.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewTrip {
    pub name: String,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
}

/// Result of redeeming an invite code.
#[derive(Debug, Clone, PartialEq)]
pub enum JoinOutcome {
    /// Caller was added to the member list.
    Joined(Trip),
    /// Caller was already a member; nothing was written.
    AlreadyMember(Trip),
}

impl JoinOutcome {
    pub fn trip(&self) -> &Trip {
        match self {
            JoinOutcome::Joined(trip) | JoinOutcome::AlreadyMember(trip) => trip,
        }
    }
}
