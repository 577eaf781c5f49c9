// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Signed-in user handle as reported by the identity provider.

use serde::{Deserialize, Serialize};

/// Name used for records whose author has neither a display name nor an email.
pub const FALLBACK_USER_NAME: &str = "User";

/// Opaque handle for the signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Provider-assigned unique user ID
    pub uid: String,
    /// Email address used to sign in
    pub email: Option<String>,
    /// Display name, if the account has one
    pub display_name: Option<String>,
}

impl Identity {
    pub fn new(uid: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            email: None,
            display_name: None,
        }
    }

    /// Human-readable author name stored on trips and trip entries.
    pub fn label(&self) -> &str {
        self.display_name
            .as_deref()
            .filter(|name| !name.is_empty())
            .or_else(|| self.email.as_deref().filter(|email| !email.is_empty()))
            .unwrap_or(FALLBACK_USER_NAME)
    }

    /// Whether `other` is the same account (compared by uid only).
    pub fn same_account(&self, other: &Identity) -> bool {
        self.uid == other.uid
    }
}
