// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Live trip membership queries.

use crate::error::Result;
use crate::models::Trip;
use futures_util::stream::BoxStream;

/// One notification from a membership subscription: the full current list of
/// trips for the member, or a query failure.
pub type MembershipUpdate = Result<Vec<Trip>>;

/// Long-lived membership subscription; dropping it tears the query down.
pub type MembershipStream = BoxStream<'static, MembershipUpdate>;

/// Source of "all trips whose member set contains this user".
pub trait TripMembershipSource: Send + Sync {
    /// Open a live query. Every emission is a complete replacement list,
    /// re-delivered whenever any matching trip document changes.
    fn subscribe_by_member(&self, member_id: &str) -> MembershipStream;
}
