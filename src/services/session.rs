// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session/trip state composition.
//!
//! Two independent asynchronous sources feed the session:
//! 1. The identity stream (who is signed in)
//! 2. A membership stream for the current identity (which trips they are in)
//!
//! `SessionComposer` is the synchronous state machine that merges them into a
//! single `SessionState`. Every identity transition bumps a generation counter;
//! membership results carry the generation they were opened under and are
//! discarded if it no longer matches, so a list keyed to a previous identity
//! can never be attributed to the current one.
//!
//! `SessionHandle` runs the composer on a single tokio task and publishes a
//! snapshot through a watch channel after every accepted change.

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::models::{Identity, Trip};
use crate::services::identity::{IdentityProvider, IdentityStream};
use crate::services::membership::{MembershipUpdate, TripMembershipSource};
use futures_util::stream::{BoxStream, StreamExt};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::Instant;

const MEMBERSHIP_TIMEOUT_MESSAGE: &str = "Timed out waiting for trips";
const MEMBERSHIP_CLOSED_MESSAGE: &str = "Trip subscription closed";
const IDENTITY_CLOSED_MESSAGE: &str = "Authentication unavailable: identity stream closed";

/// Progress of one input source since the last identity transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    Pending,
    Resolved,
}

/// Which top-level view the presentation shell should render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Shell {
    Loading,
    Unauthenticated,
    Authenticated,
}

/// Consistent view of the session, published after every change.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionState {
    pub identity: Option<Identity>,
    pub trips: Vec<Trip>,
    pub selected_trip: Option<Trip>,
    /// True until both sources have resolved since the last identity transition.
    pub is_loading: bool,
    /// Set when the identity provider itself is failing.
    pub identity_error: Option<String>,
    /// Last membership query failure; the previous trip list is kept.
    pub membership_error: Option<String>,
}

impl SessionState {
    pub fn shell(&self) -> Shell {
        if self.is_loading {
            Shell::Loading
        } else if self.identity.is_some() {
            Shell::Authenticated
        } else {
            Shell::Unauthenticated
        }
    }
}

/// Action the driver must take after an identity emission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityTransition {
    /// Same account (or nothing applied); keep the current subscription.
    Unchanged,
    /// No identity; tear down any membership subscription.
    SignedOut,
    /// Tear down any membership subscription and open one for `uid`.
    Subscribe { uid: String, generation: u64 },
}

/// Synchronous session state machine.
#[derive(Debug)]
pub struct SessionComposer {
    identity: Option<Identity>,
    trips: Vec<Trip>,
    selected: Option<Trip>,
    identity_resolution: Resolution,
    membership_resolution: Resolution,
    generation: u64,
    identity_error: Option<String>,
    membership_error: Option<String>,
    shut_down: bool,
}

impl Default for SessionComposer {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionComposer {
    pub fn new() -> Self {
        Self {
            identity: None,
            trips: Vec::new(),
            selected: None,
            identity_resolution: Resolution::Pending,
            membership_resolution: Resolution::Pending,
            generation: 0,
            identity_error: None,
            membership_error: None,
            shut_down: false,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down
    }

    pub fn is_loading(&self) -> bool {
        self.identity_resolution == Resolution::Pending
            || self.membership_resolution == Resolution::Pending
    }

    pub fn membership_resolution(&self) -> Resolution {
        self.membership_resolution
    }

    /// Apply an emission from the identity stream.
    ///
    /// The first emission is always a transition. After that, only a change of
    /// account (by uid) is; re-emitting the same account refreshes its profile
    /// fields and keeps the membership subscription.
    pub fn apply_identity(&mut self, identity: Option<Identity>) -> IdentityTransition {
        if self.shut_down {
            return IdentityTransition::Unchanged;
        }

        let first = self.identity_resolution == Resolution::Pending;
        self.identity_resolution = Resolution::Resolved;
        self.identity_error = None;

        let same_account = match (&self.identity, &identity) {
            (Some(current), Some(next)) => current.same_account(next),
            (None, None) => true,
            _ => false,
        };

        if same_account && !first {
            self.identity = identity;
            return IdentityTransition::Unchanged;
        }

        self.generation += 1;
        self.identity = identity;
        self.trips.clear();
        self.selected = None;
        self.membership_error = None;

        match &self.identity {
            Some(identity) => {
                self.membership_resolution = Resolution::Pending;
                IdentityTransition::Subscribe {
                    uid: identity.uid.clone(),
                    generation: self.generation,
                }
            }
            None => {
                self.membership_resolution = Resolution::Resolved;
                IdentityTransition::SignedOut
            }
        }
    }

    /// Record an identity provider failure.
    ///
    /// Before the first successful emission this resolves the session as
    /// signed out so the loading gate cannot hang; afterwards the current
    /// identity and subscription are left alone.
    pub fn apply_identity_error(&mut self, message: impl Into<String>) -> IdentityTransition {
        if self.shut_down {
            return IdentityTransition::Unchanged;
        }

        self.identity_error = Some(message.into());

        if self.identity_resolution == Resolution::Pending {
            self.identity_resolution = Resolution::Resolved;
            self.membership_resolution = Resolution::Resolved;
            self.generation += 1;
            return IdentityTransition::SignedOut;
        }

        IdentityTransition::Unchanged
    }

    /// Replace the trip list with a membership emission.
    ///
    /// Returns `false` (and changes nothing) if the emission belongs to a
    /// superseded subscription.
    pub fn apply_memberships(&mut self, generation: u64, trips: Vec<Trip>) -> bool {
        if !self.accepts(generation) {
            tracing::debug!(
                generation,
                current = self.generation,
                "Discarding superseded trip list"
            );
            return false;
        }

        self.trips = trips;
        self.membership_error = None;
        self.reconcile_selection();
        self.membership_resolution = Resolution::Resolved;
        true
    }

    /// Record a membership query failure. The previous trip list is kept.
    pub fn apply_membership_error(&mut self, generation: u64, message: impl Into<String>) -> bool {
        if !self.accepts(generation) {
            return false;
        }

        self.membership_error = Some(message.into());
        self.membership_resolution = Resolution::Resolved;
        true
    }

    /// Give up waiting for the first membership emission of `generation`.
    pub fn apply_membership_timeout(&mut self, generation: u64) -> bool {
        if !self.accepts(generation) || self.membership_resolution == Resolution::Resolved {
            return false;
        }

        self.membership_error = Some(MEMBERSHIP_TIMEOUT_MESSAGE.to_string());
        self.membership_resolution = Resolution::Resolved;
        true
    }

    /// Explicitly select a trip. Membership is not checked here.
    pub fn select(&mut self, trip: Trip) -> bool {
        if self.shut_down {
            return false;
        }
        self.selected = Some(trip);
        true
    }

    /// Stop accepting input. Every later call is a no-op.
    pub fn shutdown(&mut self) {
        self.shut_down = true;
        self.generation += 1;
    }

    pub fn snapshot(&self) -> SessionState {
        SessionState {
            identity: self.identity.clone(),
            trips: self.trips.clone(),
            selected_trip: self.selected.clone(),
            is_loading: self.is_loading(),
            identity_error: self.identity_error.clone(),
            membership_error: self.membership_error.clone(),
        }
    }

    fn accepts(&self, generation: u64) -> bool {
        !self.shut_down && generation == self.generation && self.identity.is_some()
    }

    /// Keep the selection pointing at a trip in the current list.
    ///
    /// The selected trip is re-bound by id to its fresh record. If it is no
    /// longer in the list, the first remaining trip is selected (or none).
    fn reconcile_selection(&mut self) {
        let selected_id = self.selected.take().map(|trip| trip.id);
        self.selected = selected_id
            .and_then(|id| self.trips.iter().find(|trip| trip.id == id))
            .or_else(|| self.trips.first())
            .cloned();
    }
}

/// Tunables for the session task.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Bound on the first membership emission after each sign-in.
    /// `None` waits indefinitely.
    pub membership_timeout: Option<Duration>,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            membership_timeout: Some(Duration::from_secs(15)),
        }
    }
}

impl From<&Config> for SessionOptions {
    fn from(config: &Config) -> Self {
        Self {
            membership_timeout: Some(config.membership_timeout),
        }
    }
}

const IDENTITY_APPLY_TIMEOUT: Duration = Duration::from_secs(5);

enum SessionCommand {
    Select(Trip, oneshot::Sender<SessionState>),
    Shutdown(oneshot::Sender<()>),
}

/// Handle to a running session task.
///
/// Cloning shares the same task. When every handle is dropped the task stops
/// and both subscriptions are cancelled.
#[derive(Clone)]
pub struct SessionHandle {
    state: watch::Receiver<SessionState>,
    commands: mpsc::UnboundedSender<SessionCommand>,
}

impl SessionHandle {
    /// Start composing identity and membership for the lifetime of the handle.
    pub fn spawn(
        identity: Arc<dyn IdentityProvider>,
        memberships: Arc<dyn TripMembershipSource>,
        options: SessionOptions,
    ) -> Self {
        let composer = SessionComposer::new();
        let (state_tx, state_rx) = watch::channel(composer.snapshot());
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();

        let task = SessionTask {
            composer,
            identity: identity.subscribe(),
            identity_open: true,
            memberships,
            membership: None,
            deadline: None,
            options,
            state: state_tx,
            commands: commands_rx,
        };
        tokio::spawn(task.run());

        Self {
            state: state_rx,
            commands: commands_tx,
        }
    }

    /// Latest published state.
    pub fn snapshot(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Receiver that is notified on every state change.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.clone()
    }

    /// Select a trip and return the state after the selection was applied.
    pub async fn select(&self, trip: Trip) -> Result<SessionState> {
        let (ack, done) = oneshot::channel();
        self.commands
            .send(SessionCommand::Select(trip, ack))
            .map_err(|_| stopped())?;
        done.await.map_err(|_| stopped())
    }

    /// Wait until both sources have resolved.
    pub async fn wait_until_ready(&self) -> Result<SessionState> {
        let mut state = self.state.clone();
        let ready = state
            .wait_for(|s| !s.is_loading)
            .await
            .map_err(|_| stopped())?
            .clone();
        Ok(ready)
    }

    /// Wait until the session has applied `uid` as its identity, `None`
    /// meaning signed out.
    pub async fn wait_for_identity(&self, uid: Option<&str>) -> Result<SessionState> {
        let mut state = self.state.clone();
        let applied = tokio::time::timeout(
            IDENTITY_APPLY_TIMEOUT,
            state.wait_for(|s| s.identity.as_ref().map(|i| i.uid.as_str()) == uid),
        )
        .await
        .map_err(|_| {
            AppError::Internal(anyhow::anyhow!("Session did not apply the identity change"))
        })?
        .map_err(|_| stopped())?
        .clone();
        Ok(applied)
    }

    /// Stop the session task and cancel both subscriptions.
    pub async fn shutdown(&self) {
        let (ack, done) = oneshot::channel();
        if self.commands.send(SessionCommand::Shutdown(ack)).is_ok() {
            let _ = done.await;
        }
    }
}

fn stopped() -> AppError {
    AppError::Internal(anyhow::anyhow!("Session task has stopped"))
}

type TaggedMembershipStream = BoxStream<'static, (u64, MembershipUpdate)>;

struct SessionTask {
    composer: SessionComposer,
    identity: IdentityStream,
    identity_open: bool,
    memberships: Arc<dyn TripMembershipSource>,
    membership: Option<TaggedMembershipStream>,
    deadline: Option<(u64, Instant)>,
    options: SessionOptions,
    state: watch::Sender<SessionState>,
    commands: mpsc::UnboundedReceiver<SessionCommand>,
}

impl SessionTask {
    async fn run(mut self) {
        tracing::debug!("Session task started");

        loop {
            let deadline = self.deadline.map(|(_, at)| at);

            tokio::select! {
                biased;

                command = self.commands.recv() => match command {
                    Some(SessionCommand::Select(trip, ack)) => {
                        tracing::info!(trip_id = %trip.id, "Trip selected");
                        if self.composer.select(trip) {
                            self.publish();
                        }
                        let _ = ack.send(self.composer.snapshot());
                    }
                    Some(SessionCommand::Shutdown(ack)) => {
                        self.stop();
                        let _ = ack.send(());
                        return;
                    }
                    None => {
                        self.stop();
                        return;
                    }
                },

                update = self.identity.next(), if self.identity_open => match update {
                    Some(Ok(identity)) => {
                        let transition = self.composer.apply_identity(identity);
                        self.follow(transition);
                    }
                    Some(Err(err)) => {
                        tracing::error!(error = %err, "Identity provider error");
                        let transition = self.composer.apply_identity_error(err.to_string());
                        self.follow(transition);
                    }
                    None => {
                        tracing::warn!("Identity stream ended");
                        self.identity_open = false;
                        let transition = self.composer.apply_identity_error(IDENTITY_CLOSED_MESSAGE);
                        self.follow(transition);
                    }
                },

                update = next_membership(&mut self.membership) => match update {
                    Some((generation, Ok(trips))) => {
                        let count = trips.len();
                        if self.composer.apply_memberships(generation, trips) {
                            tracing::debug!(generation, count, "Trip list updated");
                            self.clear_deadline(generation);
                            self.publish();
                        }
                    }
                    Some((generation, Err(err))) => {
                        tracing::error!(error = %err, generation, "Error fetching trips");
                        if self.composer.apply_membership_error(generation, err.to_string()) {
                            self.clear_deadline(generation);
                            self.publish();
                        }
                    }
                    None => {
                        tracing::warn!("Trip subscription ended");
                        self.membership = None;
                        let generation = self.composer.generation();
                        if self.composer.membership_resolution() == Resolution::Pending
                            && self.composer.apply_membership_error(generation, MEMBERSHIP_CLOSED_MESSAGE)
                        {
                            self.deadline = None;
                            self.publish();
                        }
                    }
                },

                _ = sleep_until(deadline) => {
                    if let Some((generation, _)) = self.deadline.take() {
                        if self.composer.apply_membership_timeout(generation) {
                            tracing::warn!(generation, "Timed out waiting for first trip list");
                            self.publish();
                        }
                    }
                }
            }
        }
    }

    /// Carry out the subscription change an identity emission requires.
    fn follow(&mut self, transition: IdentityTransition) {
        match transition {
            IdentityTransition::Unchanged => {}
            IdentityTransition::SignedOut => {
                self.membership = None;
                self.deadline = None;
                tracing::info!("No identity; trip subscription closed");
            }
            IdentityTransition::Subscribe { uid, generation } => {
                // Tear down before opening so the old query can never deliver again.
                self.membership = None;
                self.deadline = None;

                tracing::info!(uid = %uid, generation, "Opening trip subscription");
                let stream = self
                    .memberships
                    .subscribe_by_member(&uid)
                    .map(move |update| (generation, update))
                    .boxed();
                self.membership = Some(stream);
                self.deadline = self
                    .options
                    .membership_timeout
                    .map(|timeout| (generation, Instant::now() + timeout));
            }
        }
        self.publish();
    }

    fn clear_deadline(&mut self, generation: u64) {
        if matches!(self.deadline, Some((g, _)) if g == generation) {
            self.deadline = None;
        }
    }

    fn publish(&self) {
        if self.composer.is_shut_down() {
            return;
        }
        let next = self.composer.snapshot();
        self.state.send_if_modified(|current| {
            if *current == next {
                false
            } else {
                *current = next;
                true
            }
        });
    }

    fn stop(&mut self) {
        self.composer.shutdown();
        self.membership = None;
        self.deadline = None;
        tracing::info!("Session shut down");
    }
}

async fn next_membership(
    membership: &mut Option<TaggedMembershipStream>,
) -> Option<(u64, MembershipUpdate)> {
    match membership {
        Some(stream) => stream.next().await,
        None => std::future::pending().await,
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trip(id: &str, name: &str) -> Trip {
        Trip {
            id: id.to_string(),
            name: name.to_string(),
            invite_code: "ABC123".to_string(),
            created_by: "u1".to_string(),
            creator_name: "Ana".to_string(),
            members: vec!["u1".to_string()],
            start_date: None,
            end_date: None,
            created_at: "2026-05-01T10:00:00.000Z".to_string(),
        }
    }

    fn signed_in(composer: &mut SessionComposer, uid: &str) -> u64 {
        match composer.apply_identity(Some(Identity::new(uid))) {
            IdentityTransition::Subscribe { generation, .. } => generation,
            other => panic!("expected subscribe, got {:?}", other),
        }
    }

    #[test]
    fn test_initially_loading() {
        let composer = SessionComposer::new();
        let state = composer.snapshot();
        assert!(state.is_loading);
        assert_eq!(state.shell(), Shell::Loading);
    }

    #[test]
    fn test_first_absent_identity_resolves_immediately() {
        let mut composer = SessionComposer::new();
        assert_eq!(composer.apply_identity(None), IdentityTransition::SignedOut);

        let state = composer.snapshot();
        assert!(!state.is_loading);
        assert!(state.trips.is_empty());
        assert_eq!(state.shell(), Shell::Unauthenticated);
    }

    #[test]
    fn test_sign_in_waits_for_memberships() {
        let mut composer = SessionComposer::new();
        let generation = signed_in(&mut composer, "u1");
        assert!(composer.is_loading());

        assert!(composer.apply_memberships(generation, vec![]));
        let state = composer.snapshot();
        assert!(!state.is_loading);
        assert_eq!(state.selected_trip, None);
        assert_eq!(state.shell(), Shell::Authenticated);

        assert!(composer.apply_memberships(generation, vec![trip("t1", "Paris")]));
        assert_eq!(composer.snapshot().selected_trip, Some(trip("t1", "Paris")));
    }

    #[test]
    fn test_auto_select_first_and_keep_existing_selection() {
        let mut composer = SessionComposer::new();
        let generation = signed_in(&mut composer, "u1");

        composer.apply_memberships(generation, vec![trip("t1", "Paris"), trip("t2", "Rome")]);
        assert_eq!(composer.snapshot().selected_trip.unwrap().id, "t1");

        composer.apply_memberships(generation, vec![trip("t2", "Rome"), trip("t1", "Paris")]);
        assert_eq!(composer.snapshot().selected_trip.unwrap().id, "t1");
    }

    #[test]
    fn test_explicit_selection_survives_emissions() {
        let mut composer = SessionComposer::new();
        let generation = signed_in(&mut composer, "u1");
        composer.apply_memberships(generation, vec![trip("t1", "Paris"), trip("t2", "Rome")]);

        assert!(composer.select(trip("t2", "Rome")));
        composer.apply_memberships(
            generation,
            vec![trip("t1", "Paris"), trip("t2", "Rome"), trip("t3", "Oslo")],
        );
        assert_eq!(composer.snapshot().selected_trip.unwrap().id, "t2");
    }

    #[test]
    fn test_selection_rebinds_to_fresh_record() {
        let mut composer = SessionComposer::new();
        let generation = signed_in(&mut composer, "u1");
        composer.apply_memberships(generation, vec![trip("t1", "Paris")]);

        composer.apply_memberships(generation, vec![trip("t1", "Paris in May")]);
        assert_eq!(
            composer.snapshot().selected_trip.unwrap().name,
            "Paris in May"
        );
    }

    #[test]
    fn test_removed_selection_falls_back_to_first_or_none() {
        let mut composer = SessionComposer::new();
        let generation = signed_in(&mut composer, "u1");
        composer.apply_memberships(generation, vec![trip("t1", "Paris"), trip("t2", "Rome")]);
        composer.select(trip("t2", "Rome"));

        composer.apply_memberships(generation, vec![trip("t3", "Oslo"), trip("t1", "Paris")]);
        assert_eq!(composer.snapshot().selected_trip.unwrap().id, "t3");

        composer.apply_memberships(generation, vec![]);
        assert_eq!(composer.snapshot().selected_trip, None);
    }

    #[test]
    fn test_sign_out_clears_trips_and_discards_in_flight_results() {
        let mut composer = SessionComposer::new();
        let generation = signed_in(&mut composer, "u1");
        composer.apply_memberships(generation, vec![trip("t1", "Paris")]);

        assert_eq!(composer.apply_identity(None), IdentityTransition::SignedOut);
        let state = composer.snapshot();
        assert!(state.trips.is_empty());
        assert_eq!(state.selected_trip, None);
        assert!(!state.is_loading);

        // A result from the old subscription arriving late is ignored.
        assert!(!composer.apply_memberships(generation, vec![trip("t1", "Paris")]));
        assert!(composer.snapshot().trips.is_empty());
    }

    #[test]
    fn test_switching_accounts_supersedes_previous_subscription() {
        let mut composer = SessionComposer::new();
        let first = signed_in(&mut composer, "u1");
        let second = signed_in(&mut composer, "u2");
        assert_ne!(first, second);
        assert!(composer.is_loading());

        assert!(!composer.apply_memberships(first, vec![trip("t1", "Paris")]));
        assert!(composer.is_loading());
        assert!(composer.snapshot().trips.is_empty());

        assert!(composer.apply_memberships(second, vec![trip("t9", "Lima")]));
        assert_eq!(composer.snapshot().trips, vec![trip("t9", "Lima")]);
    }

    #[test]
    fn test_same_account_reemission_is_not_a_transition() {
        let mut composer = SessionComposer::new();
        let generation = signed_in(&mut composer, "u1");
        composer.apply_memberships(generation, vec![trip("t1", "Paris")]);

        let mut renamed = Identity::new("u1");
        renamed.display_name = Some("Ana".to_string());
        assert_eq!(
            composer.apply_identity(Some(renamed)),
            IdentityTransition::Unchanged
        );

        let state = composer.snapshot();
        assert!(!state.is_loading);
        assert_eq!(state.trips.len(), 1);
        assert_eq!(state.identity.unwrap().label(), "Ana");
        assert_eq!(composer.generation(), generation);
    }

    #[test]
    fn test_membership_error_resolves_gate_and_keeps_list() {
        let mut composer = SessionComposer::new();
        let generation = signed_in(&mut composer, "u1");
        composer.apply_memberships(generation, vec![trip("t1", "Paris")]);

        assert!(composer.apply_membership_error(generation, "permission denied"));
        let state = composer.snapshot();
        assert_eq!(state.trips.len(), 1);
        assert_eq!(state.membership_error.as_deref(), Some("permission denied"));

        composer.apply_memberships(generation, vec![trip("t1", "Paris")]);
        assert_eq!(composer.snapshot().membership_error, None);
    }

    #[test]
    fn test_membership_error_before_first_emission_unblocks_loading() {
        let mut composer = SessionComposer::new();
        let generation = signed_in(&mut composer, "u1");
        assert!(composer.apply_membership_error(generation, "unavailable"));
        assert!(!composer.is_loading());
        assert!(composer.snapshot().trips.is_empty());
    }

    #[test]
    fn test_timeout_only_applies_while_pending() {
        let mut composer = SessionComposer::new();
        let generation = signed_in(&mut composer, "u1");

        assert!(composer.apply_membership_timeout(generation));
        assert!(!composer.is_loading());
        assert_eq!(
            composer.snapshot().membership_error.as_deref(),
            Some(MEMBERSHIP_TIMEOUT_MESSAGE)
        );

        // Late data still lands and clears the error.
        assert!(composer.apply_memberships(generation, vec![trip("t1", "Paris")]));
        assert_eq!(composer.snapshot().membership_error, None);
        assert!(!composer.apply_membership_timeout(generation));
    }

    #[test]
    fn test_identity_error_before_first_emission_resolves_as_signed_out() {
        let mut composer = SessionComposer::new();
        assert_eq!(
            composer.apply_identity_error("network down"),
            IdentityTransition::SignedOut
        );
        let state = composer.snapshot();
        assert!(!state.is_loading);
        assert_eq!(state.identity_error.as_deref(), Some("network down"));
        assert_eq!(state.shell(), Shell::Unauthenticated);
    }

    #[test]
    fn test_identity_error_after_sign_in_keeps_session() {
        let mut composer = SessionComposer::new();
        let generation = signed_in(&mut composer, "u1");
        composer.apply_memberships(generation, vec![trip("t1", "Paris")]);

        assert_eq!(
            composer.apply_identity_error("token refresh failed"),
            IdentityTransition::Unchanged
        );
        let state = composer.snapshot();
        assert_eq!(state.identity.unwrap().uid, "u1");
        assert_eq!(state.trips.len(), 1);

        // The next good emission clears the error.
        composer.apply_identity(Some(Identity::new("u1")));
        assert_eq!(composer.snapshot().identity_error, None);
    }

    #[test]
    fn test_no_mutation_after_shutdown() {
        let mut composer = SessionComposer::new();
        let generation = signed_in(&mut composer, "u1");
        composer.shutdown();

        let before = composer.snapshot();
        assert!(!composer.apply_memberships(generation, vec![trip("t1", "Paris")]));
        assert!(!composer.apply_membership_error(generation, "late"));
        assert!(!composer.select(trip("t1", "Paris")));
        assert_eq!(composer.apply_identity(None), IdentityTransition::Unchanged);
        assert_eq!(composer.snapshot(), before);
    }
}
