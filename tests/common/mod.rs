// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use async_trait::async_trait;
use futures_util::stream::{self, StreamExt};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use trip_planner::config::Config;
use trip_planner::db::FirestoreDb;
use trip_planner::error::{AppError, Result};
use trip_planner::models::{Identity, Trip};
use trip_planner::routes::create_router;
use trip_planner::services::{
    FirebaseAuth, IdentityProvider, IdentityStream, IdentityUpdate, MembershipStream,
    MembershipUpdate, SessionHandle, SessionOptions, TripMembershipSource, TripService,
};
use trip_planner::AppState;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Identity source driven by the test.
#[allow(dead_code)]
pub struct FakeIdentity {
    sender: Mutex<Option<mpsc::UnboundedSender<IdentityUpdate>>>,
    receiver: Mutex<Option<mpsc::UnboundedReceiver<IdentityUpdate>>>,
}

#[allow(dead_code)]
impl FakeIdentity {
    pub fn new() -> Arc<Self> {
        let (tx, rx) = mpsc::unbounded_channel();
        Arc::new(Self {
            sender: Mutex::new(Some(tx)),
            receiver: Mutex::new(Some(rx)),
        })
    }

    pub fn emit(&self, identity: Option<Identity>) {
        self.send(Ok(identity));
    }

    pub fn sign_in(&self, uid: &str) {
        self.emit(Some(Identity::new(uid)));
    }

    pub fn emit_error(&self, message: &str) {
        self.send(Err(AppError::IdentityProvider(message.to_string())));
    }

    /// End the identity stream.
    pub fn close(&self) {
        self.sender.lock().unwrap().take();
    }

    fn send(&self, update: IdentityUpdate) {
        if let Some(tx) = self.sender.lock().unwrap().as_ref() {
            let _ = tx.send(update);
        }
    }
}

#[async_trait]
impl IdentityProvider for FakeIdentity {
    fn subscribe(&self) -> IdentityStream {
        let rx = self
            .receiver
            .lock()
            .unwrap()
            .take()
            .expect("FakeIdentity supports a single subscriber");
        receiver_stream(rx)
    }

    async fn sign_out(&self) -> Result<()> {
        self.emit(None);
        Ok(())
    }
}

/// One membership query opened by the session.
#[allow(dead_code)]
pub struct Subscription {
    pub member_id: String,
    sender: mpsc::UnboundedSender<MembershipUpdate>,
}

#[allow(dead_code)]
impl Subscription {
    pub fn emit(&self, trips: Vec<Trip>) {
        let _ = self.sender.send(Ok(trips));
    }

    pub fn emit_error(&self, message: &str) {
        let _ = self.sender.send(Err(AppError::Database(message.to_string())));
    }

    /// True once the session has dropped this query.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

/// Membership source that records every query it is asked to open.
#[derive(Default)]
pub struct FakeMembership {
    subscriptions: Mutex<Vec<Arc<Subscription>>>,
}

#[allow(dead_code)]
impl FakeMembership {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn count(&self) -> usize {
        self.subscriptions.lock().unwrap().len()
    }

    /// The `index`th subscription opened (0-based).
    pub fn subscription(&self, index: usize) -> Arc<Subscription> {
        self.subscriptions.lock().unwrap()[index].clone()
    }

    pub fn latest(&self) -> Arc<Subscription> {
        self.subscriptions
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("no membership subscription opened")
    }
}

impl TripMembershipSource for FakeMembership {
    fn subscribe_by_member(&self, member_id: &str) -> MembershipStream {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscriptions.lock().unwrap().push(Arc::new(Subscription {
            member_id: member_id.to_string(),
            sender: tx,
        }));
        receiver_stream(rx)
    }
}

fn receiver_stream<T: Send + 'static>(
    rx: mpsc::UnboundedReceiver<T>,
) -> futures_util::stream::BoxStream<'static, T> {
    stream::unfold(rx, |mut rx| async move {
        let item = rx.recv().await?;
        Some((item, rx))
    })
    .boxed()
}

/// A trip record with `members` as its member set.
#[allow(dead_code)]
pub fn trip(id: &str, name: &str, members: &[&str]) -> Trip {
    Trip {
        id: id.to_string(),
        name: name.to_string(),
        invite_code: "ABC123".to_string(),
        created_by: members.first().unwrap_or(&"u1").to_string(),
        creator_name: "User".to_string(),
        members: members.iter().map(|m| m.to_string()).collect(),
        start_date: None,
        end_date: None,
        created_at: "2026-01-01T00:00:00.000Z".to_string(),
    }
}

/// Wait for the published state to satisfy `predicate`.
#[allow(dead_code)]
pub async fn wait_for_state(
    session: &SessionHandle,
    predicate: impl FnMut(&trip_planner::services::SessionState) -> bool,
) -> trip_planner::services::SessionState {
    let mut rx = session.subscribe();
    let state = tokio::time::timeout(std::time::Duration::from_secs(5), rx.wait_for(predicate))
        .await
        .expect("timed out waiting for session state")
        .expect("session task stopped")
        .clone();
    state
}

/// Fakes behind a running test app.
#[allow(dead_code)]
pub struct TestApp {
    pub router: axum::Router,
    pub state: Arc<AppState>,
    pub identity: Arc<FakeIdentity>,
    pub membership: Arc<FakeMembership>,
}

/// Create a test app with offline mock dependencies and fake session sources.
#[allow(dead_code)]
pub fn create_test_app() -> TestApp {
    let config = Config::test_default();
    let db = FirestoreDb::new_mock();
    let auth = FirebaseAuth::new(&config.identity_toolkit_url, &config.firebase_api_key);

    let identity = FakeIdentity::new();
    let membership = FakeMembership::new();
    let session = SessionHandle::spawn(
        identity.clone(),
        membership.clone(),
        SessionOptions::from(&config),
    );

    let state = Arc::new(AppState {
        trips: TripService::new(db, config.invite_code_attempts),
        config,
        auth,
        identity: identity.clone(),
        session,
    });

    TestApp {
        router: create_router(state.clone()),
        state,
        identity,
        membership,
    }
}
