// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Trips (membership, invite-code lookup)
//! - Itinerary entries
//! - Expenses
//! - Packing list items
//!
//! and a live membership query (`TripMembershipSource`) backed by a Firestore
//! listen target.

use crate::db::collections;
use crate::error::AppError;
use crate::models::{Expense, ItineraryItem, PackingItem, Trip};
use crate::services::membership::{MembershipStream, MembershipUpdate, TripMembershipSource};
use firestore::{
    FirestoreListenEvent, FirestoreListenerTarget, FirestoreMemListenStateStorage,
    FirestoreWritePrecondition,
};
use futures_util::stream::{self, StreamExt};
use tokio::sync::mpsc;

/// Listen target ID for the per-member trip query. Each listener owns one target.
const TRIP_MEMBERSHIP_TARGET: FirestoreListenerTarget = FirestoreListenerTarget::new(1_u32);
/// Buffered membership results per subscription; the consumer only needs the latest.
const MEMBERSHIP_BUFFER: usize = 4;

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // If the emulator environment variable is set, use unauthenticated connection
        // to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a mock Firestore client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    // ─── Trip Operations ─────────────────────────────────────────

    /// Get a trip by document ID.
    pub async fn get_trip(&self, trip_id: &str) -> Result<Option<Trip>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::TRIPS)
            .obj()
            .one(trip_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Store a new trip under its own ID.
    pub async fn insert_trip(&self, trip: &Trip) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::TRIPS)
            .document_id(&trip.id)
            .object(trip)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Find the trip with exactly this invite code.
    ///
    /// Codes are not unique by construction; if several trips share one, the
    /// first result wins.
    pub async fn find_trip_by_invite_code(&self, code: &str) -> Result<Option<Trip>, AppError> {
        let code = code.to_string();
        let trips: Vec<Trip> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::TRIPS)
            .filter(move |q| q.field("invite_code").eq(code.clone()))
            .limit(1)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(trips.into_iter().next())
    }

    /// All trips whose member list contains `uid`, in query order.
    pub async fn list_trips_for_member(&self, uid: &str) -> Result<Vec<Trip>, AppError> {
        let uid = uid.to_string();
        self.get_client()?
            .fluent()
            .select()
            .from(collections::TRIPS)
            .filter(move |q| q.field("members").array_contains(uid.clone()))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Add `uid` to a trip's member list.
    ///
    /// The write is a server-side array append, so concurrent joins to the
    /// same trip all land. Returns the trip as stored after the append, or
    /// `None` if the trip does not exist.
    pub async fn add_trip_member(&self, trip_id: &str, uid: &str) -> Result<Option<Trip>, AppError> {
        let Some(trip) = self.get_trip(trip_id).await? else {
            return Ok(None);
        };
        if trip.has_member(uid) {
            return Ok(Some(trip));
        }

        let client = self.get_client()?;
        let mut transaction = client
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        client
            .fluent()
            .update()
            .in_col(collections::TRIPS)
            .precondition(FirestoreWritePrecondition::Exists(true))
            .transforms(|t| {
                t.fields([t
                    .field("members")
                    .append_missing_elements([uid.to_string()])])
            })
            .document_id(trip_id)
            .only_transform()
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add member to transaction: {}", e))
            })?;

        transaction
            .commit()
            .await
            .map_err(|e| AppError::Database(format!("Transaction commit failed: {}", e)))?;

        let trip = self.get_trip(trip_id).await?;
        if let Some(trip) = &trip {
            tracing::info!(trip_id, uid, members = trip.members.len(), "Member added to trip");
        }

        Ok(trip)
    }

    // ─── Itinerary Operations ────────────────────────────────────

    /// Itinerary for a trip, ordered by date label then creation time.
    pub async fn list_itinerary(&self, trip_id: &str) -> Result<Vec<ItineraryItem>, AppError> {
        let trip_id = trip_id.to_string();
        self.get_client()?
            .fluent()
            .select()
            .from(collections::ITINERARY)
            .filter(move |q| q.field("trip_id").eq(trip_id.clone()))
            .order_by([
                ("date", firestore::FirestoreQueryDirection::Ascending),
                ("created_at", firestore::FirestoreQueryDirection::Ascending),
            ])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    pub async fn insert_itinerary_item(&self, item: &ItineraryItem) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::ITINERARY)
            .document_id(&item.id)
            .object(item)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    pub async fn get_itinerary_item(&self, item_id: &str) -> Result<Option<ItineraryItem>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::ITINERARY)
            .obj()
            .one(item_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    pub async fn delete_itinerary_item(&self, item_id: &str) -> Result<(), AppError> {
        self.delete_document(collections::ITINERARY, item_id).await
    }

    // ─── Expense Operations ──────────────────────────────────────

    /// Expenses for a trip, newest first.
    pub async fn list_expenses(&self, trip_id: &str) -> Result<Vec<Expense>, AppError> {
        let trip_id = trip_id.to_string();
        self.get_client()?
            .fluent()
            .select()
            .from(collections::EXPENSES)
            .filter(move |q| q.field("trip_id").eq(trip_id.clone()))
            .order_by([("created_at", firestore::FirestoreQueryDirection::Descending)])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    pub async fn insert_expense(&self, expense: &Expense) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::EXPENSES)
            .document_id(&expense.id)
            .object(expense)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    pub async fn get_expense(&self, expense_id: &str) -> Result<Option<Expense>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::EXPENSES)
            .obj()
            .one(expense_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    pub async fn delete_expense(&self, expense_id: &str) -> Result<(), AppError> {
        self.delete_document(collections::EXPENSES, expense_id).await
    }

    // ─── Packing List Operations ─────────────────────────────────

    /// Packing list for a trip in creation order.
    pub async fn list_packing_items(&self, trip_id: &str) -> Result<Vec<PackingItem>, AppError> {
        let trip_id = trip_id.to_string();
        self.get_client()?
            .fluent()
            .select()
            .from(collections::PACKING_LIST)
            .filter(move |q| q.field("trip_id").eq(trip_id.clone()))
            .order_by([("created_at", firestore::FirestoreQueryDirection::Ascending)])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    pub async fn get_packing_item(&self, item_id: &str) -> Result<Option<PackingItem>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::PACKING_LIST)
            .obj()
            .one(item_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create or overwrite a packing item.
    pub async fn upsert_packing_item(&self, item: &PackingItem) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::PACKING_LIST)
            .document_id(&item.id)
            .object(item)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    pub async fn delete_packing_item(&self, item_id: &str) -> Result<(), AppError> {
        self.delete_document(collections::PACKING_LIST, item_id).await
    }

    // ─── Helper Methods ──────────────────────────────────────────

    async fn delete_document(&self, collection: &str, document_id: &str) -> Result<(), AppError> {
        self.get_client()?
            .fluent()
            .delete()
            .from(collection)
            .document_id(document_id)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    // ─── Live Membership Query ───────────────────────────────────

    /// Run a listener for `uid`'s trips until the subscriber goes away.
    ///
    /// The first full list is sent as soon as it is read; after that every
    /// document change on the target triggers a fresh full query.
    async fn run_membership_listener(
        &self,
        uid: &str,
        updates: &mpsc::Sender<MembershipUpdate>,
    ) -> Result<(), AppError> {
        let client = self.get_client()?;

        let mut listener = client
            .create_listener(FirestoreMemListenStateStorage::new())
            .await
            .map_err(|e| AppError::Database(format!("Failed to create listener: {}", e)))?;

        let member = uid.to_string();
        client
            .fluent()
            .select()
            .from(collections::TRIPS)
            .filter(move |q| q.field("members").array_contains(member.clone()))
            .listen()
            .add_target(TRIP_MEMBERSHIP_TARGET, &mut listener)
            .map_err(|e| AppError::Database(format!("Failed to add listen target: {}", e)))?;

        // Change notifications collapse: one pending re-query covers any number of events.
        let (changed_tx, mut changed_rx) = mpsc::channel::<()>(1);
        listener
            .start(move |event| {
                let changed_tx = changed_tx.clone();
                async move {
                    match event {
                        FirestoreListenEvent::DocumentChange(_)
                        | FirestoreListenEvent::DocumentDelete(_)
                        | FirestoreListenEvent::DocumentRemove(_) => {
                            let _ = changed_tx.try_send(());
                        }
                        _ => {}
                    }
                    Ok(())
                }
            })
            .await
            .map_err(|e| AppError::Database(format!("Failed to start listener: {}", e)))?;

        tracing::debug!(uid, "Trip membership listener started");

        loop {
            let update = self.list_trips_for_member(uid).await;
            let failed = update.is_err();
            if updates.send(update).await.is_err() || failed {
                break;
            }

            tokio::select! {
                _ = updates.closed() => break,
                changed = changed_rx.recv() => {
                    if changed.is_none() {
                        break;
                    }
                }
            }
        }

        listener
            .shutdown()
            .await
            .map_err(|e| AppError::Database(format!("Failed to stop listener: {}", e)))?;

        tracing::debug!(uid, "Trip membership listener stopped");
        Ok(())
    }
}

impl TripMembershipSource for FirestoreDb {
    fn subscribe_by_member(&self, member_id: &str) -> MembershipStream {
        let (tx, rx) = mpsc::channel(MEMBERSHIP_BUFFER);
        let db = self.clone();
        let uid = member_id.to_string();

        tokio::spawn(async move {
            if let Err(err) = db.run_membership_listener(&uid, &tx).await {
                tracing::error!(uid = %uid, error = %err, "Trip membership listener failed");
                let _ = tx.send(Err(err)).await;
            }
        });

        stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|update| (update, rx))
        })
        .boxed()
    }
}
