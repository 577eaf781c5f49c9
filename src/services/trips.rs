// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Trip service: creating and joining trips, and the per-trip lists
//! (itinerary, expenses, packing list).
//!
//! All input is validated before anything touches the database. Every
//! per-trip operation first checks that the caller is a member of the trip.

use crate::codes;
use crate::db::FirestoreDb;
use crate::error::{AppError, Result};
use crate::models::{
    Expense, Identity, ItineraryItem, JoinOutcome, NewExpense, NewItineraryItem, NewPackingItem,
    NewTrip, PackingItem, Trip,
};
use crate::models::itinerary::NO_DATE;
use crate::models::packing::DEFAULT_CATEGORY;
use crate::time_utils::now_rfc3339;
use crate::validation;

/// Trip operations used by the sibling screens.
#[derive(Clone)]
pub struct TripService {
    db: FirestoreDb,
    invite_code_attempts: u32,
}

impl TripService {
    pub fn new(db: FirestoreDb, invite_code_attempts: u32) -> Self {
        Self {
            db,
            invite_code_attempts: invite_code_attempts.max(1),
        }
    }

    // ─── Trips ───────────────────────────────────────────────────

    /// Create a trip with the caller as its only member.
    pub async fn create_trip(&self, creator: &Identity, input: NewTrip) -> Result<Trip> {
        let name = validation::trip_name(&input.name)?;
        let invite_code = self.allocate_invite_code().await?;

        let trip = Trip {
            id: codes::document_id()?,
            name,
            invite_code,
            created_by: creator.uid.clone(),
            creator_name: creator.label().to_string(),
            members: vec![creator.uid.clone()],
            start_date: validation::optional_text(input.start_date.as_deref()),
            end_date: validation::optional_text(input.end_date.as_deref()),
            created_at: now_rfc3339(),
        };

        self.db.insert_trip(&trip).await?;

        tracing::info!(
            trip_id = %trip.id,
            uid = %creator.uid,
            invite_code = %trip.invite_code,
            "Trip created"
        );

        Ok(trip)
    }

    /// Join the trip with this invite code.
    pub async fn join_trip(&self, identity: &Identity, code: &str) -> Result<JoinOutcome> {
        let code = validation::invite_code(code)?;

        let trip = self
            .db
            .find_trip_by_invite_code(&code)
            .await?
            .ok_or_else(|| AppError::NotFound("Invalid trip code. Please try again.".to_string()))?;

        if trip.has_member(&identity.uid) {
            tracing::debug!(trip_id = %trip.id, uid = %identity.uid, "Already a member");
            return Ok(JoinOutcome::AlreadyMember(trip));
        }

        let trip = self
            .db
            .add_trip_member(&trip.id, &identity.uid)
            .await?
            .ok_or_else(|| AppError::NotFound("Invalid trip code. Please try again.".to_string()))?;

        tracing::info!(trip_id = %trip.id, uid = %identity.uid, "Joined trip");
        Ok(JoinOutcome::Joined(trip))
    }

    /// Load a trip the caller belongs to.
    pub async fn member_trip(&self, uid: &str, trip_id: &str) -> Result<Trip> {
        let trip = self
            .db
            .get_trip(trip_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Trip {} not found", trip_id)))?;

        if !trip.has_member(uid) {
            tracing::warn!(trip_id, uid, "Access to trip by non-member");
            return Err(AppError::Forbidden("Not a member of this trip".to_string()));
        }

        Ok(trip)
    }

    /// Pick an invite code not already used by another trip.
    ///
    /// The check and the later write are not atomic, so two trips created at
    /// the same moment could still collide; lookups then return the first match.
    async fn allocate_invite_code(&self) -> Result<String> {
        for attempt in 1..=self.invite_code_attempts {
            let code = codes::invite_code()?;
            if self.db.find_trip_by_invite_code(&code).await?.is_none() {
                return Ok(code);
            }
            tracing::warn!(attempt, "Invite code collision, retrying");
        }

        Err(AppError::Internal(anyhow::anyhow!(
            "No unused invite code after {} attempts",
            self.invite_code_attempts
        )))
    }

    // ─── Itinerary ───────────────────────────────────────────────

    pub async fn list_itinerary(&self, uid: &str, trip_id: &str) -> Result<Vec<ItineraryItem>> {
        self.member_trip(uid, trip_id).await?;
        self.db.list_itinerary(trip_id).await
    }

    pub async fn add_itinerary_item(
        &self,
        author: &Identity,
        trip_id: &str,
        input: NewItineraryItem,
    ) -> Result<ItineraryItem> {
        let text = validation::activity_text(&input.text)?;
        self.member_trip(&author.uid, trip_id).await?;

        let item = ItineraryItem {
            id: codes::document_id()?,
            trip_id: trip_id.to_string(),
            user_id: author.uid.clone(),
            user_name: author.label().to_string(),
            text,
            date: validation::optional_text(input.date.as_deref())
                .unwrap_or_else(|| NO_DATE.to_string()),
            created_at: now_rfc3339(),
        };

        self.db.insert_itinerary_item(&item).await?;
        tracing::info!(trip_id, item_id = %item.id, "Itinerary item added");
        Ok(item)
    }

    pub async fn delete_itinerary_item(&self, uid: &str, trip_id: &str, item_id: &str) -> Result<()> {
        self.member_trip(uid, trip_id).await?;
        match self.db.get_itinerary_item(item_id).await? {
            Some(item) if item.trip_id == trip_id => {
                self.db.delete_itinerary_item(item_id).await?;
                tracing::info!(trip_id, item_id, "Itinerary item deleted");
                Ok(())
            }
            _ => Err(AppError::NotFound(format!("Activity {} not found", item_id))),
        }
    }

    // ─── Expenses ────────────────────────────────────────────────

    pub async fn list_expenses(&self, uid: &str, trip_id: &str) -> Result<Vec<Expense>> {
        self.member_trip(uid, trip_id).await?;
        self.db.list_expenses(trip_id).await
    }

    pub async fn add_expense(
        &self,
        author: &Identity,
        trip_id: &str,
        input: NewExpense,
    ) -> Result<Expense> {
        let (desc, amount) = validation::expense(&input.desc, &input.amount)?;
        self.member_trip(&author.uid, trip_id).await?;

        let expense = Expense {
            id: codes::document_id()?,
            trip_id: trip_id.to_string(),
            user_id: author.uid.clone(),
            user_name: author.label().to_string(),
            desc,
            amount,
            created_at: now_rfc3339(),
        };

        self.db.insert_expense(&expense).await?;
        tracing::info!(trip_id, expense_id = %expense.id, amount, "Expense added");
        Ok(expense)
    }

    pub async fn delete_expense(&self, uid: &str, trip_id: &str, expense_id: &str) -> Result<()> {
        self.member_trip(uid, trip_id).await?;
        match self.db.get_expense(expense_id).await? {
            Some(expense) if expense.trip_id == trip_id => {
                self.db.delete_expense(expense_id).await?;
                tracing::info!(trip_id, expense_id, "Expense deleted");
                Ok(())
            }
            _ => Err(AppError::NotFound(format!("Expense {} not found", expense_id))),
        }
    }

    // ─── Packing List ────────────────────────────────────────────

    pub async fn list_packing_items(&self, uid: &str, trip_id: &str) -> Result<Vec<PackingItem>> {
        self.member_trip(uid, trip_id).await?;
        self.db.list_packing_items(trip_id).await
    }

    pub async fn add_packing_item(
        &self,
        author: &Identity,
        trip_id: &str,
        input: NewPackingItem,
    ) -> Result<PackingItem> {
        let text = validation::packing_text(&input.text)?;
        self.member_trip(&author.uid, trip_id).await?;

        let item = PackingItem {
            id: codes::document_id()?,
            trip_id: trip_id.to_string(),
            user_id: author.uid.clone(),
            user_name: author.label().to_string(),
            text,
            category: validation::optional_text(input.category.as_deref())
                .unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
            packed: false,
            created_at: now_rfc3339(),
        };

        self.db.upsert_packing_item(&item).await?;
        tracing::info!(trip_id, item_id = %item.id, "Packing item added");
        Ok(item)
    }

    /// Flip an item's packed flag and return the updated item.
    pub async fn toggle_packed(&self, uid: &str, trip_id: &str, item_id: &str) -> Result<PackingItem> {
        self.member_trip(uid, trip_id).await?;
        let mut item = self
            .db
            .get_packing_item(item_id)
            .await?
            .filter(|item| item.trip_id == trip_id)
            .ok_or_else(|| AppError::NotFound(format!("Item {} not found", item_id)))?;

        item.packed = !item.packed;
        self.db.upsert_packing_item(&item).await?;
        tracing::debug!(trip_id, item_id, packed = item.packed, "Packing item toggled");
        Ok(item)
    }

    pub async fn delete_packing_item(&self, uid: &str, trip_id: &str, item_id: &str) -> Result<()> {
        self.member_trip(uid, trip_id).await?;
        match self.db.get_packing_item(item_id).await? {
            Some(item) if item.trip_id == trip_id => {
                self.db.delete_packing_item(item_id).await?;
                tracing::info!(trip_id, item_id, "Packing item deleted");
                Ok(())
            }
            _ => Err(AppError::NotFound(format!("Item {} not found", item_id))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offline_service() -> TripService {
        TripService::new(FirestoreDb::new_mock(), 3)
    }

    #[tokio::test]
    async fn test_create_trip_validates_before_database() {
        let service = offline_service();
        let err = service
            .create_trip(&Identity::new("u1"), NewTrip::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(msg) if msg == "Please enter a trip name"));
    }

    #[tokio::test]
    async fn test_create_trip_reaches_database_when_valid() {
        let service = offline_service();
        let input = NewTrip {
            name: "Paris".to_string(),
            ..Default::default()
        };
        let err = service
            .create_trip(&Identity::new("u1"), input)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Database(_)));
    }

    #[tokio::test]
    async fn test_join_trip_rejects_short_code() {
        let service = offline_service();
        let err = service
            .join_trip(&Identity::new("u1"), "ab1")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_add_expense_validates_amount_first() {
        let service = offline_service();
        let input = NewExpense {
            desc: "Taxi".to_string(),
            amount: "-4".to_string(),
        };
        let err = service
            .add_expense(&Identity::new("u1"), "t1", input)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(msg) if msg == "Please enter a valid amount"));
    }
}
