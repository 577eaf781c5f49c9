// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API routes for trips and their shared lists.

use crate::error::Result;
use crate::middleware::auth::AuthUser;
use crate::models::expense::{format_amount, total_amount};
use crate::models::itinerary::{group_by_date, DateGroup};
use crate::models::packing::{group_by_category, CategoryGroup};
use crate::models::{
    Expense, ItineraryItem, JoinOutcome, NewExpense, NewItineraryItem, NewPackingItem, NewTrip,
    PackingItem, Trip,
};
use crate::AppState;
use axum::{
    extract::{Path, State},
    routing::{delete, get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// API routes (require authentication).
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/trips", post(create_trip))
        .route("/api/trips/join", post(join_trip))
        .route(
            "/api/trips/{trip_id}/itinerary",
            get(get_itinerary).post(add_itinerary_item),
        )
        .route(
            "/api/trips/{trip_id}/itinerary/{item_id}",
            delete(delete_itinerary_item),
        )
        .route(
            "/api/trips/{trip_id}/expenses",
            get(get_expenses).post(add_expense),
        )
        .route(
            "/api/trips/{trip_id}/expenses/{expense_id}",
            delete(delete_expense),
        )
        .route(
            "/api/trips/{trip_id}/packing",
            get(get_packing_list).post(add_packing_item),
        )
        .route(
            "/api/trips/{trip_id}/packing/{item_id}",
            delete(delete_packing_item),
        )
        .route(
            "/api/trips/{trip_id}/packing/{item_id}/toggle",
            post(toggle_packing_item),
        )
}

/// Confirmation for deletes.
#[derive(Serialize)]
pub struct DeleteResponse {
    pub success: bool,
    pub message: String,
}

impl DeleteResponse {
    fn new(message: &str) -> Self {
        Self {
            success: true,
            message: message.to_string(),
        }
    }
}

// ─── Trips ───────────────────────────────────────────────────

#[derive(Serialize)]
pub struct CreateTripResponse {
    pub trip: Trip,
    pub message: String,
}

/// Create a trip; the caller becomes its first member.
async fn create_trip(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<NewTrip>,
) -> Result<Json<CreateTripResponse>> {
    let trip = state.trips.create_trip(&user.identity, body).await?;
    let message = format!(
        "Trip created with invite code: {}\n\nShare this code with your travel companions!",
        trip.invite_code
    );
    Ok(Json(CreateTripResponse { trip, message }))
}

#[derive(Deserialize)]
pub struct JoinTripRequest {
    #[serde(default)]
    code: String,
}

#[derive(Serialize)]
pub struct JoinTripResponse {
    pub trip: Trip,
    pub already_member: bool,
    pub message: String,
}

/// Join a trip by invite code.
async fn join_trip(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<JoinTripRequest>,
) -> Result<Json<JoinTripResponse>> {
    let outcome = state.trips.join_trip(&user.identity, &body.code).await?;

    let already_member = matches!(outcome, JoinOutcome::AlreadyMember(_));
    let message = if already_member {
        "You are already a member of this trip".to_string()
    } else {
        let name = outcome.trip().name.as_str();
        format!("You've joined the trip: {}", if name.is_empty() { "Trip" } else { name })
    };

    let (JoinOutcome::Joined(trip) | JoinOutcome::AlreadyMember(trip)) = outcome;
    let response = JoinTripResponse {
        trip,
        already_member,
        message,
    };

    Ok(Json(response))
}

// ─── Itinerary ───────────────────────────────────────────────

#[derive(Serialize)]
pub struct ItineraryResponse {
    pub groups: Vec<DateGroup>,
}

async fn get_itinerary(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(trip_id): Path<String>,
) -> Result<Json<ItineraryResponse>> {
    let items = state.trips.list_itinerary(user.uid(), &trip_id).await?;
    Ok(Json(ItineraryResponse {
        groups: group_by_date(items),
    }))
}

async fn add_itinerary_item(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(trip_id): Path<String>,
    Json(body): Json<NewItineraryItem>,
) -> Result<Json<ItineraryItem>> {
    let item = state
        .trips
        .add_itinerary_item(&user.identity, &trip_id, body)
        .await?;
    Ok(Json(item))
}

async fn delete_itinerary_item(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path((trip_id, item_id)): Path<(String, String)>,
) -> Result<Json<DeleteResponse>> {
    state
        .trips
        .delete_itinerary_item(user.uid(), &trip_id, &item_id)
        .await?;
    Ok(Json(DeleteResponse::new("Activity deleted")))
}

// ─── Expenses ────────────────────────────────────────────────

#[derive(Serialize)]
pub struct ExpensesResponse {
    pub expenses: Vec<Expense>,
    /// Sum of all amounts, two decimals
    pub total: String,
}

async fn get_expenses(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(trip_id): Path<String>,
) -> Result<Json<ExpensesResponse>> {
    let expenses = state.trips.list_expenses(user.uid(), &trip_id).await?;
    let total = format_amount(total_amount(&expenses));
    Ok(Json(ExpensesResponse { expenses, total }))
}

async fn add_expense(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(trip_id): Path<String>,
    Json(body): Json<NewExpense>,
) -> Result<Json<Expense>> {
    let expense = state.trips.add_expense(&user.identity, &trip_id, body).await?;
    Ok(Json(expense))
}

async fn delete_expense(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path((trip_id, expense_id)): Path<(String, String)>,
) -> Result<Json<DeleteResponse>> {
    state
        .trips
        .delete_expense(user.uid(), &trip_id, &expense_id)
        .await?;
    Ok(Json(DeleteResponse::new("Expense deleted")))
}

// ─── Packing List ────────────────────────────────────────────

#[derive(Serialize)]
pub struct PackingListResponse {
    pub groups: Vec<CategoryGroup>,
    pub packed: usize,
    pub total: usize,
}

async fn get_packing_list(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(trip_id): Path<String>,
) -> Result<Json<PackingListResponse>> {
    let items = state.trips.list_packing_items(user.uid(), &trip_id).await?;
    let packed = items.iter().filter(|item| item.packed).count();
    let total = items.len();
    Ok(Json(PackingListResponse {
        groups: group_by_category(items),
        packed,
        total,
    }))
}

async fn add_packing_item(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(trip_id): Path<String>,
    Json(body): Json<NewPackingItem>,
) -> Result<Json<PackingItem>> {
    let item = state
        .trips
        .add_packing_item(&user.identity, &trip_id, body)
        .await?;
    Ok(Json(item))
}

async fn toggle_packing_item(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path((trip_id, item_id)): Path<(String, String)>,
) -> Result<Json<PackingItem>> {
    let item = state
        .trips
        .toggle_packed(user.uid(), &trip_id, &item_id)
        .await?;
    Ok(Json(item))
}

async fn delete_packing_item(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path((trip_id, item_id)): Path<(String, String)>,
) -> Result<Json<DeleteResponse>> {
    state
        .trips
        .delete_packing_item(user.uid(), &trip_id, &item_id)
        .await?;
    Ok(Json(DeleteResponse::new("Item deleted")))
}
