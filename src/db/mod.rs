//! Database layer (Firestore).

pub mod firestore;

pub use firestore::FirestoreDb;

/// Collection names as constants.
pub mod collections {
    pub const TRIPS: &str = "trips";
    pub const ITINERARY: &str = "itinerary";
    pub const EXPENSES: &str = "expenses";
    pub const PACKING_LIST: &str = "packing_list";
}
