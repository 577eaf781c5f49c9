// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Itinerary entries and date grouping.

use serde::{Deserialize, Serialize};

/// Date label used when an activity is added without one.
pub const NO_DATE: &str = "No date specified";

/// One planned activity, stored in the `itinerary` collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItineraryItem {
    pub id: String,
    pub trip_id: String,
    /// Author UID
    pub user_id: String,
    /// Author label at write time
    pub user_name: String,
    /// Activity description
    pub text: String,
    /// Free-form date label (e.g. "May 10")
    pub date: String,
    pub created_at: String,
}

/// Input for a new itinerary entry.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewItineraryItem {
    pub text: String,
    #[serde(default)]
    pub date: Option<String>,
}

/// Activities sharing one date label.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DateGroup {
    pub date: String,
    pub items: Vec<ItineraryItem>,
}

/// Group items by date label, keeping the order in which each date first appears.
pub fn group_by_date(items: Vec<ItineraryItem>) -> Vec<DateGroup> {
    let mut groups: Vec<DateGroup> = Vec::new();
    for item in items {
        let date = if item.date.is_empty() {
            NO_DATE.to_string()
        } else {
            item.date.clone()
        };
        match groups.iter_mut().find(|g| g.date == date) {
            Some(group) => group.items.push(item),
            None => groups.push(DateGroup {
                date,
                items: vec![item],
            }),
        }
    }
    groups
}
