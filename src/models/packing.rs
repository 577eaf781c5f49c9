// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Packing list items and category grouping.

use serde::{Deserialize, Serialize};

/// Category used when an item is added without one.
pub const DEFAULT_CATEGORY: &str = "General";

/// One item on the shared packing list, stored in the `packing_list` collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackingItem {
    pub id: String,
    pub trip_id: String,
    pub user_id: String,
    pub user_name: String,
    pub text: String,
    pub category: String,
    /// Whether someone has checked the item off
    pub packed: bool,
    pub created_at: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewPackingItem {
    pub text: String,
    #[serde(default)]
    pub category: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryGroup {
    pub category: String,
    pub items: Vec<PackingItem>,
}

/// Group items by category, keeping the order in which each category first appears.
pub fn group_by_category(items: Vec<PackingItem>) -> Vec<CategoryGroup> {
    let mut groups: Vec<CategoryGroup> = Vec::new();
    for item in items {
        let category = if item.category.is_empty() {
            DEFAULT_CATEGORY.to_string()
        } else {
            item.category.clone()
        };
        match groups.iter_mut().find(|g| g.category == category) {
            Some(group) => group.items.push(item),
            None => groups.push(CategoryGroup {
                category,
                items: vec![item],
            }),
        }
    }
    groups
}
