// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared expense model and totals.

use serde::{Deserialize, Serialize};

/// One shared expense, stored in the `expenses` collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    pub id: String,
    pub trip_id: String,
    /// Author UID
    pub user_id: String,
    /// Author label at write time
    pub user_name: String,
    /// What the money was spent on
    pub desc: String,
    /// Amount in the trip's currency (always positive)
    pub amount: f64,
    pub created_at: String,
}

/// Raw form input for a new expense; the amount is parsed during validation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewExpense {
    pub desc: String,
    pub amount: String,
}

/// Sum of all expense amounts.
pub fn total_amount(expenses: &[Expense]) -> f64 {
    expenses
        .iter()
        .map(|e| e.amount)
        .filter(|a| a.is_finite())
        .sum()
}

/// Render an amount the way totals are displayed (two decimals).
pub fn format_amount(amount: f64) -> String {
    format!("{:.2}", amount)
}
