//! Presentation adapter: derived read views
//!
//! Pure, synchronous functions over the current in-memory collections.
//! They have no side effects and are re-derivable at any time from the
//! collections alone; the month-scoped aggregates take the reference
//! month as a parameter so nothing here reads the clock.

use std::collections::HashMap;

use chrono::Datelike;
use rust_decimal::Decimal;

use crate::domain::{Budget, Collections, Direction, Transaction};

/// One budget joined with the spending recorded against its category
#[derive(Debug, Clone, PartialEq)]
pub struct BudgetStatus<'a> {
    /// The budget definition
    pub budget: &'a Budget,
    /// Sum of all expense amounts in the budget's category
    pub spent: Decimal,
}

/// Sum of expense amounts per category, across all time
pub fn expenses_by_category(collections: &Collections) -> HashMap<String, Decimal> {
    let mut result: HashMap<String, Decimal> = HashMap::new();
    for tx in &collections.transactions {
        if tx.direction() == Direction::Expense {
            *result.entry(tx.category().to_string()).or_default() += tx.amount();
        }
    }
    result
}

/// Total expenses occurring in the given calendar month
pub fn monthly_expenses(collections: &Collections, year: i32, month: u32) -> Decimal {
    monthly_total(collections, year, month, Direction::Expense)
}

/// Total income occurring in the given calendar month
pub fn monthly_income(collections: &Collections, year: i32, month: u32) -> Decimal {
    monthly_total(collections, year, month, Direction::Income)
}

fn monthly_total(
    collections: &Collections,
    year: i32,
    month: u32,
    direction: Direction,
) -> Decimal {
    collections
        .transactions
        .iter()
        .filter(|tx| {
            tx.direction() == direction
                && tx.date().year() == year
                && tx.date().month() == month
        })
        .map(Transaction::amount)
        .sum()
}

/// Sum of all card and account balances
pub fn total_balance(collections: &Collections) -> Decimal {
    let cards: Decimal = collections.cards.iter().map(|c| c.balance()).sum();
    let accounts: Decimal = collections.accounts.iter().map(|a| a.balance()).sum();
    cards + accounts
}

/// Display ordering for the transaction feed
///
/// Primary key: occurrence date descending. Tie-break: creation timestamp
/// descending, so same-day entries appear newest first.
pub fn transaction_feed(collections: &Collections) -> Vec<&Transaction> {
    let mut feed: Vec<&Transaction> = collections.transactions.iter().collect();
    feed.sort_by(|a, b| {
        b.date()
            .cmp(&a.date())
            .then_with(|| b.created_at().cmp(&a.created_at()))
    });
    feed
}

/// Each budget joined with its category's all-time expense total
pub fn budget_progress(collections: &Collections) -> Vec<BudgetStatus<'_>> {
    let spent = expenses_by_category(collections);
    collections
        .budgets
        .iter()
        .map(|budget| BudgetStatus {
            budget,
            spent: spent.get(budget.category()).copied().unwrap_or_default(),
        })
        .collect()
}
