//! Balance derivation logic
//!
//! Computes the signed delta a transaction mutation applies to the
//! balance of its funding source. The engine turns each delta into an
//! ordinary card/account update mutation, so the adjustment inherits the
//! same online/offline routing, rollback semantics, and queue replay as
//! any other mutation, and always targets the existing (stable) source
//! id rather than a newly-created entity's id.
//!
//! Deltas by operation:
//!
//! | operation | expense            | income             |
//! |-----------|--------------------|--------------------|
//! | add       | −amount            | +amount            |
//! | delete    | +amount            | −amount            |
//!
//! For an edit from (amount₀, direction₀) to (amount₁, direction₁):
//!
//! | direction₀ → direction₁ | delta                |
//! |-------------------------|----------------------|
//! | expense → expense       | amount₀ − amount₁    |
//! | income  → income        | amount₁ − amount₀    |
//! | expense → income        | amount₀ + amount₁    |
//! | income  → expense       | −(amount₀ + amount₁) |

use rust_decimal::Decimal;

use super::transaction::Direction;

/// Delta applied to the source when a transaction is added
pub fn addition_delta(amount: Decimal, direction: Direction) -> Decimal {
    match direction {
        Direction::Expense => -amount,
        Direction::Income => amount,
    }
}

/// Delta applied to the source when a transaction is deleted
///
/// Exactly reverses the original effect of the transaction.
pub fn removal_delta(amount: Decimal, direction: Direction) -> Decimal {
    -addition_delta(amount, direction)
}

/// Delta applied to the source when a transaction is edited
///
/// `old` describes the transaction before the edit, `new` after it.
/// Editing amount, direction, or both nets out to a single adjustment.
pub fn update_delta(
    old_amount: Decimal,
    old_direction: Direction,
    new_amount: Decimal,
    new_direction: Direction,
) -> Decimal {
    match (old_direction, new_direction) {
        (Direction::Expense, Direction::Expense) => old_amount - new_amount,
        (Direction::Income, Direction::Income) => new_amount - old_amount,
        (Direction::Expense, Direction::Income) => old_amount + new_amount,
        (Direction::Income, Direction::Expense) => -(old_amount + new_amount),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn test_add_expense_subtracts() {
        // balance 100.00, expense 4.50 -> 95.50
        let delta = addition_delta(dec("4.50"), Direction::Expense);
        assert_eq!(dec("100.00") + delta, dec("95.50"));
    }

    #[test]
    fn test_add_income_adds() {
        let delta = addition_delta(dec("250.00"), Direction::Income);
        assert_eq!(dec("100.00") + delta, dec("350.00"));
    }

    #[test]
    fn test_delete_restores_original_balance() {
        for direction in [Direction::Expense, Direction::Income] {
            let added = addition_delta(dec("17.25"), direction);
            let removed = removal_delta(dec("17.25"), direction);
            assert_eq!(added + removed, Decimal::ZERO);
        }
    }

    #[test]
    fn test_resize_expense() {
        // expense 50 -> expense 80 deducts an additional 30
        let delta = update_delta(dec("50"), Direction::Expense, dec("80"), Direction::Expense);
        assert_eq!(delta, dec("-30"));
    }

    #[test]
    fn test_shrink_expense() {
        let delta = update_delta(dec("80"), Direction::Expense, dec("50"), Direction::Expense);
        assert_eq!(delta, dec("30"));
    }

    #[test]
    fn test_resize_income() {
        let delta = update_delta(dec("100"), Direction::Income, dec("150"), Direction::Income);
        assert_eq!(delta, dec("50"));
    }

    #[test]
    fn test_flip_expense_to_income() {
        // reverses the old expense, then applies the new income
        let delta = update_delta(dec("40"), Direction::Expense, dec("60"), Direction::Income);
        assert_eq!(delta, dec("100"));
    }

    #[test]
    fn test_flip_income_to_expense() {
        let delta = update_delta(dec("40"), Direction::Income, dec("60"), Direction::Expense);
        assert_eq!(delta, dec("-100"));
    }

    #[test]
    fn test_update_equals_remove_then_add() {
        // the edit formula is the composition of reversing the old
        // transaction and applying the new one
        let cases = [
            (dec("50"), Direction::Expense, dec("80"), Direction::Expense),
            (dec("50"), Direction::Income, dec("80"), Direction::Income),
            (dec("50"), Direction::Expense, dec("80"), Direction::Income),
            (dec("50"), Direction::Income, dec("80"), Direction::Expense),
        ];
        for (a0, d0, a1, d1) in cases {
            let composed = removal_delta(a0, d0) + addition_delta(a1, d1);
            assert_eq!(update_delta(a0, d0, a1, d1), composed);
        }
    }
}
