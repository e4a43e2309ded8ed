//! Budget projection rows.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::period::MONTHS;
use crate::transaction::TransactionKind;

/// Twelve monthly projected amounts for one category and year.
///
/// Exactly one row exists per (category, year); a save replaces the whole
/// year at once.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BudgetProjection {
    pub category_id: Uuid,
    pub kind: TransactionKind,
    pub year: i32,
    pub months: [Decimal; MONTHS],
}

impl BudgetProjection {
    pub fn new(category_id: Uuid, kind: TransactionKind, year: i32) -> Self {
        Self {
            category_id,
            kind,
            year,
            months: [Decimal::ZERO; MONTHS],
        }
    }

    pub fn with_months(mut self, months: [Decimal; MONTHS]) -> Self {
        self.months = months;
        self
    }

    pub fn total(&self) -> Decimal {
        self.months.iter().copied().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_sums_the_twelve_months() {
        let mut projection =
            BudgetProjection::new(Uuid::new_v4(), TransactionKind::Expense, 2025);
        projection.months[0] = Decimal::new(10050, 2);
        projection.months[11] = Decimal::new(4950, 2);
        assert_eq!(projection.total(), Decimal::new(15000, 2));
    }
}
