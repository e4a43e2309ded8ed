//! Category-by-month matrix shapes shared by the budget projection and
//! realized cash-flow views, so the two are structurally comparable.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::period::MONTHS;
use crate::transaction::TransactionKind;

/// One category row of a matrix: twelve monthly values plus their total.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MatrixRow {
    pub category_id: Uuid,
    pub name: String,
    pub kind: TransactionKind,
    pub monthly: [Decimal; MONTHS],
    pub total: Decimal,
}

impl MatrixRow {
    pub fn new(
        category_id: Uuid,
        name: impl Into<String>,
        kind: TransactionKind,
        monthly: [Decimal; MONTHS],
    ) -> Self {
        let total = monthly.iter().copied().sum();
        Self {
            category_id,
            name: name.into(),
            kind,
            monthly,
            total,
        }
    }
}

/// Per-month totals across all categories of a matrix.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MonthlyTotals {
    pub income: [Decimal; MONTHS],
    pub expense: [Decimal; MONTHS],
    pub net: [Decimal; MONTHS],
}

/// Year totals across all categories of a matrix.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct YearlyTotals {
    pub income: Decimal,
    pub expense: Decimal,
    pub net: Decimal,
}

/// A full category-by-month grid for one year, projected or realized.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FlowMatrix {
    pub year: i32,
    pub rows: Vec<MatrixRow>,
    pub monthly_totals: MonthlyTotals,
    pub yearly_totals: YearlyTotals,
}

impl FlowMatrix {
    /// Assembles a matrix from its rows, deriving the monthly and yearly
    /// summary totals.
    pub fn from_rows(year: i32, rows: Vec<MatrixRow>) -> Self {
        let mut income = [Decimal::ZERO; MONTHS];
        let mut expense = [Decimal::ZERO; MONTHS];
        for row in &rows {
            let bucket = match row.kind {
                TransactionKind::Income => &mut income,
                TransactionKind::Expense => &mut expense,
            };
            for (slot, value) in bucket.iter_mut().zip(row.monthly.iter()) {
                *slot += *value;
            }
        }
        let mut net = [Decimal::ZERO; MONTHS];
        for (index, slot) in net.iter_mut().enumerate() {
            *slot = income[index] - expense[index];
        }
        let total_income: Decimal = income.iter().copied().sum();
        let total_expense: Decimal = expense.iter().copied().sum();
        Self {
            year,
            rows,
            monthly_totals: MonthlyTotals {
                income,
                expense,
                net,
            },
            yearly_totals: YearlyTotals {
                income: total_income,
                expense: total_expense,
                net: total_income - total_expense,
            },
        }
    }

    pub fn row(&self, category_id: Uuid, kind: TransactionKind) -> Option<&MatrixRow> {
        self.rows
            .iter()
            .find(|row| row.category_id == category_id && row.kind == kind)
    }
}

/// Why a category-month was flagged by the variance scan.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    /// Realized expense above 150% of the trailing average.
    ExpenseSpike,
    /// Realized income below 70% of the trailing average.
    IncomeShortfall,
}

/// Advisory variance flag for one category-month. Analytics output, not a
/// correctness check.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VarianceAlert {
    pub category_id: Uuid,
    pub name: String,
    pub kind: TransactionKind,
    /// 1-based calendar month.
    pub month: u32,
    pub amount: Decimal,
    pub trailing_average: Decimal,
    pub alert: AlertKind,
}

/// Budget-vs-actual totals for one category row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BudgetComparison {
    pub category_id: Uuid,
    pub name: String,
    pub kind: TransactionKind,
    pub budgeted: Decimal,
    pub actual: Decimal,
    /// `actual - budgeted`, signed the same way for both kinds.
    pub variance: Decimal,
}
