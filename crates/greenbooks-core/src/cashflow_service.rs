//! Realized cash-flow matrix and variance analytics.
//!
//! The realized matrix mirrors the budget matrix shape so the two grids can
//! be compared cell for cell. It is recomputed from transactions on every
//! read; nothing here is a stored source of truth.

use std::collections::HashMap;

use chrono::Datelike;
use greenbooks_domain::{
    AlertKind, Books, BudgetComparison, FlowMatrix, MatrixRow, TransactionKind, VarianceAlert,
    MONTHS,
};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::budget_service::BudgetService;

/// Expense months above 150% of the trailing average are flagged.
const EXPENSE_SPIKE_RATIO: Decimal = Decimal::from_parts(15, 0, 0, false, 1);
/// Income months below 70% of the trailing average are flagged.
const INCOME_SHORTFALL_RATIO: Decimal = Decimal::from_parts(7, 0, 0, false, 1);

/// Aggregates realized transactions into the matrix shape.
pub struct CashflowService;

impl CashflowService {
    /// Groups the year's transactions by category and month. A category with
    /// both incoming and outgoing activity yields one row per direction.
    pub fn realized_matrix(books: &Books, year: i32) -> FlowMatrix {
        let mut cells: HashMap<(Uuid, TransactionKind), [Decimal; MONTHS]> = HashMap::new();
        for txn in books
            .transactions
            .iter()
            .filter(|txn| txn.date.year() == year)
        {
            let months = cells
                .entry((txn.category_id, txn.kind))
                .or_insert([Decimal::ZERO; MONTHS]);
            months[txn.date.month0() as usize] += txn.amount;
        }

        let mut keyed: Vec<(Option<String>, u8, MatrixRow)> = cells
            .into_iter()
            .map(|((category_id, kind), months)| {
                let account = books.account(category_id);
                let name = account
                    .map(|a| a.name.clone())
                    .unwrap_or_else(|| "Unknown Category".into());
                let code = account.map(|a| a.code.clone());
                let kind_order = match kind {
                    TransactionKind::Income => 0,
                    TransactionKind::Expense => 1,
                };
                (code, kind_order, MatrixRow::new(category_id, name, kind, months))
            })
            .collect();
        keyed.sort_by(|a, b| {
            match (&a.0, &b.0) {
                (Some(left), Some(right)) => left.cmp(right),
                (Some(_), None) => std::cmp::Ordering::Less,
                (None, Some(_)) => std::cmp::Ordering::Greater,
                (None, None) => std::cmp::Ordering::Equal,
            }
            .then(a.1.cmp(&b.1))
            .then(a.2.category_id.cmp(&b.2.category_id))
        });
        FlowMatrix::from_rows(year, keyed.into_iter().map(|(_, _, row)| row).collect())
    }

    /// Advisory variance scan over the realized matrix. Months without
    /// activity, and months with no earlier activity to average, are skipped.
    pub fn variance_alerts(books: &Books, year: i32) -> Vec<VarianceAlert> {
        let matrix = Self::realized_matrix(books, year);
        let mut alerts = Vec::new();
        for row in &matrix.rows {
            for (index, amount) in row.monthly.iter().copied().enumerate() {
                if amount == Decimal::ZERO {
                    continue;
                }
                let prior: Vec<Decimal> = row.monthly[..index]
                    .iter()
                    .copied()
                    .filter(|value| *value != Decimal::ZERO)
                    .collect();
                if prior.is_empty() {
                    continue;
                }
                let average =
                    prior.iter().copied().sum::<Decimal>() / Decimal::from(prior.len() as u32);
                let alert = match row.kind {
                    TransactionKind::Expense if amount > average * EXPENSE_SPIKE_RATIO => {
                        Some(AlertKind::ExpenseSpike)
                    }
                    TransactionKind::Income if amount < average * INCOME_SHORTFALL_RATIO => {
                        Some(AlertKind::IncomeShortfall)
                    }
                    _ => None,
                };
                if let Some(alert) = alert {
                    alerts.push(VarianceAlert {
                        category_id: row.category_id,
                        name: row.name.clone(),
                        kind: row.kind,
                        month: index as u32 + 1,
                        amount,
                        trailing_average: average,
                        alert,
                    });
                }
            }
        }
        alerts
    }

    /// Joins the budget and realized matrices into per-category totals.
    pub fn budget_vs_actual(books: &Books, year: i32) -> Vec<BudgetComparison> {
        let budget = BudgetService::matrix(books, year);
        let realized = Self::realized_matrix(books, year);

        let mut comparisons: Vec<BudgetComparison> = budget
            .rows
            .iter()
            .map(|row| {
                let actual = realized
                    .row(row.category_id, row.kind)
                    .map_or(Decimal::ZERO, |r| r.total);
                BudgetComparison {
                    category_id: row.category_id,
                    name: row.name.clone(),
                    kind: row.kind,
                    budgeted: row.total,
                    actual,
                    variance: actual - row.total,
                }
            })
            .collect();

        // Realized activity outside the budget catalog still shows up.
        for row in &realized.rows {
            let present = comparisons
                .iter()
                .any(|cmp| cmp.category_id == row.category_id && cmp.kind == row.kind);
            if !present {
                comparisons.push(BudgetComparison {
                    category_id: row.category_id,
                    name: row.name.clone(),
                    kind: row.kind,
                    budgeted: Decimal::ZERO,
                    actual: row.total,
                    variance: row.total,
                });
            }
        }
        comparisons
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account_service::AccountService;
    use crate::budget_service::BudgetRowInput;
    use chrono::NaiveDate;
    use greenbooks_domain::Transaction;

    fn seeded_books() -> Books {
        let mut books = Books::new("Cashflow");
        AccountService::seed_default_chart(&mut books).unwrap();
        books
    }

    fn push_txn(books: &mut Books, kind: TransactionKind, cents: i64, month: u32, code: &str) {
        let category_id = books.account_by_code(code).unwrap().id;
        books.add_transaction(Transaction::new(
            kind,
            Decimal::new(cents, 2),
            NaiveDate::from_ymd_opt(2025, month, 15).unwrap(),
            category_id,
            format!("{kind} in month {month}"),
        ));
    }

    #[test]
    fn realized_matrix_groups_by_category_and_month() {
        let mut books = seeded_books();
        push_txn(&mut books, TransactionKind::Income, 50000, 1, "4.01");
        push_txn(&mut books, TransactionKind::Income, 25000, 1, "4.01");
        push_txn(&mut books, TransactionKind::Expense, 10000, 2, "5.01");

        let matrix = CashflowService::realized_matrix(&books, 2025);
        assert_eq!(matrix.rows.len(), 2);

        let fees = books.account_by_code("4.01").unwrap().id;
        let row = matrix.row(fees, TransactionKind::Income).unwrap();
        assert_eq!(row.monthly[0], Decimal::new(75000, 2));
        assert_eq!(matrix.yearly_totals.net, Decimal::new(65000, 2));

        // Other years are invisible.
        let other = CashflowService::realized_matrix(&books, 2024);
        assert!(other.rows.is_empty());
    }

    #[test]
    fn mixed_direction_activity_produces_two_rows() {
        let mut books = seeded_books();
        // Legacy data can carry both directions on one category; the matrix
        // must keep them as separate rows, not one signed row.
        push_txn(&mut books, TransactionKind::Income, 30000, 3, "4.04");
        push_txn(&mut books, TransactionKind::Expense, 12000, 3, "4.04");

        let matrix = CashflowService::realized_matrix(&books, 2025);
        let donations = books.account_by_code("4.04").unwrap().id;
        assert!(matrix.row(donations, TransactionKind::Income).is_some());
        assert!(matrix.row(donations, TransactionKind::Expense).is_some());
        assert_eq!(matrix.rows.len(), 2);
    }

    #[test]
    fn unknown_categories_keep_their_numbers() {
        let mut books = seeded_books();
        books.add_transaction(Transaction::new(
            TransactionKind::Expense,
            Decimal::new(4200, 2),
            NaiveDate::from_ymd_opt(2025, 5, 5).unwrap(),
            Uuid::new_v4(),
            "imported legacy row",
        ));

        let matrix = CashflowService::realized_matrix(&books, 2025);
        assert_eq!(matrix.rows.len(), 1);
        assert_eq!(matrix.rows[0].name, "Unknown Category");
        assert_eq!(matrix.yearly_totals.expense, Decimal::new(4200, 2));
    }

    #[test]
    fn expense_spikes_above_150_percent_are_flagged() {
        let mut books = seeded_books();
        push_txn(&mut books, TransactionKind::Expense, 10000, 1, "5.01");
        push_txn(&mut books, TransactionKind::Expense, 10000, 2, "5.01");
        push_txn(&mut books, TransactionKind::Expense, 20000, 3, "5.01");

        let alerts = CashflowService::variance_alerts(&books, 2025);
        assert_eq!(alerts.len(), 1);
        let alert = &alerts[0];
        assert_eq!(alert.alert, AlertKind::ExpenseSpike);
        assert_eq!(alert.month, 3);
        assert_eq!(alert.amount, Decimal::new(20000, 2));
        assert_eq!(alert.trailing_average, Decimal::new(10000, 2));
    }

    #[test]
    fn income_shortfalls_below_70_percent_are_flagged() {
        let mut books = seeded_books();
        push_txn(&mut books, TransactionKind::Income, 100000, 1, "4.01");
        push_txn(&mut books, TransactionKind::Income, 100000, 2, "4.01");
        push_txn(&mut books, TransactionKind::Income, 50000, 3, "4.01");

        let alerts = CashflowService::variance_alerts(&books, 2025);
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].alert, AlertKind::IncomeShortfall);
        assert_eq!(alerts[0].month, 3);
    }

    #[test]
    fn steady_months_raise_no_alerts() {
        let mut books = seeded_books();
        for month in 1..=4 {
            push_txn(&mut books, TransactionKind::Expense, 10000, month, "5.03");
            push_txn(&mut books, TransactionKind::Income, 90000, month, "4.02");
        }
        assert!(CashflowService::variance_alerts(&books, 2025).is_empty());
    }

    #[test]
    fn budget_vs_actual_joins_both_matrices() {
        let mut books = seeded_books();
        let fees = books.account_by_code("4.01").unwrap().id;
        let mut months = [Decimal::ZERO; MONTHS];
        months[0] = Decimal::new(100000, 2);
        BudgetService::save_year(
            &mut books,
            2025,
            vec![BudgetRowInput {
                category_id: fees,
                months,
            }],
        )
        .unwrap();
        push_txn(&mut books, TransactionKind::Income, 80000, 1, "4.01");

        let comparisons = CashflowService::budget_vs_actual(&books, 2025);
        let fees_cmp = comparisons
            .iter()
            .find(|cmp| cmp.category_id == fees)
            .unwrap();
        assert_eq!(fees_cmp.budgeted, Decimal::new(100000, 2));
        assert_eq!(fees_cmp.actual, Decimal::new(80000, 2));
        assert_eq!(fees_cmp.variance, Decimal::new(-20000, 2));
    }
}
