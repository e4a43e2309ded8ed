//! Trial balance and financial statement shapes.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::account::AccountNature;
use crate::period::Period;

/// One account's activity and balances within a trial-balance period.
///
/// `code`/`name` are `None` when a historical entry references an account
/// that is no longer in the chart; the numbers still contribute.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrialBalanceRow {
    pub account_id: Uuid,
    pub code: Option<String>,
    pub name: Option<String>,
    pub nature: AccountNature,
    pub opening: Decimal,
    pub debits: Decimal,
    pub credits: Decimal,
    /// Signed relative to the account's nature; negative means the balance
    /// sits on the opposite side.
    pub ending: Decimal,
    /// Side the ending balance reports on; the natural side on exact zero.
    pub side: AccountNature,
}

/// Trial balance for one period.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrialBalance {
    pub period: Period,
    pub rows: Vec<TrialBalanceRow>,
    pub total_debits: Decimal,
    pub total_credits: Decimal,
}

/// Derived per-period balance snapshot. A pure cache shape: always
/// recomputed from posted journal lines, never read back as truth.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AccountBalance {
    pub account_id: Uuid,
    pub period: Period,
    pub opening: Decimal,
    pub debits: Decimal,
    pub credits: Decimal,
    pub ending: Decimal,
}

/// One account line of a balance-sheet section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BalanceLine {
    pub account_id: Uuid,
    pub code: String,
    pub name: String,
    pub balance: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BalanceSheetSection {
    pub lines: Vec<BalanceLine>,
    pub total: Decimal,
}

/// Assets, liabilities and equity as of a cutoff date. The accounting
/// identity `assets == liabilities + equity` is a testable property, not a
/// computed correction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BalanceSheet {
    pub as_of: NaiveDate,
    pub assets: BalanceSheetSection,
    pub liabilities: BalanceSheetSection,
    pub equity: BalanceSheetSection,
}

/// One category line of the income statement.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StatementLine {
    pub category_id: Uuid,
    pub name: Option<String>,
    pub total: Decimal,
}

/// Revenue and expenses from realized transactions up to a cutoff date.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IncomeStatement {
    pub as_of: NaiveDate,
    pub revenue: Vec<StatementLine>,
    pub expenses: Vec<StatementLine>,
    pub total_revenue: Decimal,
    pub total_expenses: Decimal,
    pub net_income: Decimal,
}
