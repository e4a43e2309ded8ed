//! Trial balance and financial statements.
//!
//! Balances derive from posted journal lines only; the per-period snapshot
//! rows this module can produce are a cache shape, never a source of truth.

use std::collections::HashMap;

use chrono::NaiveDate;
use greenbooks_domain::{
    AccountBalance, AccountNature, BalanceLine, BalanceSheet, BalanceSheetSection, Books,
    IncomeStatement, Period, StatementLine, TransactionKind, TrialBalance, TrialBalanceRow,
    ASSET_ROOT, EQUITY_ROOT, LIABILITY_ROOT,
};
use rust_decimal::Decimal;
use uuid::Uuid;

/// Read-only aggregation over posted entries and realized transactions.
pub struct ReportService;

impl ReportService {
    /// Period activity and ending balances for every active account plus any
    /// account with activity. Orphaned references degrade to rows with no
    /// code/name; their numbers still contribute.
    pub fn trial_balance(books: &Books, period: Period) -> TrialBalance {
        let period_activity = posted_activity(books, |date| period.contains(date));
        let opening_activity = posted_activity(books, |date| period.is_after(date));

        let mut ids: Vec<Uuid> = books
            .accounts
            .iter()
            .filter(|account| account.is_active)
            .map(|account| account.id)
            .collect();
        for id in period_activity.keys().chain(opening_activity.keys()) {
            if !ids.contains(id) {
                ids.push(*id);
            }
        }

        let mut rows: Vec<TrialBalanceRow> = ids
            .into_iter()
            .map(|account_id| {
                let account = books.account(account_id);
                let nature = account.map_or(AccountNature::Debit, |a| a.nature);
                let (open_debits, open_credits) = opening_activity
                    .get(&account_id)
                    .copied()
                    .unwrap_or((Decimal::ZERO, Decimal::ZERO));
                let (debits, credits) = period_activity
                    .get(&account_id)
                    .copied()
                    .unwrap_or((Decimal::ZERO, Decimal::ZERO));
                let opening = signed(nature, open_debits, open_credits);
                let ending = opening + signed(nature, debits, credits);
                let side = if ending < Decimal::ZERO {
                    nature.opposite()
                } else {
                    nature
                };
                TrialBalanceRow {
                    account_id,
                    code: account.map(|a| a.code.clone()),
                    name: account.map(|a| a.name.clone()),
                    nature,
                    opening,
                    debits,
                    credits,
                    ending,
                    side,
                }
            })
            .collect();
        rows.sort_by(|a, b| match (&a.code, &b.code) {
            (Some(left), Some(right)) => left.cmp(right),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => a.account_id.cmp(&b.account_id),
        });

        let total_debits = rows.iter().map(|row| row.debits).sum();
        let total_credits = rows.iter().map(|row| row.credits).sum();
        TrialBalance {
            period,
            rows,
            total_debits,
            total_credits,
        }
    }

    /// Derived snapshot rows for a period, in the invalidatable-cache shape.
    pub fn period_snapshots(books: &Books, period: Period) -> Vec<AccountBalance> {
        Self::trial_balance(books, period)
            .rows
            .into_iter()
            .map(|row| AccountBalance {
                account_id: row.account_id,
                period,
                opening: row.opening,
                debits: row.debits,
                credits: row.credits,
                ending: row.ending,
            })
            .collect()
    }

    /// Assets, liabilities and equity from posted lines up to the cutoff.
    /// Each line rolls its subtree up through the code hierarchy; a section
    /// total therefore counts only the section's root accounts.
    pub fn balance_sheet(books: &Books, cutoff: NaiveDate) -> BalanceSheet {
        let cumulative = posted_activity(books, |date| date <= cutoff);
        let own_balance = |account: &greenbooks_domain::Account| -> Decimal {
            let (debits, credits) = cumulative
                .get(&account.id)
                .copied()
                .unwrap_or((Decimal::ZERO, Decimal::ZERO));
            signed(account.nature, debits, credits)
        };

        let section = |root: &str| -> BalanceSheetSection {
            let members: Vec<&greenbooks_domain::Account> = books
                .accounts
                .iter()
                .filter(|account| {
                    account.is_under(root)
                        && (account.is_active || cumulative.contains_key(&account.id))
                })
                .collect();
            let rollup = |account: &greenbooks_domain::Account| -> Decimal {
                members
                    .iter()
                    .copied()
                    .filter(|member| member.is_under(&account.code))
                    .map(&own_balance)
                    .sum()
            };
            let mut lines: Vec<BalanceLine> = members
                .iter()
                .copied()
                .map(|account| BalanceLine {
                    account_id: account.id,
                    code: account.code.clone(),
                    name: account.name.clone(),
                    balance: rollup(account),
                })
                .collect();
            lines.sort_by(|a, b| a.code.cmp(&b.code));
            let total = members
                .iter()
                .copied()
                .filter(|account| {
                    account
                        .parent_id
                        .and_then(|parent_id| books.account(parent_id))
                        .map_or(true, |parent| !parent.is_under(root))
                })
                .map(rollup)
                .sum();
            BalanceSheetSection { lines, total }
        };

        BalanceSheet {
            as_of: cutoff,
            assets: section(ASSET_ROOT),
            liabilities: section(LIABILITY_ROOT),
            equity: section(EQUITY_ROOT),
        }
    }

    /// Revenue and expenses summed from realized transactions up to the
    /// cutoff, per the statement contract (transactions, not entry lines).
    pub fn income_statement(books: &Books, cutoff: NaiveDate) -> IncomeStatement {
        let mut revenue: HashMap<Uuid, Decimal> = HashMap::new();
        let mut expenses: HashMap<Uuid, Decimal> = HashMap::new();
        for txn in books.transactions.iter().filter(|txn| txn.date <= cutoff) {
            let bucket = match txn.kind {
                TransactionKind::Income => &mut revenue,
                TransactionKind::Expense => &mut expenses,
            };
            *bucket.entry(txn.category_id).or_default() += txn.amount;
        }

        let to_lines = |totals: HashMap<Uuid, Decimal>| -> Vec<StatementLine> {
            let mut lines: Vec<StatementLine> = totals
                .into_iter()
                .map(|(category_id, total)| StatementLine {
                    category_id,
                    name: books.account(category_id).map(|a| a.name.clone()),
                    total,
                })
                .collect();
            lines.sort_by(|a, b| {
                let left = books.account(a.category_id).map(|acc| acc.code.clone());
                let right = books.account(b.category_id).map(|acc| acc.code.clone());
                left.cmp(&right).then_with(|| a.category_id.cmp(&b.category_id))
            });
            lines
        };

        let revenue = to_lines(revenue);
        let expenses = to_lines(expenses);
        let total_revenue: Decimal = revenue.iter().map(|line| line.total).sum();
        let total_expenses: Decimal = expenses.iter().map(|line| line.total).sum();
        IncomeStatement {
            as_of: cutoff,
            revenue,
            expenses,
            total_revenue,
            total_expenses,
            net_income: total_revenue - total_expenses,
        }
    }
}

fn signed(nature: AccountNature, debits: Decimal, credits: Decimal) -> Decimal {
    match nature {
        AccountNature::Debit => debits - credits,
        AccountNature::Credit => credits - debits,
    }
}

/// Sums debits and credits per account over posted entries whose date passes
/// the filter.
fn posted_activity<F>(books: &Books, include: F) -> HashMap<Uuid, (Decimal, Decimal)>
where
    F: Fn(NaiveDate) -> bool,
{
    let mut activity: HashMap<Uuid, (Decimal, Decimal)> = HashMap::new();
    for entry in books
        .entries
        .iter()
        .filter(|entry| entry.is_posted() && include(entry.date))
    {
        for line in &entry.lines {
            let slot = activity.entry(line.account_id).or_default();
            slot.0 += line.debit;
            slot.1 += line.credit;
        }
    }
    activity
}
