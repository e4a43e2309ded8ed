//! Deterministic account selection for automatic journal entries.

use greenbooks_domain::{
    Account, Books, TransactionKind, CASH_PREFIX, EXPENSE_ROOT, INCOME_ROOT,
};
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};

/// The two accounts an automatic entry touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedAccounts {
    pub cash: Uuid,
    pub operational: Uuid,
}

/// Which account each side of the entry posts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntrySides {
    pub debit: Uuid,
    pub credit: Uuid,
}

impl ResolvedAccounts {
    /// The single source of truth for the debit/credit mapping rule:
    /// income debits cash and credits the operational account; expense is
    /// the mirror image.
    pub fn sides(&self, kind: TransactionKind) -> EntrySides {
        match kind {
            TransactionKind::Income => EntrySides {
                debit: self.cash,
                credit: self.operational,
            },
            TransactionKind::Expense => EntrySides {
                debit: self.operational,
                credit: self.cash,
            },
        }
    }
}

/// Selects the cash and operational accounts for a transaction kind.
pub struct AccountResolver;

impl AccountResolver {
    /// Picks the first active account in the cash subtree and the first
    /// active level-2+ category under the matching income/expense root.
    pub fn resolve(books: &Books, kind: TransactionKind) -> CoreResult<ResolvedAccounts> {
        let cash = first_by_code(
            books
                .accounts
                .iter()
                .filter(|account| account.is_active && account.is_under(CASH_PREFIX)),
        );
        let root = match kind {
            TransactionKind::Income => INCOME_ROOT,
            TransactionKind::Expense => EXPENSE_ROOT,
        };
        let operational = first_by_code(books.accounts.iter().filter(|account| {
            account.is_active && account.level >= 2 && account.is_under(root)
        }));

        match (cash, operational) {
            (Some(cash), Some(operational)) => Ok(ResolvedAccounts {
                cash: cash.id,
                operational: operational.id,
            }),
            _ => Err(CoreError::NoMappingFound(kind)),
        }
    }
}

fn first_by_code<'a>(accounts: impl Iterator<Item = &'a Account>) -> Option<&'a Account> {
    accounts.min_by(|a, b| {
        a.code
            .cmp(&b.code)
            .then_with(|| a.sort_order.cmp(&b.sort_order))
    })
}
