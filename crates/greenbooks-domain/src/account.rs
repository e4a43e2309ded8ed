//! Chart-of-accounts domain types.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::common::{Displayable, Identifiable, NamedEntity};

/// Root code for asset accounts.
pub const ASSET_ROOT: &str = "1";
/// Root code for liability accounts.
pub const LIABILITY_ROOT: &str = "2";
/// Root code for equity accounts.
pub const EQUITY_ROOT: &str = "3";
/// Root code for income categories.
pub const INCOME_ROOT: &str = "4";
/// Root code for expense categories.
pub const EXPENSE_ROOT: &str = "5";
/// Code prefix of the cash/bank subtree.
pub const CASH_PREFIX: &str = "1.1";

/// A node in the chart of accounts.
///
/// `code` is the complete dotted code (globally unique, e.g. `1.1.02`); a
/// child's code extends its parent's by one segment. `full_path` is computed
/// from the ancestor chain when the account is written.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Account {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub level: u8,
    pub parent_id: Option<Uuid>,
    pub nature: AccountNature,
    pub is_active: bool,
    pub sort_order: i32,
    pub full_path: String,
}

impl Account {
    /// Creates a root-level account. Services adjust parentage, level and
    /// path when inserting children.
    pub fn new(code: impl Into<String>, name: impl Into<String>, nature: AccountNature) -> Self {
        let code = code.into();
        Self {
            id: Uuid::new_v4(),
            full_path: code.clone(),
            code,
            name: name.into(),
            level: 1,
            parent_id: None,
            nature,
            is_active: true,
            sort_order: 0,
        }
    }

    /// Returns `true` when this account sits at or below the given root code.
    pub fn is_under(&self, root: &str) -> bool {
        code_is_under(&self.code, root)
    }
}

/// Tests whether a dotted code equals or descends from the given root code.
pub fn code_is_under(code: &str, root: &str) -> bool {
    code == root || (code.starts_with(root) && code.as_bytes().get(root.len()) == Some(&b'.'))
}

impl Identifiable for Account {
    fn id(&self) -> Uuid {
        self.id
    }
}

impl NamedEntity for Account {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Displayable for Account {
    fn display_label(&self) -> String {
        format!("{} {}", self.code, self.name)
    }
}

/// Whether an account's balance grows with debits or credits.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AccountNature {
    Debit,
    Credit,
}

impl AccountNature {
    pub fn opposite(self) -> Self {
        match self {
            AccountNature::Debit => AccountNature::Credit,
            AccountNature::Credit => AccountNature::Debit,
        }
    }
}

impl fmt::Display for AccountNature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            AccountNature::Debit => "debit",
            AccountNature::Credit => "credit",
        };
        f.write_str(label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_prefix_matching_respects_segment_boundaries() {
        assert!(code_is_under("1.1.02", "1.1"));
        assert!(code_is_under("1.1", "1.1"));
        assert!(!code_is_under("1.10", "1.1"));
        assert!(!code_is_under("11", "1"));
    }

    #[test]
    fn new_account_defaults_to_active_root() {
        let account = Account::new("4", "Income", AccountNature::Credit);
        assert_eq!(account.level, 1);
        assert_eq!(account.full_path, "4");
        assert!(account.is_active);
        assert!(account.parent_id.is_none());
    }
}
