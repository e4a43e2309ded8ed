//! Chart-of-accounts management.

use greenbooks_domain::{Account, AccountNature, Books};
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};

/// Input for creating an account. `level` and `full_path` are computed from
/// the parent chain, never supplied.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub code: String,
    pub name: String,
    pub nature: AccountNature,
    pub parent_id: Option<Uuid>,
    pub sort_order: i32,
}

impl NewAccount {
    pub fn root(code: impl Into<String>, name: impl Into<String>, nature: AccountNature) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            nature,
            parent_id: None,
            sort_order: 0,
        }
    }

    pub fn child(
        parent_id: Uuid,
        code: impl Into<String>,
        name: impl Into<String>,
        nature: AccountNature,
    ) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            nature,
            parent_id: Some(parent_id),
            sort_order: 0,
        }
    }

    pub fn with_sort_order(mut self, sort_order: i32) -> Self {
        self.sort_order = sort_order;
        self
    }
}

/// Metadata updates; structural fields (code, parent, nature) stay fixed.
#[derive(Debug, Clone, Default)]
pub struct AccountUpdate {
    pub name: Option<String>,
    pub sort_order: Option<i32>,
}

/// Validated CRUD over the chart of accounts held by a [`Books`] aggregate.
pub struct AccountService;

impl AccountService {
    /// Adds an account and returns its identifier.
    pub fn create(books: &mut Books, new: NewAccount) -> CoreResult<Uuid> {
        let code = new.code.trim().to_string();
        if code.is_empty() {
            return Err(CoreError::Validation("account code must not be empty".into()));
        }
        if books.account_by_code(&code).is_some() {
            return Err(CoreError::DuplicateCode(code));
        }

        let (level, full_path, parent_id) = match new.parent_id {
            Some(parent_id) => {
                let parent = books
                    .account(parent_id)
                    .ok_or_else(|| CoreError::ParentNotFound(parent_id.to_string()))?;
                let segment = code
                    .strip_prefix(&parent.code)
                    .and_then(|rest| rest.strip_prefix('.'))
                    .ok_or_else(|| {
                        CoreError::Validation(format!(
                            "code {} must extend parent code {}",
                            code, parent.code
                        ))
                    })?;
                if segment.is_empty() || segment.contains('.') {
                    return Err(CoreError::Validation(format!(
                        "code {} must extend parent code {} by exactly one segment",
                        code, parent.code
                    )));
                }
                let full_path = format!("{}.{}", parent.full_path, segment);
                (parent.level + 1, full_path, Some(parent_id))
            }
            None => {
                if code.contains('.') {
                    return Err(CoreError::Validation(format!(
                        "root account code {} must be a single segment",
                        code
                    )));
                }
                (1, code.clone(), None)
            }
        };

        let account = Account {
            id: Uuid::new_v4(),
            code,
            name: new.name,
            level,
            parent_id,
            nature: new.nature,
            is_active: true,
            sort_order: new.sort_order,
            full_path,
        };
        Ok(books.add_account(account))
    }

    /// Updates name/sort metadata for the account identified by `id`.
    pub fn update(books: &mut Books, id: Uuid, update: AccountUpdate) -> CoreResult<()> {
        let account = books
            .account_mut(id)
            .ok_or_else(|| CoreError::AccountNotFound(id.to_string()))?;
        if let Some(name) = update.name {
            account.name = name;
        }
        if let Some(sort_order) = update.sort_order {
            account.sort_order = sort_order;
        }
        books.touch();
        Ok(())
    }

    /// Soft-deletes an account. Referenced or non-leaf accounts stay active.
    pub fn deactivate(books: &mut Books, id: Uuid) -> CoreResult<()> {
        let code = books
            .account(id)
            .map(|account| account.code.clone())
            .ok_or_else(|| CoreError::AccountNotFound(id.to_string()))?;

        if Self::is_referenced(books, id) {
            return Err(CoreError::HasTransactions(code));
        }
        if books.children_of(id).any(|child| child.is_active) {
            return Err(CoreError::HasChildren(code));
        }

        if let Some(account) = books.account_mut(id) {
            account.is_active = false;
        }
        books.touch();
        Ok(())
    }

    /// Re-activates a previously deactivated account.
    pub fn reactivate(books: &mut Books, id: Uuid) -> CoreResult<()> {
        let account = books
            .account_mut(id)
            .ok_or_else(|| CoreError::AccountNotFound(id.to_string()))?;
        account.is_active = true;
        books.touch();
        Ok(())
    }

    /// Ordered root-to-leaf ancestor chain for the account with `code`.
    pub fn resolve_path<'a>(books: &'a Books, code: &str) -> CoreResult<Vec<&'a Account>> {
        let mut current = books
            .account_by_code(code)
            .ok_or_else(|| CoreError::AccountNotFound(code.to_string()))?;
        let mut chain = vec![current];
        while let Some(parent_id) = current.parent_id {
            current = books.account(parent_id).ok_or_else(|| {
                CoreError::Validation(format!(
                    "account {} has a dangling parent reference",
                    current.code
                ))
            })?;
            chain.push(current);
        }
        chain.reverse();
        Ok(chain)
    }

    /// Seeds the standard parks chart of accounts into empty books.
    pub fn seed_default_chart(books: &mut Books) -> CoreResult<()> {
        if !books.accounts.is_empty() {
            return Err(CoreError::Validation(
                "chart of accounts is already seeded".into(),
            ));
        }

        use AccountNature::{Credit, Debit};

        let assets = Self::create(books, NewAccount::root("1", "Assets", Debit))?;
        let cash = Self::create(
            books,
            NewAccount::child(assets, "1.1", "Cash and Banks", Debit),
        )?;
        Self::create(books, NewAccount::child(cash, "1.1.01", "Cash", Debit))?;
        Self::create(books, NewAccount::child(cash, "1.1.02", "Banks", Debit))?;

        let liabilities = Self::create(books, NewAccount::root("2", "Liabilities", Credit))?;
        Self::create(
            books,
            NewAccount::child(liabilities, "2.1", "Accounts Payable", Credit),
        )?;

        let equity = Self::create(books, NewAccount::root("3", "Equity", Credit))?;
        Self::create(
            books,
            NewAccount::child(equity, "3.1", "Accumulated Surplus", Credit),
        )?;

        let income = Self::create(books, NewAccount::root("4", "Income", Credit))?;
        for (index, (code, name)) in [
            ("4.01", "Park Entry Fees"),
            ("4.02", "Concession Rents"),
            ("4.03", "Event Permits"),
            ("4.04", "Donations and Grants"),
        ]
        .into_iter()
        .enumerate()
        {
            Self::create(
                books,
                NewAccount::child(income, code, name, Credit).with_sort_order(index as i32),
            )?;
        }

        let expenses = Self::create(books, NewAccount::root("5", "Expenses", Debit))?;
        for (index, (code, name)) in [
            ("5.01", "Park Maintenance"),
            ("5.02", "Payroll and Wages"),
            ("5.03", "Utilities"),
            ("5.04", "Supplies and Materials"),
            ("5.05", "Volunteer Programs"),
        ]
        .into_iter()
        .enumerate()
        {
            Self::create(
                books,
                NewAccount::child(expenses, code, name, Debit).with_sort_order(index as i32),
            )?;
        }

        Ok(())
    }

    fn is_referenced(books: &Books, account_id: Uuid) -> bool {
        books
            .transactions
            .iter()
            .any(|txn| txn.category_id == account_id)
            || books
                .entries
                .iter()
                .flat_map(|entry| entry.lines.iter())
                .any(|line| line.account_id == account_id)
    }
}
