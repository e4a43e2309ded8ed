//! The persisted aggregate: one set of books for one fiscal entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::account::Account;
use crate::budget::BudgetProjection;
use crate::journal::JournalEntry;
use crate::transaction::Transaction;

const CURRENT_SCHEMA_VERSION: u8 = 1;
const ENTRY_NUMBER_PREFIX: &str = "JE";

/// Chart of accounts, transactions, journal entries and budget projections
/// for one fiscal entity. Services operate on this aggregate; storage
/// backends persist it as one snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Books {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub accounts: Vec<Account>,
    #[serde(default)]
    pub transactions: Vec<Transaction>,
    #[serde(default)]
    pub entries: Vec<JournalEntry>,
    #[serde(default)]
    pub budgets: Vec<BudgetProjection>,
    #[serde(default)]
    pub entry_counter: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default = "Books::schema_version_default")]
    pub schema_version: u8,
}

impl Books {
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            accounts: Vec::new(),
            transactions: Vec::new(),
            entries: Vec::new(),
            budgets: Vec::new(),
            entry_counter: 0,
            created_at: now,
            updated_at: now,
            schema_version: CURRENT_SCHEMA_VERSION,
        }
    }

    pub fn add_account(&mut self, account: Account) -> Uuid {
        let id = account.id;
        self.accounts.push(account);
        self.touch();
        id
    }

    pub fn add_transaction(&mut self, transaction: Transaction) -> Uuid {
        let id = transaction.id;
        self.transactions.push(transaction);
        self.touch();
        id
    }

    pub fn add_entry(&mut self, entry: JournalEntry) -> Uuid {
        let id = entry.id;
        self.entries.push(entry);
        self.touch();
        id
    }

    pub fn account(&self, id: Uuid) -> Option<&Account> {
        self.accounts.iter().find(|account| account.id == id)
    }

    pub fn account_mut(&mut self, id: Uuid) -> Option<&mut Account> {
        self.accounts.iter_mut().find(|account| account.id == id)
    }

    pub fn account_by_code(&self, code: &str) -> Option<&Account> {
        self.accounts.iter().find(|account| account.code == code)
    }

    /// Child accounts of `parent_id`, in chart order.
    pub fn children_of(&self, parent_id: Uuid) -> impl Iterator<Item = &Account> {
        self.accounts
            .iter()
            .filter(move |account| account.parent_id == Some(parent_id))
    }

    pub fn transaction(&self, id: Uuid) -> Option<&Transaction> {
        self.transactions.iter().find(|txn| txn.id == id)
    }

    pub fn transaction_mut(&mut self, id: Uuid) -> Option<&mut Transaction> {
        self.transactions.iter_mut().find(|txn| txn.id == id)
    }

    pub fn entry(&self, id: Uuid) -> Option<&JournalEntry> {
        self.entries.iter().find(|entry| entry.id == id)
    }

    pub fn entry_mut(&mut self, id: Uuid) -> Option<&mut JournalEntry> {
        self.entries.iter_mut().find(|entry| entry.id == id)
    }

    pub fn budget_for(&self, category_id: Uuid, year: i32) -> Option<&BudgetProjection> {
        self.budgets
            .iter()
            .find(|row| row.category_id == category_id && row.year == year)
    }

    pub fn budgets_for_year(&self, year: i32) -> impl Iterator<Item = &BudgetProjection> {
        self.budgets.iter().filter(move |row| row.year == year)
    }

    /// Issues the next human-readable journal entry number.
    pub fn next_entry_number(&mut self) -> String {
        self.entry_counter += 1;
        format!("{}-{:06}", ENTRY_NUMBER_PREFIX, self.entry_counter)
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    pub fn schema_version_default() -> u8 {
        CURRENT_SCHEMA_VERSION
    }
}
