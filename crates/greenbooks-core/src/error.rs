use std::fmt;

use greenbooks_domain::{EntryStatus, TransactionKind};
use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

pub type CoreResult<T> = Result<T, CoreError>;

/// Unified error type for the accounting services and storage boundary.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Duplicate account code: {0}")]
    DuplicateCode(String),
    #[error("Parent account not found: {0}")]
    ParentNotFound(String),
    #[error("Account not found: {0}")]
    AccountNotFound(String),
    #[error("Transaction not found: {0}")]
    TransactionNotFound(Uuid),
    #[error("Journal entry not found: {0}")]
    EntryNotFound(Uuid),
    #[error("Account {0} is referenced by transactions or journal lines")]
    HasTransactions(String),
    #[error("Account {0} has active child accounts")]
    HasChildren(String),
    #[error("No account mapping found for {0} transactions")]
    NoMappingFound(TransactionKind),
    #[error("Unbalanced entry: debits {debits} != credits {credits}")]
    UnbalancedEntry { debits: Decimal, credits: Decimal },
    #[error("Category {category} is {expected}-typed, row says {found}")]
    CategoryTypeMismatch {
        category: String,
        expected: TransactionKind,
        found: TransactionKind,
    },
    #[error("Amount must be positive, got {0}")]
    AmountNotPositive(Decimal),
    #[error("Category {0} is inactive")]
    InactiveCategory(String),
    #[error("Invalid entry status transition: {from} -> {to}")]
    InvalidStatusTransition { from: EntryStatus, to: EntryStatus },
    #[error("CSV import rejected, {} invalid row(s)", .0.len())]
    CsvImport(Vec<CsvRowError>),
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serde(String),
    #[error("Storage error: {0}")]
    Storage(String),
}

impl From<csv::Error> for CoreError {
    fn from(err: csv::Error) -> Self {
        CoreError::Serde(err.to_string())
    }
}

/// One failing row of a budget CSV import, with enough detail to correct
/// the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvRowError {
    /// 1-based data row number (the header row is not counted).
    pub row: usize,
    pub category: String,
    pub reason: String,
}

impl fmt::Display for CsvRowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "row {} ({}): {}", self.row, self.category, self.reason)
    }
}
