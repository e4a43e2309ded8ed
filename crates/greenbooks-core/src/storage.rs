//! Persistence boundary for [`Books`] aggregates.

use std::{
    collections::HashSet,
    path::{Path, PathBuf},
};

use greenbooks_domain::Books;

use crate::error::CoreError;

/// Describes a persisted backup artifact for a set of books.
#[derive(Debug, Clone)]
pub struct BooksBackupInfo {
    pub books: String,
    pub id: String,
    pub created_at: String,
    pub path: PathBuf,
}

/// Abstraction over persistence backends capable of storing books and
/// backups. Backends persist whole snapshots, so a reader never observes a
/// partially written entry or budget year.
pub trait BooksStorage: Send + Sync {
    fn save_books(&self, name: &str, books: &Books) -> Result<(), CoreError>;
    fn load_books(&self, name: &str) -> Result<Books, CoreError>;
    fn list_books(&self) -> Result<Vec<String>, CoreError>;
    fn delete_books(&self, name: &str) -> Result<(), CoreError>;
    fn save_to_path(&self, books: &Books, path: &Path) -> Result<(), CoreError>;
    fn load_from_path(&self, path: &Path) -> Result<Books, CoreError>;
    fn backup_books(
        &self,
        name: &str,
        books: &Books,
        note: Option<&str>,
    ) -> Result<BooksBackupInfo, CoreError>;
    fn list_backups(&self, name: &str) -> Result<Vec<BooksBackupInfo>, CoreError>;
    fn restore_backup(&self, backup: &BooksBackupInfo) -> Result<Books, CoreError>;
}

/// Detects dangling references and invariant violations within a snapshot.
/// Used after loading foreign data; reports never block loading.
pub fn books_warnings(books: &Books) -> Vec<String> {
    let account_ids: HashSet<_> = books.accounts.iter().map(|a| a.id).collect();
    let entry_ids: HashSet<_> = books.entries.iter().map(|e| e.id).collect();
    let transaction_ids: HashSet<_> = books.transactions.iter().map(|t| t.id).collect();
    let mut warnings = Vec::new();

    for txn in &books.transactions {
        if !account_ids.contains(&txn.category_id) {
            warnings.push(format!(
                "transaction {} references unknown category {}",
                txn.id, txn.category_id
            ));
        }
        if let Some(entry_id) = txn.journal_entry_id {
            if !entry_ids.contains(&entry_id) {
                warnings.push(format!(
                    "transaction {} links missing journal entry {}",
                    txn.id, entry_id
                ));
            }
        }
    }

    for entry in &books.entries {
        if !entry.is_balanced() {
            warnings.push(format!(
                "journal entry {} is unbalanced ({} vs {})",
                entry.entry_number,
                entry.line_debit_total(),
                entry.line_credit_total()
            ));
        }
        if let Some(source) = entry.source_transaction_id {
            if !transaction_ids.contains(&source) {
                warnings.push(format!(
                    "journal entry {} references missing transaction {}",
                    entry.entry_number, source
                ));
            }
        }
        for line in &entry.lines {
            if !account_ids.contains(&line.account_id) {
                warnings.push(format!(
                    "journal entry {} posts to unknown account {}",
                    entry.entry_number, line.account_id
                ));
            }
            if !line.is_single_sided() {
                warnings.push(format!(
                    "journal entry {} has a line with both sides set",
                    entry.entry_number
                ));
            }
        }
    }

    for projection in &books.budgets {
        if !account_ids.contains(&projection.category_id) {
            warnings.push(format!(
                "budget row for {} ({}) references an unknown category",
                projection.category_id, projection.year
            ));
        }
    }

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use greenbooks_domain::{Transaction, TransactionKind};
    use rust_decimal::Decimal;
    use uuid::Uuid;

    #[test]
    fn clean_books_raise_no_warnings() {
        let mut books = Books::new("Clean");
        crate::account_service::AccountService::seed_default_chart(&mut books).unwrap();
        assert!(books_warnings(&books).is_empty());
    }

    #[test]
    fn dangling_references_are_reported() {
        let mut books = Books::new("Dangling");
        books.add_transaction(Transaction::new(
            TransactionKind::Income,
            Decimal::ONE,
            NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            Uuid::new_v4(),
            "orphan",
        ));

        let warnings = books_warnings(&books);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("unknown category"));
    }
}
