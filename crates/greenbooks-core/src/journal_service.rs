//! Journal entry generation and lifecycle.
//!
//! Recording a transaction and generating its entry are two phases: the
//! transaction is the durable fact, the entry a derived artifact that can
//! be regenerated later. Phase-2 failures surface as warnings, never as a
//! failure of the recording call.

use chrono::NaiveDate;
use greenbooks_domain::{
    AccountNature, Books, EntryStatus, JournalEntry, JournalLine, Transaction, TransactionKind,
    EXPENSE_ROOT, INCOME_ROOT,
};
use rust_decimal::Decimal;
use tracing::{info, warn};
use uuid::Uuid;

use crate::account_resolver::AccountResolver;
use crate::error::{CoreError, CoreResult};

/// Boundary-validated input for recording a transaction.
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub kind: TransactionKind,
    pub amount: Decimal,
    pub date: NaiveDate,
    pub category_id: Uuid,
    pub description: String,
    pub reference: Option<String>,
}

/// Outcome of the two-phase record operation. `warning` is set when the
/// transaction was recorded but entry generation failed.
#[derive(Debug, Clone)]
pub struct RecordedTransaction {
    pub transaction_id: Uuid,
    pub entry_id: Option<Uuid>,
    pub warning: Option<String>,
}

/// Boundary-validated input for a manual journal entry.
#[derive(Debug, Clone)]
pub struct NewJournalEntry {
    pub date: NaiveDate,
    pub description: String,
    pub reference: Option<String>,
    pub lines: Vec<JournalLine>,
    pub created_by: Option<Uuid>,
}

/// Result of one batch catch-up run.
#[derive(Debug, Clone, Default)]
pub struct CatchUpSummary {
    pub scanned: usize,
    pub generated: usize,
    pub failures: Vec<CatchUpFailure>,
}

#[derive(Debug, Clone)]
pub struct CatchUpFailure {
    pub transaction_id: Uuid,
    pub error: String,
}

/// Creates balanced journal entries and drives their status lifecycle.
pub struct JournalService;

impl JournalService {
    /// Phase 1 records the transaction; phase 2 generates its entry
    /// best-effort. A recorded transaction is never rolled back because
    /// generation failed.
    pub fn record_transaction(
        books: &mut Books,
        new: NewTransaction,
        actor: Option<Uuid>,
    ) -> CoreResult<RecordedTransaction> {
        Self::validate_transaction(books, &new)?;

        let mut transaction = Transaction::new(
            new.kind,
            new.amount,
            new.date,
            new.category_id,
            new.description,
        );
        if let Some(reference) = new.reference {
            transaction = transaction.with_reference(reference);
        }
        let transaction_id = books.add_transaction(transaction);

        match Self::ensure_entry(books, transaction_id, actor) {
            Ok(entry_id) => Ok(RecordedTransaction {
                transaction_id,
                entry_id: Some(entry_id),
                warning: None,
            }),
            Err(err) => {
                warn!(%transaction_id, error = %err, "journal entry generation deferred");
                Ok(RecordedTransaction {
                    transaction_id,
                    entry_id: None,
                    warning: Some(err.to_string()),
                })
            }
        }
    }

    /// Idempotently guarantees the transaction has a balanced entry.
    /// Returns the existing entry id when one is already linked.
    pub fn ensure_entry(
        books: &mut Books,
        transaction_id: Uuid,
        actor: Option<Uuid>,
    ) -> CoreResult<Uuid> {
        let txn = books
            .transaction(transaction_id)
            .ok_or(CoreError::TransactionNotFound(transaction_id))?;
        if let Some(entry_id) = txn.journal_entry_id {
            return Ok(entry_id);
        }

        let kind = txn.kind;
        let amount = txn.amount;
        let date = txn.date;
        let description = txn.description.clone();
        let reference = txn.reference.clone();

        let sides = AccountResolver::resolve(books, kind)?.sides(kind);
        let lines = vec![
            JournalLine::debit(sides.debit, amount, description.clone()),
            JournalLine::credit(sides.credit, amount, description.clone()),
        ];

        let entry = JournalEntry {
            id: Uuid::new_v4(),
            entry_number: books.next_entry_number(),
            date,
            description,
            reference,
            status: EntryStatus::Posted,
            total_debit: amount,
            total_credit: amount,
            source_transaction_id: Some(transaction_id),
            created_by: actor,
            lines,
        };
        Self::validate_entry(&entry)?;

        let entry_id = books.add_entry(entry);
        if let Some(txn) = books.transaction_mut(transaction_id) {
            txn.link_entry(entry_id);
        }
        Ok(entry_id)
    }

    /// Bounded catch-up over transactions that still lack an entry,
    /// oldest-first. One item's failure never aborts the batch.
    pub fn generate_missing_entries(
        books: &mut Books,
        limit: usize,
        actor: Option<Uuid>,
    ) -> CatchUpSummary {
        let mut pending: Vec<(NaiveDate, Uuid)> = books
            .transactions
            .iter()
            .filter(|txn| !txn.has_entry())
            .map(|txn| (txn.date, txn.id))
            .collect();
        pending.sort();
        pending.truncate(limit);

        let mut summary = CatchUpSummary::default();
        for (_, transaction_id) in pending {
            summary.scanned += 1;
            match Self::ensure_entry(books, transaction_id, actor) {
                Ok(_) => summary.generated += 1,
                Err(err) => {
                    warn!(%transaction_id, error = %err, "catch-up entry generation failed");
                    summary.failures.push(CatchUpFailure {
                        transaction_id,
                        error: err.to_string(),
                    });
                }
            }
        }
        info!(
            scanned = summary.scanned,
            generated = summary.generated,
            failed = summary.failures.len(),
            "journal catch-up finished"
        );
        summary
    }

    /// Creates a validated multi-line manual entry in `Draft` status.
    pub fn create_manual_entry(books: &mut Books, new: NewJournalEntry) -> CoreResult<Uuid> {
        let total_debit: Decimal = new.lines.iter().map(|line| line.debit).sum();
        let total_credit: Decimal = new.lines.iter().map(|line| line.credit).sum();
        let entry = JournalEntry {
            id: Uuid::new_v4(),
            entry_number: books.next_entry_number(),
            date: new.date,
            description: new.description,
            reference: new.reference,
            status: EntryStatus::Draft,
            total_debit,
            total_credit,
            source_transaction_id: None,
            created_by: new.created_by,
            lines: new.lines,
        };
        Self::validate_entry(&entry)?;
        Ok(books.add_entry(entry))
    }

    pub fn approve(books: &mut Books, entry_id: Uuid) -> CoreResult<()> {
        Self::transition(books, entry_id, EntryStatus::Approved)
    }

    pub fn post(books: &mut Books, entry_id: Uuid) -> CoreResult<()> {
        Self::transition(books, entry_id, EntryStatus::Posted)
    }

    /// Rejects entries that violate the double-entry invariants before any
    /// state change: at least two lines, every line single-sided, line sums
    /// balanced and matching the header totals.
    pub fn validate_entry(entry: &JournalEntry) -> CoreResult<()> {
        if entry.lines.len() < 2 {
            return Err(CoreError::Validation(
                "journal entry requires at least two lines".into(),
            ));
        }
        for line in &entry.lines {
            if line.debit < Decimal::ZERO || line.credit < Decimal::ZERO {
                return Err(CoreError::Validation(
                    "journal line amounts must not be negative".into(),
                ));
            }
            if !line.is_single_sided() {
                return Err(CoreError::Validation(
                    "journal line must carry exactly one non-zero side".into(),
                ));
            }
        }
        let debits = entry.line_debit_total();
        let credits = entry.line_credit_total();
        if debits != credits {
            return Err(CoreError::UnbalancedEntry { debits, credits });
        }
        if entry.total_debit != debits || entry.total_credit != credits {
            return Err(CoreError::Validation(
                "entry totals do not match line sums".into(),
            ));
        }
        Ok(())
    }

    fn validate_transaction(books: &Books, new: &NewTransaction) -> CoreResult<()> {
        if new.amount <= Decimal::ZERO {
            return Err(CoreError::AmountNotPositive(new.amount));
        }
        let category = books
            .account(new.category_id)
            .ok_or_else(|| CoreError::AccountNotFound(new.category_id.to_string()))?;
        if !category.is_active {
            return Err(CoreError::InactiveCategory(category.code.clone()));
        }
        let expected = if category.is_under(INCOME_ROOT) && category.nature == AccountNature::Credit
        {
            TransactionKind::Income
        } else if category.is_under(EXPENSE_ROOT) && category.nature == AccountNature::Debit {
            TransactionKind::Expense
        } else {
            return Err(CoreError::Validation(format!(
                "account {} is not an income or expense category",
                category.code
            )));
        };
        if expected != new.kind {
            return Err(CoreError::CategoryTypeMismatch {
                category: category.code.clone(),
                expected,
                found: new.kind,
            });
        }
        Ok(())
    }

    fn transition(books: &mut Books, entry_id: Uuid, next: EntryStatus) -> CoreResult<()> {
        let entry = books
            .entry(entry_id)
            .ok_or(CoreError::EntryNotFound(entry_id))?;
        let from = entry.status;
        if !from.can_transition_to(next) {
            return Err(CoreError::InvalidStatusTransition { from, to: next });
        }
        if let Some(entry) = books.entry_mut(entry_id) {
            entry.status = next;
        }
        books.touch();
        Ok(())
    }
}
