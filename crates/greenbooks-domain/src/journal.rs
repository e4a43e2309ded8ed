//! Double-entry journal types.

use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::common::{Displayable, Identifiable};

/// Lifecycle of a journal entry. Posted entries are immutable; corrections
/// are new offsetting entries.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EntryStatus {
    Draft,
    Approved,
    Posted,
}

impl EntryStatus {
    pub fn can_transition_to(self, next: EntryStatus) -> bool {
        matches!(
            (self, next),
            (EntryStatus::Draft, EntryStatus::Approved)
                | (EntryStatus::Approved, EntryStatus::Posted)
        )
    }
}

impl fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            EntryStatus::Draft => "draft",
            EntryStatus::Approved => "approved",
            EntryStatus::Posted => "posted",
        };
        f.write_str(label)
    }
}

/// A single debit or credit posting within an entry. Exactly one side is
/// non-zero.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JournalLine {
    pub account_id: Uuid,
    pub debit: Decimal,
    pub credit: Decimal,
    pub description: String,
}

impl JournalLine {
    pub fn debit(account_id: Uuid, amount: Decimal, description: impl Into<String>) -> Self {
        Self {
            account_id,
            debit: amount,
            credit: Decimal::ZERO,
            description: description.into(),
        }
    }

    pub fn credit(account_id: Uuid, amount: Decimal, description: impl Into<String>) -> Self {
        Self {
            account_id,
            debit: Decimal::ZERO,
            credit: amount,
            description: description.into(),
        }
    }

    /// True when exactly one side carries a positive amount.
    pub fn is_single_sided(&self) -> bool {
        (self.debit > Decimal::ZERO && self.credit == Decimal::ZERO)
            || (self.credit > Decimal::ZERO && self.debit == Decimal::ZERO)
    }

    /// Positive for debit lines, negative for credit lines.
    pub fn signed_amount(&self) -> Decimal {
        self.debit - self.credit
    }
}

/// A balanced set of postings recorded together. Lines are embedded so the
/// header and its lines form one atomic value.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JournalEntry {
    pub id: Uuid,
    pub entry_number: String,
    pub date: NaiveDate,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    pub status: EntryStatus,
    pub total_debit: Decimal,
    pub total_credit: Decimal,
    /// Source transaction for auto-generated entries; `None` for manual ones.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_transaction_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<Uuid>,
    pub lines: Vec<JournalLine>,
}

impl JournalEntry {
    pub fn line_debit_total(&self) -> Decimal {
        self.lines.iter().map(|line| line.debit).sum()
    }

    pub fn line_credit_total(&self) -> Decimal {
        self.lines.iter().map(|line| line.credit).sum()
    }

    pub fn is_balanced(&self) -> bool {
        self.line_debit_total() == self.line_credit_total()
    }

    pub fn is_posted(&self) -> bool {
        self.status == EntryStatus::Posted
    }
}

impl Identifiable for JournalEntry {
    fn id(&self) -> Uuid {
        self.id
    }
}

impl Displayable for JournalEntry {
    fn display_label(&self) -> String {
        format!("{} [{}] {}", self.entry_number, self.status, self.description)
    }
}
