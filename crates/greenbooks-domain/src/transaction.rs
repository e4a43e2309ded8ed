//! Income and expense transaction facts.

use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::common::{Displayable, Identifiable};

/// The two kinds of financial fact the engine records.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Income,
    Expense,
}

impl TransactionKind {
    /// Label used by the budget CSV contract.
    pub fn csv_label(self) -> &'static str {
        match self {
            TransactionKind::Income => "ingreso",
            TransactionKind::Expense => "gasto",
        }
    }

    /// Parses a CSV type label, case-insensitively.
    pub fn from_csv_label(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "ingreso" => Some(TransactionKind::Income),
            "gasto" => Some(TransactionKind::Expense),
            _ => None,
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TransactionKind::Income => "income",
            TransactionKind::Expense => "expense",
        };
        f.write_str(label)
    }
}

/// A recorded income or expense, the durable fact journal entries derive from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Transaction {
    pub id: Uuid,
    pub kind: TransactionKind,
    pub amount: Decimal,
    pub date: NaiveDate,
    pub category_id: Uuid,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    /// Back-link to the generated journal entry, set once generation succeeds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub journal_entry_id: Option<Uuid>,
}

impl Transaction {
    pub fn new(
        kind: TransactionKind,
        amount: Decimal,
        date: NaiveDate,
        category_id: Uuid,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            amount,
            date,
            category_id,
            description: description.into(),
            reference: None,
            journal_entry_id: None,
        }
    }

    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }

    pub fn link_entry(&mut self, entry_id: Uuid) {
        self.journal_entry_id = Some(entry_id);
    }

    pub fn has_entry(&self) -> bool {
        self.journal_entry_id.is_some()
    }
}

impl Identifiable for Transaction {
    fn id(&self) -> Uuid {
        self.id
    }
}

impl Displayable for Transaction {
    fn display_label(&self) -> String {
        format!("{} {} on {}", self.kind, self.amount, self.date)
    }
}
