//! greenbooks-domain
//!
//! Pure domain models for the parks accounting engine (Books, Account,
//! Transaction, JournalEntry, BudgetProjection, matrices, reports).
//! No I/O, no services, no storage. Only data types and core enums.

pub mod account;
pub mod books;
pub mod budget;
pub mod common;
pub mod journal;
pub mod matrix;
pub mod period;
pub mod reports;
pub mod transaction;

pub use account::*;
pub use books::*;
pub use budget::*;
pub use common::*;
pub use journal::*;
pub use matrix::*;
pub use period::*;
pub use reports::*;
pub use transaction::*;
