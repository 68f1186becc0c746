//! Append-only student ledger.
//!
//! This module implements:
//! - Typed debit/credit entries keyed to challans and payments
//! - Student financial summary arithmetic
//! - Statement verification against the stored summary

pub mod balance;
pub mod service;
pub mod store;
pub mod types;

#[cfg(test)]
mod balance_props;

pub use balance::LedgerTotals;
pub use service::LedgerService;
pub use store::LedgerStore;
pub use types::{
    EntryDirection, LedgerEntry, LedgerEntryType, LedgerStatement, NewLedgerEntry,
    StudentFinancialSummary, reference_type,
};
