//! Core billing logic for Sairex.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! Persistence is reached only through the store traits each module declares;
//! `sairex-db` implements them inside database transactions.
//!
//! # Modules
//!
//! - `fees` - Fee structure resolution per campus and grade
//! - `billing` - Challan posting, status lifecycle, and cancellation
//! - `ledger` - Append-only ledger entries and student financial summaries
//! - `payment` - Payment reconciliation against challans
//! - `revenue` - Monthly revenue cycles and post-close adjustments
//! - `orchestrator` - Scheduled, lock-protected revenue-cycle runs
//! - `events` - Domain events emitted for observability
//! - `money` - Storage bounds shared by every amount

pub mod billing;
pub mod error;
pub mod events;
pub mod fees;
pub mod ledger;
pub mod money;
pub mod orchestrator;
pub mod payment;
pub mod revenue;

#[cfg(test)]
pub(crate) mod testing;

pub use error::ErrorCategory;
