//! Challan posting and lifecycle.
//!
//! This module implements:
//! - Billing periods and deterministic challan numbers
//! - Idempotent posting of challans to a campus grade
//! - Monotonic challan status transitions and cancellation
//! - Error types shared by billing, ledger, and reconciliation

pub mod error;
pub mod lifecycle;
pub mod period;
pub mod service;
pub mod store;
pub mod types;

#[cfg(test)]
mod lifecycle_props;

pub use error::BillingError;
pub use lifecycle::{CancellationPlan, ChallanLifecycle};
pub use period::{BillingPeriod, challan_number, ruleset_digest};
pub use service::PostingService;
pub use store::BillingStore;
pub use types::{
    CancelChallanInput, ChallanFilter, ChallanInsert, ChallanStatus, FeeChallan, NewChallan,
    PostingFailure, PostingReport, PostingRequest, Student,
};
