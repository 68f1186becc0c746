//! Payment reconciliation.
//!
//! A payment is validated, checked against its natural key, and applied to
//! the challan, the ledger, and the student summary as one unit.

pub mod service;
pub mod store;
pub mod types;

#[cfg(test)]
mod service_props;

pub use service::ReconciliationService;
pub use store::PaymentStore;
pub use types::{
    PaymentNaturalKey, PaymentPlan, PaymentRecord, PaymentStatus, ReconcilePaymentInput,
    ReconciliationResult,
};
