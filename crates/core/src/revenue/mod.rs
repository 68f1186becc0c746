//! Monthly platform revenue cycles.
//!
//! A cycle snapshots an organization's billing plan when it opens, refreshes
//! its metrics while open, and freezes revenue when it closes. Closed cycles
//! change only through adjustments.

pub mod error;
pub mod lifecycle;
pub mod service;
pub mod store;
pub mod types;

pub use error::RevenueCycleError;
pub use lifecycle::RevenueCycleLifecycle;
pub use service::RevenueCycleService;
pub use store::RevenueCycleStore;
pub use types::{
    AdjustmentInput, AdjustmentOutcome, BillingPlan, CycleClosure, CycleCreation, CycleInsert,
    CycleWindow, LiveMetrics, NewRevenueCycle, RevenueAdjustment, RevenueCalculationMode,
    RevenueCycle, RevenueCycleMetrics, RevenueCycleStatus,
};
