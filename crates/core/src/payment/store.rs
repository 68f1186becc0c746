//! Payment persistence seam.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::types::{PaymentRecord, ReconcilePaymentInput, ReconciliationResult};
use crate::billing::BillingError;

/// Repository trait for payment reconciliation.
pub trait PaymentStore: Send + Sync {
    /// Applies a payment as one atomic unit.
    ///
    /// Implementations must, inside a single transaction:
    /// 1. Lock the challan row, scoped to the organization
    /// 2. Look for a record with the same natural key
    /// 3. Plan the change with `ReconciliationService::plan`
    /// 4. Insert the payment, update the challan, append the credit, and
    ///    update the student summary
    ///
    /// A unique violation on the natural key maps to
    /// `BillingError::DuplicatePayment`.
    fn reconcile_payment(
        &self,
        input: ReconcilePaymentInput,
        default_currency: String,
        now: DateTime<Utc>,
    ) -> impl std::future::Future<Output = Result<ReconciliationResult, BillingError>> + Send;

    /// Payments recorded against a challan, oldest first.
    fn payments_for_challan(
        &self,
        organization_id: Uuid,
        challan_id: Uuid,
    ) -> impl std::future::Future<Output = Result<Vec<PaymentRecord>, BillingError>> + Send;
}
