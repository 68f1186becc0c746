//! Fee structure persistence seam.

use uuid::Uuid;

use super::types::FeeRule;
use crate::billing::BillingError;

/// Repository trait for fee structure reads.
pub trait FeeStructureStore: Send + Sync {
    /// Active rules configured for a campus.
    fn active_fee_rules(
        &self,
        organization_id: Uuid,
        campus_id: Uuid,
    ) -> impl std::future::Future<Output = Result<Vec<FeeRule>, BillingError>> + Send;
}
