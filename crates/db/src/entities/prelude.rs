//! Entity re-exports.

pub use super::domain_events::Entity as DomainEvents;
pub use super::fee_challans::Entity as FeeChallans;
pub use super::fee_structures::Entity as FeeStructures;
pub use super::ledger_entries::Entity as LedgerEntries;
pub use super::organization_billing_plans::Entity as OrganizationBillingPlans;
pub use super::organizations::Entity as Organizations;
pub use super::payment_records::Entity as PaymentRecords;
pub use super::revenue_adjustments::Entity as RevenueAdjustments;
pub use super::revenue_cycles::Entity as RevenueCycles;
pub use super::student_financial_summaries::Entity as StudentFinancialSummaries;
pub use super::students::Entity as Students;
