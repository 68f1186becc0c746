//! Fee structure resolution.

use rust_decimal::Decimal;
use uuid::Uuid;

use super::store::FeeStructureStore;
use super::types::{FeeResolution, FeeRule};
use crate::billing::BillingError;

/// Selects the fee rules billed to a campus and grade.
pub struct FeeResolver;

impl FeeResolver {
    /// Grade equality used for both fee rules and student selection:
    /// trimmed and case-insensitive.
    #[must_use]
    pub fn same_grade(a: &str, b: &str) -> bool {
        a.trim().eq_ignore_ascii_case(b.trim())
    }

    /// Returns true if `rule` targets `grade` or every grade.
    #[must_use]
    pub fn applies_to_grade(rule: &FeeRule, grade: &str) -> bool {
        match rule.applicable_grade.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(target) => Self::same_grade(target, grade),
        }
    }

    /// Filters `rules` down to the active ones for the scope.
    ///
    /// An empty resolution is a normal result; posting treats it as terminal.
    #[must_use]
    pub fn resolve(
        rules: Vec<FeeRule>,
        organization_id: Uuid,
        campus_id: Uuid,
        grade: &str,
    ) -> FeeResolution {
        let mut matching: Vec<FeeRule> = rules
            .into_iter()
            .filter(|rule| {
                rule.is_active
                    && rule.organization_id == organization_id
                    && rule.campus_id == campus_id
                    && Self::applies_to_grade(rule, grade)
            })
            .collect();
        matching.sort_by_key(|rule| rule.id);

        let total_amount = Self::total_bill_amount(&matching);
        FeeResolution {
            rules: matching,
            total_amount,
        }
    }

    /// Sum of every rule amount.
    #[must_use]
    pub fn total_bill_amount(rules: &[FeeRule]) -> Decimal {
        rules.iter().map(|rule| rule.amount).sum()
    }

    /// Loads campus rules from the store and resolves them for `grade`.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub async fn load<S: FeeStructureStore>(
        store: &S,
        organization_id: Uuid,
        campus_id: Uuid,
        grade: &str,
    ) -> Result<FeeResolution, BillingError> {
        let rules = store.active_fee_rules(organization_id, campus_id).await?;
        Ok(Self::resolve(rules, organization_id, campus_id, grade))
    }
}
