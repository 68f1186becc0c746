//! Fee structure types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One fee rule configured for a campus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeRule {
    /// Rule ID.
    pub id: Uuid,
    /// Owning organization.
    pub organization_id: Uuid,
    /// Campus the rule applies to.
    pub campus_id: Uuid,
    /// Display name (e.g., "Tuition").
    pub name: String,
    /// Amount billed per student per period.
    pub amount: Decimal,
    /// Grade the rule targets; `None` or blank means every grade.
    pub applicable_grade: Option<String>,
    /// Inactive rules are never billed.
    pub is_active: bool,
}

/// Rules matching a posting scope and their combined amount.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FeeResolution {
    /// Matching rules, ordered by ID.
    pub rules: Vec<FeeRule>,
    /// Exact sum of the rule amounts.
    pub total_amount: Decimal,
}

impl FeeResolution {
    /// Returns true if no rule matched.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
