//! Billing periods and deterministic challan numbers.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use super::error::BillingError;
use crate::fees::FeeRule;

/// A calendar month that challans are issued for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BillingPeriod {
    year: i32,
    month: u32,
}

impl BillingPeriod {
    /// Creates a period after range-checking it.
    ///
    /// # Errors
    ///
    /// Returns `BillingError::InvalidBillingPeriod` if the month is outside
    /// 1..=12 or the year outside 2000..=9999.
    pub fn new(year: i32, month: u32) -> Result<Self, BillingError> {
        if !(2000..=9999).contains(&year) || !(1..=12).contains(&month) {
            return Err(BillingError::InvalidBillingPeriod(format!(
                "{year:04}-{month:02}"
            )));
        }
        Ok(Self { year, month })
    }

    /// Calendar year.
    #[must_use]
    pub const fn year(&self) -> i32 {
        self.year
    }

    /// Calendar month (1-12).
    #[must_use]
    pub const fn month(&self) -> u32 {
        self.month
    }

    /// First day of the period.
    #[must_use]
    pub fn first_day(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
    }

    /// `YYYYMM` form used inside challan numbers.
    #[must_use]
    pub fn compact(&self) -> String {
        format!("{:04}{:02}", self.year, self.month)
    }
}

impl fmt::Display for BillingPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for BillingPeriod {
    type Err = BillingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || BillingError::InvalidBillingPeriod(s.to_string());
        let (year, month) = s.trim().split_once('-').ok_or_else(invalid)?;
        if year.len() != 4 || month.len() != 2 {
            return Err(invalid());
        }
        let year = year.parse::<i32>().map_err(|_| invalid())?;
        let month = month.parse::<u32>().map_err(|_| invalid())?;
        Self::new(year, month).map_err(|_| invalid())
    }
}

impl Serialize for BillingPeriod {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for BillingPeriod {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Hex digest over the sorted `(rule_id, amount)` pairs of a rule set.
#[must_use]
pub fn ruleset_digest(rules: &[FeeRule]) -> String {
    let mut pairs: Vec<(Uuid, String)> = rules
        .iter()
        .map(|rule| (rule.id, rule.amount.normalize().to_string()))
        .collect();
    pairs.sort();

    let mut hasher = Sha256::new();
    for (id, amount) in &pairs {
        hasher.update(id.as_bytes());
        hasher.update(b":");
        hasher.update(amount.as_bytes());
        hasher.update(b";");
    }
    hex(&hasher.finalize())
}

/// Deterministic challan number: `CH-{YYYYMM}-{16 hex}`.
///
/// Identical campus, student, period, and rule set give an identical number.
#[must_use]
pub fn challan_number(
    campus_id: Uuid,
    student_id: Uuid,
    period: BillingPeriod,
    rules: &[FeeRule],
) -> String {
    let mut hasher = Sha256::new();
    hasher.update(campus_id.as_bytes());
    hasher.update(b"|");
    hasher.update(student_id.as_bytes());
    hasher.update(b"|");
    hasher.update(period.to_string().as_bytes());
    hasher.update(b"|");
    hasher.update(ruleset_digest(rules).as_bytes());
    let digest = hex(&hasher.finalize());

    format!("CH-{}-{}", period.compact(), &digest[..16])
}

fn hex(bytes: &[u8]) -> String {
    use std::fmt::Write;

    bytes.iter().fold(String::with_capacity(bytes.len() * 2), |mut out, b| {
        let _ = write!(out, "{b:02x}");
        out
    })
}
