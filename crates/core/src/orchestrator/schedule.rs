//! Organization-local calendar for orchestrator passes.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use chrono_tz::Tz;

use super::types::OrganizationSchedule;
use crate::revenue::RevenueCycleLifecycle;
use crate::revenue::types::effective_closing_day;

/// Parse an IANA timezone, falling back to `default` when empty or unknown.
#[must_use]
pub fn resolve_timezone(name: Option<&str>, default: Tz) -> Tz {
    name.map(str::trim)
        .filter(|n| !n.is_empty())
        .and_then(|n| n.parse::<Tz>().ok())
        .unwrap_or(default)
}

/// Closing day used when neither plan nor configuration has a valid one.
pub const DEFAULT_CLOSING_DAY: u32 = 10;

/// `day` if within 1..=28, otherwise [`DEFAULT_CLOSING_DAY`].
#[must_use]
pub fn closing_day_or(day: u32) -> u32 {
    if (1..=28).contains(&day) { day } else { DEFAULT_CLOSING_DAY }
}

/// An organization's view of "now".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalSchedule {
    /// Resolved timezone.
    pub timezone: Tz,
    /// Local calendar date.
    pub local_date: NaiveDate,
    /// Resolved closing day.
    pub closing_day: u32,
}

impl LocalSchedule {
    /// Resolve an organization's timezone and closing day at `now`.
    #[must_use]
    pub fn at(
        schedule: &OrganizationSchedule,
        now: DateTime<Utc>,
        default_timezone: Tz,
        default_closing_day: u32,
    ) -> Self {
        let timezone = resolve_timezone(schedule.timezone.as_deref(), default_timezone);
        Self {
            timezone,
            local_date: now.with_timezone(&timezone).date_naive(),
            closing_day: effective_closing_day(schedule.closing_day, default_closing_day),
        }
    }

    /// Local (month, year).
    #[must_use]
    pub fn current_period(&self) -> (u32, i32) {
        (self.local_date.month(), self.local_date.year())
    }

    /// Local (month, year) of the month before.
    #[must_use]
    pub fn previous_period(&self) -> (u32, i32) {
        let (month, year) = self.current_period();
        RevenueCycleLifecycle::previous_period(month, year)
    }

    /// True when today is the organization's closing day.
    #[must_use]
    pub fn is_closing_day(&self) -> bool {
        self.local_date.day() == self.closing_day
    }
}
