//! Vehicle and billing-period selection over imported sessions.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate, NaiveDateTime};

use super::import::ImportedSession;
use crate::error::BillingError;

/// A calendar month; a session belongs to the month of its start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BillingPeriod {
    year: i32,
    month: u32,
}

impl BillingPeriod {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(|_| Self { year, month })
    }

    pub fn of(start: NaiveDateTime) -> Self {
        Self {
            year: start.year(),
            month: start.month(),
        }
    }

    pub fn contains(&self, start: NaiveDateTime) -> bool {
        Self::of(start) == *self
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }
}

impl FromStr for BillingPeriod {
    type Err = BillingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || BillingError::InvalidPeriod(s.to_string());
        let (y, m) = s.trim().split_once('-').ok_or_else(invalid)?;
        if y.len() != 4 || m.len() != 2 {
            return Err(invalid());
        }
        let year = y.parse().map_err(|_| invalid())?;
        let month = m.parse().map_err(|_| invalid())?;
        Self::new(year, month).ok_or_else(invalid)
    }
}

impl fmt::Display for BillingPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Lowercases, trims and replaces non-breaking spaces.
pub fn normalize_identity(text: &str) -> String {
    text.replace('\u{a0}', " ").trim().to_lowercase()
}

/// Case-insensitive substring match on the recorded vehicle identity.
///
/// An empty filter matches every session that carries some identity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VehicleFilter {
    needle: String,
}

impl VehicleFilter {
    pub fn new(vehicle: Option<&str>) -> Self {
        Self {
            needle: vehicle.map(normalize_identity).unwrap_or_default(),
        }
    }

    pub fn matches(&self, identity: &str) -> bool {
        let identity = normalize_identity(identity);
        if self.needle.is_empty() {
            !identity.is_empty()
        } else {
            identity.contains(&self.needle)
        }
    }
}

/// Imported rows matching `vehicle` and `period`, ordered by start.
///
/// `period = None` keeps every month.
pub fn select_imported<'a>(
    imported: &'a [ImportedSession],
    vehicle: &VehicleFilter,
    period: Option<BillingPeriod>,
) -> Vec<&'a ImportedSession> {
    let mut selected: Vec<&ImportedSession> = imported
        .iter()
        .filter(|s| vehicle.matches(&s.identity))
        .filter(|s| period.is_none_or(|p| p.contains(s.session.start)))
        .collect();
    selected.sort_by_key(|s| s.session.start);
    selected
}

/// Distinct months present in the export, ascending.
pub fn available_periods(imported: &[ImportedSession]) -> Vec<BillingPeriod> {
    imported
        .iter()
        .map(|s| BillingPeriod::of(s.session.start))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Distinct non-empty identities as recorded, ascending.
pub fn distinct_identities(imported: &[ImportedSession]) -> Vec<String> {
    imported
        .iter()
        .map(|s| s.identity.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
