//! Core billing records: sessions in, cost breakdowns out.

use std::iter::Sum;
use std::ops::{Add, AddAssign};

use chrono::{Duration, NaiveDateTime};
use serde::Serialize;

use crate::error::{BillingError, Result};

/// One charging session as delivered by the ingestion layer.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use ev_invoice::billing::types::ChargingSession;
///
/// let start = NaiveDate::from_ymd_opt(2025, 8, 5).unwrap().and_hms_opt(0, 0, 0).unwrap();
/// let session = ChargingSession::new(start, 3600, 5.0).unwrap();
/// assert!(session.is_billable());
/// assert!(ChargingSession::new(start, 3600, -1.0).is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChargingSession {
    /// Local civil start time.
    pub start: NaiveDateTime,
    /// Seconds during which current actually flowed.
    pub active_duration_secs: u64,
    /// Energy delivered (kWh, >= 0).
    pub energy_kwh: f64,
    /// Wall-clock end, display only.
    pub end: Option<NaiveDateTime>,
}

impl ChargingSession {
    /// Creates a session without a wall-clock end.
    ///
    /// # Errors
    ///
    /// Returns [`BillingError::InvalidSession`] if `energy_kwh` is negative or not finite.
    pub fn new(start: NaiveDateTime, active_duration_secs: u64, energy_kwh: f64) -> Result<Self> {
        if !energy_kwh.is_finite() || energy_kwh < 0.0 {
            return Err(BillingError::InvalidSession {
                line: 0,
                reason: format!("energy {energy_kwh} kWh must be a finite value >= 0"),
            });
        }
        Ok(Self {
            start,
            active_duration_secs,
            energy_kwh,
            end: None,
        })
    }

    pub fn with_end(mut self, end: NaiveDateTime) -> Self {
        self.end = Some(end);
        self
    }

    /// Zero-energy and zero-duration sessions carry no cost and are not billed.
    pub fn is_billable(&self) -> bool {
        self.active_duration_secs > 0 && self.energy_kwh > 0.0
    }

    /// Recorded end, or `start + active duration` when the export had none.
    pub fn display_end(&self) -> NaiveDateTime {
        self.end.unwrap_or_else(|| {
            let secs = i64::try_from(self.active_duration_secs).unwrap_or(i64::MAX);
            self.start
                .checked_add_signed(Duration::seconds(secs))
                .unwrap_or(self.start)
        })
    }
}

/// Off-peak/peak split of one session (or a sum of sessions) and its pre-tax cost.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct CostBreakdown {
    pub off_peak_kwh: f64,
    pub peak_kwh: f64,
    pub total_kwh: f64,
    pub amount_before_tax: f64,
}

impl CostBreakdown {
    pub const ZERO: Self = Self {
        off_peak_kwh: 0.0,
        peak_kwh: 0.0,
        total_kwh: 0.0,
        amount_before_tax: 0.0,
    };

    /// Share of energy delivered off-peak, `0.0` for an empty breakdown.
    pub fn off_peak_share(&self) -> f64 {
        if self.total_kwh > 0.0 {
            self.off_peak_kwh / self.total_kwh
        } else {
            0.0
        }
    }
}

impl Add for CostBreakdown {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            off_peak_kwh: self.off_peak_kwh + rhs.off_peak_kwh,
            peak_kwh: self.peak_kwh + rhs.peak_kwh,
            total_kwh: self.total_kwh + rhs.total_kwh,
            amount_before_tax: self.amount_before_tax + rhs.amount_before_tax,
        }
    }
}

impl AddAssign for CostBreakdown {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sum for CostBreakdown {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a CostBreakdown> for CostBreakdown {
    fn sum<I: Iterator<Item = &'a Self>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn start() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 8, 5)
            .unwrap()
            .and_hms_opt(22, 30, 0)
            .unwrap()
    }

    #[test]
    fn rejects_negative_and_nan_energy() {
        assert!(ChargingSession::new(start(), 60, -0.01).is_err());
        assert!(ChargingSession::new(start(), 60, f64::NAN).is_err());
        assert!(ChargingSession::new(start(), 60, f64::INFINITY).is_err());
    }

    #[test]
    fn zero_energy_or_duration_is_not_billable() {
        assert!(!ChargingSession::new(start(), 0, 3.0).unwrap().is_billable());
        assert!(!ChargingSession::new(start(), 600, 0.0).unwrap().is_billable());
        assert!(ChargingSession::new(start(), 600, 0.1).unwrap().is_billable());
    }

    #[test]
    fn display_end_falls_back_to_active_duration() {
        let s = ChargingSession::new(start(), 7200, 1.0).unwrap();
        assert_eq!(
            s.display_end(),
            NaiveDate::from_ymd_opt(2025, 8, 6)
                .unwrap()
                .and_hms_opt(0, 30, 0)
                .unwrap()
        );
        let recorded = start() + Duration::hours(5);
        assert_eq!(s.with_end(recorded).display_end(), recorded);
    }

    #[test]
    fn breakdowns_sum_fieldwise() {
        let a = CostBreakdown {
            off_peak_kwh: 1.0,
            peak_kwh: 2.0,
            total_kwh: 3.0,
            amount_before_tax: 0.5,
        };
        let total: CostBreakdown = [a, a, CostBreakdown::ZERO].iter().sum();
        assert_eq!(total.off_peak_kwh, 2.0);
        assert_eq!(total.peak_kwh, 4.0);
        assert_eq!(total.total_kwh, 6.0);
        assert_eq!(total.amount_before_tax, 1.0);
        assert!((total.off_peak_share() - 1.0 / 3.0).abs() < 1e-12);
        assert_eq!(CostBreakdown::ZERO.off_peak_share(), 0.0);
    }
}
