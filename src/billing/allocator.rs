//! Per-session energy allocation between off-peak and peak bands.
//!
//! Power draw is assumed constant over the active duration. Whole days are
//! split by the daily off-peak minute count; the rest of the window is walked
//! in steps of at most one minute, each attributed to the band of its starting
//! instant. The tariff is chosen once, from the start date, even when charging
//! runs past midnight into a new rate period.

use chrono::Duration;
use tracing::debug;

use super::types::{ChargingSession, CostBreakdown};
use crate::error::Result;
use crate::tariff::{Band, TariffRate, TariffSchedule, TimeOfDayBands};

/// Integration step length in seconds.
pub const STEP_SECS: u64 = 60;

const SECS_PER_DAY: u64 = 24 * 3600;

/// Allocation of one session together with the unit prices it was billed at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Allocation {
    pub breakdown: CostBreakdown,
    /// Before-tax prices applied, `None` for a zero-cost session.
    pub rate: Option<TariffRate>,
}

/// Splits session energy across tariff bands and prices it.
#[derive(Debug, Clone)]
pub struct SessionAllocator {
    schedule: TariffSchedule,
    bands: TimeOfDayBands,
    tax_rate: f64,
}

impl SessionAllocator {
    /// Creates an allocator.
    ///
    /// # Arguments
    ///
    /// * `schedule` - Tariff table; its tax flag decides whether prices are converted
    /// * `bands` - Daily off-peak windows
    /// * `tax_rate` - Used only to strip tax from tax-inclusive prices
    pub fn new(schedule: TariffSchedule, bands: TimeOfDayBands, tax_rate: f64) -> Self {
        Self {
            schedule,
            bands,
            tax_rate,
        }
    }

    pub fn schedule(&self) -> &TariffSchedule {
        &self.schedule
    }

    pub fn bands(&self) -> &TimeOfDayBands {
        &self.bands
    }

    pub fn tax_rate(&self) -> f64 {
        self.tax_rate
    }

    /// Splits the session's energy into `(off_peak_kwh, peak_kwh)`.
    ///
    /// Returns `(0.0, 0.0)` for sessions with no energy or no active time.
    pub fn split_energy(&self, session: &ChargingSession) -> (f64, f64) {
        if !session.is_billable() {
            return (0.0, 0.0);
        }

        let kwh_per_sec = session.energy_kwh / session.active_duration_secs as f64;

        // Every whole day covers each minute of the day exactly once.
        let full_days = session.active_duration_secs / SECS_PER_DAY;
        let off_peak_secs_per_day = u64::from(self.bands.off_peak_minutes_per_day()) * 60;
        let mut off_peak = kwh_per_sec * (full_days * off_peak_secs_per_day) as f64;
        let mut peak = kwh_per_sec * (full_days * (SECS_PER_DAY - off_peak_secs_per_day)) as f64;

        // Only the time of day matters, so the cursor wraps at midnight.
        let mut cursor = session.start.time();
        let mut remaining = session.active_duration_secs % SECS_PER_DAY;

        while remaining > 0 {
            let step = remaining.min(STEP_SECS);
            let chunk = kwh_per_sec * step as f64;
            match self.bands.classify(cursor) {
                Band::OffPeak => off_peak += chunk,
                Band::Peak => peak += chunk,
            }
            // `step` <= 60, so the cast is lossless.
            cursor = cursor
                .overflowing_add_signed(Duration::seconds(step as i64))
                .0;
            remaining -= step;
        }

        (off_peak, peak)
    }

    /// Allocates and prices one session.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::BillingError::ScheduleGap`] when no tariff is in
    /// force on the session start date.
    pub fn allocate(&self, session: &ChargingSession) -> Result<Allocation> {
        if !session.is_billable() {
            return Ok(Allocation {
                breakdown: CostBreakdown::ZERO,
                rate: None,
            });
        }

        let rate = self
            .schedule
            .pre_tax_rate_for(session.start.date(), self.tax_rate)?;
        let (off_peak_kwh, peak_kwh) = self.split_energy(session);
        let amount_before_tax = off_peak_kwh * rate.off_peak + peak_kwh * rate.peak;

        debug!(
            start = %session.start,
            active_secs = session.active_duration_secs,
            off_peak_kwh,
            peak_kwh,
            amount_before_tax,
            "allocated session"
        );

        Ok(Allocation {
            breakdown: CostBreakdown {
                off_peak_kwh,
                peak_kwh,
                total_kwh: off_peak_kwh + peak_kwh,
                amount_before_tax,
            },
            rate: Some(rate),
        })
    }

    /// Convenience wrapper returning only the breakdown.
    ///
    /// # Errors
    ///
    /// Same as [`SessionAllocator::allocate`].
    pub fn cost(&self, session: &ChargingSession) -> Result<CostBreakdown> {
        self.allocate(session).map(|a| a.breakdown)
    }
}

impl Default for SessionAllocator {
    fn default() -> Self {
        Self::new(TariffSchedule::reference(), TimeOfDayBands::standard(), 0.20)
    }
}
