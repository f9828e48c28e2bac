//! Batch aggregation of allocated sessions into period totals.

use serde::Serialize;
use tracing::info;

use super::allocator::SessionAllocator;
use super::impact::{ImpactEstimate, ImpactModel};
use super::types::{ChargingSession, CostBreakdown};
use crate::error::Result;
use crate::tariff::TariffRate;

/// One billed session with the breakdown and before-tax prices applied.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvoiceLine {
    pub session: ChargingSession,
    pub breakdown: CostBreakdown,
    pub rate: TariffRate,
}

/// Totals for a billing period.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PeriodTotals {
    /// Sum of all billed session breakdowns.
    pub energy: CostBreakdown,
    pub tax_rate: f64,
    pub tax: f64,
    pub total_incl_tax: f64,
    pub impact: ImpactEstimate,
}

impl PeriodTotals {
    /// Derives tax and impact figures from summed breakdowns.
    pub fn from_breakdown(energy: CostBreakdown, tax_rate: f64, impact: &ImpactModel) -> Self {
        let tax = energy.amount_before_tax * tax_rate;
        Self {
            energy,
            tax_rate,
            tax,
            total_incl_tax: energy.amount_before_tax + tax,
            impact: impact.estimate(energy.total_kwh),
        }
    }
}

/// Billed lines and totals for one filtered set of sessions.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Invoice {
    pub lines: Vec<InvoiceLine>,
    pub totals: PeriodTotals,
    /// Sessions left out because they had no energy or no active time.
    pub excluded: usize,
}

impl Invoice {
    /// Allocates every session and reduces to period totals.
    ///
    /// Zero-energy and zero-duration sessions are counted in
    /// [`Invoice::excluded`] and produce no line. An empty input yields an
    /// empty invoice with all-zero totals.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::BillingError::ScheduleGap`] if any billable
    /// session starts before the tariff schedule.
    pub fn build(
        sessions: &[ChargingSession],
        allocator: &SessionAllocator,
        impact: &ImpactModel,
    ) -> Result<Self> {
        let mut lines = Vec::with_capacity(sessions.len());
        let mut excluded = 0_usize;

        for session in sessions {
            let allocation = allocator.allocate(session)?;
            match allocation.rate {
                Some(rate) => lines.push(InvoiceLine {
                    session: session.clone(),
                    breakdown: allocation.breakdown,
                    rate,
                }),
                None => excluded += 1,
            }
        }

        let energy: CostBreakdown = lines.iter().map(|l| l.breakdown).sum();
        let totals = PeriodTotals::from_breakdown(energy, allocator.tax_rate(), impact);

        info!(
            billed = lines.len(),
            excluded,
            total_kwh = totals.energy.total_kwh,
            total_before_tax = totals.energy.amount_before_tax,
            "invoice aggregated"
        );

        Ok(Self {
            lines,
            totals,
            excluded,
        })
    }

    /// `true` when no session was billed.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tariff::{TariffSchedule, TimeOfDayBands};
    use chrono::{NaiveDate, NaiveDateTime};

    fn at(d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 8, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    fn session(start: NaiveDateTime, secs: u64, kwh: f64) -> ChargingSession {
        ChargingSession::new(start, secs, kwh).unwrap()
    }

    #[test]
    fn empty_input_gives_zero_totals() {
        let invoice = Invoice::build(&[], &SessionAllocator::default(), &ImpactModel::default())
            .unwrap();
        assert!(invoice.is_empty());
        assert_eq!(invoice.excluded, 0);
        assert_eq!(invoice.totals.energy, CostBreakdown::ZERO);
        assert_eq!(invoice.totals.tax, 0.0);
        assert_eq!(invoice.totals.total_incl_tax, 0.0);
        assert_eq!(invoice.totals.impact, ImpactEstimate::default());
    }

    #[test]
    fn totals_sum_lines_and_apply_tax() {
        let sessions = vec![
            session(at(5, 1), 3600, 4.0),
            session(at(6, 10), 3600, 6.0),
            session(at(7, 12), 0, 3.0),
        ];
        let invoice = Invoice::build(
            &sessions,
            &SessionAllocator::default(),
            &ImpactModel::default(),
        )
        .unwrap();

        assert_eq!(invoice.lines.len(), 2);
        assert_eq!(invoice.excluded, 1);
        let expected_ht = 4.0 * 0.1635 + 6.0 * 0.2081;
        let t = invoice.totals;
        assert!((t.energy.total_kwh - 10.0).abs() < 1e-9);
        assert!((t.energy.amount_before_tax - expected_ht).abs() < 1e-9);
        assert!((t.tax - expected_ht * 0.2).abs() < 1e-9);
        assert!((t.total_incl_tax - expected_ht * 1.2).abs() < 1e-9);
        assert_eq!(t.impact, ImpactModel::default().estimate(t.energy.total_kwh));
    }

    #[test]
    fn tax_inclusive_schedule_round_trips_to_stored_prices() {
        let sessions = vec![session(at(5, 0), 3600, 5.0), session(at(9, 16), 5400, 8.0)];
        let impact = ImpactModel::default();
        let ht = Invoice::build(&sessions, &SessionAllocator::default(), &impact).unwrap();
        let ttc_alloc = SessionAllocator::new(
            TariffSchedule::reference().with_prices_include_tax(true),
            TimeOfDayBands::standard(),
            0.20,
        );
        let ttc = Invoice::build(&sessions, &ttc_alloc, &impact).unwrap();

        let stored = ht.totals.energy.amount_before_tax;
        assert!((ttc.totals.energy.amount_before_tax - stored / 1.2).abs() < 1e-12);
        assert!((ttc.totals.total_incl_tax - stored).abs() < 1e-12);
    }

    #[test]
    fn schedule_gap_aborts_the_batch() {
        let early = NaiveDate::from_ymd_opt(2023, 3, 1)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap();
        let sessions = vec![session(at(5, 1), 600, 1.0), session(early, 600, 1.0)];
        let result = Invoice::build(
            &sessions,
            &SessionAllocator::default(),
            &ImpactModel::default(),
        );
        assert!(result.is_err());
    }
}
