//! Plain-text invoice rendering.

use std::fmt;

use crate::billing::{Invoice, PeriodTotals};
use crate::io::filter::BillingPeriod;
use crate::io::import::{ImportedSession, fmt_duration};
use crate::tariff::{TariffSchedule, TimeOfDayBands};

/// Invoice with the context needed to print it.
pub struct InvoiceReport<'a> {
    pub invoice: &'a Invoice,
    pub period: Option<BillingPeriod>,
    pub vehicle: Option<&'a str>,
    pub schedule: &'a TariffSchedule,
    pub bands: &'a TimeOfDayBands,
}

/// Rows shown by [`SessionPreview`].
pub const PREVIEW_LIMIT: usize = 20;

/// Matched sessions before pricing, zero-energy rows included.
pub struct SessionPreview<'a> {
    pub sessions: &'a [&'a ImportedSession],
}

impl fmt::Display for SessionPreview<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let total = self.sessions.len();
        if total > PREVIEW_LIMIT {
            writeln!(f, "Matched sessions: {total} (first {PREVIEW_LIMIT} shown)")?;
        } else {
            writeln!(f, "Matched sessions: {total}")?;
        }
        writeln!(
            f,
            "{:<16} {:<16} {:>9} {:>6}  Identity",
            "Start", "End", "kWh", "Active"
        )?;
        for imported in self.sessions.iter().take(PREVIEW_LIMIT) {
            let s = &imported.session;
            writeln!(
                f,
                "{:<16} {:<16} {:>9.2} {:>6}  {}",
                s.start.format("%d/%m/%Y %H:%M").to_string(),
                s.display_end().format("%d/%m/%Y %H:%M").to_string(),
                s.energy_kwh,
                fmt_duration(s.active_duration_secs),
                imported.identity
            )?;
        }
        Ok(())
    }
}

/// Renders a tax rate as a percentage without trailing zeros (`0.2` as `20`).
pub fn fmt_percent(rate: f64) -> String {
    let pct = (rate * 10_000.0).round() / 100.0;
    if pct.fract() == 0.0 {
        format!("{pct:.0}")
    } else {
        format!("{pct}")
    }
}

impl fmt::Display for InvoiceReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== EV charging invoice ===")?;
        if let Some(period) = self.period {
            writeln!(f, "Period:  {period}")?;
        }
        writeln!(f, "Vehicle: {}", self.vehicle.unwrap_or("(all)"))?;
        writeln!(f)?;

        writeln!(
            f,
            "{:<10} {:>6} {:>6} {:>6} {:>9} {:>9} {:>9} {:>8} {:>8} {:>10}",
            "Date",
            "Start",
            "End",
            "Active",
            "kWh",
            "kWh HC",
            "kWh HP",
            "Rate HC",
            "Rate HP",
            "Amount"
        )?;
        for line in &self.invoice.lines {
            let s = &line.session;
            let b = &line.breakdown;
            writeln!(
                f,
                "{:<10} {:>6} {:>6} {:>6} {:>9.2} {:>9.2} {:>9.2} {:>8.4} {:>8.4} {:>10.2}",
                s.start.format("%d/%m/%Y").to_string(),
                s.start.format("%Hh%M").to_string(),
                s.display_end().format("%Hh%M").to_string(),
                fmt_duration(s.active_duration_secs),
                b.total_kwh,
                b.off_peak_kwh,
                b.peak_kwh,
                line.rate.off_peak,
                line.rate.peak,
                b.amount_before_tax,
            )?;
        }
        if self.invoice.excluded > 0 {
            writeln!(
                f,
                "({} session(s) without energy or active time not billed)",
                self.invoice.excluded
            )?;
        }
        writeln!(f)?;

        write!(f, "{}", self.invoice.totals)?;
        writeln!(f)?;
        writeln!(f)?;
        write!(
            f,
            "{}",
            TariffConditions {
                schedule: self.schedule,
                bands: self.bands,
            }
        )
    }
}

impl fmt::Display for PeriodTotals {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Totals ---")?;
        writeln!(f, "Total energy:          {:.2} kWh", self.energy.total_kwh)?;
        writeln!(
            f,
            "Off-peak / peak:       {:.2} / {:.2} kWh",
            self.energy.off_peak_kwh, self.energy.peak_kwh
        )?;
        writeln!(
            f,
            "Off-peak share:        {} %",
            fmt_percent(self.energy.off_peak_share())
        )?;
        writeln!(f, "Total before tax:      {:.2} EUR", self.energy.amount_before_tax)?;
        let tax_label = format!("Tax ({}%):", fmt_percent(self.tax_rate));
        writeln!(f, "{tax_label:<23}{:.2} EUR", self.tax)?;
        writeln!(f, "Total incl. tax:       {:.2} EUR", self.total_incl_tax)?;
        writeln!(f, "Estimated distance:    {:.0} km", self.impact.distance_km)?;
        writeln!(f, "CO2 avoided:           {:.0} kg", self.impact.co2_avoided_kg)?;
        write!(f, "Tree equivalent:       {}", self.impact.tree_equivalent)
    }
}

/// Off-peak windows and the rate table as printed under the totals.
pub struct TariffConditions<'a> {
    pub schedule: &'a TariffSchedule,
    pub bands: &'a TimeOfDayBands,
}

impl fmt::Display for TariffConditions<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Tariff conditions ---")?;
        let windows: Vec<String> = self.bands.windows().iter().map(ToString::to_string).collect();
        writeln!(f, "Off-peak hours: {}", windows.join(" and "))?;
        let tax_note = if self.schedule.prices_include_tax() {
            "incl. tax"
        } else {
            "before tax"
        };
        for rate in self.schedule.rates() {
            writeln!(
                f,
                "From {}: HC {:.4} EUR/kWh | HP {:.4} EUR/kWh ({tax_note})",
                rate.effective.format("%d/%m/%Y"),
                rate.off_peak,
                rate.peak
            )?;
        }
        Ok(())
    }
}
