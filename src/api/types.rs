//! API response and query types.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::billing::{InvoiceLine, PeriodTotals};

/// Invoice summary: context and totals.
#[derive(Debug, Serialize)]
pub struct InvoiceResponse {
    /// Billing month as `YYYY-MM`, absent when all months were billed.
    pub period: Option<String>,
    pub vehicle: Option<String>,
    pub billed_sessions: usize,
    pub excluded_sessions: usize,
    pub rejected_rows: usize,
    pub totals: PeriodTotals,
}

/// Optional inclusive start-date range for `/sessions`.
#[derive(Debug, Deserialize)]
pub struct SessionsQuery {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

/// One billed session as exposed over HTTP.
#[derive(Debug, Serialize)]
pub struct SessionRecord {
    pub start: String,
    pub end: String,
    pub active_duration_secs: u64,
    pub total_kwh: f64,
    pub off_peak_kwh: f64,
    pub peak_kwh: f64,
    pub off_peak_rate: f64,
    pub peak_rate: f64,
    pub amount_before_tax: f64,
}

impl From<&InvoiceLine> for SessionRecord {
    fn from(l: &InvoiceLine) -> Self {
        Self {
            start: l.session.start.format("%Y-%m-%dT%H:%M:%S").to_string(),
            end: l.session.display_end().format("%Y-%m-%dT%H:%M:%S").to_string(),
            active_duration_secs: l.session.active_duration_secs,
            total_kwh: l.breakdown.total_kwh,
            off_peak_kwh: l.breakdown.off_peak_kwh,
            peak_kwh: l.breakdown.peak_kwh,
            off_peak_rate: l.rate.off_peak,
            peak_rate: l.rate.peak,
            amount_before_tax: l.breakdown.amount_before_tax,
        }
    }
}

/// JSON error body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}
