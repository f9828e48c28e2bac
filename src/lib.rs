//! Monthly EV charging invoices from charging-station session exports.

#[cfg(feature = "api")]
pub mod api;
/// Session allocation, invoice totals and impact estimates.
pub mod billing;
pub mod config;
pub mod error;
pub mod io;
pub mod report;
/// Time-of-day bands and dated tariff schedules.
pub mod tariff;
pub mod telemetry;
