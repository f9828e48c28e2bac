//! Shared test fixtures for integration tests.

#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime};
use ev_invoice::billing::{ChargingSession, ImpactModel, SessionAllocator};

/// Path of the sample charger export, relative to the crate root.
pub const SESSIONS_CSV: &str = "tests/data/sessions.csv";

/// Builds a timestamp, panicking on an invalid date.
pub fn at(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .and_then(|date| date.and_hms_opt(h, min, s))
        .expect("valid fixture timestamp")
}

/// Session of `minutes` active minutes delivering `kwh`.
pub fn session(start: NaiveDateTime, minutes: u64, kwh: f64) -> ChargingSession {
    ChargingSession::new(start, minutes * 60, kwh).expect("valid fixture session")
}

/// Reference tariff, standard off-peak windows, 20% tax.
pub fn default_allocator() -> SessionAllocator {
    SessionAllocator::default()
}

/// Reference impact constants.
pub fn default_impact() -> ImpactModel {
    ImpactModel::default()
}

/// Asserts two floats are within `1e-9`.
pub fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}
