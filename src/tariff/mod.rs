//! Tariff schedule and time-of-day band definitions.

/// Off-peak window classification.
pub mod band;
/// Date-keyed unit prices.
pub mod schedule;

pub use band::{Band, ClockMinute, OffPeakWindow, TimeOfDayBands};
pub use schedule::{TariffRate, TariffSchedule, exclusive_from_inclusive};
