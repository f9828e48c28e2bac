//! Time-of-day classification into off-peak (HC) and peak (HP) bands.

use std::fmt;

use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

/// Minutes in a civil day.
const MINUTES_PER_DAY: u16 = 24 * 60;

/// Tariff band a given instant belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Band {
    OffPeak,
    Peak,
}

/// A clock time truncated to the minute, stored as minutes since midnight.
///
/// Deserializes from and serializes to `"HH:MM"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(try_from = "String", into = "String")]
pub struct ClockMinute(u16);

impl ClockMinute {
    /// Builds a clock minute from an hour (0-23) and minute (0-59).
    pub fn new(hour: u16, minute: u16) -> Option<Self> {
        (hour < 24 && minute < 60).then_some(Self(hour * 60 + minute))
    }

    /// Minute-of-day of `time`; seconds and sub-seconds are dropped.
    pub fn of(time: NaiveTime) -> Self {
        // hour() < 24 and minute() < 60, so this always fits below MINUTES_PER_DAY.
        Self((time.hour() * 60 + time.minute()) as u16)
    }

    pub fn minutes(self) -> u16 {
        self.0
    }
}

impl TryFrom<String> for ClockMinute {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl std::str::FromStr for ClockMinute {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NaiveTime::parse_from_str(s.trim(), "%H:%M")
            .map(Self::of)
            .map_err(|e| format!("invalid clock time \"{s}\" (expected HH:MM): {e}"))
    }
}

impl From<ClockMinute> for String {
    fn from(value: ClockMinute) -> Self {
        value.to_string()
    }
}

impl fmt::Display for ClockMinute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.0 / 60, self.0 % 60)
    }
}

/// One daily off-peak window `[start, end]`, both bounds inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct OffPeakWindow {
    pub start: ClockMinute,
    pub end: ClockMinute,
}

impl OffPeakWindow {
    pub fn new(start: ClockMinute, end: ClockMinute) -> Self {
        Self { start, end }
    }

    /// Returns `true` when `minute` lies inside the window, bounds included.
    pub fn contains(&self, minute: ClockMinute) -> bool {
        self.start <= minute && minute <= self.end
    }
}

impl fmt::Display for OffPeakWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.start, self.end)
    }
}

/// The recurring daily off-peak schedule. Any minute outside every window is peak.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeOfDayBands {
    windows: Vec<OffPeakWindow>,
}

impl TimeOfDayBands {
    pub fn new(windows: Vec<OffPeakWindow>) -> Self {
        Self { windows }
    }

    /// 00:06-06:06 and 15:06-17:06.
    pub fn standard() -> Self {
        Self::new(standard_windows())
    }

    pub fn windows(&self) -> &[OffPeakWindow] {
        &self.windows
    }

    /// Returns `true` if `time` falls in an off-peak window (minute granularity).
    ///
    /// # Examples
    ///
    /// ```
    /// use chrono::NaiveTime;
    /// use ev_invoice::tariff::TimeOfDayBands;
    ///
    /// let bands = TimeOfDayBands::standard();
    /// assert!(bands.is_off_peak(NaiveTime::from_hms_opt(6, 6, 0).unwrap()));
    /// assert!(!bands.is_off_peak(NaiveTime::from_hms_opt(6, 7, 0).unwrap()));
    /// ```
    pub fn is_off_peak(&self, time: NaiveTime) -> bool {
        let minute = ClockMinute::of(time);
        self.windows.iter().any(|w| w.contains(minute))
    }

    pub fn classify(&self, time: NaiveTime) -> Band {
        if self.is_off_peak(time) {
            Band::OffPeak
        } else {
            Band::Peak
        }
    }

    /// Off-peak minutes per day, counting overlapping windows once.
    pub fn off_peak_minutes_per_day(&self) -> u16 {
        (0..MINUTES_PER_DAY)
            .filter(|&m| self.windows.iter().any(|w| w.contains(ClockMinute(m))))
            .count() as u16
    }
}

impl Default for TimeOfDayBands {
    fn default() -> Self {
        Self::standard()
    }
}

/// The two reference off-peak windows.
pub fn standard_windows() -> Vec<OffPeakWindow> {
    vec![
        OffPeakWindow::new(ClockMinute(6), ClockMinute(6 * 60 + 6)),
        OffPeakWindow::new(ClockMinute(15 * 60 + 6), ClockMinute(17 * 60 + 6)),
    ]
}
