//! Error types shared across ingestion, tariff lookup and aggregation.

use chrono::NaiveDate;
use thiserror::Error;

use crate::config::ConfigError;

/// Errors raised while turning a CSV export into an invoice.
#[derive(Debug, Error)]
pub enum BillingError {
    /// A session falls outside the allowed energy/duration domain.
    #[error("invalid session at line {line}: {reason}")]
    InvalidSession {
        /// 1-based CSV line number (header is line 1), or 0 when not from a file.
        line: u64,
        /// Human-readable rejection reason.
        reason: String,
    },

    /// No tariff is in force on the session start date.
    #[error("no tariff in force on {date} (schedule starts {earliest})")]
    ScheduleGap {
        /// Calendar date that could not be priced.
        date: NaiveDate,
        /// Earliest effective date known to the schedule.
        earliest: NaiveDate,
    },

    /// The CSV header lacks columns needed to build sessions.
    #[error(
        "missing columns in CSV header: {} (found: {})",
        .missing.join(", "),
        .found.join(" | ")
    )]
    MissingColumns {
        missing: Vec<String>,
        found: Vec<String>,
    },

    /// Tariff table rejected at construction.
    #[error("invalid tariff schedule: {0}")]
    InvalidSchedule(String),

    /// Billing period string is not `YYYY-MM`.
    #[error("invalid billing period \"{0}\", expected YYYY-MM")]
    InvalidPeriod(String),

    /// One or more configuration constraints failed.
    #[error("{}", join_config_errors(.0))]
    Config(Vec<ConfigError>),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

fn join_config_errors(errors: &[ConfigError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl From<ConfigError> for BillingError {
    fn from(err: ConfigError) -> Self {
        Self::Config(vec![err])
    }
}

pub type Result<T> = std::result::Result<T, BillingError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schedule_gap_names_both_dates() {
        let err = BillingError::ScheduleGap {
            date: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
            earliest: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        };
        let msg = err.to_string();
        assert!(msg.contains("2020-01-01"));
        assert!(msg.contains("2024-01-01"));
    }

    #[test]
    fn missing_columns_lists_names() {
        let err = BillingError::MissingColumns {
            missing: vec!["start".to_string(), "energy".to_string()],
            found: vec!["a;b".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "missing columns in CSV header: start, energy (found: a;b)"
        );
    }

    #[test]
    fn config_errors_are_joined() {
        let err = BillingError::Config(vec![
            ConfigError::new("billing.tax_rate", "must be >= 0"),
            ConfigError::new("tariff.rates", "must not be empty"),
        ]);
        let msg = err.to_string();
        assert!(msg.contains("billing.tax_rate"));
        assert!(msg.contains("tariff.rates"));
    }
}
