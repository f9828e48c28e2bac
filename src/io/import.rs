//! Charger CSV export reader.
//!
//! Columns are matched by exact header name (French export headers or their
//! English aliases); unknown columns are ignored. Rows that cannot become a
//! valid [`ChargingSession`] are reported as [`RejectedRow`]s and never reach
//! aggregation.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::NaiveDateTime;
use csv::{ReaderBuilder, StringRecord, Trim};
use serde::Deserialize;
use tracing::{info, warn};

use crate::billing::ChargingSession;
use crate::config::IngestConfig;
use crate::error::{BillingError, Result};

/// Timestamp layouts accepted for start/end columns.
const TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
];

/// Longest active charging time accepted for one session (7 days).
pub const MAX_ACTIVE_SECS: u64 = 7 * 24 * 3600;

/// Slack allowed when the active duration exceeds the wall-clock span.
const SPAN_TOLERANCE_SECS: i64 = 60;

const START_COLUMNS: &[&str] = &["Date/heure de début", "start"];
const ENERGY_COLUMNS: &[&str] = &["Énergie consommée (Wh)", "energy_wh", "energy"];
const TIMING_COLUMNS: &[&str] = &[
    "Date/heure de fin",
    "end",
    "Temps de charge active",
    "active_duration",
];

#[derive(Debug, Deserialize)]
struct RawRow {
    #[serde(rename = "Date/heure de début", alias = "start")]
    start: String,
    #[serde(rename = "Date/heure de fin", alias = "end", default)]
    end: Option<String>,
    #[serde(rename = "Énergie consommée (Wh)", alias = "energy_wh", alias = "energy")]
    energy: String,
    #[serde(rename = "Authentification", alias = "identity", default)]
    identity: Option<String>,
    #[serde(rename = "Temps de charge active", alias = "active_duration", default)]
    active_duration: Option<String>,
}

/// A parsed session with the vehicle identity it was recorded under.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportedSession {
    pub identity: String,
    pub session: ChargingSession,
}

/// A CSV row that was excluded, with its 1-based line number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedRow {
    pub line: u64,
    pub reason: String,
}

impl From<RejectedRow> for BillingError {
    fn from(row: RejectedRow) -> Self {
        Self::InvalidSession {
            line: row.line,
            reason: row.reason,
        }
    }
}

/// Outcome of reading one export.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportReport {
    pub sessions: Vec<ImportedSession>,
    pub rejected: Vec<RejectedRow>,
}

/// Reads sessions from the CSV file at `path`.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or its header row is unreadable.
pub fn read_sessions_from_path(path: &Path, config: &IngestConfig) -> Result<ImportReport> {
    let file = File::open(path)?;
    read_sessions(file, config)
}

/// Reads sessions from any CSV source.
///
/// Invalid rows are collected in [`ImportReport::rejected`] rather than
/// failing the whole read.
///
/// # Errors
///
/// Returns an error if the header row cannot be read, or
/// [`BillingError::MissingColumns`] if it lacks the start, energy, or both
/// end and active-duration columns (usually a wrong delimiter).
pub fn read_sessions(reader: impl Read, config: &IngestConfig) -> Result<ImportReport> {
    let mut rdr = ReaderBuilder::new()
        .delimiter(config.delimiter_byte())
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);
    let headers = rdr.headers()?.clone();
    check_columns(&headers)?;

    let mut report = ImportReport::default();
    for (idx, result) in rdr.records().enumerate() {
        // Header occupies line 1.
        let fallback_line = idx as u64 + 2;
        let outcome = match result {
            Ok(record) => {
                let line = record.position().map_or(fallback_line, |p| p.line());
                parse_record(&record, &headers, config)
                    .map_err(|reason| RejectedRow { line, reason })
            }
            Err(e) => Err(RejectedRow {
                line: fallback_line,
                reason: e.to_string(),
            }),
        };
        match outcome {
            Ok(session) => report.sessions.push(session),
            Err(row) => {
                warn!(line = row.line, reason = %row.reason, "rejected session row");
                report.rejected.push(row);
            }
        }
    }

    info!(
        accepted = report.sessions.len(),
        rejected = report.rejected.len(),
        "read charger export"
    );
    Ok(report)
}

/// Fails when a required column is absent from the header row.
fn check_columns(headers: &StringRecord) -> Result<()> {
    let has_any = |names: &[&str]| headers.iter().any(|h| names.contains(&h));
    let missing: Vec<String> = [
        (START_COLUMNS, START_COLUMNS[0]),
        (ENERGY_COLUMNS, ENERGY_COLUMNS[0]),
        (TIMING_COLUMNS, "Date/heure de fin or Temps de charge active"),
    ]
    .into_iter()
    .filter(|(names, _)| !has_any(names))
    .map(|(_, label)| label.to_string())
    .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(BillingError::MissingColumns {
            missing,
            found: headers.iter().map(str::to_string).collect(),
        })
    }
}

fn parse_record(
    record: &StringRecord,
    headers: &StringRecord,
    config: &IngestConfig,
) -> std::result::Result<ImportedSession, String> {
    let raw: RawRow = record
        .deserialize(Some(headers))
        .map_err(|e| format!("malformed row: {e}"))?;

    let start = parse_timestamp(&raw.start)
        .ok_or_else(|| format!("unrecognised start timestamp \"{}\"", raw.start))?;
    let end = raw.end.as_deref().and_then(parse_timestamp);

    let energy = parse_number(&raw.energy)
        .ok_or_else(|| format!("energy \"{}\" is not a number", raw.energy))?;
    if energy < 0.0 {
        return Err(format!("negative energy {energy}"));
    }

    let active_secs = match raw.active_duration.as_deref().filter(|s| !s.is_empty()) {
        Some(text) => parse_active_duration(text)
            .ok_or_else(|| format!("unrecognised active duration \"{text}\""))?,
        None => {
            let end = end.ok_or("no active duration and no end time")?;
            let secs = (end - start).num_seconds();
            u64::try_from(secs).map_err(|_| format!("end {end} is before start {start}"))?
        }
    };
    if active_secs > MAX_ACTIVE_SECS {
        return Err(format!(
            "active duration {} exceeds the {} limit",
            fmt_duration(active_secs),
            fmt_duration(MAX_ACTIVE_SECS)
        ));
    }
    if let Some(end) = end {
        let span = (end - start).num_seconds();
        if i64::try_from(active_secs).is_ok_and(|active| active > span + SPAN_TOLERANCE_SECS) {
            return Err(format!(
                "active duration {} is longer than {start} to {end}",
                fmt_duration(active_secs)
            ));
        }
    }

    let mut session = ChargingSession::new(start, active_secs, config.energy_unit.to_kwh(energy))
        .map_err(|e| e.to_string())?;
    session.end = end;

    Ok(ImportedSession {
        identity: raw.identity.unwrap_or_default(),
        session,
    })
}

/// Parses a start/end timestamp in one of the accepted layouts.
pub fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
}

/// Parses a decimal number, accepting a comma as decimal separator.
fn parse_number(text: &str) -> Option<f64> {
    let text = text.trim().replace('\u{a0}', "");
    let value: f64 = if text.contains('.') {
        text.parse().ok()?
    } else {
        text.replace(',', ".").parse().ok()?
    };
    value.is_finite().then_some(value)
}

/// Parses an active charging duration.
///
/// Accepts unit-tagged text (`"1 hr 5 min 30 sec"`, `"2h05"`, `"45 min"`) or a
/// clock layout (`"01:05:30"`, `"01:05"`). Returns `None` if nothing is recognised.
///
/// # Examples
///
/// ```
/// use ev_invoice::io::import::parse_active_duration;
///
/// assert_eq!(parse_active_duration("1 hr 5 min 30 sec"), Some(3930));
/// assert_eq!(parse_active_duration("01:05:30"), Some(3930));
/// assert_eq!(parse_active_duration("n/a"), None);
/// ```
pub fn parse_active_duration(text: &str) -> Option<u64> {
    let text = text.trim().to_lowercase();
    if text.contains(':') {
        return parse_clock_duration(&text);
    }

    let mut total = 0_u64;
    let mut seen = false;
    let mut last_factor = 0_u64;
    let mut rest = text.as_str();
    loop {
        rest = rest.trim_start_matches(|c: char| !c.is_ascii_digit());
        if rest.is_empty() {
            break;
        }
        let digits_end = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
        let value: u64 = rest[..digits_end].parse().ok()?;
        rest = rest[digits_end..].trim_start();
        let unit_end = rest.find(|c: char| !c.is_alphabetic()).unwrap_or(rest.len());
        let factor = match &rest[..unit_end] {
            "h" | "hr" | "hrs" | "hour" | "hours" | "heure" | "heures" => 3600,
            "m" | "mn" | "min" | "mins" | "minute" | "minutes" => 60,
            "s" | "sec" | "secs" | "second" | "seconds" | "seconde" | "secondes" => 1,
            // "2h05": a bare number after hours is minutes.
            "" if last_factor == 3600 => 60,
            _ => return None,
        };
        total = total.checked_add(value.checked_mul(factor)?)?;
        last_factor = factor;
        seen = true;
        rest = &rest[unit_end..];
    }
    seen.then_some(total)
}

fn parse_clock_duration(text: &str) -> Option<u64> {
    let parts: Vec<u64> = text
        .split(':')
        .map(|p| p.trim().parse().ok())
        .collect::<Option<_>>()?;
    let (h, m, s) = match parts.as_slice() {
        [h, m] if *m < 60 => (*h, *m, 0),
        [h, m, s] if *m < 60 && *s < 60 => (*h, *m, *s),
        _ => return None,
    };
    h.checked_mul(3600)?.checked_add(m * 60 + s)
}

/// Formats seconds as `"{h}h{mm}"`, e.g. `3930` as `"1h05"`.
pub fn fmt_duration(secs: u64) -> String {
    if secs == 0 {
        return "0h00".to_string();
    }
    format!("{}h{:02}", secs / 3600, (secs % 3600) / 60)
}
