//! CSV export of invoice lines.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::billing::InvoiceLine;
use crate::io::import::fmt_duration;

/// Column header for the invoice line export.
const HEADER: &str = "date,start,end,active_duration,total_kwh,off_peak_kwh,peak_kwh,\
                      off_peak_rate,peak_rate,amount_before_tax";

/// Exports invoice lines to a CSV file at the given path.
///
/// # Errors
///
/// Returns an error if file creation or writing fails.
pub fn export_csv(lines: &[InvoiceLine], path: &Path) -> csv::Result<()> {
    let file = File::create(path)?;
    write_csv(lines, io::BufWriter::new(file))
}

/// Writes invoice lines as CSV to any writer.
///
/// Amounts keep full precision; dates use ISO layout so the file sorts and
/// re-imports cleanly.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_csv(lines: &[InvoiceLine], writer: impl Write) -> csv::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);

    wtr.write_record(HEADER.split(',').map(str::trim))?;

    for l in lines {
        let s = &l.session;
        wtr.write_record(&[
            s.start.format("%Y-%m-%d").to_string(),
            s.start.format("%H:%M").to_string(),
            s.display_end().format("%H:%M").to_string(),
            fmt_duration(s.active_duration_secs),
            format!("{:.6}", l.breakdown.total_kwh),
            format!("{:.6}", l.breakdown.off_peak_kwh),
            format!("{:.6}", l.breakdown.peak_kwh),
            format!("{:.6}", l.rate.off_peak),
            format!("{:.6}", l.rate.peak),
            format!("{:.6}", l.breakdown.amount_before_tax),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}
