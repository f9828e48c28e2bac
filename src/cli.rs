use std::path::PathBuf;

use clap::Parser;

/// Builds an EV charging invoice from a charging-station CSV export.
///
/// Sessions are filtered by vehicle and month, their energy is split between
/// off-peak and peak hours minute by minute, and the result is priced with
/// the tariff in force on each session's start date.
#[derive(Parser, Debug)]
#[command(name = "ev-invoice", version, long_about)]
pub struct CliOptions {
    /// Charger export (CSV).
    pub sessions_csv: PathBuf,

    /// Billing month, `YYYY-MM`. All months when omitted.
    #[arg(short, long)]
    pub period: Option<String>,

    /// Case-insensitive part of the vehicle identity to bill.
    #[arg(short, long)]
    pub vehicle: Option<String>,

    /// Billing configuration (TOML).
    #[arg(long, conflicts_with = "preset")]
    pub config: Option<PathBuf>,

    /// Built-in configuration preset (`reference`, `reference_ttc`).
    #[arg(long)]
    pub preset: Option<String>,

    /// Override the configured tax rate (0.20 = 20%).
    #[arg(long)]
    pub tax_rate: Option<f64>,

    /// Write billed lines to this CSV file.
    #[arg(long)]
    pub lines_out: Option<PathBuf>,

    /// Fail instead of skipping rows that cannot be read.
    #[arg(long)]
    pub strict: bool,

    /// Show the matched sessions without pricing them, then exit.
    #[arg(long)]
    pub preview: bool,

    /// List vehicles and months found in the export, then exit.
    #[arg(long)]
    pub list: bool,

    /// Debug logging (overridden by `RUST_LOG`).
    #[arg(long)]
    pub verbose: bool,

    /// Serve the invoice over HTTP after printing it.
    #[cfg(feature = "api")]
    #[arg(long)]
    pub serve: bool,

    /// API server port.
    #[cfg(feature = "api")]
    #[arg(long, default_value_t = 3000)]
    pub port: u16,
}

pub fn parse_args() -> CliOptions {
    CliOptions::parse()
}

#[cfg(test)]
fn parse_args_from<I, T>(args: I) -> Result<CliOptions, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    CliOptions::try_parse_from(args)
}
