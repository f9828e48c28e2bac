//! ev-invoice entry point: CLI wiring and config-driven invoice construction.

mod cli;

use std::process;

use tracing::warn;

use ev_invoice::billing::Invoice;
use ev_invoice::config::BillingConfig;
use ev_invoice::error::{BillingError, Result};
use ev_invoice::io::export::export_csv;
use ev_invoice::io::filter::{
    BillingPeriod, VehicleFilter, available_periods, distinct_identities, select_imported,
};
use ev_invoice::io::import::read_sessions_from_path;
use ev_invoice::report::{InvoiceReport, SessionPreview};
use ev_invoice::telemetry::init_tracing;

use crate::cli::CliOptions;

/// Resolves configuration: `--config` takes priority, then `--preset`, then the reference tariff.
fn load_config(cli: &CliOptions) -> Result<BillingConfig> {
    let mut config = if let Some(ref path) = cli.config {
        BillingConfig::from_toml_file(path)?
    } else if let Some(ref name) = cli.preset {
        BillingConfig::from_preset(name)?
    } else {
        BillingConfig::reference()
    };

    if let Some(tax_rate) = cli.tax_rate {
        config.billing.tax_rate = tax_rate;
    }
    Ok(config)
}

fn run(cli: &CliOptions) -> Result<()> {
    let config = load_config(cli)?;
    let allocator = config.allocator()?;
    let period = cli
        .period
        .as_deref()
        .map(str::parse::<BillingPeriod>)
        .transpose()?;

    let report = read_sessions_from_path(&cli.sessions_csv, &config.ingest)?;
    if !report.rejected.is_empty() {
        if cli.strict {
            return Err(report.rejected[0].clone().into());
        }
        eprintln!("Skipped {} unreadable row(s)", report.rejected.len());
    }

    if cli.list {
        println!("Vehicles:");
        for identity in distinct_identities(&report.sessions) {
            println!("  {identity}");
        }
        println!("Periods:");
        for p in available_periods(&report.sessions) {
            println!("  {p}");
        }
        return Ok(());
    }

    let vehicle = VehicleFilter::new(cli.vehicle.as_deref());
    let matched = select_imported(&report.sessions, &vehicle, period);
    if cli.preview {
        print!("{}", SessionPreview { sessions: &matched });
        return Ok(());
    }

    let sessions: Vec<_> = matched.iter().map(|s| s.session.clone()).collect();
    let invoice = Invoice::build(&sessions, &allocator, &config.impact)?;

    if invoice.is_empty() {
        warn!(period = ?cli.period, vehicle = ?cli.vehicle, "nothing to bill");
        eprintln!("No billable session for this vehicle and period; no invoice produced.");
        return Ok(());
    }

    println!(
        "{}",
        InvoiceReport {
            invoice: &invoice,
            period,
            vehicle: cli.vehicle.as_deref(),
            schedule: allocator.schedule(),
            bands: allocator.bands(),
        }
    );

    if let Some(ref path) = cli.lines_out {
        export_csv(&invoice.lines, path)?;
        eprintln!("Invoice lines written to {}", path.display());
    }

    #[cfg(feature = "api")]
    if cli.serve {
        use std::net::SocketAddr;
        use std::sync::Arc;

        let state = Arc::new(ev_invoice::api::AppState {
            invoice,
            period,
            vehicle: cli.vehicle.clone(),
            rejected_rows: report.rejected.len(),
        });
        let addr = SocketAddr::from(([0, 0, 0, 0], cli.port));
        let rt = tokio::runtime::Runtime::new()?;
        rt.block_on(ev_invoice::api::serve(state, addr))?;
    }

    Ok(())
}

fn main() {
    let cli = cli::parse_args();
    init_tracing(cli.verbose);

    if let Err(e) = run(&cli) {
        eprintln!("error: {e}");
        let code = match e {
            BillingError::Config(_) | BillingError::InvalidPeriod(_) => 2,
            _ => 1,
        };
        process::exit(code);
    }
}
