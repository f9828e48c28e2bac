//! Read-only REST view of a computed invoice.
//!
//! Provides two GET endpoints:
//! - `/invoice`: period, vehicle and totals
//! - `/sessions`: billed lines with optional date-range filtering

mod handlers;
mod types;

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tracing::info;

use crate::billing::Invoice;
use crate::io::filter::BillingPeriod;

/// Immutable application state shared across all request handlers.
///
/// Built once after the invoice is computed and wrapped in `Arc`; no locks
/// are needed since all data is read-only.
pub struct AppState {
    pub invoice: Invoice,
    pub period: Option<BillingPeriod>,
    pub vehicle: Option<String>,
    /// Rows skipped while reading the export.
    pub rejected_rows: usize,
}

/// Builds the axum router with all API routes.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/invoice", get(handlers::get_invoice))
        .route("/sessions", get(handlers::get_sessions))
        .with_state(state)
}

/// Binds to the given address and serves the API until the process exits.
///
/// # Errors
///
/// Returns an error if the listener cannot bind to `addr` or the server fails.
pub async fn serve(state: Arc<AppState>, addr: SocketAddr) -> io::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "API server listening");
    axum::serve(listener, app).await
}
