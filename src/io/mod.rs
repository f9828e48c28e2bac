//! Charger export ingestion and invoice line export.

pub mod export;
/// Vehicle and month selection.
pub mod filter;
pub mod import;
