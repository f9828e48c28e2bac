//! TOML-based billing configuration and preset definitions.

use std::fs;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::billing::{ImpactModel, SessionAllocator};
use crate::error::BillingError;
use crate::tariff::band::standard_windows;
use crate::tariff::schedule::reference_rates;
use crate::tariff::{OffPeakWindow, TariffRate, TariffSchedule, TimeOfDayBands};

/// Top-level billing configuration parsed from TOML.
///
/// All sections have defaults matching the reference tariff. Load from TOML
/// with [`BillingConfig::from_toml_file`] or use [`BillingConfig::reference`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BillingConfig {
    /// Tax parameters.
    #[serde(default)]
    pub billing: TaxConfig,
    /// Tariff table and its tax treatment.
    #[serde(default)]
    pub tariff: TariffConfig,
    /// Daily off-peak windows.
    #[serde(default)]
    pub off_peak: OffPeakConfig,
    /// Distance/CO2 estimate constants.
    #[serde(default)]
    pub impact: ImpactModel,
    /// CSV reading options.
    #[serde(default)]
    pub ingest: IngestConfig,
}

/// Tax parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TaxConfig {
    /// Tax rate applied on top of the before-tax total (0.20 = 20%).
    pub tax_rate: f64,
}

impl Default for TaxConfig {
    fn default() -> Self {
        Self { tax_rate: 0.20 }
    }
}

/// Tariff table and its tax treatment.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TariffConfig {
    /// Whether the stored unit prices already include tax.
    pub prices_include_tax: bool,
    /// Rates keyed by effective date; order does not matter.
    pub rates: Vec<TariffRate>,
}

impl Default for TariffConfig {
    fn default() -> Self {
        Self {
            prices_include_tax: false,
            rates: reference_rates(),
        }
    }
}

/// Daily off-peak windows, bounds inclusive.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OffPeakConfig {
    pub windows: Vec<OffPeakWindow>,
}

impl Default for OffPeakConfig {
    fn default() -> Self {
        Self {
            windows: standard_windows(),
        }
    }
}

/// Unit of the energy column in the charger export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnergyUnit {
    Wh,
    Kwh,
}

impl EnergyUnit {
    /// Converts a raw column value to kWh.
    pub fn to_kwh(self, value: f64) -> f64 {
        match self {
            Self::Wh => value / 1000.0,
            Self::Kwh => value,
        }
    }
}

/// CSV reading options.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IngestConfig {
    /// Single-byte field delimiter.
    pub delimiter: String,
    /// Unit of the energy column.
    pub energy_unit: EnergyUnit,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            delimiter: ",".to_string(),
            energy_unit: EnergyUnit::Wh,
        }
    }
}

impl IngestConfig {
    /// Delimiter as a byte, falling back to `,` for values `validate` rejects.
    pub fn delimiter_byte(&self) -> u8 {
        match self.delimiter.as_bytes() {
            [b] => *b,
            _ => b',',
        }
    }
}

/// Configuration error with field path and constraint description.
#[derive(Debug, Clone, Error)]
#[error("config error: {field}: {message}")]
pub struct ConfigError {
    /// Dotted field path (e.g., `"billing.tax_rate"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl ConfigError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl BillingConfig {
    /// Reference tariff with prices stored before tax.
    pub fn reference() -> Self {
        Self::default()
    }

    /// Reference tariff with the same figures read as tax-inclusive prices.
    pub fn reference_ttc() -> Self {
        Self {
            tariff: TariffConfig {
                prices_include_tax: true,
                ..TariffConfig::default()
            },
            ..Self::default()
        }
    }

    /// Available preset names.
    pub const PRESETS: &[&str] = &["reference", "reference_ttc"];

    /// Loads a configuration from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "reference" => Ok(Self::reference()),
            "reference_ttc" => Ok(Self::reference_ttc()),
            _ => Err(ConfigError::new(
                "preset",
                format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            )),
        }
    }

    /// Parses a configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| {
            ConfigError::new("config", format!("cannot read \"{}\": {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::new("toml", e.to_string()))
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        let tax = self.billing.tax_rate;
        if !tax.is_finite() || tax < 0.0 {
            errors.push(ConfigError::new("billing.tax_rate", "must be a finite value >= 0"));
        }

        if let Err(e) = TariffSchedule::new(self.tariff.rates.clone(), false) {
            errors.push(ConfigError::new("tariff.rates", e.to_string()));
        }

        for (i, w) in self.off_peak.windows.iter().enumerate() {
            if w.start > w.end {
                errors.push(ConfigError::new(
                    format!("off_peak.windows[{i}]"),
                    format!("start {} must not be after end {}", w.start, w.end),
                ));
            }
        }

        let imp = &self.impact;
        if !imp.kwh_per_km.is_finite() || imp.kwh_per_km <= 0.0 {
            errors.push(ConfigError::new("impact.kwh_per_km", "must be a finite value > 0"));
        }
        if !imp.kg_per_tree.is_finite() || imp.kg_per_tree <= 0.0 {
            errors.push(ConfigError::new("impact.kg_per_tree", "must be a finite value > 0"));
        }
        for (field, value) in [
            ("impact.baseline_g_per_km", imp.baseline_g_per_km),
            ("impact.ev_g_per_km", imp.ev_g_per_km),
        ] {
            if !value.is_finite() || value < 0.0 {
                errors.push(ConfigError::new(field, "must be a finite value >= 0"));
            }
        }

        if self.ingest.delimiter.len() != 1 {
            errors.push(ConfigError::new(
                "ingest.delimiter",
                format!("must be a single ASCII character, got \"{}\"", self.ingest.delimiter),
            ));
        }

        errors
    }

    /// Builds the tariff schedule described by this configuration.
    ///
    /// # Errors
    ///
    /// Returns [`BillingError::InvalidSchedule`] if the rate table is invalid.
    pub fn schedule(&self) -> Result<TariffSchedule, BillingError> {
        TariffSchedule::new(self.tariff.rates.clone(), self.tariff.prices_include_tax)
    }

    pub fn bands(&self) -> TimeOfDayBands {
        TimeOfDayBands::new(self.off_peak.windows.clone())
    }

    /// Builds a session allocator after validating the whole configuration.
    ///
    /// # Errors
    ///
    /// Returns [`BillingError::Config`] listing every failed constraint.
    pub fn allocator(&self) -> Result<SessionAllocator, BillingError> {
        let errors = self.validate();
        if !errors.is_empty() {
            return Err(BillingError::Config(errors));
        }
        Ok(SessionAllocator::new(
            self.schedule()?,
            self.bands(),
            self.billing.tax_rate,
        ))
    }
}
