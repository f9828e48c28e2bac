//! Date-keyed tariff table with tax-treatment handling.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{BillingError, Result};

/// Off-peak and peak unit prices (currency per kWh) in force from `effective` onward.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TariffRate {
    /// First calendar day the prices apply.
    pub effective: NaiveDate,
    /// Off-peak (HC) unit price.
    pub off_peak: f64,
    /// Peak (HP) unit price.
    pub peak: f64,
}

impl TariffRate {
    pub fn new(effective: NaiveDate, off_peak: f64, peak: f64) -> Self {
        Self {
            effective,
            off_peak,
            peak,
        }
    }

    /// Same rate with both prices converted from tax-inclusive to tax-exclusive.
    pub fn exclusive_of_tax(&self, tax_rate: f64) -> Self {
        Self {
            effective: self.effective,
            off_peak: exclusive_from_inclusive(self.off_peak, tax_rate),
            peak: exclusive_from_inclusive(self.peak, tax_rate),
        }
    }
}

/// Converts a tax-inclusive amount to its before-tax value.
///
/// # Examples
///
/// ```
/// use ev_invoice::tariff::exclusive_from_inclusive;
///
/// assert!((exclusive_from_inclusive(1.2, 0.2) - 1.0).abs() < 1e-12);
/// ```
pub fn exclusive_from_inclusive(price: f64, tax_rate: f64) -> f64 {
    price / (1.0 + tax_rate)
}

/// Tariff rates sorted by effective date.
///
/// The rate in force on a date is the entry with the greatest effective date
/// not after it. Dates before the first entry have no tariff.
#[derive(Debug, Clone, PartialEq)]
pub struct TariffSchedule {
    rates: Vec<TariffRate>,
    prices_include_tax: bool,
}

impl TariffSchedule {
    /// Builds a schedule, sorting `rates` by effective date.
    ///
    /// # Errors
    ///
    /// Returns [`BillingError::InvalidSchedule`] if `rates` is empty, two
    /// entries share an effective date, or a price is negative or not finite.
    pub fn new(mut rates: Vec<TariffRate>, prices_include_tax: bool) -> Result<Self> {
        if rates.is_empty() {
            return Err(BillingError::InvalidSchedule(
                "at least one rate is required".to_string(),
            ));
        }
        for r in &rates {
            for (name, price) in [("off_peak", r.off_peak), ("peak", r.peak)] {
                if !price.is_finite() || price < 0.0 {
                    return Err(BillingError::InvalidSchedule(format!(
                        "{name} price {price} effective {} must be a finite value >= 0",
                        r.effective
                    )));
                }
            }
        }
        rates.sort_by_key(|r| r.effective);
        if let Some(pair) = rates.windows(2).find(|w| w[0].effective == w[1].effective) {
            return Err(BillingError::InvalidSchedule(format!(
                "duplicate effective date {}",
                pair[0].effective
            )));
        }
        Ok(Self {
            rates,
            prices_include_tax,
        })
    }

    /// The reference table: one cutover on 2025-08-01.
    pub fn reference() -> Self {
        Self {
            rates: reference_rates(),
            prices_include_tax: false,
        }
    }

    pub fn rates(&self) -> &[TariffRate] {
        &self.rates
    }

    pub fn prices_include_tax(&self) -> bool {
        self.prices_include_tax
    }

    /// Same table with a different tax-treatment flag.
    pub fn with_prices_include_tax(mut self, prices_include_tax: bool) -> Self {
        self.prices_include_tax = prices_include_tax;
        self
    }

    /// Earliest effective date in the table.
    pub fn earliest(&self) -> NaiveDate {
        // `new` guarantees at least one entry.
        self.rates[0].effective
    }

    /// Returns the rate in force on `date`, as stored.
    ///
    /// # Errors
    ///
    /// Returns [`BillingError::ScheduleGap`] when `date` precedes the first entry.
    pub fn rate_for(&self, date: NaiveDate) -> Result<&TariffRate> {
        // Number of entries effective on or before `date`.
        let idx = self.rates.partition_point(|r| r.effective <= date);
        match idx.checked_sub(1) {
            Some(i) => Ok(&self.rates[i]),
            None => Err(BillingError::ScheduleGap {
                date,
                earliest: self.earliest(),
            }),
        }
    }

    /// Returns the before-tax rate in force on `date`.
    ///
    /// # Errors
    ///
    /// Returns [`BillingError::ScheduleGap`] when `date` precedes the first entry.
    pub fn pre_tax_rate_for(&self, date: NaiveDate, tax_rate: f64) -> Result<TariffRate> {
        let rate = self.rate_for(date)?;
        if self.prices_include_tax {
            Ok(rate.exclusive_of_tax(tax_rate))
        } else {
            Ok(*rate)
        }
    }
}

impl Default for TariffSchedule {
    fn default() -> Self {
        Self::reference()
    }
}

/// First day of the reference table.
const REFERENCE_START: NaiveDate = ymd(2024, 1, 1);
/// Day the reference prices changed.
const REFERENCE_CUTOVER: NaiveDate = ymd(2025, 8, 1);

/// HC/HP prices before and after the 2025-08-01 cutover.
pub fn reference_rates() -> Vec<TariffRate> {
    vec![
        TariffRate::new(REFERENCE_START, 0.1696, 0.2146),
        TariffRate::new(REFERENCE_CUTOVER, 0.1635, 0.2081),
    ]
}

/// Date literal checked at compile time.
const fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    match NaiveDate::from_ymd_opt(y, m, d) {
        Some(date) => date,
        None => panic!("invalid date literal"),
    }
}
