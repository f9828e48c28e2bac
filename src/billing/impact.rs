//! Estimated driving distance and avoided emissions for a quantity of energy.

use serde::{Deserialize, Serialize};

/// Constants used to turn charged energy into a distance and CO2 estimate.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImpactModel {
    /// Vehicle consumption (kWh per km).
    pub kwh_per_km: f64,
    /// Reference fossil-fuel vehicle emissions (g CO2 per km).
    pub baseline_g_per_km: f64,
    /// Electric vehicle emissions attributed to electricity (g CO2 per km).
    pub ev_g_per_km: f64,
    /// CO2 absorbed by one tree per year (kg).
    pub kg_per_tree: f64,
}

impl Default for ImpactModel {
    fn default() -> Self {
        Self {
            kwh_per_km: 0.165,
            baseline_g_per_km: 120.0,
            ev_g_per_km: 4.5,
            kg_per_tree: 25.0,
        }
    }
}

/// Distance and emissions figures derived from total energy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ImpactEstimate {
    pub distance_km: f64,
    pub co2_avoided_kg: f64,
    pub tree_equivalent: u32,
}

impl ImpactModel {
    /// Estimates the impact of `total_kwh`.
    ///
    /// # Examples
    ///
    /// ```
    /// use ev_invoice::billing::impact::ImpactModel;
    ///
    /// let est = ImpactModel::default().estimate(165.0);
    /// assert!((est.distance_km - 1000.0).abs() < 1e-9);
    /// assert!((est.co2_avoided_kg - 115.5).abs() < 1e-9);
    /// assert_eq!(est.tree_equivalent, 5);
    /// ```
    pub fn estimate(&self, total_kwh: f64) -> ImpactEstimate {
        if total_kwh <= 0.0 || self.kwh_per_km <= 0.0 {
            return ImpactEstimate::default();
        }
        let distance_km = total_kwh / self.kwh_per_km;
        let baseline_kg = distance_km * self.baseline_g_per_km / 1000.0;
        let ev_kg = distance_km * self.ev_g_per_km / 1000.0;
        let co2_avoided_kg = (baseline_kg - ev_kg).max(0.0);
        let tree_equivalent = if self.kg_per_tree > 0.0 {
            (co2_avoided_kg / self.kg_per_tree).round() as u32
        } else {
            0
        };
        ImpactEstimate {
            distance_km,
            co2_avoided_kg,
            tree_equivalent,
        }
    }
}
