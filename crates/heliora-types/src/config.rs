// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of Heliora.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.
//
// For commercial licensing, please contact: info@solare.cz

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;

use crate::plant::{Plant, PlantRegistry};

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub database: DatabaseSettings,
    /// IANA zone used to bucket telemetry timestamps into local dates.
    /// One zone per deployment: the fleet is one-region.
    #[serde(default = "default_timezone")]
    pub timezone: String,
    #[serde(default)]
    pub tariffs: TariffModel,
    #[serde(default)]
    pub taxes: TaxSettings,
    pub plants: Vec<Plant>,
    #[serde(default)]
    pub investments: Vec<InvestmentRecord>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    #[serde(default = "default_db_path")]
    pub path: String,
    #[serde(default = "default_sample_retention_days")]
    pub sample_retention_days: u32,
}

/// Valuation constants for generated energy. Configuration, not state:
/// the engine never writes these back anywhere.
#[derive(Debug, Clone, Deserialize)]
pub struct TariffModel {
    /// €/kWh credited for energy consumed on-site instead of imported
    #[serde(default = "default_self_consumption_rate")]
    pub self_consumption_rate: f64,
    /// €/kWh credited for surplus exported to the grid
    #[serde(default = "default_export_rate")]
    pub export_rate: f64,
    /// Assumed fraction of generation consumed on-site
    #[serde(default = "default_self_consumption_share")]
    pub self_consumption_share: f64,
    /// Assumed fraction of generation exported
    #[serde(default = "default_export_share")]
    pub export_share: f64,
    /// Assumed equivalent full-sun hours per year for projections
    #[serde(default = "default_annual_sun_hours")]
    pub annual_sun_hours: f64,
}

/// Fixed tax-benefit factors applied to the total investment.
#[derive(Debug, Clone, Deserialize)]
pub struct TaxSettings {
    /// IRPF renta deduction as a fraction of the investment
    #[serde(default = "default_renta_deduction")]
    pub renta_deduction: f64,
    /// Depreciation tax shield as a fraction of the investment
    #[serde(default = "default_depreciation_shield")]
    pub depreciation_shield: f64,
}

/// Capital figures for one plant. External input, read-only to the engine.
#[derive(Debug, Clone, Deserialize)]
pub struct InvestmentRecord {
    pub plant_code: String,
    /// Amount invested (€)
    pub invested: f64,
    /// Whether this investment qualifies for the renta deduction
    #[serde(default = "default_tax_deductible")]
    pub tax_deductible: bool,
    #[serde(default = "default_depreciation_years")]
    pub depreciation_years: u32,
}

fn default_timezone() -> String {
    "Europe/Madrid".to_owned()
}

fn default_db_path() -> String {
    "./data/heliora.db".to_owned()
}

fn default_sample_retention_days() -> u32 {
    90
}

fn default_self_consumption_rate() -> f64 {
    0.15
}

fn default_export_rate() -> f64 {
    0.06
}

fn default_self_consumption_share() -> f64 {
    0.60
}

fn default_export_share() -> f64 {
    0.40
}

fn default_annual_sun_hours() -> f64 {
    1600.0
}

fn default_renta_deduction() -> f64 {
    0.20
}

fn default_depreciation_shield() -> f64 {
    0.07
}

fn default_tax_deductible() -> bool {
    true
}

fn default_depreciation_years() -> u32 {
    10
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            sample_retention_days: default_sample_retention_days(),
        }
    }
}

impl Default for TariffModel {
    fn default() -> Self {
        Self {
            self_consumption_rate: default_self_consumption_rate(),
            export_rate: default_export_rate(),
            self_consumption_share: default_self_consumption_share(),
            export_share: default_export_share(),
            annual_sun_hours: default_annual_sun_hours(),
        }
    }
}

impl Default for TaxSettings {
    fn default() -> Self {
        Self {
            renta_deduction: default_renta_deduction(),
            depreciation_shield: default_depreciation_shield(),
        }
    }
}

impl TaxSettings {
    /// Total tax benefit for a given investment amount.
    #[must_use]
    pub fn total_benefit(&self, invested: f64) -> f64 {
        invested * (self.renta_deduction + self.depreciation_shield)
    }
}

impl AppConfig {
    pub fn from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(Path::new(path))
            .with_context(|| format!("Failed to read config file: {path}"))?;
        let config: Self =
            toml::from_str(&content).with_context(|| "Failed to parse config TOML")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.plants.is_empty() {
            bail!("at least one plant must be configured");
        }
        let mut seen = HashSet::new();
        for plant in &self.plants {
            if !seen.insert(plant.account_code.as_str()) {
                bail!("duplicate account code in plants: {}", plant.account_code);
            }
            if plant.capacity_kwp <= 0.0 {
                bail!("plant {} has non-positive capacity", plant.code);
            }
        }
        let share_sum = self.tariffs.self_consumption_share + self.tariffs.export_share;
        if (share_sum - 1.0).abs() > 1e-6 {
            bail!("tariffs.self_consumption_share + tariffs.export_share must equal 1.0");
        }
        if self.tariffs.self_consumption_rate < 0.0 || self.tariffs.export_rate < 0.0 {
            bail!("tariff rates must be non-negative");
        }
        if self.timezone.parse::<chrono_tz::Tz>().is_err() {
            bail!("unknown timezone: {}", self.timezone);
        }
        Ok(())
    }

    /// The configured zone, validated on load.
    #[must_use]
    pub fn tz(&self) -> chrono_tz::Tz {
        self.timezone
            .parse::<chrono_tz::Tz>()
            .unwrap_or(chrono_tz::Europe::Madrid)
    }

    /// Account-code-to-name registry for the invoice extractor.
    #[must_use]
    pub fn plant_registry(&self) -> PlantRegistry {
        PlantRegistry::from_pairs(
            self.plants
                .iter()
                .map(|p| (p.account_code.clone(), p.name.clone())),
        )
    }

    /// Total invested across the fleet.
    #[must_use]
    pub fn total_investment(&self) -> f64 {
        self.investments.iter().map(|i| i.invested).sum()
    }

    /// Investment eligible for the renta deduction.
    #[must_use]
    pub fn deductible_investment(&self) -> f64 {
        self.investments
            .iter()
            .filter(|i| i.tax_deductible)
            .map(|i| i.invested)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_toml() -> &'static str {
        r#"
            timezone = "Europe/Madrid"

            [database]
            path = "/tmp/heliora-test.db"

            [tariffs]
            self_consumption_rate = 0.15
            export_rate = 0.06

            [[plants]]
            code = "CAB"
            name = "Cabañita"
            account_code = "1056060000"
            capacity_kwp = 5.2
            peak_sun_hours = 4.4
            performance_ratio = 0.8
            commissioned = "2023-06-01"

            [[investments]]
            plant_code = "CAB"
            invested = 7200.0
        "#
    }

    #[test]
    fn parses_and_validates_sample_config() {
        let config: AppConfig = toml::from_str(sample_toml()).expect("parse");
        config.validate().expect("valid");
        assert_eq!(config.plants.len(), 1);
        assert_eq!(config.total_investment(), 7200.0);
        assert_eq!(config.plant_registry().name_for("1056060000"), "Cabañita");
    }

    #[test]
    fn rejects_duplicate_account_codes() {
        let mut config: AppConfig = toml::from_str(sample_toml()).expect("parse");
        let dup = config.plants[0].clone();
        config.plants.push(dup);
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_shares_not_summing_to_one() {
        let mut config: AppConfig = toml::from_str(sample_toml()).expect("parse");
        config.tariffs.self_consumption_share = 0.7;
        assert!(config.validate().is_err());
    }

    #[test]
    fn tax_benefit_is_sum_of_both_factors() {
        let taxes = TaxSettings::default();
        let benefit = taxes.total_benefit(10_000.0);
        assert!((benefit - 2700.0).abs() < 1e-9);
    }
}
