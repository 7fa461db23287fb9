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

pub mod config;
pub mod invoice;
pub mod plant;
pub mod telemetry;

// Re-export common types for convenience
pub use config::{AppConfig, DatabaseSettings, InvestmentRecord, TariffModel, TaxSettings};
pub use invoice::{EnergyLine, Invoice, UnitTariffs, month_position};
pub use plant::{Plant, PlantRegistry, PlantStatus};
pub use telemetry::{DailyEnergyRecord, TelemetrySample};
