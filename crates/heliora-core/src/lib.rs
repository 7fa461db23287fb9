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

//! Heliora Reconciliation Core
//!
//! Pure, stateless computations over the billing-and-telemetry ledger:
//!
//! - **Energy Rollup Aggregator**: fuses realtime telemetry, daily
//!   snapshots, and historical per-day metrics into day/month/year/
//!   lifetime figures per plant, with explicit source-precedence rules
//! - **Payment Inference**: infers historical payment events from the
//!   invoice balance series (a heuristic — see [`payments`])
//! - **Financial Derivation**: payback, ROI, tax benefits, and recovery
//!   progress from the reconciled data
//!
//! Everything here is re-derivable from stored data at any time; the
//! core owns no long-lived state. Degenerate arithmetic (zero
//! denominators, empty series) resolves to zero, never an error.

pub mod finance;
pub mod payments;
pub mod rollup;
pub mod source;
pub mod types;

pub use finance::{FinancialInputs, derive_financials, invoice_savings};
pub use payments::{InferredPayments, infer_payments};
pub use rollup::build_plant_summary;
pub use source::{LedgerSource, build_fleet_report};
pub use types::*;
