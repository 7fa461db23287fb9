// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of Heliora.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Spanish month names in calendar order, as printed on invoices.
pub const MONTH_NAMES: [&str; 12] = [
    "Enero",
    "Febrero",
    "Marzo",
    "Abril",
    "Mayo",
    "Junio",
    "Julio",
    "Agosto",
    "Septiembre",
    "Octubre",
    "Noviembre",
    "Diciembre",
];

/// Calendar position (1-12) of a Spanish month name, case-insensitive.
/// Unknown names yield `None` and sort last.
#[must_use]
pub fn month_position(name: &str) -> Option<u32> {
    MONTH_NAMES
        .iter()
        .position(|m| m.eq_ignore_ascii_case(name.trim()))
        .map(|i| u32::try_from(i + 1).unwrap_or(13))
}

/// One itemized energy transaction line from an invoice:
/// quantity, unit price, and the billed subtotal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EnergyLine {
    pub volume_kwh: f64,
    pub unit_price: f64,
    pub amount: f64,
}

/// Per-kWh tariff component breakdown printed on the invoice.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct UnitTariffs {
    pub generation: f64,
    pub commercialization: f64,
    pub transmission: f64,
    pub restrictions: f64,
    pub distribution: f64,
    pub losses: f64,
}

/// A structured utility invoice, uniquely identified by
/// (account code, year, month name).
///
/// Mutated only by upsert-on-conflict: an update refreshes every derived
/// field, never the key. The store stamps its own `updated_at` column;
/// extraction output carries none.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    // Natural key
    pub account_code: String,
    pub year: i32,
    /// Spanish month name, e.g. "Noviembre"
    pub month: String,

    /// Plant display name resolved from the account code ("" if unknown)
    pub plant_name: String,
    pub period_start: Option<NaiveDate>,
    pub period_end: Option<NaiveDate>,

    // Itemized energy transaction lines
    pub imported: EnergyLine,
    pub energy_credit: EnergyLine,
    pub hourly_valuation: EnergyLine,

    // Standalone figures
    pub total_surplus_kwh: f64,
    pub applied_tariff: f64,
    pub accumulated_balance: f64,
    /// Pass-through charges billed on behalf of other entities
    pub other_charges: f64,
    pub prior_balance: f64,
    /// Total billed for energy (before third-party charges)
    pub total_billed: f64,
    /// Total amount due on the invoice
    pub amount_due: f64,
    /// Independent "consumption for the month" figure (cross-check)
    pub month_consumption_kwh: f64,

    pub unit_tariffs: UnitTariffs,
}

impl Invoice {
    /// Ordering key: year first, then calendar month position.
    /// Unknown month names sort after December.
    #[must_use]
    pub fn sort_key(&self) -> (i32, u32) {
        (self.year, month_position(&self.month).unwrap_or(13))
    }
}
