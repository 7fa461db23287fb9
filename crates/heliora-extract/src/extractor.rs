// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of Heliora.

use std::fmt;

use chrono::{Datelike, NaiveDate};
use thiserror::Error;
use tracing::debug;

use heliora_types::{Invoice, PlantRegistry, UnitTariffs};

use crate::rules;

/// Fields without which a document cannot be persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MandatoryField {
    AccountCode,
    BillingYear,
    MonthName,
}

impl fmt::Display for MandatoryField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::AccountCode => "account code",
            Self::BillingYear => "billing year",
            Self::MonthName => "month name",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("invoice text is missing mandatory fields: {}", format_fields(.0))]
    MissingFields(Vec<MandatoryField>),
}

fn format_fields(fields: &[MandatoryField]) -> String {
    fields
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Extract a structured invoice from raw document text.
///
/// Every optional field degrades to zero/empty on a pattern miss. The
/// only failure mode is a document missing its account code, billing
/// year, or month name; the error names all absent mandatory fields.
pub fn extract_invoice(text: &str, registry: &PlantRegistry) -> Result<Invoice, ExtractError> {
    let month = rules::capture_str(&rules::RE_MONTH, text);
    let account_code = rules::capture_str(&rules::RE_ACCOUNT, text);
    let (period_start, period_end) = extract_period(text);
    // Billing year comes from the period's end date
    let year = period_end.map(|d| d.year());

    let mut missing = Vec::new();
    if account_code.is_none() {
        missing.push(MandatoryField::AccountCode);
    }
    if year.is_none() {
        missing.push(MandatoryField::BillingYear);
    }
    if month.is_none() {
        missing.push(MandatoryField::MonthName);
    }
    if !missing.is_empty() {
        return Err(ExtractError::MissingFields(missing));
    }

    let account_code = account_code.unwrap_or_default();
    let plant_name = registry.name_for(&account_code);
    if plant_name.is_empty() {
        debug!(account_code, "account code not in plant registry");
    }

    Ok(Invoice {
        account_code,
        year: year.unwrap_or_default(),
        month: month.unwrap_or_default(),
        plant_name,
        period_start,
        period_end,
        imported: rules::energy_line(&rules::RE_IMPORTED_LINE, text),
        energy_credit: rules::energy_line(&rules::RE_CREDIT_LINE, text),
        hourly_valuation: rules::energy_line(&rules::RE_HOURLY_LINE, text),
        total_surplus_kwh: rules::capture_f64(&rules::RE_SURPLUS, text).unwrap_or(0.0),
        applied_tariff: rules::capture_f64(&rules::RE_APPLIED_TARIFF, text).unwrap_or(0.0),
        accumulated_balance: rules::capture_f64(&rules::RE_ACCUM_BALANCE, text).unwrap_or(0.0),
        other_charges: extract_other_charges(text),
        prior_balance: rules::capture_f64(&rules::RE_PRIOR_BALANCE, text).unwrap_or(0.0),
        total_billed: rules::first_of(&[&rules::RE_TOTAL_ENERGY, &rules::RE_SUBTOTAL], text),
        amount_due: rules::capture_f64(&rules::RE_AMOUNT_DUE, text).unwrap_or(0.0),
        month_consumption_kwh: rules::capture_f64(&rules::RE_MONTH_CONSUMPTION, text)
            .unwrap_or(0.0),
        unit_tariffs: extract_unit_tariffs(text),
    })
}

fn extract_period(text: &str) -> (Option<NaiveDate>, Option<NaiveDate>) {
    let Some(caps) = rules::RE_PERIOD.captures(text) else {
        return (None, None);
    };
    let parse = |i: usize| {
        caps.get(i)
            .and_then(|m| NaiveDate::parse_from_str(m.as_str(), "%d/%m/%Y").ok())
    };
    (parse(1), parse(2))
}

/// Six unit-tariff components, preferentially from the contiguous
/// labeled block; per-label fallbacks when the block pattern misses.
fn extract_unit_tariffs(text: &str) -> UnitTariffs {
    if let Some(caps) = rules::RE_TARIFF_BLOCK.captures(text) {
        let field = |i: usize| {
            caps.get(i)
                .map_or(0.0, |m| crate::numeric::normalize_number(m.as_str()))
        };
        return UnitTariffs {
            generation: field(1),
            commercialization: field(2),
            transmission: field(3),
            restrictions: field(4),
            distribution: field(5),
            losses: field(6),
        };
    }

    UnitTariffs {
        generation: rules::capture_f64(&rules::RE_T_GENERATION, text).unwrap_or(0.0),
        commercialization: rules::capture_f64(&rules::RE_T_COMMERCIALIZATION, text).unwrap_or(0.0),
        transmission: rules::capture_f64(&rules::RE_T_TRANSMISSION, text).unwrap_or(0.0),
        restrictions: rules::capture_f64(&rules::RE_T_RESTRICTIONS, text).unwrap_or(0.0),
        distribution: rules::capture_f64(&rules::RE_T_DISTRIBUTION, text).unwrap_or(0.0),
        losses: rules::capture_f64(&rules::RE_T_LOSSES, text).unwrap_or(0.0),
    }
}

/// Sum of the three named other-entity line items; when none match,
/// falls back to summing the two fee lines older layouts print.
fn extract_other_charges(text: &str) -> f64 {
    let items: Vec<f64> = [
        &rules::RE_PUBLIC_LIGHTING,
        &rules::RE_WASTE_COLLECTION,
        &rules::RE_OTHER_ITEMS,
    ]
    .iter()
    .filter_map(|re| rules::capture_f64(re, text))
    .collect();

    if !items.is_empty() {
        return items.iter().sum();
    }

    [&rules::RE_FIRE_LEVY, &rules::RE_MUNICIPAL_FEE]
        .iter()
        .filter_map(|re| rules::capture_f64(re, text))
        .sum()
}
