// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of Heliora.

//! Field extraction rules for the utility-billing format family.
//!
//! Each field owns its own compiled pattern (plus an optional fallback
//! pattern) so individual rules can be tested and extended without risk
//! to the others. Patterns are anchored on the printed Spanish labels
//! and tolerant of spacing and accent variations.

use std::sync::LazyLock;

use regex::Regex;

use heliora_types::EnergyLine;

use crate::numeric::normalize_number;

macro_rules! rule {
    ($name:ident, $pattern:literal) => {
        pub static $name: LazyLock<Regex> =
            LazyLock::new(|| Regex::new($pattern).expect("valid pattern"));
    };
}

// Header fields
rule!(RE_MONTH, r"(?i)MES:\s*([A-Za-zÁÉÍÓÚÜÑáéíóúüñ]+)");
rule!(RE_ACCOUNT, r"(?i)C[ÓO]DIGO:\s*(\d{7,})");
rule!(
    RE_PERIOD,
    r"(?i)Periodo\s+facturado:\s*(\d{1,2}/\d{1,2}/\d{4})\s*al\s*(\d{1,2}/\d{1,2}/\d{4})"
);

// Itemized energy transaction lines: quantity, unit price, subtotal
rule!(
    RE_IMPORTED_LINE,
    r"(?im)^\s*Consumo\s+importado\s+([\d.,]+)\s*(?:kWh)?\s+([\d.,]+)\s+(-?[\d.,]+)"
);
rule!(
    RE_CREDIT_LINE,
    r"(?im)^\s*Cr[ée]dito\s+de\s+energ[íi]a\s+([\d.,]+)\s*(?:kWh)?\s+([\d.,]+)\s+(-?[\d.,]+)"
);
rule!(
    RE_HOURLY_LINE,
    r"(?im)^\s*Valoraci[óo]n\s+horaria\s+([\d.,]+)\s*(?:kWh)?\s+([\d.,]+)\s+(-?[\d.,]+)"
);

// Standalone figures
rule!(RE_SURPLUS, r"(?i)Excedentes?\s+totales?:?\s*([\d.,]+)");
rule!(RE_APPLIED_TARIFF, r"(?i)Tarifa\s+aplicada:?\s*([\d.,]+)");
rule!(RE_PRIOR_BALANCE, r"(?i)Saldo\s+anterior:?\s*(-?[\d.,]+)");
rule!(RE_ACCUM_BALANCE, r"(?i)Saldo\s+acumulado:?\s*(-?[\d.,]+)");
rule!(RE_AMOUNT_DUE, r"(?i)Total\s+a\s+pagar:?\s*(-?[\d.,]+)");
rule!(RE_MONTH_CONSUMPTION, r"(?i)Consumo\s+del\s+mes:?\s*([\d.,]+)");

// Total billed for energy: specific TOTAL label first, generic Subtotal second
rule!(RE_TOTAL_ENERGY, r"(?im)^\s*TOTAL\s+ENERG[ÍI]A:?\s*(-?[\d.,]+)");
rule!(RE_SUBTOTAL, r"(?im)Subtotal:\s*(-?[\d.,]+)");

// Unit-tariff components: one contiguous labeled block...
rule!(
    RE_TARIFF_BLOCK,
    r"(?is)Generaci[óo]n:?\s*([\d.,]+)\s+Comercializaci[óo]n:?\s*([\d.,]+)\s+Transporte:?\s*([\d.,]+)\s+Restricciones:?\s*([\d.,]+)\s+Distribuci[óo]n:?\s*([\d.,]+)\s+P[ée]rdidas:?\s*([\d.,]+)"
);
// ...with per-label fallbacks matched anywhere in the text
rule!(RE_T_GENERATION, r"(?im)Generaci[óo]n:?\s*([\d.,]+)");
rule!(RE_T_COMMERCIALIZATION, r"(?im)Comercializaci[óo]n:?\s*([\d.,]+)");
rule!(RE_T_TRANSMISSION, r"(?im)Transporte:?\s*([\d.,]+)");
rule!(RE_T_RESTRICTIONS, r"(?im)Restricciones:?\s*([\d.,]+)");
rule!(RE_T_DISTRIBUTION, r"(?im)Distribuci[óo]n:?\s*([\d.,]+)");
rule!(RE_T_LOSSES, r"(?im)P[ée]rdidas:?\s*([\d.,]+)");

// Pass-through charges from other entities
rule!(RE_PUBLIC_LIGHTING, r"(?i)Alumbrado\s+p[úu]blico:?\s*(-?[\d.,]+)");
rule!(RE_WASTE_COLLECTION, r"(?i)Recolecci[óo]n\s+de\s+basura:?\s*(-?[\d.,]+)");
rule!(RE_OTHER_ITEMS, r"(?i)Otros\s+cargos:?\s*(-?[\d.,]+)");
// Older layouts print two fee lines instead
rule!(RE_FIRE_LEVY, r"(?i)Contribuci[óo]n\s+bomberos:?\s*(-?[\d.,]+)");
rule!(RE_MUNICIPAL_FEE, r"(?i)Tasa\s+municipal:?\s*(-?[\d.,]+)");

/// First capture group of the first match, as text.
#[must_use]
pub fn capture_str(re: &Regex, text: &str) -> Option<String> {
    re.captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_owned())
}

/// First capture group of the first match, normalized to `f64`.
#[must_use]
pub fn capture_f64(re: &Regex, text: &str) -> Option<f64> {
    capture_str(re, text).map(|s| normalize_number(&s))
}

/// First capture group across an ordered list of patterns: the first
/// pattern that matches wins. No match yields `0.0`.
#[must_use]
pub fn first_of(patterns: &[&Regex], text: &str) -> f64 {
    patterns
        .iter()
        .find_map(|re| capture_f64(re, text))
        .unwrap_or(0.0)
}

/// Parse an itemized transaction line into (quantity, unit price,
/// subtotal). Absence of a match yields zeros, not a failure.
#[must_use]
pub fn energy_line(re: &Regex, text: &str) -> EnergyLine {
    re.captures(text).map_or_else(EnergyLine::default, |caps| {
        let field = |i: usize| {
            caps.get(i)
                .map_or(0.0, |m| normalize_number(m.as_str()))
        };
        EnergyLine {
            volume_kwh: field(1),
            unit_price: field(2),
            amount: field(3),
        }
    })
}
