// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of Heliora.

//! Numeric normalization for invoice figures.
//!
//! Invoices print numbers in the Spanish convention: `.` as thousands
//! separator and `,` as decimal separator (`1.234,56`). Normalization
//! never errors: anything unparseable becomes `0.0`.

/// Normalize an invoice number string to an `f64`.
///
/// Strips `.` thousands separators, converts the `,` decimal separator
/// to a period, drops any remaining characters that are not digits,
/// sign, or decimal point, and parses. Unparseable input yields `0.0`.
#[must_use]
pub fn normalize_number(raw: &str) -> f64 {
    let swapped = raw.trim().replace('.', "").replace(',', ".");

    let cleaned: String = swapped
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '-' || *c == '+' || *c == '.')
        .collect();

    cleaned.parse::<f64>().unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spanish_thousands_and_decimal() {
        assert_eq!(normalize_number("1.234,56"), 1234.56);
    }

    #[test]
    fn plain_integer() {
        assert_eq!(normalize_number("750"), 750.0);
    }

    #[test]
    fn decimal_only() {
        assert_eq!(normalize_number("0,0831"), 0.0831);
    }

    #[test]
    fn negative_value() {
        assert_eq!(normalize_number("-12,50"), -12.50);
    }

    #[test]
    fn currency_suffix_is_stripped() {
        assert_eq!(normalize_number("45,10 €"), 45.10);
        assert_eq!(normalize_number("320 kWh"), 320.0);
    }

    #[test]
    fn unparseable_input_is_zero() {
        assert_eq!(normalize_number(""), 0.0);
        assert_eq!(normalize_number("n/a"), 0.0);
        assert_eq!(normalize_number("--"), 0.0);
    }
}
