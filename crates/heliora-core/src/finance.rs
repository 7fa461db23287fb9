// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of Heliora.

//! Financial Derivation Engine.
//!
//! Pure function from (energy rollups, invoice totals, tariff/tax
//! configuration, months of operating history) to the fleet financial
//! indicators: payback, ROI, tax benefits, and recovery progress.
//! Every division tolerates a zero denominator by yielding zero.

use chrono::{Datelike, Months, NaiveDate};

use heliora_types::{Invoice, TariffModel, TaxSettings};

use crate::payments::InferredPayments;
use crate::types::{
    FinancialSummary, InvoiceSavings, ProjectedIndicators, RealizedIndicators, RecoveryProgress,
};

/// Zero-tolerant division: zero denominator yields zero, never an error.
#[must_use]
pub fn safe_div(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

/// Inputs to one financial derivation pass.
#[derive(Debug, Clone)]
pub struct FinancialInputs<'a> {
    /// Lifetime self-consumed energy across the fleet (kWh)
    pub lifetime_self_consumed_kwh: f64,
    /// Fleet-aggregated payment inference
    pub inferred: &'a InferredPayments,
    /// Months of billing history across the fleet
    pub months_of_history: u32,
    pub total_investment: f64,
    /// Investment eligible for the renta deduction
    pub deductible_investment: f64,
    /// Total installed capacity (kWp)
    pub fleet_capacity_kwp: f64,
    pub tariffs: &'a TariffModel,
    pub taxes: &'a TaxSettings,
    /// Reference date for the payback-month estimate
    pub today: NaiveDate,
}

/// Derive the full set of financial indicators.
#[must_use]
pub fn derive_financials(inputs: &FinancialInputs<'_>) -> FinancialSummary {
    let self_consumption_value =
        inputs.lifetime_self_consumed_kwh * inputs.tariffs.self_consumption_rate;
    let surplus_income = inputs.inferred.total_recovered;
    let total_income = self_consumption_value + surplus_income;
    let tax_benefits = inputs.taxes.total_benefit(inputs.deductible_investment);

    let avg_monthly_income = safe_div(total_income, f64::from(inputs.months_of_history));
    let annual_income = avg_monthly_income * 12.0;

    let realized = RealizedIndicators {
        avg_monthly_income,
        annual_income,
        payback_years: safe_div(inputs.total_investment, annual_income),
        payback_years_with_tax: safe_div(inputs.total_investment - tax_benefits, annual_income),
        roi_pct: safe_div(total_income + tax_benefits, inputs.total_investment) * 100.0,
    };

    let projected = project_indicators(inputs, tax_benefits);

    let recovered = total_income + tax_benefits;
    let pending = (inputs.total_investment - recovered).max(0.0);
    let recovery = RecoveryProgress {
        recovered,
        pending,
        percent_recovered: safe_div(recovered, inputs.total_investment) * 100.0,
        estimated_payback_month: estimate_payback_month(inputs.today, pending, avg_monthly_income),
    };

    FinancialSummary {
        total_investment: inputs.total_investment,
        self_consumption_value,
        surplus_income,
        total_income,
        tax_benefits,
        months_of_history: inputs.months_of_history,
        realized,
        projected,
        recovery,
    }
}

/// Projected indicators from configured capacity and tariff assumptions:
/// annual generation split into self-consumption/export shares, valued
/// at the configured rates.
fn project_indicators(inputs: &FinancialInputs<'_>, tax_benefits: f64) -> ProjectedIndicators {
    let tariffs = inputs.tariffs;
    let annual_generation_kwh = inputs.fleet_capacity_kwp * tariffs.annual_sun_hours;
    let self_consumption_kwh = annual_generation_kwh * tariffs.self_consumption_share;
    let export_kwh = annual_generation_kwh * tariffs.export_share;
    let annual_income = self_consumption_kwh * tariffs.self_consumption_rate
        + export_kwh * tariffs.export_rate;

    ProjectedIndicators {
        annual_generation_kwh,
        self_consumption_kwh,
        export_kwh,
        annual_income,
        payback_years: safe_div(inputs.total_investment, annual_income),
        payback_years_with_tax: safe_div(inputs.total_investment - tax_benefits, annual_income),
    }
}

/// First day of the month in which the pending balance is recovered at
/// the average monthly income. Zero income means unknown, not a date.
#[must_use]
pub fn estimate_payback_month(
    today: NaiveDate,
    pending: f64,
    avg_monthly_income: f64,
) -> Option<NaiveDate> {
    if avg_monthly_income <= 0.0 {
        return None;
    }
    #[expect(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let months_needed = (pending / avg_monthly_income).ceil().max(0.0) as u32;
    today
        .with_day(1)
        .and_then(|d| d.checked_add_months(Months::new(months_needed)))
}

/// Savings of one invoice against a grid-only scenario: the month's
/// consumption valued entirely at the import price, minus what was
/// actually billed for energy. The import line's unit price anchors the
/// comparison; the applied tariff stands in when the line is missing.
#[must_use]
pub fn invoice_savings(invoice: &Invoice) -> InvoiceSavings {
    let grid_price = if invoice.imported.unit_price > 0.0 {
        invoice.imported.unit_price
    } else {
        invoice.applied_tariff
    };
    let grid_only_cost = invoice.month_consumption_kwh * grid_price;

    InvoiceSavings {
        account_code: invoice.account_code.clone(),
        plant_name: invoice.plant_name.clone(),
        year: invoice.year,
        month: invoice.month.clone(),
        billed: invoice.total_billed,
        grid_only_cost,
        savings: grid_only_cost - invoice.total_billed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use heliora_types::EnergyLine;

    fn tariffs() -> TariffModel {
        TariffModel {
            self_consumption_rate: 0.15,
            export_rate: 0.06,
            self_consumption_share: 0.60,
            export_share: 0.40,
            annual_sun_hours: 1600.0,
        }
    }

    fn taxes() -> TaxSettings {
        TaxSettings {
            renta_deduction: 0.20,
            depreciation_shield: 0.07,
        }
    }

    fn inputs<'a>(inferred: &'a InferredPayments, t: &'a TariffModel, x: &'a TaxSettings) -> FinancialInputs<'a> {
        FinancialInputs {
            lifetime_self_consumed_kwh: 4000.0,
            inferred,
            months_of_history: 24,
            total_investment: 12_000.0,
            deductible_investment: 12_000.0,
            fleet_capacity_kwp: 10.0,
            tariffs: t,
            taxes: x,
            today: NaiveDate::from_ymd_opt(2025, 11, 20).expect("valid date"),
        }
    }

    #[test]
    fn realized_indicators_follow_income() {
        let inferred = InferredPayments {
            payments: vec![300.0],
            total_paid: 300.0,
            current_balance: 100.0,
            total_recovered: 400.0,
        };
        let (t, x) = (tariffs(), taxes());
        let summary = derive_financials(&inputs(&inferred, &t, &x));

        // 4000 kWh × 0.15 = 600 self-consumption value; + 400 surplus
        assert!((summary.total_income - 1000.0).abs() < 1e-9);
        // 1000 / 24 months
        assert!((summary.realized.avg_monthly_income - 41.666666).abs() < 1e-3);
        assert!((summary.realized.annual_income - 500.0).abs() < 1e-9);
        // 12000 / 500 = 24 years
        assert!((summary.realized.payback_years - 24.0).abs() < 1e-9);
        // tax benefits: 12000 × 0.27 = 3240; (12000-3240)/500 = 17.52
        assert!((summary.tax_benefits - 3240.0).abs() < 1e-9);
        assert!((summary.realized.payback_years_with_tax - 17.52).abs() < 1e-9);
        // ROI = (1000 + 3240) / 12000 × 100
        assert!((summary.realized.roi_pct - 35.333333).abs() < 1e-3);
    }

    #[test]
    fn projected_indicators_use_configured_split() {
        let inferred = InferredPayments::default();
        let (t, x) = (tariffs(), taxes());
        let summary = derive_financials(&inputs(&inferred, &t, &x));

        // 10 kWp × 1600 h = 16000 kWh
        assert_eq!(summary.projected.annual_generation_kwh, 16_000.0);
        assert_eq!(summary.projected.self_consumption_kwh, 9600.0);
        assert_eq!(summary.projected.export_kwh, 6400.0);
        // 9600 × 0.15 + 6400 × 0.06 = 1440 + 384
        assert!((summary.projected.annual_income - 1824.0).abs() < 1e-9);
        assert!((summary.projected.payback_years - 12_000.0 / 1824.0).abs() < 1e-9);
    }

    #[test]
    fn zero_denominators_resolve_to_zero() {
        let inferred = InferredPayments::default();
        let (t, x) = (tariffs(), taxes());
        let mut zeroed = inputs(&inferred, &t, &x);
        zeroed.lifetime_self_consumed_kwh = 0.0;
        zeroed.months_of_history = 0;
        zeroed.total_investment = 0.0;
        zeroed.deductible_investment = 0.0;
        zeroed.fleet_capacity_kwp = 0.0;

        let summary = derive_financials(&zeroed);
        assert_eq!(summary.realized.avg_monthly_income, 0.0);
        assert_eq!(summary.realized.payback_years, 0.0);
        assert_eq!(summary.realized.roi_pct, 0.0);
        assert_eq!(summary.projected.payback_years, 0.0);
        assert_eq!(summary.recovery.percent_recovered, 0.0);
        assert_eq!(summary.recovery.estimated_payback_month, None);
    }

    #[test]
    fn payback_month_advances_by_ceiling_of_pending_over_income() {
        let today = NaiveDate::from_ymd_opt(2025, 11, 20).expect("valid date");
        // 1000 / 300 → 4 months
        assert_eq!(
            estimate_payback_month(today, 1000.0, 300.0),
            NaiveDate::from_ymd_opt(2026, 3, 1)
        );
        assert_eq!(estimate_payback_month(today, 1000.0, 0.0), None);
        // Nothing pending: this month
        assert_eq!(
            estimate_payback_month(today, 0.0, 300.0),
            NaiveDate::from_ymd_opt(2025, 11, 1)
        );
    }

    #[test]
    fn invoice_savings_compare_against_grid_only() {
        let invoice = Invoice {
            account_code: "1056060000".to_owned(),
            year: 2025,
            month: "Noviembre".to_owned(),
            plant_name: "Cabañita".to_owned(),
            period_start: None,
            period_end: None,
            imported: EnergyLine {
                volume_kwh: 320.0,
                unit_price: 0.14,
                amount: 44.8,
            },
            energy_credit: EnergyLine::default(),
            hourly_valuation: EnergyLine::default(),
            total_surplus_kwh: 0.0,
            applied_tariff: 0.06,
            accumulated_balance: 0.0,
            other_charges: 0.0,
            prior_balance: 0.0,
            total_billed: 44.8,
            amount_due: 0.0,
            month_consumption_kwh: 410.0,
            unit_tariffs: heliora_types::UnitTariffs::default(),
        };

        let savings = invoice_savings(&invoice);
        // 410 kWh × 0.14 = 57.4 grid-only vs 44.8 billed
        assert!((savings.grid_only_cost - 57.4).abs() < 1e-9);
        assert!((savings.savings - 12.6).abs() < 1e-9);
    }
}
