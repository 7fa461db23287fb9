// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of Heliora.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use heliora_types::PlantStatus;

use crate::payments::InferredPayments;

/// Five energy measures over one time window (kWh).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EnergyWindow {
    pub generated_kwh: f64,
    pub consumed_kwh: f64,
    pub self_consumed_kwh: f64,
    pub exported_kwh: f64,
    pub imported_kwh: f64,
}

impl EnergyWindow {
    /// Accumulate a collapsed daily record into this window.
    pub fn add_day(&mut self, rec: &heliora_types::DailyEnergyRecord) {
        self.generated_kwh += rec.generated_kwh;
        self.consumed_kwh += rec.consumed_kwh;
        self.self_consumed_kwh += rec.self_consumed_kwh;
        self.exported_kwh += rec.exported_kwh;
        self.imported_kwh += rec.imported_kwh;
    }
}

/// Dashboard-facing rollup for one plant at the fleet as-of date.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlantSummary {
    pub code: String,
    pub name: String,
    pub status: PlantStatus,
    pub as_of: NaiveDate,

    pub today: EnergyWindow,
    pub month_to_date: EnergyWindow,
    pub year_to_date: EnergyWindow,
    pub lifetime: EnergyWindow,

    // Generation targets (kWh) and compliance against them (%)
    pub today_target_kwh: f64,
    pub month_target_kwh: f64,
    pub year_target_kwh: f64,
    pub today_compliance_pct: f64,
    pub month_compliance_pct: f64,
    pub year_compliance_pct: f64,

    // Lifetime shares of generation (%)
    pub self_consumption_pct: f64,
    pub export_pct: f64,
}

/// Realized financial indicators, derived from actual billing history.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RealizedIndicators {
    pub avg_monthly_income: f64,
    pub annual_income: f64,
    /// Payback period in years, ignoring tax benefits
    pub payback_years: f64,
    /// Payback period in years, net of tax benefits
    pub payback_years_with_tax: f64,
    pub roi_pct: f64,
}

/// Projected indicators from configured capacity and tariff assumptions.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ProjectedIndicators {
    pub annual_generation_kwh: f64,
    pub self_consumption_kwh: f64,
    pub export_kwh: f64,
    pub annual_income: f64,
    pub payback_years: f64,
    pub payback_years_with_tax: f64,
}

/// Progress toward recovering the total investment.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RecoveryProgress {
    pub recovered: f64,
    pub pending: f64,
    pub percent_recovered: f64,
    /// First day of the estimated full-payback month; `None` when
    /// average monthly income is zero ("unknown", not a date).
    pub estimated_payback_month: Option<NaiveDate>,
}

/// Fleet-wide financial summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinancialSummary {
    pub total_investment: f64,
    pub self_consumption_value: f64,
    /// Surplus income: inferred payments plus pending balance
    pub surplus_income: f64,
    pub total_income: f64,
    pub tax_benefits: f64,
    pub months_of_history: u32,
    pub realized: RealizedIndicators,
    pub projected: ProjectedIndicators,
    pub recovery: RecoveryProgress,
}

/// Savings-vs-grid-only comparison for one invoice.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoiceSavings {
    pub account_code: String,
    pub plant_name: String,
    pub year: i32,
    pub month: String,
    /// What the month cost with the plant in place
    pub billed: f64,
    /// What the same consumption would have cost imported entirely
    pub grid_only_cost: f64,
    pub savings: f64,
}

/// Complete dashboard-facing output of one reconciliation pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FleetReport {
    pub as_of: NaiveDate,
    pub plants: Vec<PlantSummary>,
    pub invoice_savings: Vec<InvoiceSavings>,
    /// Fleet-aggregated payment inference (heuristic)
    pub inferred_payments: InferredPayments,
    pub financial: FinancialSummary,
}
