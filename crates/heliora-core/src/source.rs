// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of Heliora.

//! Ledger access seam and the fleet reconciliation driver.
//!
//! [`LedgerSource`] abstracts the queryable store so the reconciliation
//! pass can run against SQLite in production and plain in-memory
//! fixtures in tests. The driver is read-only against the source; a
//! failed query for one plant degrades that plant to explicit zeros and
//! the rest of the fleet proceeds.

use std::collections::BTreeSet;

use anyhow::Result;
use chrono::{DateTime, Utc};
use tracing::warn;

use heliora_types::{AppConfig, DailyEnergyRecord, Invoice, TelemetrySample};

use crate::finance::{FinancialInputs, derive_financials, invoice_savings};
use crate::payments::{InferredPayments, infer_payments};
use crate::rollup::{build_plant_summary, latest_activity_date};
use crate::types::FleetReport;

/// Read access to the durable ledger.
pub trait LedgerSource: Send + Sync {
    /// Most recent realtime sample for a plant, if any.
    fn latest_sample(&self, plant_code: &str) -> Result<Option<TelemetrySample>>;

    /// All daily snapshot rows for a plant (may contain duplicates per
    /// date; the aggregator collapses them).
    fn daily_records(&self, plant_code: &str) -> Result<Vec<DailyEnergyRecord>>;

    /// All stored invoices for a utility account, in arbitrary order.
    fn invoices_for_account(&self, account_code: &str) -> Result<Vec<Invoice>>;
}

/// Run one full reconciliation pass over the fleet.
///
/// Per-plant store failures are logged and degrade that plant to zeros;
/// nothing here aborts the whole computation.
pub fn build_fleet_report(
    source: &dyn LedgerSource,
    config: &AppConfig,
    now: DateTime<Utc>,
) -> Result<FleetReport> {
    let tz = config.tz();

    // Fetch per-plant telemetry up front so the fleet as-of date is
    // known before any summary is built.
    let mut telemetry = Vec::with_capacity(config.plants.len());
    for plant in &config.plants {
        let latest = source.latest_sample(&plant.code).unwrap_or_else(|err| {
            warn!(plant = %plant.code, %err, "failed to load latest sample");
            None
        });
        let daily = source.daily_records(&plant.code).unwrap_or_else(|err| {
            warn!(plant = %plant.code, %err, "failed to load daily records");
            Vec::new()
        });
        telemetry.push((plant, latest, daily));
    }

    let as_of = telemetry
        .iter()
        .filter_map(|(_, latest, daily)| latest_activity_date(latest.as_ref(), daily, tz))
        .max()
        .unwrap_or_else(|| now.with_timezone(&tz).date_naive());

    let plants: Vec<_> = telemetry
        .iter()
        .map(|(plant, latest, daily)| {
            build_plant_summary(plant, latest.as_ref(), daily, as_of, now, tz)
        })
        .collect();

    // Billing side: balance series per account, chronological
    let mut inferred_fleet = InferredPayments::default();
    let mut savings = Vec::new();
    let mut billing_months: BTreeSet<(i32, u32)> = BTreeSet::new();

    for plant in &config.plants {
        let mut invoices = source
            .invoices_for_account(&plant.account_code)
            .unwrap_or_else(|err| {
                warn!(plant = %plant.code, %err, "failed to load invoices");
                Vec::new()
            });
        invoices.sort_by_key(Invoice::sort_key);

        let balances: Vec<f64> = invoices.iter().map(|i| i.accumulated_balance).collect();
        inferred_fleet.merge(&infer_payments(&balances));

        for invoice in &invoices {
            billing_months.insert(invoice.sort_key());
            savings.push(invoice_savings(invoice));
        }
    }

    let lifetime_self_consumed: f64 = plants.iter().map(|p| p.lifetime.self_consumed_kwh).sum();
    let fleet_capacity: f64 = config.plants.iter().map(|p| p.capacity_kwp).sum();

    let months_of_history = u32::try_from(billing_months.len()).unwrap_or(u32::MAX);
    let financial = derive_financials(&FinancialInputs {
        lifetime_self_consumed_kwh: lifetime_self_consumed,
        inferred: &inferred_fleet,
        months_of_history,
        total_investment: config.total_investment(),
        deductible_investment: config.deductible_investment(),
        fleet_capacity_kwp: fleet_capacity,
        tariffs: &config.tariffs,
        taxes: &config.taxes,
        today: now.with_timezone(&tz).date_naive(),
    });

    Ok(FleetReport {
        as_of,
        plants,
        invoice_savings: savings,
        inferred_payments: inferred_fleet,
        financial,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use chrono::NaiveDate;
    use heliora_types::{EnergyLine, UnitTariffs};
    use std::collections::HashMap;

    /// In-memory fixture source; plants listed in `failing` error on
    /// every query.
    #[derive(Debug, Default)]
    struct FixtureSource {
        samples: HashMap<String, TelemetrySample>,
        daily: HashMap<String, Vec<DailyEnergyRecord>>,
        invoices: HashMap<String, Vec<Invoice>>,
        failing: Vec<String>,
    }

    impl LedgerSource for FixtureSource {
        fn latest_sample(&self, plant_code: &str) -> Result<Option<TelemetrySample>> {
            if self.failing.iter().any(|p| p == plant_code) {
                return Err(anyhow!("store unavailable"));
            }
            Ok(self.samples.get(plant_code).cloned())
        }

        fn daily_records(&self, plant_code: &str) -> Result<Vec<DailyEnergyRecord>> {
            if self.failing.iter().any(|p| p == plant_code) {
                return Err(anyhow!("store unavailable"));
            }
            Ok(self.daily.get(plant_code).cloned().unwrap_or_default())
        }

        fn invoices_for_account(&self, account_code: &str) -> Result<Vec<Invoice>> {
            Ok(self.invoices.get(account_code).cloned().unwrap_or_default())
        }
    }

    fn config() -> AppConfig {
        let toml = r#"
            [[plants]]
            code = "CAB"
            name = "Cabañita"
            account_code = "1056060000"
            capacity_kwp = 5.0
            peak_sun_hours = 4.0
            performance_ratio = 0.8
            commissioned = "2023-06-01"

            [[plants]]
            code = "MIR"
            name = "El Mirador"
            account_code = "2044070001"
            capacity_kwp = 3.0
            peak_sun_hours = 4.0
            performance_ratio = 0.8
            commissioned = "2024-01-15"

            [[investments]]
            plant_code = "CAB"
            invested = 7000.0

            [[investments]]
            plant_code = "MIR"
            invested = 5000.0
        "#;
        toml::from_str(toml).expect("valid config")
    }

    fn invoice(account: &str, year: i32, month: &str, balance: f64) -> Invoice {
        Invoice {
            account_code: account.to_owned(),
            year,
            month: month.to_owned(),
            plant_name: String::new(),
            period_start: None,
            period_end: None,
            imported: EnergyLine::default(),
            energy_credit: EnergyLine::default(),
            hourly_valuation: EnergyLine::default(),
            total_surplus_kwh: 0.0,
            applied_tariff: 0.0,
            accumulated_balance: balance,
            other_charges: 0.0,
            prior_balance: 0.0,
            total_billed: 0.0,
            amount_due: 0.0,
            month_consumption_kwh: 0.0,
            unit_tariffs: UnitTariffs::default(),
        }
    }

    #[test]
    fn report_covers_all_plants_and_orders_balances() {
        let mut source = FixtureSource::default();
        // Inserted out of chronological order; the driver must sort by
        // (year, month position) before inferring payments.
        source.invoices.insert(
            "1056060000".to_owned(),
            vec![
                invoice("1056060000", 2025, "Abril", 80.0),
                invoice("1056060000", 2025, "Febrero", 120.0),
                invoice("1056060000", 2025, "Enero", 100.0),
                invoice("1056060000", 2025, "Marzo", 55.0),
            ],
        );

        let now: DateTime<Utc> = "2025-11-20T12:00:00Z".parse().expect("valid");
        let report = build_fleet_report(&source, &config(), now).expect("report");

        assert_eq!(report.plants.len(), 2);
        // Series [100, 120, 55, 80] → one payment of 120
        assert_eq!(report.inferred_payments.payments, vec![120.0]);
        assert_eq!(report.inferred_payments.total_recovered, 200.0);
        assert_eq!(report.financial.months_of_history, 4);
        assert_eq!(report.financial.total_investment, 12_000.0);
        assert_eq!(report.invoice_savings.len(), 4);
    }

    #[test]
    fn failing_plant_degrades_to_zeros_without_aborting() {
        let mut source = FixtureSource::default();
        source.failing.push("CAB".to_owned());
        source.daily.insert(
            "MIR".to_owned(),
            vec![DailyEnergyRecord {
                generated_kwh: 12.0,
                ..DailyEnergyRecord::empty(
                    "MIR",
                    NaiveDate::from_ymd_opt(2025, 11, 19).expect("d"),
                )
            }],
        );

        let now: DateTime<Utc> = "2025-11-20T12:00:00Z".parse().expect("valid");
        let report = build_fleet_report(&source, &config(), now).expect("report");

        let cab = report.plants.iter().find(|p| p.code == "CAB").expect("CAB");
        let mir = report.plants.iter().find(|p| p.code == "MIR").expect("MIR");
        assert_eq!(cab.lifetime.generated_kwh, 0.0);
        assert_eq!(mir.lifetime.generated_kwh, 12.0);
        assert_eq!(
            report.as_of,
            NaiveDate::from_ymd_opt(2025, 11, 19).expect("d")
        );
    }

    #[test]
    fn empty_ledger_as_of_falls_back_to_today() {
        let source = FixtureSource::default();
        let now: DateTime<Utc> = "2025-11-20T12:00:00Z".parse().expect("valid");
        let report = build_fleet_report(&source, &config(), now).expect("report");
        assert_eq!(
            report.as_of,
            NaiveDate::from_ymd_opt(2025, 11, 20).expect("d")
        );
        assert_eq!(report.financial.months_of_history, 0);
        assert_eq!(report.financial.realized.avg_monthly_income, 0.0);
    }
}
