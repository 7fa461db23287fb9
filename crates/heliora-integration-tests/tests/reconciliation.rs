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

//! End-to-end: invoice text → extraction → upsert → reconciliation
//! report over a real SQLite ledger.

use chrono::{DateTime, NaiveDate, Utc};
use tempfile::TempDir;

use heliora_core::{LedgerSource, build_fleet_report};
use heliora_extract::extract_invoice;
use heliora_store::Database;
use heliora_types::{AppConfig, DailyEnergyRecord, PlantStatus, TelemetrySample};

fn config(db_path: &str) -> AppConfig {
    let toml = format!(
        r#"
        timezone = "Europe/Madrid"

        [database]
        path = "{db_path}"

        [tariffs]
        self_consumption_rate = 0.15
        export_rate = 0.06

        [[plants]]
        code = "CAB"
        name = "Cabañita"
        account_code = "1056060000"
        capacity_kwp = 5.0
        peak_sun_hours = 4.0
        performance_ratio = 0.8
        commissioned = "2023-06-01"

        [[investments]]
        plant_code = "CAB"
        invested = 7200.0
        "#
    );
    let config: AppConfig = toml::from_str(&toml).expect("valid config");
    config.validate().expect("valid");
    config
}

/// One invoice document in the known utility layout.
fn invoice_text(month: &str, start: &str, end: &str, balance: &str) -> String {
    format!(
        "FACTURA DE SUMINISTRO ELÉCTRICO\n\
         MES: {month}\n\
         CÓDIGO: 1056060000\n\
         Periodo facturado: {start} al {end}\n\
         Consumo importado 320 kWh 0,1412 45,18\n\
         Crédito de energía 120 kWh 0,0600 -7,20\n\
         Excedentes totales: 1.240,5\n\
         Tarifa aplicada: 0,0600\n\
         Consumo del mes: 410 kWh\n\
         TOTAL ENERGÍA: 45,04\n\
         Alumbrado público: 3,10\n\
         Saldo anterior: 12,40\n\
         Saldo acumulado: {balance}\n\
         Total a pagar: 51,39\n"
    )
}

fn sample(ts: &str, day: f64, total: f64) -> TelemetrySample {
    TelemetrySample {
        plant_code: "CAB".to_owned(),
        timestamp: ts.parse().expect("valid timestamp"),
        power_w: 2400.0,
        day_energy_kwh: day,
        month_energy_kwh: 0.0,
        total_energy_kwh: total,
    }
}

fn day(date: &str, generated: f64) -> DailyEnergyRecord {
    DailyEnergyRecord {
        generated_kwh: generated,
        self_consumed_kwh: generated * 0.6,
        exported_kwh: generated * 0.4,
        ..DailyEnergyRecord::empty(
            "CAB",
            NaiveDate::parse_from_str(date, "%Y-%m-%d").expect("valid date"),
        )
    }
}

#[test]
fn full_reconciliation_pass() {
    let dir = TempDir::new().expect("temp dir");
    let db_path = dir.path().join("ledger.db");
    let db_path = db_path.to_str().expect("utf-8 path");
    let config = config(db_path);
    let db = Database::open(db_path).expect("open");
    let registry = config.plant_registry();

    // Four billing periods; the March balance drop (120 → 55) is the
    // only one below half of its predecessor.
    let documents = [
        ("Enero", "01/01/2025", "31/01/2025", "100,00"),
        ("Febrero", "01/02/2025", "28/02/2025", "120,00"),
        ("Marzo", "01/03/2025", "31/03/2025", "55,00"),
        ("Abril", "01/04/2025", "30/04/2025", "80,00"),
    ];
    for (month, start, end, balance) in documents {
        let invoice = extract_invoice(&invoice_text(month, start, end, balance), &registry)
            .expect("extract");
        assert_eq!(invoice.plant_name, "Cabañita");
        assert_eq!(invoice.year, 2025);
        db.upsert_invoice(&invoice).expect("upsert");
    }

    // Re-upload of an already-stored month must replace, not duplicate
    let corrected = extract_invoice(
        &invoice_text("Abril", "01/04/2025", "30/04/2025", "80,00"),
        &registry,
    )
    .expect("extract");
    db.upsert_invoice(&corrected).expect("upsert");
    assert_eq!(db.invoice_count().expect("count"), 4);

    // Telemetry: dailies with an intraday duplicate for the as-of date,
    // plus a fresh realtime sample superseding the snapshot
    for rec in [
        day("2025-03-10", 470.0),
        day("2025-11-10", 10.0),
        day("2025-11-20", 15.0),
        day("2025-11-20", 20.0),
    ] {
        db.insert_daily_record(&rec).expect("insert");
    }
    db.insert_sample(&sample("2025-11-20T09:00:00Z", 22.0, 1900.0))
        .expect("insert");
    db.insert_sample(&sample("2025-11-20T11:50:00Z", 30.0, 2000.0))
        .expect("insert");

    let now: DateTime<Utc> = "2025-11-20T12:00:00Z".parse().expect("valid");
    let report = build_fleet_report(&db, &config, now).expect("report");

    assert_eq!(report.as_of, NaiveDate::from_ymd_opt(2025, 11, 20).expect("d"));

    let cab = &report.plants[0];
    // Realtime supersedes the collapsed snapshot (max 20) for today
    assert_eq!(cab.today.generated_kwh, 30.0);
    // YTD: (470 + 10 + 20) + 30 − 20
    assert_eq!(cab.year_to_date.generated_kwh, 510.0);
    // Lifetime prefers the realtime cumulative counter
    assert_eq!(cab.lifetime.generated_kwh, 2000.0);
    assert_eq!(cab.status, PlantStatus::Active);

    // Balance series [100, 120, 55, 80] → one inferred payment of 120
    assert_eq!(report.inferred_payments.payments, vec![120.0]);
    assert_eq!(report.inferred_payments.total_recovered, 200.0);

    assert_eq!(report.financial.months_of_history, 4);
    assert_eq!(report.financial.total_investment, 7200.0);
    // Surplus income feeds total income alongside self-consumption value
    assert!(report.financial.surplus_income >= 200.0 - 1e-9);
    assert!(report.financial.realized.avg_monthly_income > 0.0);

    // Savings comparison present per stored invoice
    assert_eq!(report.invoice_savings.len(), 4);
    let abril = report
        .invoice_savings
        .iter()
        .find(|s| s.month == "Abril")
        .expect("Abril");
    // 410 kWh × 0,1412 grid-only vs 45,04 billed
    assert!((abril.grid_only_cost - 57.892).abs() < 1e-6);
    assert!((abril.savings - 12.852).abs() < 1e-6);
}

#[test]
fn rejected_document_does_not_block_batch() {
    let dir = TempDir::new().expect("temp dir");
    let db_path = dir.path().join("ledger.db");
    let db_path = db_path.to_str().expect("utf-8 path");
    let config = config(db_path);
    let db = Database::open(db_path).expect("open");
    let registry = config.plant_registry();

    let batch = [
        invoice_text("Enero", "01/01/2025", "31/01/2025", "10,00"),
        "garbled scan with no usable fields".to_owned(),
        invoice_text("Febrero", "01/02/2025", "28/02/2025", "20,00"),
    ];

    let mut stored = 0;
    for text in &batch {
        if let Ok(invoice) = extract_invoice(text, &registry) {
            db.upsert_invoice(&invoice).expect("upsert");
            stored += 1;
        }
    }

    assert_eq!(stored, 2);
    assert_eq!(db.invoice_count().expect("count"), 2);
    let invoices = db.invoices_for_account("1056060000").expect("query");
    assert_eq!(invoices.len(), 2);
}
