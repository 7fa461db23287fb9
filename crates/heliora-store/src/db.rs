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

use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{Row, params};
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, warn};

use heliora_core::LedgerSource;
use heliora_types::{DailyEnergyRecord, EnergyLine, Invoice, TelemetrySample, UnitTariffs};

#[derive(Debug)]
pub struct Database {
    conn: Mutex<rusqlite::Connection>,
}

impl Database {
    pub fn open(path: &str) -> Result<Self> {
        if let Some(parent) = Path::new(path).parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create database directory: {}", parent.display())
            })?;
        }

        let conn = rusqlite::Connection::open(path)
            .with_context(|| format!("Failed to open database: {path}"))?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS invoices (
                account_code            TEXT NOT NULL,
                year                    INTEGER NOT NULL,
                month                   TEXT NOT NULL,
                plant_name              TEXT NOT NULL DEFAULT '',
                period_start            TEXT,
                period_end              TEXT,
                imported_kwh            REAL NOT NULL DEFAULT 0,
                imported_price          REAL NOT NULL DEFAULT 0,
                imported_amount         REAL NOT NULL DEFAULT 0,
                credit_kwh              REAL NOT NULL DEFAULT 0,
                credit_price            REAL NOT NULL DEFAULT 0,
                credit_amount           REAL NOT NULL DEFAULT 0,
                hourly_kwh              REAL NOT NULL DEFAULT 0,
                hourly_price            REAL NOT NULL DEFAULT 0,
                hourly_amount           REAL NOT NULL DEFAULT 0,
                total_surplus_kwh       REAL NOT NULL DEFAULT 0,
                applied_tariff          REAL NOT NULL DEFAULT 0,
                accumulated_balance     REAL NOT NULL DEFAULT 0,
                other_charges           REAL NOT NULL DEFAULT 0,
                prior_balance           REAL NOT NULL DEFAULT 0,
                total_billed            REAL NOT NULL DEFAULT 0,
                amount_due              REAL NOT NULL DEFAULT 0,
                month_consumption_kwh   REAL NOT NULL DEFAULT 0,
                tariff_generation       REAL NOT NULL DEFAULT 0,
                tariff_commercialization REAL NOT NULL DEFAULT 0,
                tariff_transmission     REAL NOT NULL DEFAULT 0,
                tariff_restrictions     REAL NOT NULL DEFAULT 0,
                tariff_distribution     REAL NOT NULL DEFAULT 0,
                tariff_losses           REAL NOT NULL DEFAULT 0,
                updated_at              TEXT NOT NULL,
                PRIMARY KEY (account_code, year, month)
            );

            CREATE TABLE IF NOT EXISTS telemetry_samples (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                plant_code      TEXT NOT NULL,
                timestamp       TEXT NOT NULL,
                power_w         REAL NOT NULL,
                day_energy_kwh  REAL NOT NULL,
                month_energy_kwh REAL NOT NULL,
                total_energy_kwh REAL NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_samples_plant_time
                ON telemetry_samples(plant_code, timestamp DESC);

            CREATE TABLE IF NOT EXISTS daily_energy (
                id                INTEGER PRIMARY KEY AUTOINCREMENT,
                plant_code        TEXT NOT NULL,
                date              TEXT NOT NULL,
                generated_kwh     REAL NOT NULL DEFAULT 0,
                consumed_kwh      REAL NOT NULL DEFAULT 0,
                self_consumed_kwh REAL NOT NULL DEFAULT 0,
                exported_kwh      REAL NOT NULL DEFAULT 0,
                imported_kwh      REAL NOT NULL DEFAULT 0
            );

            CREATE INDEX IF NOT EXISTS idx_daily_plant_date
                ON daily_energy(plant_code, date);",
        )
        .context("Failed to initialize database schema")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Insert-or-replace one invoice, keyed by (account, year, month).
    ///
    /// On conflict every derived column is overwritten with the new
    /// extraction's values and `updated_at` is refreshed; the key
    /// columns are never altered. The single statement makes the
    /// operation atomic per record.
    pub fn upsert_invoice(&self, invoice: &Invoice) -> Result<()> {
        let conn = self.conn.lock().expect("database mutex poisoned");
        let now = Utc::now().to_rfc3339();

        conn.execute(
            "INSERT INTO invoices (
                account_code, year, month, plant_name, period_start, period_end,
                imported_kwh, imported_price, imported_amount,
                credit_kwh, credit_price, credit_amount,
                hourly_kwh, hourly_price, hourly_amount,
                total_surplus_kwh, applied_tariff, accumulated_balance,
                other_charges, prior_balance, total_billed, amount_due,
                month_consumption_kwh,
                tariff_generation, tariff_commercialization, tariff_transmission,
                tariff_restrictions, tariff_distribution, tariff_losses,
                updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15,
                      ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24, ?25, ?26, ?27, ?28, ?29, ?30)
             ON CONFLICT(account_code, year, month) DO UPDATE SET
                plant_name = ?4,
                period_start = ?5,
                period_end = ?6,
                imported_kwh = ?7, imported_price = ?8, imported_amount = ?9,
                credit_kwh = ?10, credit_price = ?11, credit_amount = ?12,
                hourly_kwh = ?13, hourly_price = ?14, hourly_amount = ?15,
                total_surplus_kwh = ?16,
                applied_tariff = ?17,
                accumulated_balance = ?18,
                other_charges = ?19,
                prior_balance = ?20,
                total_billed = ?21,
                amount_due = ?22,
                month_consumption_kwh = ?23,
                tariff_generation = ?24, tariff_commercialization = ?25,
                tariff_transmission = ?26, tariff_restrictions = ?27,
                tariff_distribution = ?28, tariff_losses = ?29,
                updated_at = ?30",
            params![
                invoice.account_code,
                invoice.year,
                invoice.month,
                invoice.plant_name,
                invoice.period_start.map(|d| d.to_string()),
                invoice.period_end.map(|d| d.to_string()),
                invoice.imported.volume_kwh,
                invoice.imported.unit_price,
                invoice.imported.amount,
                invoice.energy_credit.volume_kwh,
                invoice.energy_credit.unit_price,
                invoice.energy_credit.amount,
                invoice.hourly_valuation.volume_kwh,
                invoice.hourly_valuation.unit_price,
                invoice.hourly_valuation.amount,
                invoice.total_surplus_kwh,
                invoice.applied_tariff,
                invoice.accumulated_balance,
                invoice.other_charges,
                invoice.prior_balance,
                invoice.total_billed,
                invoice.amount_due,
                invoice.month_consumption_kwh,
                invoice.unit_tariffs.generation,
                invoice.unit_tariffs.commercialization,
                invoice.unit_tariffs.transmission,
                invoice.unit_tariffs.restrictions,
                invoice.unit_tariffs.distribution,
                invoice.unit_tariffs.losses,
                now,
            ],
        )?;

        Ok(())
    }

    pub fn insert_sample(&self, sample: &TelemetrySample) -> Result<()> {
        let conn = self.conn.lock().expect("database mutex poisoned");
        conn.execute(
            "INSERT INTO telemetry_samples
                (plant_code, timestamp, power_w, day_energy_kwh, month_energy_kwh, total_energy_kwh)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                sample.plant_code,
                sample.timestamp.to_rfc3339(),
                sample.power_w,
                sample.day_energy_kwh,
                sample.month_energy_kwh,
                sample.total_energy_kwh,
            ],
        )?;
        Ok(())
    }

    pub fn insert_daily_record(&self, rec: &DailyEnergyRecord) -> Result<()> {
        let conn = self.conn.lock().expect("database mutex poisoned");
        conn.execute(
            "INSERT INTO daily_energy
                (plant_code, date, generated_kwh, consumed_kwh, self_consumed_kwh, exported_kwh, imported_kwh)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                rec.plant_code,
                rec.date.to_string(),
                rec.generated_kwh,
                rec.consumed_kwh,
                rec.self_consumed_kwh,
                rec.exported_kwh,
                rec.imported_kwh,
            ],
        )?;
        Ok(())
    }

    pub fn invoice_count(&self) -> Result<u64> {
        let conn = self.conn.lock().expect("database mutex poisoned");
        let count: u64 = conn.query_row("SELECT COUNT(*) FROM invoices", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Delete realtime samples older than the retention window. Daily
    /// records and invoices are the durable history and are never swept.
    pub fn cleanup_old_samples(&self, retention_days: u32) -> Result<u64> {
        let conn = self.conn.lock().expect("database mutex poisoned");
        let cutoff = Utc::now() - chrono::Duration::days(i64::from(retention_days));
        let deleted = conn.execute(
            "DELETE FROM telemetry_samples WHERE timestamp < ?1",
            params![cutoff.to_rfc3339()],
        )?;
        debug!(deleted, cutoff = %cutoff, "swept expired telemetry samples");
        Ok(deleted as u64)
    }
}

const INVOICE_COLUMNS: &str = "account_code, year, month, plant_name, period_start, period_end,
    imported_kwh, imported_price, imported_amount,
    credit_kwh, credit_price, credit_amount,
    hourly_kwh, hourly_price, hourly_amount,
    total_surplus_kwh, applied_tariff, accumulated_balance,
    other_charges, prior_balance, total_billed, amount_due,
    month_consumption_kwh,
    tariff_generation, tariff_commercialization, tariff_transmission,
    tariff_restrictions, tariff_distribution, tariff_losses";

fn row_to_invoice(row: &Row<'_>) -> rusqlite::Result<Invoice> {
    let parse_date = |s: Option<String>| {
        s.and_then(|s| chrono::NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok())
    };
    Ok(Invoice {
        account_code: row.get(0)?,
        year: row.get(1)?,
        month: row.get(2)?,
        plant_name: row.get(3)?,
        period_start: parse_date(row.get(4)?),
        period_end: parse_date(row.get(5)?),
        imported: EnergyLine {
            volume_kwh: row.get(6)?,
            unit_price: row.get(7)?,
            amount: row.get(8)?,
        },
        energy_credit: EnergyLine {
            volume_kwh: row.get(9)?,
            unit_price: row.get(10)?,
            amount: row.get(11)?,
        },
        hourly_valuation: EnergyLine {
            volume_kwh: row.get(12)?,
            unit_price: row.get(13)?,
            amount: row.get(14)?,
        },
        total_surplus_kwh: row.get(15)?,
        applied_tariff: row.get(16)?,
        accumulated_balance: row.get(17)?,
        other_charges: row.get(18)?,
        prior_balance: row.get(19)?,
        total_billed: row.get(20)?,
        amount_due: row.get(21)?,
        month_consumption_kwh: row.get(22)?,
        unit_tariffs: UnitTariffs {
            generation: row.get(23)?,
            commercialization: row.get(24)?,
            transmission: row.get(25)?,
            restrictions: row.get(26)?,
            distribution: row.get(27)?,
            losses: row.get(28)?,
        },
    })
}

impl LedgerSource for Database {
    fn latest_sample(&self, plant_code: &str) -> Result<Option<TelemetrySample>> {
        let conn = self.conn.lock().expect("database mutex poisoned");
        let mut stmt = conn.prepare(
            "SELECT plant_code, timestamp, power_w, day_energy_kwh, month_energy_kwh, total_energy_kwh
             FROM telemetry_samples
             WHERE plant_code = ?1
             ORDER BY timestamp DESC
             LIMIT 1",
        )?;
        let sample = stmt
            .query_map(params![plant_code], |row| {
                Ok(TelemetrySample {
                    plant_code: row.get(0)?,
                    timestamp: row.get::<_, String>(1)?.parse().unwrap_or_else(|err| {
                        warn!(%err, "unparseable sample timestamp, substituting now");
                        Utc::now()
                    }),
                    power_w: row.get(2)?,
                    day_energy_kwh: row.get(3)?,
                    month_energy_kwh: row.get(4)?,
                    total_energy_kwh: row.get(5)?,
                })
            })?
            .filter_map(std::result::Result::ok)
            .next();
        Ok(sample)
    }

    fn daily_records(&self, plant_code: &str) -> Result<Vec<DailyEnergyRecord>> {
        let conn = self.conn.lock().expect("database mutex poisoned");
        let mut stmt = conn.prepare(
            "SELECT plant_code, date, generated_kwh, consumed_kwh, self_consumed_kwh, exported_kwh, imported_kwh
             FROM daily_energy
             WHERE plant_code = ?1
             ORDER BY date ASC",
        )?;
        let records = stmt
            .query_map(params![plant_code], |row| {
                let date: String = row.get(1)?;
                Ok(DailyEnergyRecord {
                    plant_code: row.get(0)?,
                    date: chrono::NaiveDate::parse_from_str(&date, "%Y-%m-%d")
                        .unwrap_or_default(),
                    generated_kwh: row.get(2)?,
                    consumed_kwh: row.get(3)?,
                    self_consumed_kwh: row.get(4)?,
                    exported_kwh: row.get(5)?,
                    imported_kwh: row.get(6)?,
                })
            })?
            .filter_map(std::result::Result::ok)
            .collect();
        Ok(records)
    }

    fn invoices_for_account(&self, account_code: &str) -> Result<Vec<Invoice>> {
        let conn = self.conn.lock().expect("database mutex poisoned");
        let mut stmt = conn.prepare(&format!(
            "SELECT {INVOICE_COLUMNS} FROM invoices WHERE account_code = ?1"
        ))?;
        let rows = stmt
            .query_map(params![account_code], row_to_invoice)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}
