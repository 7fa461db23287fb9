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

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::FmtSubscriber;

use heliora_core::build_fleet_report;
use heliora_extract::extract_invoice;
use heliora_store::Database;
use heliora_types::{AppConfig, DailyEnergyRecord, TelemetrySample};

#[derive(Parser)]
#[command(name = "heliora")]
#[command(about = "Heliora - solar fleet energy and billing reconciliation", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "heliora.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract invoice text files and upsert them into the ledger
    Ingest {
        /// Plain-text invoice files (one document per file)
        files: Vec<PathBuf>,
    },
    /// Import realtime telemetry samples from a CSV export
    ImportTelemetry {
        #[arg(short = 'f', long)]
        csv: PathBuf,
    },
    /// Import daily energy snapshot records from a CSV export
    ImportDaily {
        #[arg(short = 'f', long)]
        csv: PathBuf,
    },
    /// Build and print the fleet reconciliation report
    Summary {
        /// Emit the full report as JSON instead of the text digest
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    // Initialize tracing with env filter support; respects RUST_LOG
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("setting default tracing subscriber failed")?;

    let cli = Cli::parse();
    let config_path = cli.config.to_string_lossy();
    let config = AppConfig::from_file(&config_path)?;
    let db = Database::open(&config.database.path)?;

    match cli.command {
        Commands::Ingest { files } => ingest_invoices(&db, &config, &files),
        Commands::ImportTelemetry { csv } => import_telemetry(&db, &config, &csv),
        Commands::ImportDaily { csv } => import_daily(&db, &csv),
        Commands::Summary { json } => print_summary(&db, &config, json),
    }
}

/// Batch invoice ingestion: one bad document never stops the rest.
fn ingest_invoices(db: &Database, config: &AppConfig, files: &[PathBuf]) -> Result<()> {
    let registry = config.plant_registry();
    let mut stored = 0_usize;
    let mut rejected = 0_usize;

    for file in files {
        let text = match std::fs::read_to_string(file) {
            Ok(text) => text,
            Err(err) => {
                warn!(file = %file.display(), %err, "failed to read invoice file");
                rejected += 1;
                continue;
            }
        };

        match extract_invoice(&text, &registry) {
            Ok(invoice) => {
                if let Err(err) = db.upsert_invoice(&invoice) {
                    warn!(file = %file.display(), %err, "failed to store invoice");
                    rejected += 1;
                } else {
                    info!(
                        account = %invoice.account_code,
                        year = invoice.year,
                        month = %invoice.month,
                        plant = %invoice.plant_name,
                        "invoice stored"
                    );
                    stored += 1;
                }
            }
            Err(err) => {
                warn!(file = %file.display(), %err, "document rejected");
                rejected += 1;
            }
        }
    }

    info!(stored, rejected, "invoice ingestion finished");
    Ok(())
}

fn import_telemetry(db: &Database, config: &AppConfig, csv_path: &PathBuf) -> Result<()> {
    let mut reader = csv::Reader::from_path(csv_path)
        .with_context(|| format!("Failed to open CSV: {}", csv_path.display()))?;

    let mut imported = 0_usize;
    for result in reader.deserialize::<TelemetrySample>() {
        match result {
            Ok(sample) => {
                db.insert_sample(&sample)?;
                imported += 1;
            }
            Err(err) => warn!(%err, "skipping malformed telemetry row"),
        }
    }

    let swept = db.cleanup_old_samples(config.database.sample_retention_days)?;
    info!(imported, swept, "telemetry import finished");
    Ok(())
}

fn import_daily(db: &Database, csv_path: &PathBuf) -> Result<()> {
    let mut reader = csv::Reader::from_path(csv_path)
        .with_context(|| format!("Failed to open CSV: {}", csv_path.display()))?;

    let mut imported = 0_usize;
    for result in reader.deserialize::<DailyEnergyRecord>() {
        match result {
            Ok(rec) => {
                db.insert_daily_record(&rec)?;
                imported += 1;
            }
            Err(err) => warn!(%err, "skipping malformed daily row"),
        }
    }

    info!(imported, "daily snapshot import finished");
    Ok(())
}

fn print_summary(db: &Database, config: &AppConfig, json: bool) -> Result<()> {
    let report = build_fleet_report(db, config, Utc::now())?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("Fleet report as of {}", report.as_of);
    for plant in &report.plants {
        println!(
            "  {} ({:?}) today {:.1} kWh | MTD {:.1} | YTD {:.1} | lifetime {:.1} | self-use {:.1}%",
            plant.name,
            plant.status,
            plant.today.generated_kwh,
            plant.month_to_date.generated_kwh,
            plant.year_to_date.generated_kwh,
            plant.lifetime.generated_kwh,
            plant.self_consumption_pct,
        );
    }

    let fin = &report.financial;
    println!(
        "Investment {:.2} | income {:.2} | tax benefits {:.2} | recovered {:.1}%",
        fin.total_investment,
        fin.total_income,
        fin.tax_benefits,
        fin.recovery.percent_recovered,
    );
    println!(
        "Payback {:.1}y (with tax {:.1}y) | projected {:.1}y | est. payback month {}",
        fin.realized.payback_years,
        fin.realized.payback_years_with_tax,
        fin.projected.payback_years,
        fin.recovery
            .estimated_payback_month
            .map_or_else(|| "unknown".to_owned(), |d| d.format("%Y-%m").to_string()),
    );

    for saving in &report.invoice_savings {
        println!(
            "  invoice {} {} {}: billed {:.2} vs grid-only {:.2} (saved {:.2})",
            saving.plant_name, saving.month, saving.year, saving.billed,
            saving.grid_only_cost, saving.savings,
        );
    }

    Ok(())
}
