// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of Heliora.

//! Energy Rollup Aggregator.
//!
//! Fuses three telemetry sources of varying freshness into per-plant
//! day/month-to-date/year-to-date/lifetime rollups:
//!
//! 1. realtime samples (freshest, generation counters only)
//! 2. collapsed daily snapshot records (all five measures)
//! 3. zero (explicit, when both sources are silent)
//!
//! Each measure's precedence resolution is its own function so the
//! fallback order stays auditable.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use chrono_tz::Tz;

use heliora_types::{DailyEnergyRecord, Plant, PlantStatus, TelemetrySample};

use crate::types::{EnergyWindow, PlantSummary};

/// Collapse raw daily snapshot rows into one record per local date.
///
/// Counters are monotonically non-decreasing within a day, so duplicate
/// or partial snapshots collapse by per-counter maximum. Output is
/// sorted by date.
#[must_use]
pub fn collapse_daily_records(records: &[DailyEnergyRecord]) -> Vec<DailyEnergyRecord> {
    let mut by_date: BTreeMap<NaiveDate, DailyEnergyRecord> = BTreeMap::new();
    for rec in records {
        by_date
            .entry(rec.date)
            .and_modify(|existing| existing.merge_max(rec))
            .or_insert_with(|| rec.clone());
    }
    by_date.into_values().collect()
}

/// Today's generation: realtime counter first, collapsed snapshot
/// second, zero last.
#[must_use]
pub fn resolve_today_generation(realtime: Option<f64>, snapshot: Option<f64>) -> f64 {
    realtime.or(snapshot).unwrap_or(0.0)
}

/// Lifetime generation: the realtime lifetime counter supersedes the
/// sum of collapsed dailies when present.
#[must_use]
pub fn resolve_lifetime_generation(realtime_total: Option<f64>, daily_sum: f64) -> f64 {
    realtime_total.unwrap_or(daily_sum)
}

/// Year-to-date generation reconciled with the realtime today figure:
/// the realtime counter supersedes the snapshot's today contribution
/// inside the yearly sum, avoiding double counting.
#[must_use]
pub fn reconcile_ytd_generation(
    ytd_sum: f64,
    realtime_today: Option<f64>,
    snapshot_today: f64,
) -> f64 {
    match realtime_today {
        Some(rt) => ytd_sum + rt - snapshot_today,
        None => ytd_sum,
    }
}

/// Share of a lifetime measure against lifetime generation, in percent.
/// Zero generation yields zero, not a division error.
#[must_use]
pub fn lifetime_percentage(part: f64, lifetime_generated: f64) -> f64 {
    if lifetime_generated == 0.0 {
        0.0
    } else {
        part / lifetime_generated * 100.0
    }
}

/// Operational status from the age of the most recent realtime sample.
#[must_use]
pub fn plant_status(now: DateTime<Utc>, last_sample: Option<DateTime<Utc>>) -> PlantStatus {
    let Some(last) = last_sample else {
        return PlantStatus::Inactive;
    };
    let age = now.signed_duration_since(last);
    if age <= Duration::minutes(30) {
        PlantStatus::Active
    } else if age <= Duration::hours(24) {
        PlantStatus::Warning
    } else {
        PlantStatus::Inactive
    }
}

fn compliance_pct(actual: f64, target: f64) -> f64 {
    if target == 0.0 {
        0.0
    } else {
        actual / target * 100.0
    }
}

/// Build the complete rollup for one plant.
///
/// `daily` may contain duplicate rows per date; they are collapsed
/// here. `latest_sample` is the most recent realtime reading, if the
/// monitoring feed has one for this plant.
#[must_use]
pub fn build_plant_summary(
    plant: &Plant,
    latest_sample: Option<&TelemetrySample>,
    daily: &[DailyEnergyRecord],
    as_of: NaiveDate,
    now: DateTime<Utc>,
    tz: Tz,
) -> PlantSummary {
    let collapsed = collapse_daily_records(daily);

    let month_start = as_of.with_day(1).unwrap_or(as_of);
    let year_start = NaiveDate::from_ymd_opt(as_of.year(), 1, 1).unwrap_or(as_of);

    let mut month_to_date = EnergyWindow::default();
    let mut year_to_date = EnergyWindow::default();
    let mut lifetime = EnergyWindow::default();
    let mut snapshot_today: Option<&DailyEnergyRecord> = None;

    for rec in &collapsed {
        if rec.date > as_of {
            continue;
        }
        lifetime.add_day(rec);
        if rec.date >= year_start {
            year_to_date.add_day(rec);
        }
        if rec.date >= month_start {
            month_to_date.add_day(rec);
        }
        if rec.date == as_of {
            snapshot_today = Some(rec);
        }
    }

    // A realtime sample only counts toward "today" if it belongs to the
    // as-of local date.
    let realtime_today = latest_sample
        .filter(|s| s.timestamp.with_timezone(&tz).date_naive() == as_of)
        .map(|s| s.day_energy_kwh);
    let snapshot_today_gen = snapshot_today.map_or(0.0, |r| r.generated_kwh);

    let mut today = snapshot_today.map_or_else(EnergyWindow::default, |rec| {
        let mut w = EnergyWindow::default();
        w.add_day(rec);
        w
    });
    today.generated_kwh = resolve_today_generation(
        realtime_today,
        snapshot_today.map(|r| r.generated_kwh),
    );

    year_to_date.generated_kwh = reconcile_ytd_generation(
        year_to_date.generated_kwh,
        realtime_today,
        snapshot_today_gen,
    );

    lifetime.generated_kwh = resolve_lifetime_generation(
        latest_sample.map(|s| s.total_energy_kwh).filter(|v| *v > 0.0),
        lifetime.generated_kwh,
    );

    let today_target = plant.daily_target_kwh();
    let month_target = today_target * f64::from(as_of.day());
    let year_target = today_target * 365.0;
    let ytd_fraction_target = year_target * f64::from(as_of.ordinal()) / 365.0;

    PlantSummary {
        code: plant.code.clone(),
        name: plant.name.clone(),
        status: plant_status(now, latest_sample.map(|s| s.timestamp)),
        as_of,
        self_consumption_pct: lifetime_percentage(
            lifetime.self_consumed_kwh,
            lifetime.generated_kwh,
        ),
        export_pct: lifetime_percentage(lifetime.exported_kwh, lifetime.generated_kwh),
        today_compliance_pct: compliance_pct(today.generated_kwh, today_target),
        month_compliance_pct: compliance_pct(month_to_date.generated_kwh, month_target),
        year_compliance_pct: compliance_pct(year_to_date.generated_kwh, ytd_fraction_target),
        today,
        month_to_date,
        year_to_date,
        lifetime,
        today_target_kwh: today_target,
        month_target_kwh: month_target,
        year_target_kwh: year_target,
    }
}

/// Latest local date with any telemetry for one plant.
#[must_use]
pub fn latest_activity_date(
    latest_sample: Option<&TelemetrySample>,
    daily: &[DailyEnergyRecord],
    tz: Tz,
) -> Option<NaiveDate> {
    let sample_date = latest_sample.map(|s| s.timestamp.with_timezone(&tz).date_naive());
    let daily_date = daily.iter().map(|r| r.date).max();
    sample_date.max(daily_date)
}
