// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of Heliora.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// One realtime reading from the monitoring feed.
///
/// The feed is append-only and may deliver several samples per day; only
/// the most recent sample per plant matters for "today" rollups. Counters
/// are cumulative and monotonically non-decreasing within their period.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetrySample {
    pub plant_code: String,
    pub timestamp: DateTime<Utc>,
    /// Instantaneous output power (W)
    pub power_w: f64,
    /// Cumulative generation since local midnight (kWh)
    pub day_energy_kwh: f64,
    /// Cumulative generation since the 1st of the local month (kWh)
    pub month_energy_kwh: f64,
    /// Lifetime cumulative generation (kWh)
    pub total_energy_kwh: f64,
}

/// Collapsed per-day energy figures for one plant and one local calendar
/// date. Upstream snapshots arrive at finer resolution; duplicates for the
/// same date collapse by taking the maximum of each cumulative counter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyEnergyRecord {
    pub plant_code: String,
    /// Calendar date in plant-local time
    pub date: NaiveDate,
    pub generated_kwh: f64,
    pub consumed_kwh: f64,
    pub self_consumed_kwh: f64,
    pub exported_kwh: f64,
    pub imported_kwh: f64,
}

impl DailyEnergyRecord {
    /// Empty record for a (plant, date) pair.
    #[must_use]
    pub fn empty(plant_code: &str, date: NaiveDate) -> Self {
        Self {
            plant_code: plant_code.to_owned(),
            date,
            generated_kwh: 0.0,
            consumed_kwh: 0.0,
            self_consumed_kwh: 0.0,
            exported_kwh: 0.0,
            imported_kwh: 0.0,
        }
    }

    /// Fold another observation for the same date into this record,
    /// keeping the maximum of each counter.
    pub fn merge_max(&mut self, other: &Self) {
        self.generated_kwh = self.generated_kwh.max(other.generated_kwh);
        self.consumed_kwh = self.consumed_kwh.max(other.consumed_kwh);
        self.self_consumed_kwh = self.self_consumed_kwh.max(other.self_consumed_kwh);
        self.exported_kwh = self.exported_kwh.max(other.exported_kwh);
        self.imported_kwh = self.imported_kwh.max(other.imported_kwh);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_max_keeps_largest_counters() {
        let date = NaiveDate::from_ymd_opt(2025, 11, 3).expect("valid date");
        let mut a = DailyEnergyRecord::empty("CAB", date);
        a.generated_kwh = 10.0;
        a.exported_kwh = 4.0;

        let mut b = DailyEnergyRecord::empty("CAB", date);
        b.generated_kwh = 8.0;
        b.exported_kwh = 6.0;

        a.merge_max(&b);
        assert_eq!(a.generated_kwh, 10.0);
        assert_eq!(a.exported_kwh, 6.0);
    }
}
