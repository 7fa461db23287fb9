// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of Heliora.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A provisioned installation. Read-only to the reconciliation engine:
/// fleet provisioning owns creation and edits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plant {
    /// Short internal code (e.g. "CAB")
    pub code: String,
    /// Display name as shown on the dashboard
    pub name: String,
    /// Utility account code as printed on invoices (7+ digits)
    pub account_code: String,
    /// Installed capacity (kWp)
    pub capacity_kwp: f64,
    /// Expected peak sun hours per day at this site
    pub peak_sun_hours: f64,
    /// Performance ratio target (0-1)
    pub performance_ratio: f64,
    /// Commissioning date
    pub commissioned: NaiveDate,
}

impl Plant {
    /// Daily generation target in kWh (capacity × sun hours × PR).
    #[must_use]
    pub fn daily_target_kwh(&self) -> f64 {
        self.capacity_kwp * self.peak_sun_hours * self.performance_ratio
    }
}

/// Operational status derived from realtime sample freshness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlantStatus {
    /// Last sample within 30 minutes
    Active,
    /// Last sample within 24 hours
    Warning,
    /// No recent sample (or none at all)
    Inactive,
}

/// Read-only mapping from utility account codes to plant display names.
///
/// Injected configuration: invoices only carry the account code, so the
/// extractor resolves the human-readable name through this registry. An
/// unknown code resolves to an empty name, never an error.
#[derive(Debug, Clone, Default)]
pub struct PlantRegistry {
    by_account: HashMap<String, String>,
}

impl PlantRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self {
            by_account: HashMap::new(),
        }
    }

    /// Build a registry from (account code, plant name) pairs.
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, S)>,
        S: Into<String>,
    {
        Self {
            by_account: pairs
                .into_iter()
                .map(|(code, name)| (code.into(), name.into()))
                .collect(),
        }
    }

    /// Resolve a plant name; unknown codes yield an empty string.
    #[must_use]
    pub fn name_for(&self, account_code: &str) -> String {
        self.by_account.get(account_code).cloned().unwrap_or_default()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_account.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.by_account.len()
    }
}
