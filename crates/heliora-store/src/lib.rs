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

//! SQLite-backed ledger for Heliora.
//!
//! The store is a queryable ledger, nothing more: invoices keyed by
//! (account code, year, month) with insert-or-replace semantics, and
//! two append-only telemetry tables. All reconciliation logic lives in
//! `heliora-core`; this crate only persists and queries.

pub mod db;

pub use db::Database;
