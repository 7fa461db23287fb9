// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of Heliora.

//! Payment Inference Engine.
//!
//! Billing history records an accumulating surplus balance but never an
//! explicit "payment made" event. This module infers payments from the
//! chronological balance series: a payment is assumed wherever the
//! balance drops to less than half its previous value, with the inferred
//! amount equal to that previous value.
//!
//! This is a **heuristic**, not ground truth. A month where a legitimate
//! credit balance happens to more than halve without a real payment
//! (seasonal generation variation, tariff changes) produces a false
//! positive. Consumers must treat the output as inferred, never as
//! authoritative payment data.

use serde::{Deserialize, Serialize};

/// Payments inferred from one or more balance series.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InferredPayments {
    /// Individual inferred payment amounts, in series order
    pub payments: Vec<f64>,
    /// Sum of all inferred payments
    pub total_paid: f64,
    /// Most recent outstanding balance (still pending)
    pub current_balance: f64,
    /// Recovered excedentes: inferred payments plus pending balance
    pub total_recovered: f64,
}

impl InferredPayments {
    /// Fold another plant's inference into a fleet aggregate.
    pub fn merge(&mut self, other: &Self) {
        self.payments.extend_from_slice(&other.payments);
        self.total_paid += other.total_paid;
        self.current_balance += other.current_balance;
        self.total_recovered += other.total_recovered;
    }
}

/// Infer payments from a chronological balance series (ordered by year,
/// then month).
///
/// A payment is inferred at step `i` when `balance[i]` is strictly below
/// half of `balance[i-1]`; a drop to exactly half does not count. Fewer
/// than two periods, or a series that never drops, yields no payments.
#[must_use]
pub fn infer_payments(balances: &[f64]) -> InferredPayments {
    let mut payments = Vec::new();
    for window in balances.windows(2) {
        let (prev, curr) = (window[0], window[1]);
        if curr < prev / 2.0 {
            payments.push(prev);
        }
    }

    let total_paid: f64 = payments.iter().sum();
    let current_balance = balances.last().copied().unwrap_or(0.0);

    InferredPayments {
        payments,
        total_paid,
        current_balance,
        total_recovered: total_paid + current_balance,
    }
}
