//! Per-category signal aggregation.
//!
//! `Totals` is the fixed-shape numeric aggregate every rollup and reporting
//! surface shares: one bucket per (vendor, category), summable across any
//! subset. `add_to_bucket` folds one account's signals into the addressed
//! category's bucket, zero-initializing on first use — unknown categories get
//! a bucket too and simply miss every allowed-set downstream.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// One account's financial signals for a single (vendor, fiscal year).
/// Absent DB values are coerced to 0.0 before they ever reach arithmetic.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalValues {
    pub invoicing: f64,
    pub invoicing_take: f64,
    pub bookings: f64,
    pub bookings_take: f64,
    pub session_revenue: f64,
    pub session_take: f64,
    pub pipeline_amount: f64,
    pub enrollment: f64,
}

impl SignalValues {
    /// Any recognized revenue this year (invoicing or session revenue).
    pub fn has_revenue(&self) -> bool {
        self.invoicing > 0.0 || self.session_revenue > 0.0
    }

    /// Any booked-but-unrecognized amount this year.
    pub fn has_bookings(&self) -> bool {
        self.bookings > 0.0
    }
}

/// The reporting aggregate: ~a dozen named numeric fields, keyed upstream by
/// vendor and category. `count` is the number of accounts folded in; the
/// `total_*` fields are the revenue/take sums display layers chart directly.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Totals {
    pub count: u64,
    pub enrollment: f64,
    pub pipeline_amount: f64,
    pub bookings: f64,
    pub bookings_take: f64,
    pub invoicing: f64,
    pub invoicing_take: f64,
    pub session_revenue: f64,
    pub session_take: f64,
    pub total_revenue: f64,
    pub total_take: f64,
}

impl Totals {
    /// Fold one account's signals into this bucket.
    pub fn add_signals(&mut self, s: &SignalValues) {
        self.count += 1;
        self.enrollment += s.enrollment;
        self.pipeline_amount += s.pipeline_amount;
        self.bookings += s.bookings;
        self.bookings_take += s.bookings_take;
        self.invoicing += s.invoicing;
        self.invoicing_take += s.invoicing_take;
        self.session_revenue += s.session_revenue;
        self.session_take += s.session_take;
        self.total_revenue += s.invoicing + s.session_revenue;
        self.total_take += s.invoicing_take + s.session_take;
    }

    /// Add another bucket into this one, field by field.
    pub fn merge(&mut self, other: &Totals) {
        self.count += other.count;
        self.enrollment += other.enrollment;
        self.pipeline_amount += other.pipeline_amount;
        self.bookings += other.bookings;
        self.bookings_take += other.bookings_take;
        self.invoicing += other.invoicing;
        self.invoicing_take += other.invoicing_take;
        self.session_revenue += other.session_revenue;
        self.session_take += other.session_take;
        self.total_revenue += other.total_revenue;
        self.total_take += other.total_take;
    }
}

/// Fold one account's (category, signals) pair into a per-category totals
/// map, creating a zero-initialized bucket on first use.
pub fn add_to_bucket(
    totals_by_category: &mut HashMap<String, Totals>,
    category: &str,
    signals: &SignalValues,
) {
    totals_by_category
        .entry(category.to_string())
        .or_default()
        .add_signals(signals);
}
