//! Engagement classification core for district sales intelligence.
//!
//! Four rule engines, leaf to root:
//! - `hierarchy`: the category vocabulary, groups, and rank table.
//! - `transition`: pure (category, category) → transition bucket classifier.
//! - `totals`: per-category signal aggregation into the shared `Totals` shape.
//! - `rollup`: vendor/category rollups honoring engagement sub-filters.
//!
//! Plus the persistence side:
//! - `labels`: the pure label rulesets (classification, competitor, locale).
//! - `sync`: transactional label reconciliation, per account and in bulk.
//! - `db`: the SQLite store the sync engine reads signals from and writes
//!   labels to.
//!
//! The classification and rollup layers are pure and safe to call from any
//! number of threads; only `sync` writes, and only through short single-scope
//! transactions. Consumers are the reporting endpoint, the tag-sync job (see
//! the `sync_labels` binary), and the year-over-year comparison endpoint.

pub mod db;
pub mod hierarchy;
pub mod labels;
mod migrations;
pub mod rollup;
pub mod sync;
pub mod totals;
pub mod transition;
