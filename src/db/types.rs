//! Shared type definitions for the database layer.

use serde::Serialize;
use thiserror::Error;

use crate::totals::SignalValues;

/// Errors specific to database operations.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Home directory not found")]
    HomeDirNotFound,

    #[error("Failed to create database directory: {0}")]
    CreateDir(std::io::Error),

    #[error("Schema migration failed: {0}")]
    Migration(String),
}

/// A row from the `accounts` table. Accounts are owned by the surrounding
/// pipeline; this core reads them and writes derived labels only.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DbAccount {
    pub id: String,
    pub name: String,
    /// NCES urban-centric locale code, when the district has one on file.
    pub locale_code: Option<i64>,
    pub updated_at: String,
}

/// One (account, vendor, fiscal year) signal row. NULL columns read as 0.0.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DbSignalRow {
    pub account_id: String,
    pub vendor: String,
    pub fiscal_year: i32,
    #[serde(flatten)]
    pub signals: SignalValues,
}

/// The externally-computed engagement category for one (account, vendor).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DbCategoryRow {
    pub account_id: String,
    pub vendor: String,
    pub category: String,
}

/// Spend a district reported with one tracked competitor in one fiscal year.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DbCompetitorSpend {
    pub account_id: String,
    pub competitor: String,
    pub fiscal_year: i32,
    pub spend: f64,
}

/// A row from the `labels` table. Identity within a group is the name.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DbLabel {
    pub id: String,
    pub name: String,
    pub color: String,
    pub label_group: String,
}
