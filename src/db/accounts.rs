use std::collections::BTreeMap;

use rusqlite::params;

use super::*;
use crate::totals::SignalValues;

/// Map a row to SignalValues. Expects the eight signal columns in table
/// order; NULLs coerce to 0.0 so absent signals never reach arithmetic as
/// anything but zero.
fn map_signal_values(row: &rusqlite::Row, offset: usize) -> rusqlite::Result<SignalValues> {
    let get = |i: usize| -> rusqlite::Result<f64> {
        Ok(row.get::<_, Option<f64>>(offset + i)?.unwrap_or(0.0))
    };
    Ok(SignalValues {
        invoicing: get(0)?,
        invoicing_take: get(1)?,
        bookings: get(2)?,
        bookings_take: get(3)?,
        session_revenue: get(4)?,
        session_take: get(5)?,
        pipeline_amount: get(6)?,
        enrollment: get(7)?,
    })
}

const SIGNAL_COLUMNS: &str = "invoicing, invoicing_take, bookings, bookings_take, \
     session_revenue, session_take, pipeline_amount, enrollment";

impl PulseDb {
    // =========================================================================
    // Accounts
    // =========================================================================

    /// Insert or update an account.
    pub fn upsert_account(&self, account: &DbAccount) -> Result<(), DbError> {
        self.conn.execute(
            "INSERT INTO accounts (id, name, locale_code, updated_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                locale_code = excluded.locale_code,
                updated_at = excluded.updated_at",
            params![
                account.id,
                account.name,
                account.locale_code,
                account.updated_at
            ],
        )?;
        Ok(())
    }

    /// Fetch one account by id.
    pub fn get_account(&self, id: &str) -> Result<Option<DbAccount>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, locale_code, updated_at FROM accounts WHERE id = ?1",
        )?;
        let mut rows = stmt.query_map(params![id], |row| {
            Ok(DbAccount {
                id: row.get(0)?,
                name: row.get(1)?,
                locale_code: row.get(2)?,
                updated_at: row.get(3)?,
            })
        })?;
        match rows.next() {
            Some(row) => Ok(Some(row?)),
            None => Ok(None),
        }
    }

    /// All accounts, ordered by id for stable iteration.
    pub fn list_accounts(&self) -> Result<Vec<DbAccount>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, locale_code, updated_at FROM accounts ORDER BY id",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(DbAccount {
                id: row.get(0)?,
                name: row.get(1)?,
                locale_code: row.get(2)?,
                updated_at: row.get(3)?,
            })
        })?;

        let mut accounts = Vec::new();
        for row in rows {
            accounts.push(row?);
        }
        Ok(accounts)
    }

    // =========================================================================
    // Signal rows
    // =========================================================================

    /// Insert or update one (account, vendor, fiscal year) signal row.
    pub fn upsert_signal_row(&self, row: &DbSignalRow) -> Result<(), DbError> {
        let s = &row.signals;
        self.conn.execute(
            "INSERT INTO account_signals (account_id, vendor, fiscal_year,
                invoicing, invoicing_take, bookings, bookings_take,
                session_revenue, session_take, pipeline_amount, enrollment)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
             ON CONFLICT(account_id, vendor, fiscal_year) DO UPDATE SET
                invoicing = excluded.invoicing,
                invoicing_take = excluded.invoicing_take,
                bookings = excluded.bookings,
                bookings_take = excluded.bookings_take,
                session_revenue = excluded.session_revenue,
                session_take = excluded.session_take,
                pipeline_amount = excluded.pipeline_amount,
                enrollment = excluded.enrollment",
            params![
                row.account_id,
                row.vendor,
                row.fiscal_year,
                s.invoicing,
                s.invoicing_take,
                s.bookings,
                s.bookings_take,
                s.session_revenue,
                s.session_take,
                s.pipeline_amount,
                s.enrollment,
            ],
        )?;
        Ok(())
    }

    /// Signal values for one (account, vendor, fiscal year). A missing row
    /// reads as all zeros — absent signals are zero, never an error.
    pub fn get_signal_values(
        &self,
        account_id: &str,
        vendor: &str,
        fiscal_year: i32,
    ) -> Result<SignalValues, DbError> {
        let sql = format!(
            "SELECT {SIGNAL_COLUMNS} FROM account_signals
             WHERE account_id = ?1 AND vendor = ?2 AND fiscal_year = ?3"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows =
            stmt.query_map(params![account_id, vendor, fiscal_year], |row| {
                map_signal_values(row, 0)
            })?;
        match rows.next() {
            Some(row) => Ok(row?),
            None => Ok(SignalValues::default()),
        }
    }

    /// All signal rows for one vendor across the given fiscal years. The
    /// set-oriented read bulk label sync starts from.
    pub fn list_signal_rows(
        &self,
        vendor: &str,
        fiscal_years: &[i32],
    ) -> Result<Vec<DbSignalRow>, DbError> {
        if fiscal_years.is_empty() {
            return Ok(Vec::new());
        }
        let placeholders: Vec<String> =
            (2..=fiscal_years.len() + 1).map(|i| format!("?{}", i)).collect();
        let sql = format!(
            "SELECT account_id, vendor, fiscal_year, {SIGNAL_COLUMNS}
             FROM account_signals
             WHERE vendor = ?1 AND fiscal_year IN ({})
             ORDER BY account_id, fiscal_year",
            placeholders.join(", ")
        );

        let mut stmt = self.conn.prepare(&sql)?;
        let mut sql_params: Vec<&dyn rusqlite::types::ToSql> = vec![&vendor];
        for fy in fiscal_years {
            sql_params.push(fy);
        }

        let rows = stmt.query_map(&*sql_params, |row| {
            Ok(DbSignalRow {
                account_id: row.get(0)?,
                vendor: row.get(1)?,
                fiscal_year: row.get(2)?,
                signals: map_signal_values(row, 3)?,
            })
        })?;

        let mut result = Vec::new();
        for row in rows {
            result.push(row?);
        }
        Ok(result)
    }

    // =========================================================================
    // Category assignments
    // =========================================================================

    /// Record the externally-computed category for one (account, vendor).
    pub fn set_category(
        &self,
        account_id: &str,
        vendor: &str,
        category: &str,
    ) -> Result<(), DbError> {
        self.conn.execute(
            "INSERT INTO account_categories (account_id, vendor, category)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(account_id, vendor) DO UPDATE SET
                category = excluded.category",
            params![account_id, vendor, category],
        )?;
        Ok(())
    }

    /// The current category for one (account, vendor), if assigned.
    pub fn get_category(
        &self,
        account_id: &str,
        vendor: &str,
    ) -> Result<Option<String>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT category FROM account_categories
             WHERE account_id = ?1 AND vendor = ?2",
        )?;
        let mut rows = stmt.query_map(params![account_id, vendor], |row| {
            row.get::<_, String>(0)
        })?;
        match rows.next() {
            Some(row) => Ok(Some(row?)),
            None => Ok(None),
        }
    }

    /// All category assignments for one vendor, for rollup pre-aggregation.
    pub fn list_category_assignments(
        &self,
        vendor: &str,
    ) -> Result<Vec<DbCategoryRow>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT account_id, vendor, category FROM account_categories
             WHERE vendor = ?1
             ORDER BY account_id",
        )?;
        let rows = stmt.query_map(params![vendor], |row| {
            Ok(DbCategoryRow {
                account_id: row.get(0)?,
                vendor: row.get(1)?,
                category: row.get(2)?,
            })
        })?;

        let mut result = Vec::new();
        for row in rows {
            result.push(row?);
        }
        Ok(result)
    }

    // =========================================================================
    // Competitor spend
    // =========================================================================

    /// Insert or update one competitor spend observation.
    pub fn upsert_competitor_spend(
        &self,
        account_id: &str,
        competitor: &str,
        fiscal_year: i32,
        spend: f64,
    ) -> Result<(), DbError> {
        self.conn.execute(
            "INSERT INTO competitor_spend (account_id, competitor, fiscal_year, spend)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(account_id, competitor, fiscal_year) DO UPDATE SET
                spend = excluded.spend",
            params![account_id, competitor, fiscal_year, spend],
        )?;
        Ok(())
    }

    /// One account's spend with one competitor, keyed by fiscal year.
    /// NULL spend reads as 0.0.
    pub fn competitor_spend_by_year(
        &self,
        account_id: &str,
        competitor: &str,
    ) -> Result<BTreeMap<i32, f64>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT fiscal_year, spend FROM competitor_spend
             WHERE account_id = ?1 AND competitor = ?2",
        )?;
        let rows = stmt.query_map(params![account_id, competitor], |row| {
            Ok((
                row.get::<_, i32>(0)?,
                row.get::<_, Option<f64>>(1)?.unwrap_or(0.0),
            ))
        })?;

        let mut by_year = BTreeMap::new();
        for row in rows {
            let (year, spend) = row?;
            by_year.insert(year, spend);
        }
        Ok(by_year)
    }

    /// Every competitor spend row, for the bulk sync's set-oriented read.
    pub fn list_competitor_spend(&self) -> Result<Vec<DbCompetitorSpend>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT account_id, competitor, fiscal_year, spend
             FROM competitor_spend
             ORDER BY account_id, competitor, fiscal_year",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(DbCompetitorSpend {
                account_id: row.get(0)?,
                competitor: row.get(1)?,
                fiscal_year: row.get(2)?,
                spend: row.get::<_, Option<f64>>(3)?.unwrap_or(0.0),
            })
        })?;

        let mut result = Vec::new();
        for row in rows {
            result.push(row?);
        }
        Ok(result)
    }
}
