use rusqlite::params;

use super::*;
use crate::labels::{LabelGroup, LabelSpec};

/// Rows per multi-row INSERT during bulk assignment writes. Keeps statements
/// under SQLite's bound-parameter limit with plenty of headroom.
pub const BULK_INSERT_CHUNK: usize = 1000;

impl PulseDb {
    // =========================================================================
    // Label rows
    // =========================================================================

    /// Ensure a label row exists for (name, group), returning its id.
    /// Color updates in place when the spec changed.
    pub fn ensure_label(&self, spec: &LabelSpec, group: LabelGroup) -> Result<String, DbError> {
        self.conn.execute(
            "INSERT INTO labels (id, name, color, label_group)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(name, label_group) DO UPDATE SET
                color = excluded.color",
            params![
                uuid::Uuid::new_v4().to_string(),
                spec.name,
                spec.color,
                group.as_str()
            ],
        )?;
        let id = self.conn.query_row(
            "SELECT id FROM labels WHERE name = ?1 AND label_group = ?2",
            params![spec.name, group.as_str()],
            |row| row.get(0),
        )?;
        Ok(id)
    }

    /// All label rows in one group.
    pub fn list_labels(&self, group: LabelGroup) -> Result<Vec<DbLabel>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, color, label_group FROM labels
             WHERE label_group = ?1
             ORDER BY name",
        )?;
        let rows = stmt.query_map(params![group.as_str()], |row| {
            Ok(DbLabel {
                id: row.get(0)?,
                name: row.get(1)?,
                color: row.get(2)?,
                label_group: row.get(3)?,
            })
        })?;

        let mut labels = Vec::new();
        for row in rows {
            labels.push(row?);
        }
        Ok(labels)
    }

    // =========================================================================
    // Assignments
    // =========================================================================

    /// Labels currently assigned to an account within one group, ordered by
    /// name for stable comparison.
    pub fn account_labels(
        &self,
        account_id: &str,
        group: LabelGroup,
    ) -> Result<Vec<DbLabel>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT l.id, l.name, l.color, l.label_group
             FROM labels l
             INNER JOIN account_labels al ON al.label_id = l.id
             WHERE al.account_id = ?1 AND l.label_group = ?2
             ORDER BY l.name",
        )?;
        let rows = stmt.query_map(params![account_id, group.as_str()], |row| {
            Ok(DbLabel {
                id: row.get(0)?,
                name: row.get(1)?,
                color: row.get(2)?,
                label_group: row.get(3)?,
            })
        })?;

        let mut labels = Vec::new();
        for row in rows {
            labels.push(row?);
        }
        Ok(labels)
    }

    /// Make one account's persisted assignments in one group match `desired`
    /// exactly: delete everything in the group, insert the computed set.
    ///
    /// Not transactional by itself — callers wrap it in `with_transaction` so
    /// a failure between delete and insert rolls back to the prior set.
    pub fn replace_account_labels(
        &self,
        account_id: &str,
        group: LabelGroup,
        desired: &[LabelSpec],
    ) -> Result<(), DbError> {
        self.conn.execute(
            "DELETE FROM account_labels
             WHERE account_id = ?1
               AND label_id IN (SELECT id FROM labels WHERE label_group = ?2)",
            params![account_id, group.as_str()],
        )?;

        for spec in desired {
            let label_id = self.ensure_label(spec, group)?;
            self.conn.execute(
                "INSERT OR IGNORE INTO account_labels (account_id, label_id)
                 VALUES (?1, ?2)",
                params![account_id, label_id],
            )?;
        }
        Ok(())
    }

    /// Delete every assignment in one group across all accounts. Returns the
    /// number of rows removed. The first half of a bulk sync.
    pub fn delete_group_assignments(&self, group: LabelGroup) -> Result<usize, DbError> {
        let deleted = self.conn.execute(
            "DELETE FROM account_labels
             WHERE label_id IN (SELECT id FROM labels WHERE label_group = ?1)",
            params![group.as_str()],
        )?;
        Ok(deleted)
    }

    /// Insert (account_id, label_id) assignment rows in chunks of
    /// `BULK_INSERT_CHUNK`, logging at each chunk boundary so a long run
    /// shows liveness. Returns the number of rows inserted.
    pub fn bulk_insert_assignments(
        &self,
        rows: &[(String, String)],
    ) -> Result<usize, DbError> {
        let mut inserted = 0usize;
        for chunk in rows.chunks(BULK_INSERT_CHUNK) {
            let placeholders: Vec<String> = (0..chunk.len())
                .map(|i| format!("(?{}, ?{})", i * 2 + 1, i * 2 + 2))
                .collect();
            let sql = format!(
                "INSERT OR IGNORE INTO account_labels (account_id, label_id) VALUES {}",
                placeholders.join(", ")
            );

            let mut sql_params: Vec<&dyn rusqlite::types::ToSql> =
                Vec::with_capacity(chunk.len() * 2);
            for (account_id, label_id) in chunk {
                sql_params.push(account_id);
                sql_params.push(label_id);
            }

            inserted += self.conn.execute(&sql, &*sql_params)?;
            log::info!(
                "bulk label insert: {}/{} assignment rows written",
                inserted,
                rows.len()
            );
        }
        Ok(inserted)
    }
}
