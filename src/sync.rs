//! Label synchronization: make persisted label assignments match what the
//! rulesets compute.
//!
//! Each sync call is one reconciling transaction scoped to one account and
//! one label group (or, in bulk mode, one group across the whole population):
//! delete the group's current assignments, insert the freshly computed set.
//! Never a partial patch — running a sync twice with unchanged signals leaves
//! the persisted set byte-identical.
//!
//! Bulk sync exists because the per-account path is too slow at population
//! scale: it reads each input table once, computes every account's labels in
//! memory, then does one group-wide delete and one chunked bulk insert inside
//! a single outer transaction. Bulk sync must not interleave with per-account
//! syncs on the same group (both rewrite the same rows); the maintenance
//! pipeline runs bulk to completion before other writers proceed.

use std::collections::{BTreeMap, HashMap};

use crate::db::PulseDb;
use crate::hierarchy::EngagementConfig;
use crate::labels::{
    classification_labels, competitor_label, locale_label, LabelGroup, LabelSpec,
};
use crate::totals::SignalValues;

/// Recompute and persist one account's labels in one group.
///
/// Runs entirely inside one transaction; any failure (including a stale
/// account reference) rolls back and leaves the previously-persisted set
/// untouched. Returns the label set that now holds.
pub fn sync_account_labels(
    db: &PulseDb,
    config: &EngagementConfig,
    account_id: &str,
    group: LabelGroup,
    current_fy: i32,
) -> Result<Vec<LabelSpec>, String> {
    db.with_transaction(|db| {
        let account = db
            .get_account(account_id)
            .map_err(|e| e.to_string())?
            .ok_or_else(|| format!("Unknown account '{account_id}'"))?;

        let desired = match group {
            LabelGroup::Classification => {
                let current = db
                    .get_signal_values(account_id, &config.primary_vendor, current_fy)
                    .map_err(|e| e.to_string())?;
                let prior = db
                    .get_signal_values(account_id, &config.primary_vendor, current_fy - 1)
                    .map_err(|e| e.to_string())?;
                classification_labels(&current, &prior)
            }
            LabelGroup::Locale => locale_label(account.locale_code).into_iter().collect(),
            LabelGroup::Competitor => {
                let mut labels = Vec::new();
                for competitor in &config.competitors {
                    let spend = db
                        .competitor_spend_by_year(account_id, competitor)
                        .map_err(|e| e.to_string())?;
                    if let Some(label) = competitor_label(competitor, &spend, current_fy) {
                        labels.push(label);
                    }
                }
                labels
            }
        };

        db.replace_account_labels(account_id, group, &desired)
            .map_err(|e| e.to_string())?;
        Ok(desired)
    })
}

/// Recompute one group's labels for the entire account population.
///
/// Set-oriented: one read per input table, one group-wide delete, one chunked
/// bulk insert, all inside a single outer transaction so a mid-run failure
/// commits nothing. Also safely re-runnable by construction — a rerun fully
/// recomputes and replaces the set. Returns the number of assignment rows
/// written.
pub fn sync_all_labels(
    db: &PulseDb,
    config: &EngagementConfig,
    group: LabelGroup,
    current_fy: i32,
) -> Result<usize, String> {
    db.with_transaction(|db| {
        let desired = match group {
            LabelGroup::Classification => {
                desired_classification_labels(db, config, current_fy)?
            }
            LabelGroup::Locale => desired_locale_labels(db)?,
            LabelGroup::Competitor => desired_competitor_labels(db, config, current_fy)?,
        };

        // Mint/refresh label rows once per distinct spec, then expand to
        // (account, label id) assignment rows.
        let mut label_ids: HashMap<LabelSpec, String> = HashMap::new();
        let mut rows = Vec::with_capacity(desired.len());
        for (account_id, spec) in desired {
            let label_id = match label_ids.get(&spec) {
                Some(id) => id.clone(),
                None => {
                    let id = db.ensure_label(&spec, group).map_err(|e| e.to_string())?;
                    label_ids.insert(spec, id.clone());
                    id
                }
            };
            rows.push((account_id, label_id));
        }

        let removed = db
            .delete_group_assignments(group)
            .map_err(|e| e.to_string())?;
        log::info!(
            "bulk label sync ({}): cleared {} assignments, inserting {}",
            group.as_str(),
            removed,
            rows.len()
        );

        db.bulk_insert_assignments(&rows).map_err(|e| e.to_string())
    })
}

/// Classification labels for every account, from the primary vendor's
/// current- and prior-year signal rows.
fn desired_classification_labels(
    db: &PulseDb,
    config: &EngagementConfig,
    current_fy: i32,
) -> Result<Vec<(String, LabelSpec)>, String> {
    let rows = db
        .list_signal_rows(&config.primary_vendor, &[current_fy, current_fy - 1])
        .map_err(|e| e.to_string())?;

    let mut by_account: BTreeMap<String, (SignalValues, SignalValues)> = BTreeMap::new();
    for row in rows {
        let entry = by_account.entry(row.account_id).or_default();
        if row.fiscal_year == current_fy {
            entry.0 = row.signals;
        } else {
            entry.1 = row.signals;
        }
    }

    Ok(by_account
        .into_iter()
        .flat_map(|(account_id, (current, prior))| {
            classification_labels(&current, &prior)
                .into_iter()
                .map(move |label| (account_id.clone(), label))
        })
        .collect())
}

/// Locale labels for every account that has a recognized locale code.
fn desired_locale_labels(db: &PulseDb) -> Result<Vec<(String, LabelSpec)>, String> {
    Ok(db
        .list_accounts()
        .map_err(|e| e.to_string())?
        .into_iter()
        .filter_map(|account| locale_label(account.locale_code).map(|l| (account.id, l)))
        .collect())
}

/// Competitor labels for every (account, tracked competitor) with spend.
fn desired_competitor_labels(
    db: &PulseDb,
    config: &EngagementConfig,
    current_fy: i32,
) -> Result<Vec<(String, LabelSpec)>, String> {
    let rows = db.list_competitor_spend().map_err(|e| e.to_string())?;

    let mut by_pair: BTreeMap<(String, String), BTreeMap<i32, f64>> = BTreeMap::new();
    for row in rows {
        if !config.competitors.contains(&row.competitor) {
            continue;
        }
        by_pair
            .entry((row.account_id, row.competitor))
            .or_default()
            .insert(row.fiscal_year, row.spend);
    }

    Ok(by_pair
        .into_iter()
        .filter_map(|((account_id, competitor), spend)| {
            competitor_label(&competitor, &spend, current_fy).map(|l| (account_id, l))
        })
        .collect())
}
