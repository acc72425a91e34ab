//! Vendor/category rollups for the reporting endpoint.
//!
//! Input is the upstream pre-aggregation: vendor → category → `Totals`.
//! Output honors two filter dimensions — a per-vendor engagement sub-filter
//! (logical levels expanded to raw categories via config) and the active
//! vendor set. Cost is O(distinct categories) per vendor, never O(accounts);
//! the per-category pre-aggregation upstream is what keeps this fast.
//!
//! Everything here is pure: missing vendors, missing categories, and empty
//! allowed sets all produce zero totals, never errors.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::Serialize;

use crate::hierarchy::EngagementConfig;
use crate::totals::Totals;

/// Per-category totals for one vendor, as pre-aggregated upstream.
pub type CategoryTotals = HashMap<String, Totals>;

/// Combined reporting rollup. `per_vendor` is present only when two or more
/// vendors are active; a single active vendor gets just the combined pass.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VendorRollup {
    pub combined: Totals,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub per_vendor: Option<BTreeMap<String, Totals>>,
}

/// Sum the buckets whose category is in `allowed` into a fresh accumulator.
///
/// Walks every map entry once. Categories outside the allowed set are simply
/// skipped — including unknown strings that never belonged to the vocabulary.
pub fn sum_categories(by_category: &CategoryTotals, allowed: &HashSet<String>) -> Totals {
    let mut acc = Totals::default();
    for (category, totals) in by_category {
        if allowed.contains(category) {
            acc.merge(totals);
        }
    }
    acc
}

/// Sum every bucket in the map — the unfiltered grand total.
pub fn sum_all(by_category: &CategoryTotals) -> Totals {
    let mut acc = Totals::default();
    for totals in by_category.values() {
        acc.merge(totals);
    }
    acc
}

/// Total one vendor's buckets, honoring an optional engagement sub-filter.
///
/// A present sub-filter expands each logical level to its raw categories
/// before summing; an absent one reuses the unfiltered grand total.
fn vendor_total(
    config: &EngagementConfig,
    by_category: &CategoryTotals,
    sub_filter: Option<&[String]>,
) -> Totals {
    match sub_filter {
        Some(levels) => sum_categories(by_category, &config.expand_levels(levels)),
        None => sum_all(by_category),
    }
}

/// Roll per-vendor, per-category totals up into reporting numbers.
///
/// `filters` maps a vendor to its engagement sub-filter (levels); vendors
/// absent from the map are unfiltered. Vendors in `active_vendors` but absent
/// from `by_vendor` contribute zero totals.
pub fn rollup(
    config: &EngagementConfig,
    by_vendor: &HashMap<String, CategoryTotals>,
    active_vendors: &[String],
    filters: &HashMap<String, Vec<String>>,
) -> VendorRollup {
    let empty = CategoryTotals::new();
    let mut combined = Totals::default();
    let mut per_vendor = BTreeMap::new();

    for vendor in active_vendors {
        let by_category = by_vendor.get(vendor).unwrap_or(&empty);
        let total = vendor_total(config, by_category, filters.get(vendor).map(|v| v.as_slice()));
        combined.merge(&total);
        per_vendor.insert(vendor.clone(), total);
    }

    VendorRollup {
        combined,
        per_vendor: if active_vendors.len() >= 2 {
            Some(per_vendor)
        } else {
            None
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::totals::{add_to_bucket, SignalValues};

    fn signals(invoicing: f64) -> SignalValues {
        SignalValues {
            invoicing,
            ..SignalValues::default()
        }
    }

    fn sample_categories() -> CategoryTotals {
        let mut map = HashMap::new();
        add_to_bucket(&mut map, "target_pipeline", &signals(100.0));
        add_to_bucket(&mut map, "proposal_pipeline", &signals(200.0));
        add_to_bucket(&mut map, "single_year", &signals(1_000.0));
        add_to_bucket(&mut map, "multi_year", &signals(2_000.0));
        map
    }

    #[test]
    fn test_sum_categories_filters_by_allowed_set() {
        let map = sample_categories();
        let allowed: HashSet<String> = ["target_pipeline", "proposal_pipeline"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        let totals = sum_categories(&map, &allowed);
        assert_eq!(totals.count, 2);
        assert_eq!(totals.invoicing, 300.0);
    }

    #[test]
    fn test_empty_allowed_set_yields_zero_totals() {
        let map = sample_categories();
        let totals = sum_categories(&map, &HashSet::new());
        assert_eq!(totals, Totals::default());
    }

    #[test]
    fn test_sum_all_equals_full_vocabulary_filter() {
        let config = EngagementConfig::default();
        let map = sample_categories();

        let everything: HashSet<String> =
            config.all_categories().map(str::to_string).collect();
        assert_eq!(sum_all(&map), sum_categories(&map, &everything));
        assert_eq!(sum_all(&map).invoicing, 3_300.0);
    }

    #[test]
    fn test_single_vendor_has_no_breakdown() {
        let config = EngagementConfig::default();
        let mut by_vendor = HashMap::new();
        by_vendor.insert("coretext".to_string(), sample_categories());

        let result = rollup(
            &config,
            &by_vendor,
            &["coretext".to_string()],
            &HashMap::new(),
        );
        assert!(result.per_vendor.is_none());
        assert_eq!(result.combined.invoicing, 3_300.0);
    }

    #[test]
    fn test_two_vendors_with_independent_filters() {
        let config = EngagementConfig::default();
        let mut by_vendor = HashMap::new();
        by_vendor.insert("coretext".to_string(), sample_categories());
        by_vendor.insert("sessionworks".to_string(), sample_categories());

        // Vendor one filtered to pipeline, vendor two unfiltered: combined is
        // the filtered sum plus the full grand total.
        let mut filters = HashMap::new();
        filters.insert("coretext".to_string(), vec!["pipeline".to_string()]);

        let result = rollup(
            &config,
            &by_vendor,
            &["coretext".to_string(), "sessionworks".to_string()],
            &filters,
        );

        let breakdown = result.per_vendor.expect("two vendors need a breakdown");
        assert_eq!(breakdown["coretext"].invoicing, 300.0);
        assert_eq!(breakdown["sessionworks"].invoicing, 3_300.0);
        assert_eq!(result.combined.invoicing, 3_600.0);
        assert_eq!(
            result.combined.count,
            breakdown["coretext"].count + breakdown["sessionworks"].count
        );
    }

    #[test]
    fn test_vendor_missing_from_input_contributes_zero() {
        let config = EngagementConfig::default();
        let mut by_vendor = HashMap::new();
        by_vendor.insert("coretext".to_string(), sample_categories());

        let result = rollup(
            &config,
            &by_vendor,
            &["coretext".to_string(), "sessionworks".to_string()],
            &HashMap::new(),
        );
        let breakdown = result.per_vendor.expect("breakdown");
        assert_eq!(breakdown["sessionworks"], Totals::default());
        assert_eq!(result.combined.invoicing, 3_300.0);
    }

    #[test]
    fn test_unfiltered_rollup_matches_independent_grand_total() {
        // The rollup over the full unfiltered set must equal a direct sum
        // over every account's raw signals, unknown categories included.
        let accounts = [
            ("d1", "single_year", 100.0),
            ("d2", "multi_year", 250.0),
            ("d3", "target_pipeline", 40.0),
            ("d4", "mystery_state", 7.0),
        ];

        let mut by_category = HashMap::new();
        let mut direct = Totals::default();
        for (_, category, invoicing) in &accounts {
            let s = signals(*invoicing);
            add_to_bucket(&mut by_category, category, &s);
            direct.add_signals(&s);
        }

        assert_eq!(sum_all(&by_category), direct);
    }

    #[test]
    fn test_filtered_plus_unfiltered_combined() {
        // Vendor one's sub-filter expands to exactly three raw categories;
        // vendor two is unfiltered. Combined must equal the three-category
        // sum plus vendor two's full total.
        let config = EngagementConfig::new(
            &["no_data"],
            &["early", "mid", "late"],
            &["won"],
            &[("pipeline", &["early", "mid", "late"])],
            "coretext",
            &[],
        );

        let mut v1 = HashMap::new();
        add_to_bucket(&mut v1, "early", &signals(10.0));
        add_to_bucket(&mut v1, "mid", &signals(20.0));
        add_to_bucket(&mut v1, "late", &signals(30.0));
        add_to_bucket(&mut v1, "won", &signals(500.0));

        let mut v2 = HashMap::new();
        add_to_bucket(&mut v2, "early", &signals(1.0));
        add_to_bucket(&mut v2, "won", &signals(2.0));

        let mut by_vendor = HashMap::new();
        by_vendor.insert("v1".to_string(), v1);
        by_vendor.insert("v2".to_string(), v2);

        let mut filters = HashMap::new();
        filters.insert("v1".to_string(), vec!["pipeline".to_string()]);

        let result = rollup(
            &config,
            &by_vendor,
            &["v1".to_string(), "v2".to_string()],
            &filters,
        );
        assert_eq!(result.combined.invoicing, 60.0 + 3.0);

        let breakdown = result.per_vendor.expect("breakdown");
        assert_eq!(breakdown["v1"].invoicing, 60.0);
        assert_eq!(breakdown["v2"].invoicing, 3.0);
    }

    #[test]
    fn test_unknown_level_in_filter_undercounts_not_errors() {
        let config = EngagementConfig::default();
        let mut by_vendor = HashMap::new();
        by_vendor.insert("coretext".to_string(), sample_categories());

        let mut filters = HashMap::new();
        filters.insert(
            "coretext".to_string(),
            vec!["pipeline".to_string(), "bogus_level".to_string()],
        );

        let result = rollup(&config, &by_vendor, &["coretext".to_string()], &filters);
        assert_eq!(result.combined.invoicing, 300.0);
    }
}
