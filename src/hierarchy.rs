//! Category vocabulary, groups, and the rank table.
//!
//! Every engagement category a district can hold belongs to exactly one of
//! three groups: no-data (never bought, lapsed, or churned), pipeline (five
//! ordered stages), or customer (three ordered stages). Ranks order the full
//! vocabulary by engagement depth: no-data = 0, pipeline = 1..=5, customer =
//! 6..=8. Unknown or empty strings rank 0 and belong to no group — they never
//! error, they just fall out of every rollup.
//!
//! The vocabulary is carried by an `EngagementConfig` injected into each
//! component at call time, so tests can substitute alternate vocabularies
//! without touching global state.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

/// The three engagement groups a category can belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryGroup {
    NoData,
    Pipeline,
    Customer,
}

impl CategoryGroup {
    pub fn as_str(&self) -> &'static str {
        match self {
            CategoryGroup::NoData => "no_data",
            CategoryGroup::Pipeline => "pipeline",
            CategoryGroup::Customer => "customer",
        }
    }
}

// ---------------------------------------------------------------------------
// Production vocabulary
// ---------------------------------------------------------------------------

/// No-data categories. All rank 0; order is not significant.
pub const NO_DATA_CATEGORIES: &[&str] = &["no_data", "lapsed", "churned"];

/// Pipeline stages in ascending order. Ranks 1..=5.
pub const PIPELINE_CATEGORIES: &[&str] = &[
    "target_pipeline",
    "engaged_pipeline",
    "proposal_pipeline",
    "verbal_pipeline",
    "renewal_pipeline",
];

/// Customer stages in ascending order. Ranks 6..=8.
pub const CUSTOMER_CATEGORIES: &[&str] = &["single_year", "multi_year", "multi_year_growing"];

/// Engagement-level filter options shown to users, each expanding to 1..N raw
/// categories. Keys are the level names the display layer sends back.
pub const ENGAGEMENT_LEVELS: &[(&str, &[&str])] = &[
    ("no_data", NO_DATA_CATEGORIES),
    ("pipeline", PIPELINE_CATEGORIES),
    ("customer", CUSTOMER_CATEGORIES),
    ("multi_year", &["multi_year", "multi_year_growing"]),
];

/// Vendors a district can engage with. The first entry is the primary vendor
/// whose signals drive the classification label ruleset.
pub const VENDORS: &[&str] = &["coretext", "sessionworks"];

/// Competitor products tracked per district for win-back labeling.
pub const COMPETITORS: &[&str] = &["EduRival", "ClassCompete"];

// ---------------------------------------------------------------------------
// EngagementConfig
// ---------------------------------------------------------------------------

/// Immutable vocabulary and mapping tables injected into every component.
///
/// Built once (usually via `EngagementConfig::default()`) and passed by
/// reference; holds no mutable state.
#[derive(Debug, Clone)]
pub struct EngagementConfig {
    /// category -> (rank, group). Rank 0 entries are the no-data group.
    ranks: HashMap<String, (u8, CategoryGroup)>,
    /// engagement level -> raw categories it expands to.
    levels: HashMap<String, Vec<String>>,
    /// Vendor whose signals drive the classification ruleset.
    pub primary_vendor: String,
    /// Competitor products tracked for win-back labels.
    pub competitors: Vec<String>,
}

impl EngagementConfig {
    /// Build a config from ordered group vocabularies and a level map.
    ///
    /// Rank assignment follows the invariant: no-data = 0, pipeline stages
    /// take 1..=N in the given order, customer stages continue from there.
    pub fn new(
        no_data: &[&str],
        pipeline: &[&str],
        customer: &[&str],
        levels: &[(&str, &[&str])],
        primary_vendor: &str,
        competitors: &[&str],
    ) -> Self {
        let mut ranks = HashMap::new();
        for cat in no_data {
            ranks.insert(cat.to_string(), (0, CategoryGroup::NoData));
        }
        for (i, cat) in pipeline.iter().enumerate() {
            ranks.insert(cat.to_string(), (i as u8 + 1, CategoryGroup::Pipeline));
        }
        let customer_base = pipeline.len() as u8;
        for (i, cat) in customer.iter().enumerate() {
            ranks.insert(
                cat.to_string(),
                (customer_base + 1 + i as u8, CategoryGroup::Customer),
            );
        }

        let levels = levels
            .iter()
            .map(|(name, cats)| {
                (
                    name.to_string(),
                    cats.iter().map(|c| c.to_string()).collect(),
                )
            })
            .collect();

        Self {
            ranks,
            levels,
            primary_vendor: primary_vendor.to_string(),
            competitors: competitors.iter().map(|c| c.to_string()).collect(),
        }
    }

    /// Rank of a category. 0 for unknown, empty, or no-data categories.
    pub fn rank_of(&self, category: &str) -> u8 {
        self.ranks.get(category.trim()).map(|(r, _)| *r).unwrap_or(0)
    }

    /// Group a category belongs to. `None` for unknown/empty strings.
    pub fn group_of(&self, category: &str) -> Option<CategoryGroup> {
        self.ranks.get(category.trim()).map(|(_, g)| *g)
    }

    /// Whether a category belongs to the given group. Unknown categories are
    /// in no group, including `NoData`.
    pub fn is_in_group(&self, category: &str, group: CategoryGroup) -> bool {
        self.group_of(category) == Some(group)
    }

    /// All categories in the vocabulary (unordered).
    pub fn all_categories(&self) -> impl Iterator<Item = &str> {
        self.ranks.keys().map(|k| k.as_str())
    }

    /// Expand a set of engagement levels into the raw categories they cover.
    ///
    /// Unknown level names expand to nothing (logged at debug, never an
    /// error), so a stale filter from the display layer degrades to an
    /// undercount rather than a failure.
    pub fn expand_levels(&self, levels: &[String]) -> HashSet<String> {
        let mut allowed = HashSet::new();
        for level in levels {
            match self.levels.get(level.as_str()) {
                Some(cats) => allowed.extend(cats.iter().cloned()),
                None => log::debug!("Ignoring unknown engagement level '{}'", level),
            }
        }
        allowed
    }
}

impl Default for EngagementConfig {
    fn default() -> Self {
        Self::new(
            NO_DATA_CATEGORIES,
            PIPELINE_CATEGORIES,
            CUSTOMER_CATEGORIES,
            ENGAGEMENT_LEVELS,
            VENDORS[0],
            COMPETITORS,
        )
    }
}
