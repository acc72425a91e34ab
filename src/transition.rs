//! Year-over-year transition classification.
//!
//! Maps a pair of engagement categories (fiscal year A, fiscal year B) to a
//! transition bucket for change-over-time reporting. The rules are an ordered
//! table evaluated first-match-wins; ordering is load-bearing. In particular,
//! the new-customer rule fires before the rank-based upgrade rule, so a direct
//! pipeline→customer jump classifies as `NewCustomer` rather than `Upgraded`
//! even though both sides rank ≥ 1. Downstream reports depend on that exact
//! precedence.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::hierarchy::{CategoryGroup, EngagementConfig};

/// How a district's engagement changed between two fiscal years.
/// Derived on demand, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionBucket {
    Unchanged,
    Churned,
    NewCustomer,
    NewPipeline,
    Upgraded,
    Downgraded,
}

impl TransitionBucket {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransitionBucket::Unchanged => "unchanged",
            TransitionBucket::Churned => "churned",
            TransitionBucket::NewCustomer => "new_customer",
            TransitionBucket::NewPipeline => "new_pipeline",
            TransitionBucket::Upgraded => "upgraded",
            TransitionBucket::Downgraded => "downgraded",
        }
    }
}

/// Facts derived from a normalized category pair, precomputed once so each
/// rule predicate stays a one-liner.
#[derive(Debug, Clone, Copy)]
struct PairFacts {
    same: bool,
    rank_a: u8,
    rank_b: u8,
    /// Absent categories count as no-data for rule purposes.
    a_no_data: bool,
    b_no_data: bool,
    a_pipeline: bool,
    b_pipeline: bool,
    b_customer: bool,
}

/// One classification rule: named so each can be pinned independently in
/// tests, evaluated in table order, first match wins.
struct TransitionRule {
    name: &'static str,
    applies: fn(&PairFacts) -> bool,
    outcome: TransitionBucket,
}

const TRANSITION_RULES: &[TransitionRule] = &[
    TransitionRule {
        name: "unchanged",
        applies: |f| f.same,
        outcome: TransitionBucket::Unchanged,
    },
    TransitionRule {
        name: "churned",
        applies: |f| f.rank_a >= 1 && f.b_no_data,
        outcome: TransitionBucket::Churned,
    },
    // Fires before the rank comparison below: pipeline→customer is a new
    // customer, not an upgrade.
    TransitionRule {
        name: "new_customer",
        applies: |f| (f.a_no_data || f.a_pipeline) && f.b_customer,
        outcome: TransitionBucket::NewCustomer,
    },
    TransitionRule {
        name: "new_pipeline",
        applies: |f| f.a_no_data && f.b_pipeline,
        outcome: TransitionBucket::NewPipeline,
    },
    TransitionRule {
        name: "upgraded",
        applies: |f| f.rank_a >= 1 && f.rank_b >= 1 && f.rank_b > f.rank_a,
        outcome: TransitionBucket::Upgraded,
    },
    TransitionRule {
        name: "downgraded",
        applies: |f| f.rank_a >= 1 && f.rank_b >= 1 && f.rank_b < f.rank_a && !f.b_no_data,
        outcome: TransitionBucket::Downgraded,
    },
];

/// Collapse null/empty/whitespace categories into one "no value" form.
fn normalize(category: Option<&str>) -> Option<&str> {
    match category {
        Some(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed)
            }
        }
        None => None,
    }
}

/// Classify the transition from category `a` (earlier year) to category `b`
/// (later year). Total and pure: any pair of strings, including unknown
/// categories, maps to a bucket. Falls back to `Unchanged` when no rule fires.
pub fn classify(
    config: &EngagementConfig,
    a: Option<&str>,
    b: Option<&str>,
) -> TransitionBucket {
    let a = normalize(a);
    let b = normalize(b);

    let group = |c: Option<&str>| c.and_then(|s| config.group_of(s));
    let group_a = group(a);
    let group_b = group(b);

    let facts = PairFacts {
        same: a == b,
        rank_a: a.map(|s| config.rank_of(s)).unwrap_or(0),
        rank_b: b.map(|s| config.rank_of(s)).unwrap_or(0),
        a_no_data: a.is_none() || group_a == Some(CategoryGroup::NoData),
        b_no_data: b.is_none() || group_b == Some(CategoryGroup::NoData),
        a_pipeline: group_a == Some(CategoryGroup::Pipeline),
        b_pipeline: group_b == Some(CategoryGroup::Pipeline),
        b_customer: group_b == Some(CategoryGroup::Customer),
    };

    for rule in TRANSITION_RULES {
        if (rule.applies)(&facts) {
            log::trace!("transition rule '{}' matched ({:?} -> {:?})", rule.name, a, b);
            return rule.outcome;
        }
    }
    TransitionBucket::Unchanged
}

/// Classify a batch of per-account category pairs, as supplied by the
/// comparison endpoint. Preserves input order.
pub fn classify_all(
    config: &EngagementConfig,
    pairs: &[(String, Option<String>, Option<String>)],
) -> Vec<(String, TransitionBucket)> {
    pairs
        .iter()
        .map(|(account_id, a, b)| {
            (
                account_id.clone(),
                classify(config, a.as_deref(), b.as_deref()),
            )
        })
        .collect()
}

/// Count accounts per bucket for a change-over-time summary.
pub fn transition_counts(
    classified: &[(String, TransitionBucket)],
) -> HashMap<TransitionBucket, u64> {
    let mut counts = HashMap::new();
    for (_, bucket) in classified {
        *counts.entry(*bucket).or_insert(0) += 1;
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> EngagementConfig {
        EngagementConfig::default()
    }

    #[test]
    fn test_rule_names_stay_ordered() {
        // The table order IS the semantics; pin it.
        let names: Vec<&str> = TRANSITION_RULES.iter().map(|r| r.name).collect();
        assert_eq!(
            names,
            vec![
                "unchanged",
                "churned",
                "new_customer",
                "new_pipeline",
                "upgraded",
                "downgraded"
            ]
        );
    }

    #[test]
    fn test_identical_categories_are_unchanged() {
        let c = config();
        for cat in c.all_categories().map(str::to_string).collect::<Vec<_>>() {
            assert_eq!(
                classify(&c, Some(&cat), Some(&cat)),
                TransitionBucket::Unchanged,
                "classify({cat}, {cat})"
            );
        }
    }

    #[test]
    fn test_both_absent_is_unchanged() {
        let c = config();
        assert_eq!(classify(&c, None, None), TransitionBucket::Unchanged);
        assert_eq!(classify(&c, Some(""), None), TransitionBucket::Unchanged);
        assert_eq!(
            classify(&c, Some("  "), Some("")),
            TransitionBucket::Unchanged
        );
    }

    #[test]
    fn test_ranked_to_absent_is_churned() {
        let c = config();
        assert_eq!(
            classify(&c, Some("proposal_pipeline"), None),
            TransitionBucket::Churned
        );
        assert_eq!(
            classify(&c, Some("multi_year"), Some("lapsed")),
            TransitionBucket::Churned
        );
        assert_eq!(
            classify(&c, Some("single_year"), Some("churned")),
            TransitionBucket::Churned
        );
    }

    #[test]
    fn test_no_data_to_customer_is_new_customer() {
        let c = config();
        assert_eq!(
            classify(&c, None, Some("single_year")),
            TransitionBucket::NewCustomer
        );
        assert_eq!(
            classify(&c, Some("lapsed"), Some("multi_year")),
            TransitionBucket::NewCustomer
        );
    }

    #[test]
    fn test_pipeline_to_customer_is_new_customer_not_upgraded() {
        // Both sides rank >= 1 and rank(B) > rank(A), but the new-customer
        // rule fires first. Intentional; reports key off this.
        let c = config();
        assert_eq!(
            classify(&c, Some("renewal_pipeline"), Some("multi_year_growing")),
            TransitionBucket::NewCustomer
        );
        assert_eq!(
            classify(&c, Some("target_pipeline"), Some("single_year")),
            TransitionBucket::NewCustomer
        );
    }

    #[test]
    fn test_no_data_to_pipeline_is_new_pipeline() {
        let c = config();
        assert_eq!(
            classify(&c, None, Some("target_pipeline")),
            TransitionBucket::NewPipeline
        );
        assert_eq!(
            classify(&c, Some("churned"), Some("verbal_pipeline")),
            TransitionBucket::NewPipeline
        );
    }

    #[test]
    fn test_rank_increase_within_group_is_upgraded() {
        let c = config();
        assert_eq!(
            classify(&c, Some("target_pipeline"), Some("proposal_pipeline")),
            TransitionBucket::Upgraded
        );
        assert_eq!(
            classify(&c, Some("single_year"), Some("multi_year_growing")),
            TransitionBucket::Upgraded
        );
    }

    #[test]
    fn test_rank_decrease_is_downgraded() {
        let c = config();
        assert_eq!(
            classify(&c, Some("renewal_pipeline"), Some("target_pipeline")),
            TransitionBucket::Downgraded
        );
        // Customer falling back into pipeline is a downgrade, not a churn
        assert_eq!(
            classify(&c, Some("multi_year"), Some("renewal_pipeline")),
            TransitionBucket::Downgraded
        );
    }

    #[test]
    fn test_unknown_categories_never_error() {
        let c = config();
        // Unknown strings rank 0 and sit in no group — not even no-data — so
        // no rule fires and every pairing falls back to unchanged.
        assert_eq!(
            classify(&c, Some("???"), Some("!!!")),
            TransitionBucket::Unchanged
        );
        assert_eq!(
            classify(&c, Some("multi_year"), Some("???")),
            TransitionBucket::Unchanged
        );
        assert_eq!(
            classify(&c, Some("???"), Some("single_year")),
            TransitionBucket::Unchanged
        );
    }

    #[test]
    fn test_classify_all_and_counts() {
        let c = config();
        let pairs = vec![
            (
                "district-1".to_string(),
                Some("target_pipeline".to_string()),
                Some("single_year".to_string()),
            ),
            ("district-2".to_string(), None, None),
            (
                "district-3".to_string(),
                Some("multi_year".to_string()),
                None,
            ),
            (
                "district-4".to_string(),
                Some("single_year".to_string()),
                Some("multi_year".to_string()),
            ),
        ];

        let classified = classify_all(&c, &pairs);
        assert_eq!(classified.len(), 4);
        assert_eq!(classified[0].1, TransitionBucket::NewCustomer);
        assert_eq!(classified[1].1, TransitionBucket::Unchanged);
        assert_eq!(classified[2].1, TransitionBucket::Churned);
        assert_eq!(classified[3].1, TransitionBucket::Upgraded);

        let counts = transition_counts(&classified);
        assert_eq!(counts[&TransitionBucket::NewCustomer], 1);
        assert_eq!(counts[&TransitionBucket::Unchanged], 1);
        assert_eq!(counts[&TransitionBucket::Churned], 1);
        assert_eq!(counts[&TransitionBucket::Upgraded], 1);
    }
}
