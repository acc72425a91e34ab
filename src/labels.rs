//! Label vocabulary and the three assignment rulesets.
//!
//! Pure layer: given signals, competitor spend, or a locale code, compute the
//! complete label set that should hold for one account. Persistence lives in
//! `sync` / `db::labels`; nothing here touches the database.
//!
//! Three independent rulesets, one per label group, each contributing at most
//! one label:
//! - classification: priority chain over the primary vendor's current/prior
//!   fiscal-year signals (Return > Churn-Risk > Win-Back).
//! - competitor: per tracked competitor, most-recent year with spend decides
//!   between Return and Win-Back (year).
//! - locale: NCES urban-centric locale code lookup into four disjoint bands.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::totals::SignalValues;

/// The label groups that sync independently. Re-syncing one group never
/// disturbs another's assignments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelGroup {
    Classification,
    Locale,
    Competitor,
}

impl LabelGroup {
    pub const ALL: &'static [LabelGroup] = &[
        LabelGroup::Classification,
        LabelGroup::Locale,
        LabelGroup::Competitor,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LabelGroup::Classification => "classification",
            LabelGroup::Locale => "locale",
            LabelGroup::Competitor => "competitor",
        }
    }

    pub fn parse(s: &str) -> Option<LabelGroup> {
        match s {
            "classification" => Some(LabelGroup::Classification),
            "locale" => Some(LabelGroup::Locale),
            "competitor" => Some(LabelGroup::Competitor),
            _ => None,
        }
    }
}

/// A label to persist: name plus display color. Identity within a group is
/// the name; downstream displays key off the literal strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelSpec {
    pub name: String,
    pub color: String,
}

impl LabelSpec {
    fn new(name: impl Into<String>, color: &str) -> Self {
        Self {
            name: name.into(),
            color: color.to_string(),
        }
    }
}

const COLOR_RETURN: &str = "#2e7d32";
const COLOR_CHURN_RISK: &str = "#f9a825";
const COLOR_WIN_BACK: &str = "#c62828";
const COLOR_COMPETITOR: &str = "#5e35b1";

// ---------------------------------------------------------------------------
// Classification ruleset (primary vendor)
// ---------------------------------------------------------------------------

/// One branch of the classification priority chain. Evaluated in table order,
/// first true branch wins.
struct ClassificationRule {
    name: &'static str,
    applies: fn(current: &SignalValues, prior: &SignalValues) -> bool,
    label: fn() -> LabelSpec,
}

/// "Churn-Risk" reads oddly for an account that has not churned yet but holds
/// an unrecognized booking; the name is load-bearing downstream, keep it.
const CLASSIFICATION_RULES: &[ClassificationRule] = &[
    ClassificationRule {
        name: "return",
        applies: |current, _| current.has_revenue(),
        label: || LabelSpec::new("Return", COLOR_RETURN),
    },
    ClassificationRule {
        name: "churn_risk",
        applies: |current, _| current.has_bookings(),
        label: || LabelSpec::new("Churn-Risk", COLOR_CHURN_RISK),
    },
    ClassificationRule {
        name: "win_back",
        applies: |_, prior| prior.has_revenue() || prior.has_bookings(),
        label: || LabelSpec::new("Win-Back (prior year)", COLOR_WIN_BACK),
    },
];

/// Classification labels for one account from the primary vendor's current-
/// and prior-year signals. At most one label; zero when neither year shows
/// any activity.
pub fn classification_labels(current: &SignalValues, prior: &SignalValues) -> Vec<LabelSpec> {
    for rule in CLASSIFICATION_RULES {
        if (rule.applies)(current, prior) {
            log::trace!("classification rule '{}' matched", rule.name);
            return vec![(rule.label)()];
        }
    }
    Vec::new()
}

// ---------------------------------------------------------------------------
// Competitor ruleset
// ---------------------------------------------------------------------------

/// Label for one tracked competitor: walk spend by fiscal year, most recent
/// first, until spend > 0. Spend in the current year maps to a Return label,
/// spend only in an earlier year to a Win-Back label naming that year, and no
/// spend at all to no label.
pub fn competitor_label(
    competitor: &str,
    spend_by_year: &BTreeMap<i32, f64>,
    current_fy: i32,
) -> Option<LabelSpec> {
    for (&year, &spend) in spend_by_year.iter().rev() {
        if year > current_fy || spend <= 0.0 {
            continue;
        }
        let label = if year == current_fy {
            LabelSpec::new(format!("{competitor}: Return"), COLOR_COMPETITOR)
        } else {
            LabelSpec::new(
                format!("{competitor}: Win-Back (FY{:02})", year % 100),
                COLOR_COMPETITOR,
            )
        };
        return Some(label);
    }
    None
}

// ---------------------------------------------------------------------------
// Locale ruleset
// ---------------------------------------------------------------------------

/// One locale band: a label over a disjoint set of NCES locale codes.
pub struct LocaleBand {
    pub label: &'static str,
    pub color: &'static str,
    pub codes: &'static [i64],
}

/// NCES urban-centric locale bands. Code sets are disjoint by construction,
/// so no priority ordering is needed.
pub const LOCALE_BANDS: &[LocaleBand] = &[
    LocaleBand {
        label: "City",
        color: "#1565c0",
        codes: &[11, 12, 13],
    },
    LocaleBand {
        label: "Suburb",
        color: "#6a1b9a",
        codes: &[21, 22, 23],
    },
    LocaleBand {
        label: "Town",
        color: "#ef6c00",
        codes: &[31, 32, 33],
    },
    LocaleBand {
        label: "Rural",
        color: "#00695c",
        codes: &[41, 42, 43],
    },
];

/// Locale label for an account. Absent or unrecognized codes get no label.
pub fn locale_label(locale_code: Option<i64>) -> Option<LabelSpec> {
    let code = locale_code?;
    LOCALE_BANDS
        .iter()
        .find(|band| band.codes.contains(&code))
        .map(|band| LabelSpec::new(band.label, band.color))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signals(invoicing: f64, bookings: f64, session_revenue: f64) -> SignalValues {
        SignalValues {
            invoicing,
            bookings,
            session_revenue,
            ..SignalValues::default()
        }
    }

    #[test]
    fn test_classification_rule_order_is_pinned() {
        let names: Vec<&str> = CLASSIFICATION_RULES.iter().map(|r| r.name).collect();
        assert_eq!(names, vec!["return", "churn_risk", "win_back"]);
    }

    #[test]
    fn test_current_revenue_wins_over_bookings() {
        // Scenario: FY26 invoicing=20000 AND bookings=15000 assigns Return
        // only, never Churn-Risk.
        let current = signals(20_000.0, 15_000.0, 0.0);
        let labels = classification_labels(&current, &SignalValues::default());
        assert_eq!(labels.len(), 1);
        assert_eq!(labels[0].name, "Return");
    }

    #[test]
    fn test_session_revenue_counts_as_revenue() {
        let current = signals(0.0, 0.0, 3_500.0);
        let labels = classification_labels(&current, &SignalValues::default());
        assert_eq!(labels[0].name, "Return");
    }

    #[test]
    fn test_bookings_without_revenue_is_churn_risk() {
        let current = signals(0.0, 15_000.0, 0.0);
        let labels = classification_labels(&current, &SignalValues::default());
        assert_eq!(labels.len(), 1);
        assert_eq!(labels[0].name, "Churn-Risk");
    }

    #[test]
    fn test_prior_year_activity_is_win_back() {
        // Scenario: FY25 invoicing=30000, FY26 all zero assigns Win-Back
        // (prior year) only.
        let prior = signals(30_000.0, 0.0, 0.0);
        let labels = classification_labels(&SignalValues::default(), &prior);
        assert_eq!(labels.len(), 1);
        assert_eq!(labels[0].name, "Win-Back (prior year)");

        // Prior bookings alone also qualify
        let prior = signals(0.0, 1.0, 0.0);
        let labels = classification_labels(&SignalValues::default(), &prior);
        assert_eq!(labels[0].name, "Win-Back (prior year)");
    }

    #[test]
    fn test_no_activity_yields_no_label() {
        let labels =
            classification_labels(&SignalValues::default(), &SignalValues::default());
        assert!(labels.is_empty());
    }

    #[test]
    fn test_competitor_current_year_spend_is_return() {
        // Scenario: spend FY24=5000, FY25=0, FY26=12000 assigns only the
        // Return label; the older spend never surfaces as Win-Back.
        let spend = BTreeMap::from([(2024, 5_000.0), (2025, 0.0), (2026, 12_000.0)]);
        let label = competitor_label("EduRival", &spend, 2026).expect("label");
        assert_eq!(label.name, "EduRival: Return");
    }

    #[test]
    fn test_competitor_older_spend_is_win_back_with_year() {
        let spend = BTreeMap::from([(2024, 5_000.0), (2025, 0.0), (2026, 0.0)]);
        let label = competitor_label("EduRival", &spend, 2026).expect("label");
        assert_eq!(label.name, "EduRival: Win-Back (FY24)");
    }

    #[test]
    fn test_competitor_no_spend_no_label() {
        let spend = BTreeMap::from([(2025, 0.0), (2026, 0.0)]);
        assert!(competitor_label("EduRival", &spend, 2026).is_none());
        assert!(competitor_label("EduRival", &BTreeMap::new(), 2026).is_none());
    }

    #[test]
    fn test_competitor_future_years_are_ignored() {
        // A forward-booked row past the pinned fiscal year must not leak in.
        let spend = BTreeMap::from([(2027, 9_000.0), (2025, 400.0)]);
        let label = competitor_label("ClassCompete", &spend, 2026).expect("label");
        assert_eq!(label.name, "ClassCompete: Win-Back (FY25)");
    }

    #[test]
    fn test_locale_bands_are_disjoint() {
        let mut seen = std::collections::HashSet::new();
        for band in LOCALE_BANDS {
            for code in band.codes {
                assert!(seen.insert(*code), "code {code} appears in two bands");
            }
        }
    }

    #[test]
    fn test_locale_lookup() {
        assert_eq!(locale_label(Some(11)).unwrap().name, "City");
        assert_eq!(locale_label(Some(23)).unwrap().name, "Suburb");
        assert_eq!(locale_label(Some(32)).unwrap().name, "Town");
        assert_eq!(locale_label(Some(43)).unwrap().name, "Rural");
        assert!(locale_label(Some(99)).is_none());
        assert!(locale_label(None).is_none());
    }

    #[test]
    fn test_label_group_round_trip() {
        for group in LabelGroup::ALL {
            assert_eq!(LabelGroup::parse(group.as_str()), Some(*group));
        }
        assert_eq!(LabelGroup::parse("nonsense"), None);
    }
}
