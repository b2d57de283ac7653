use serde::Serialize;

use super::age::age_in_months;
use super::growth::NEUTRAL_SCORE;
use crate::model::{BabyProfile, MilestoneEntry};
use crate::reference::MilestoneCatalog;

/// Score reported when the catalog expects nothing yet at the baby's age.
pub const NOTHING_EXPECTED_SCORE: f64 = 70.0;

/// Points awarded per milestone reached before its catalog month.
const EARLY_BONUS: f64 = 5.0;

/// Decides whether a logged milestone label satisfies a catalog label.
pub trait MilestoneMatcher: Send + Sync {
    fn matches(&self, achieved: &str, expected: &str) -> bool;
}

/// Case-insensitive containment in either direction, so "smiles" satisfies
/// "smiles and coos" and "coos and makes sounds" is satisfied by "coos".
#[derive(Debug, Clone, Copy, Default)]
pub struct SubstringMatcher;

impl MilestoneMatcher for SubstringMatcher {
    fn matches(&self, achieved: &str, expected: &str) -> bool {
        let achieved = achieved.trim().to_lowercase();
        let expected = expected.trim().to_lowercase();
        if achieved.is_empty() || expected.is_empty() {
            return false;
        }
        achieved.contains(&expected) || expected.contains(&achieved)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DevelopmentScore {
    pub score: f64,
    /// Catalog labels expected by now that some logged milestone satisfies.
    pub matched: usize,
    pub expected: usize,
    pub early_bonus: f64,
}

/// Coverage of the milestones expected by `age_months`, plus a bonus for
/// each logged milestone reached before the month the catalog lists it.
pub fn score_development<M: MilestoneMatcher + ?Sized>(
    achieved: &[MilestoneEntry],
    age_months: u32,
    baby: &BabyProfile,
    catalog: &MilestoneCatalog,
    matcher: &M,
) -> DevelopmentScore {
    if achieved.is_empty() {
        return DevelopmentScore {
            score: NEUTRAL_SCORE,
            matched: 0,
            expected: 0,
            early_bonus: 0.0,
        };
    }

    let expected = catalog.expected_by(age_months);
    if expected.is_empty() {
        return DevelopmentScore {
            score: NOTHING_EXPECTED_SCORE,
            matched: 0,
            expected: 0,
            early_bonus: 0.0,
        };
    }

    let matched = expected
        .iter()
        .filter(|label| achieved.iter().any(|a| matcher.matches(&a.label, label)))
        .count();
    let base = matched as f64 / expected.len() as f64 * 100.0;

    let mut early_bonus = 0.0;
    for entry in achieved {
        let Some(date) = entry.achieved_date else {
            continue;
        };
        // Earliest catalog month listing this milestone.
        let listed_month = catalog
            .months()
            .iter()
            .find(|m| m.labels.iter().any(|l| matcher.matches(&entry.label, l)))
            .map(|m| m.month);

        if let Some(month) = listed_month {
            if age_in_months(baby.date_of_birth, date) < month {
                early_bonus += EARLY_BONUS;
            }
        }
    }

    let score = (base + early_bonus).min(100.0);
    tracing::debug!(
        age_months,
        matched,
        expected = expected.len(),
        early_bonus,
        score,
        "developmental score"
    );

    DevelopmentScore {
        score,
        matched,
        expected: expected.len(),
        early_bonus,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn baby() -> BabyProfile {
        BabyProfile::new("Test", date(2026, 1, 1), Some("female"))
    }

    fn score(achieved: &[MilestoneEntry], age: u32) -> DevelopmentScore {
        score_development(achieved, age, &baby(), &MilestoneCatalog::default(), &SubstringMatcher)
    }

    #[test]
    fn matcher_is_bidirectional_and_case_insensitive() {
        let m = SubstringMatcher;
        assert!(m.matches("Smiles", "smiles and coos"));
        assert!(m.matches("coos and makes sounds today", "coos and makes sounds"));
        assert!(m.matches("  LAUGHS ", "laughs"));
        assert!(!m.matches("smiles", "begins to smile"));
        assert!(!m.matches("", "laughs"));
    }

    #[test]
    fn no_milestones_is_neutral() {
        assert_eq!(score(&[], 3).score, 50.0);
    }

    #[test]
    fn nothing_expected_yet() {
        let achieved = [MilestoneEntry::new("laughs", None)];
        assert_eq!(score(&achieved, 0).score, 70.0);
    }

    #[test]
    fn coverage_plus_early_bonus() {
        let achieved = [
            MilestoneEntry::new("Responds to sounds", None),
            // one month old, listed at month 2
            MilestoneEntry::new("holds head up", Some(date(2026, 2, 10))),
            // two months old, listed at month 3; not expected yet so only the bonus counts
            MilestoneEntry::new("laughs", Some(date(2026, 3, 1))),
        ];
        let result = score(&achieved, 2);
        assert_eq!(result.expected, 6);
        assert_eq!(result.matched, 2);
        assert_eq!(result.early_bonus, 10.0);
        assert!((result.score - (200.0 / 6.0 + 10.0)).abs() < 1e-9);
    }

    #[test]
    fn on_time_milestone_earns_no_bonus() {
        let achieved = [MilestoneEntry::new("holds head up", Some(date(2026, 3, 1)))];
        let result = score(&achieved, 2);
        assert_eq!(result.early_bonus, 0.0);
        assert_eq!(result.matched, 1);
    }

    #[test]
    fn uncatalogued_milestone_earns_no_bonus() {
        let achieved = [MilestoneEntry::new("waves bye", Some(date(2026, 1, 2)))];
        let result = score(&achieved, 4);
        assert_eq!(result.matched, 0);
        assert_eq!(result.score, 0.0);
    }

    #[test]
    fn capped_at_hundred() {
        let catalog = MilestoneCatalog::default();
        let achieved: Vec<MilestoneEntry> = catalog
            .expected_by(4)
            .into_iter()
            .map(|l| MilestoneEntry::new(l, Some(date(2026, 1, 1))))
            .collect();
        let result = score(&achieved, 4);
        assert_eq!(result.matched, 12);
        assert!(result.early_bonus > 0.0);
        assert_eq!(result.score, 100.0);
    }

    struct ExactMatcher;

    impl MilestoneMatcher for ExactMatcher {
        fn matches(&self, achieved: &str, expected: &str) -> bool {
            achieved.eq_ignore_ascii_case(expected)
        }
    }

    #[test]
    fn matcher_is_swappable() {
        let achieved = [MilestoneEntry::new("coos", None)];
        let catalog = MilestoneCatalog::default();
        let fuzzy = score_development(&achieved, 2, &baby(), &catalog, &SubstringMatcher);
        let exact = score_development(&achieved, 2, &baby(), &catalog, &ExactMatcher);
        assert_eq!(fuzzy.matched, 1);
        assert_eq!(exact.matched, 0);
    }
}
