use serde::{Deserialize, Serialize};

use crate::error::{AnalyticsError, Result};

/// Milestones typically reached by a given age in months.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MilestoneMonth {
    pub month: u32,
    pub labels: Vec<String>,
}

/// Age-indexed catalog of expected milestones, kept sorted by month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MilestoneCatalog {
    months: Vec<MilestoneMonth>,
}

impl MilestoneCatalog {
    pub fn new(mut months: Vec<MilestoneMonth>) -> Self {
        months.sort_by_key(|m| m.month);
        Self { months }
    }

    /// Catalog months in ascending order.
    pub fn months(&self) -> &[MilestoneMonth] {
        &self.months
    }

    /// Every label expected by `age_months`, earliest months first.
    pub fn expected_by(&self, age_months: u32) -> Vec<&str> {
        self.months
            .iter()
            .filter(|m| m.month <= age_months)
            .flat_map(|m| m.labels.iter().map(String::as_str))
            .collect()
    }

    pub(crate) fn normalize(&mut self) {
        self.months.sort_by_key(|m| m.month);
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.months.windows(2).any(|w| w[0].month == w[1].month) {
            return Err(AnalyticsError::reference(
                "milestone catalog lists the same month twice",
            ));
        }
        for month in &self.months {
            if month.labels.iter().any(|l| l.trim().is_empty()) {
                return Err(AnalyticsError::reference(format!(
                    "milestone catalog month {} has an empty label",
                    month.month
                )));
            }
        }
        Ok(())
    }
}

impl Default for MilestoneCatalog {
    fn default() -> Self {
        let month = |month: u32, labels: &[&str]| MilestoneMonth {
            month,
            labels: labels.iter().map(|l| l.to_string()).collect(),
        };

        Self::new(vec![
            month(
                1,
                &["responds to sounds", "follows objects with eyes", "lifts head briefly"],
            ),
            month(2, &["holds head up", "begins to smile", "coos and makes sounds"]),
            month(3, &["recognizes faces", "reaches for objects", "laughs"]),
            month(4, &["rolls over", "holds head steady", "pushes up on arms"]),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expected_by_accumulates_months() {
        let catalog = MilestoneCatalog::default();
        assert!(catalog.expected_by(0).is_empty());
        assert_eq!(catalog.expected_by(1).len(), 3);
        assert_eq!(catalog.expected_by(2).len(), 6);
        assert_eq!(catalog.expected_by(24).len(), 12);
    }

    #[test]
    fn months_are_sorted_on_construction() {
        let catalog = MilestoneCatalog::new(vec![
            MilestoneMonth { month: 6, labels: vec!["sits".into()] },
            MilestoneMonth { month: 2, labels: vec!["smiles".into()] },
        ]);
        let months: Vec<u32> = catalog.months().iter().map(|m| m.month).collect();
        assert_eq!(months, vec![2, 6]);
    }

    #[test]
    fn empty_label_rejected() {
        let catalog = MilestoneCatalog::new(vec![MilestoneMonth {
            month: 1,
            labels: vec!["  ".into()],
        }]);
        assert!(catalog.validate().is_err());
    }
}
