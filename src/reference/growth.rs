use serde::{Deserialize, Serialize};

use crate::error::{AnalyticsError, Result};
use crate::model::Gender;

/// Which growth measurement a table describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrowthMetric {
    Weight,
    Height,
    HeadCircumference,
}

impl GrowthMetric {
    pub fn name(self) -> &'static str {
        match self {
            GrowthMetric::Weight => "weight",
            GrowthMetric::Height => "height",
            GrowthMetric::HeadCircumference => "head_circumference",
        }
    }
}

/// Anchor values for one age, aligned rung-by-rung with the percentile ladder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnchorRow {
    pub month: u32,
    pub anchors: Vec<f64>,
}

impl AnchorRow {
    pub fn new(month: u32, anchors: &[f64]) -> Self {
        Self {
            month,
            anchors: anchors.to_vec(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnchorTable {
    pub male: Vec<AnchorRow>,
    pub female: Vec<AnchorRow>,
}

impl AnchorTable {
    pub fn rows(&self, gender: Gender) -> &[AnchorRow] {
        match gender {
            Gender::Male => &self.male,
            Gender::Female => &self.female,
        }
    }

    /// The row whose month is closest to `age_months`. Ties go to the
    /// lower month.
    pub fn nearest(&self, gender: Gender, age_months: u32) -> Option<&AnchorRow> {
        self.rows(gender)
            .iter()
            .min_by_key(|row| (row.month.abs_diff(age_months), row.month))
    }

    fn validate(&self, metric: GrowthMetric, ladder_len: usize) -> Result<()> {
        for gender in [Gender::Male, Gender::Female] {
            let rows = self.rows(gender);
            let table = format!("{} table for {}", metric.name(), gender.as_str());

            if rows.is_empty() {
                return Err(AnalyticsError::reference(format!("{table} has no rows")));
            }

            let mut months: Vec<u32> = rows.iter().map(|r| r.month).collect();
            months.sort_unstable();
            if months.windows(2).any(|w| w[0] == w[1]) {
                return Err(AnalyticsError::reference(format!(
                    "{table} lists the same month twice"
                )));
            }

            for row in rows {
                validate_anchors(&row.anchors, ladder_len).map_err(|reason| {
                    AnalyticsError::reference(format!("{table}, month {}: {reason}", row.month))
                })?;
            }
        }
        Ok(())
    }
}

/// Shared anchor checks, also used by the interpolator itself.
pub(crate) fn validate_anchors(anchors: &[f64], ladder_len: usize) -> std::result::Result<(), String> {
    if anchors.is_empty() {
        return Err("no anchors".into());
    }
    if anchors.len() != ladder_len {
        return Err(format!(
            "expected {ladder_len} anchors, found {}",
            anchors.len()
        ));
    }
    if anchors.iter().any(|a| !a.is_finite()) {
        return Err("anchors must be finite".into());
    }
    if anchors[0] <= 0.0 {
        return Err("lowest anchor must be positive".into());
    }
    if anchors.windows(2).any(|w| w[1] < w[0]) {
        return Err("anchors must be non-decreasing".into());
    }
    Ok(())
}

/// WHO-style growth standards, one table per measurement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrowthStandards {
    pub weight: AnchorTable,
    pub height: AnchorTable,
    pub head_circumference: AnchorTable,
}

impl GrowthStandards {
    pub fn table(&self, metric: GrowthMetric) -> &AnchorTable {
        match metric {
            GrowthMetric::Weight => &self.weight,
            GrowthMetric::Height => &self.height,
            GrowthMetric::HeadCircumference => &self.head_circumference,
        }
    }

    pub(crate) fn validate(&self, ladder_len: usize) -> Result<()> {
        self.weight.validate(GrowthMetric::Weight, ladder_len)?;
        self.height.validate(GrowthMetric::Height, ladder_len)?;
        self.head_circumference
            .validate(GrowthMetric::HeadCircumference, ladder_len)
    }
}

// Simplified WHO excerpts. Full tables can be dropped in through
// reference.toml without touching the scorers.
impl Default for GrowthStandards {
    fn default() -> Self {
        Self {
            weight: AnchorTable {
                male: vec![
                    AnchorRow::new(0, &[2.5, 2.9, 3.3, 3.7, 4.0]),
                    AnchorRow::new(1, &[3.4, 3.9, 4.5, 5.1, 5.5]),
                    AnchorRow::new(2, &[4.3, 4.9, 5.6, 6.3, 6.8]),
                    AnchorRow::new(3, &[5.0, 5.7, 6.4, 7.2, 7.8]),
                ],
                female: vec![
                    AnchorRow::new(0, &[2.4, 2.8, 3.2, 3.6, 3.9]),
                    AnchorRow::new(1, &[3.2, 3.6, 4.2, 4.8, 5.2]),
                    AnchorRow::new(2, &[3.9, 4.5, 5.1, 5.8, 6.2]),
                    AnchorRow::new(3, &[4.5, 5.2, 5.8, 6.6, 7.1]),
                ],
            },
            height: AnchorTable {
                male: vec![
                    AnchorRow::new(0, &[46.1, 48.0, 49.9, 51.8, 53.4]),
                    AnchorRow::new(1, &[50.8, 52.8, 54.7, 56.7, 58.4]),
                ],
                female: vec![
                    AnchorRow::new(0, &[45.4, 47.3, 49.1, 51.0, 52.7]),
                    AnchorRow::new(1, &[49.8, 51.7, 53.7, 55.6, 57.4]),
                ],
            },
            head_circumference: AnchorTable {
                male: vec![AnchorRow::new(0, &[32.4, 33.6, 34.5, 35.4, 36.1])],
                female: vec![AnchorRow::new(0, &[31.9, 33.0, 33.9, 34.8, 35.5])],
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nearest_month_exact_match() {
        let standards = GrowthStandards::default();
        let row = standards.weight.nearest(Gender::Female, 2).unwrap();
        assert_eq!(row.month, 2);
    }

    #[test]
    fn nearest_month_beyond_table_uses_last_row() {
        let standards = GrowthStandards::default();
        let row = standards.weight.nearest(Gender::Male, 11).unwrap();
        assert_eq!(row.month, 3);
        let head = standards.head_circumference.nearest(Gender::Male, 2).unwrap();
        assert_eq!(head.month, 0);
    }

    #[test]
    fn nearest_month_tie_breaks_low() {
        let table = AnchorTable {
            male: vec![
                AnchorRow::new(4, &[1.0, 2.0, 3.0, 4.0, 5.0]),
                AnchorRow::new(0, &[1.0, 2.0, 3.0, 4.0, 5.0]),
            ],
            female: vec![],
        };
        assert_eq!(table.nearest(Gender::Male, 2).unwrap().month, 0);
    }

    #[test]
    fn default_tables_are_valid() {
        GrowthStandards::default().validate(5).unwrap();
    }

    #[test]
    fn decreasing_anchors_rejected() {
        let mut standards = GrowthStandards::default();
        standards.height.male[0].anchors = vec![50.0, 49.0, 51.0, 52.0, 53.0];
        let err = standards.validate(5).unwrap_err();
        assert!(matches!(err, AnalyticsError::InvalidReferenceData(_)));
        assert!(err.to_string().contains("height table for male"));
    }

    #[test]
    fn wrong_anchor_count_rejected() {
        let mut standards = GrowthStandards::default();
        standards.weight.female[1].anchors = vec![3.0, 4.0];
        assert!(standards.validate(5).is_err());
    }

    #[test]
    fn empty_gender_table_rejected() {
        let mut standards = GrowthStandards::default();
        standards.head_circumference.female.clear();
        assert!(standards.validate(5).is_err());
    }

    #[test]
    fn duplicate_month_rejected() {
        let mut standards = GrowthStandards::default();
        standards
            .weight
            .male
            .push(AnchorRow::new(0, &[2.5, 2.9, 3.3, 3.7, 4.0]));
        assert!(standards.validate(5).is_err());
    }
}
