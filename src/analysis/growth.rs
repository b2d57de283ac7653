use chrono::NaiveDate;
use serde::Serialize;

use super::age::age_in_months;
use super::percentile::interpolate_percentile;
use crate::error::{AnalyticsError, EntryKind, Result};
use crate::model::BabyProfile;
use crate::reference::{GrowthMetric, ReferenceData};

/// Neutral score reported when there is nothing to measure.
pub const NEUTRAL_SCORE: f64 = 50.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GrowthScores {
    pub weight_percentile: Option<f64>,
    pub height_percentile: Option<f64>,
    pub head_percentile: Option<f64>,
    /// Mean of whichever percentiles were computed, or 50 if none were.
    pub overall_percentile: f64,
    /// Measurements that were supplied but could not be used.
    #[serde(skip)]
    pub issues: Vec<AnalyticsError>,
}

/// Measurements for one record, all optional.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Measurements {
    /// kg
    pub weight: Option<f64>,
    /// cm
    pub height: Option<f64>,
    /// cm
    pub head_circumference: Option<f64>,
}

/// Place each supplied measurement against the reference table for the
/// baby's gender and age at `record_date`.
///
/// Each metric uses the row of its own table closest to the baby's age, so a
/// table with fewer months (head circumference, typically) still answers.
pub fn score_growth(
    baby: &BabyProfile,
    measurements: Measurements,
    record_date: NaiveDate,
    reference: &ReferenceData,
) -> Result<GrowthScores> {
    let gender = baby.resolved_gender();
    let age_months = age_in_months(baby.date_of_birth, record_date);
    let mut issues = Vec::new();

    let mut percentile_for = |metric: GrowthMetric, value: Option<f64>| -> Result<Option<f64>> {
        let Some(value) = value else {
            return Ok(None);
        };

        if !value.is_finite() || value < 0.0 {
            issues.push(AnalyticsError::malformed(
                EntryKind::Measurement,
                metric as usize,
                format!("{} must be a non-negative number, got {value}", metric.name()),
            ));
            return Ok(None);
        }

        let row = reference
            .growth
            .table(metric)
            .nearest(gender, age_months)
            .ok_or_else(|| {
                AnalyticsError::reference(format!(
                    "no {} rows for {}",
                    metric.name(),
                    gender.as_str()
                ))
            })?;

        let pct = interpolate_percentile(value, &row.anchors, &reference.ladder)?;
        tracing::debug!(
            metric = metric.name(),
            gender = gender.as_str(),
            age_months,
            table_month = row.month,
            value,
            percentile = pct,
            "growth percentile"
        );
        Ok(Some(pct))
    };

    let weight_percentile = percentile_for(GrowthMetric::Weight, measurements.weight)?;
    let height_percentile = percentile_for(GrowthMetric::Height, measurements.height)?;
    let head_percentile =
        percentile_for(GrowthMetric::HeadCircumference, measurements.head_circumference)?;

    let computed: Vec<f64> = [weight_percentile, height_percentile, head_percentile]
        .into_iter()
        .flatten()
        .collect();

    let overall_percentile = if computed.is_empty() {
        NEUTRAL_SCORE
    } else {
        computed.iter().sum::<f64>() / computed.len() as f64
    };

    Ok(GrowthScores {
        weight_percentile,
        height_percentile,
        head_percentile,
        overall_percentile: overall_percentile.clamp(0.0, 100.0),
        issues,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::AnchorRow;

    fn baby(gender: Option<&str>) -> BabyProfile {
        BabyProfile::new("Test", NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(), gender)
    }

    fn on(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn no_measurements_is_neutral() {
        let scores = score_growth(
            &baby(None),
            Measurements::default(),
            on(2026, 2, 1),
            &ReferenceData::default(),
        )
        .unwrap();
        assert_eq!(scores.overall_percentile, 50.0);
        assert!(scores.weight_percentile.is_none());
    }

    #[test]
    fn female_two_months_weight_only() {
        // 60 days after 2026-01-01 is 2026-03-02: two completed months
        let record_date = on(2026, 1, 1) + chrono::Days::new(60);
        let scores = score_growth(
            &baby(Some("Female")),
            Measurements {
                weight: Some(5.2),
                ..Measurements::default()
            },
            record_date,
            &ReferenceData::default(),
        )
        .unwrap();

        // female month 2: [3.9, 4.5, 5.1, 5.8, 6.2]; 5.2 is 1/7 of the way from P50 to P85
        let expected = 50.0 + (5.2 - 5.1) / (5.8 - 5.1) * 35.0;
        let weight = scores.weight_percentile.unwrap();
        assert!((weight - expected).abs() < 1e-9, "got {weight}");
        assert!(scores.height_percentile.is_none());
        assert!(scores.head_percentile.is_none());
        assert_eq!(scores.overall_percentile, weight);
    }

    #[test]
    fn unknown_gender_uses_male_table() {
        let reference = ReferenceData::default();
        let m = Measurements {
            weight: Some(3.3),
            ..Measurements::default()
        };
        let unknown = score_growth(&baby(Some("other")), m, on(2026, 1, 1), &reference).unwrap();
        let male = score_growth(&baby(Some("male")), m, on(2026, 1, 1), &reference).unwrap();
        assert_eq!(unknown.weight_percentile, male.weight_percentile);
        assert_eq!(male.weight_percentile, Some(50.0));
    }

    #[test]
    fn overall_is_mean_of_available() {
        // newborn male medians: weight 3.3 (P50), height 53.4 (P97)
        let scores = score_growth(
            &baby(None),
            Measurements {
                weight: Some(3.3),
                height: Some(53.4),
                head_circumference: None,
            },
            on(2026, 1, 1),
            &ReferenceData::default(),
        )
        .unwrap();
        assert_eq!(scores.overall_percentile, (50.0 + 97.0) / 2.0);
    }

    #[test]
    fn head_table_falls_back_to_nearest_month() {
        // six months old; head table only has month 0
        let scores = score_growth(
            &baby(None),
            Measurements {
                head_circumference: Some(34.5),
                ..Measurements::default()
            },
            on(2026, 7, 1),
            &ReferenceData::default(),
        )
        .unwrap();
        assert_eq!(scores.head_percentile, Some(50.0));
    }

    #[test]
    fn negative_measurement_reported_not_scored() {
        let scores = score_growth(
            &baby(None),
            Measurements {
                weight: Some(-1.0),
                height: Some(f64::NAN),
                head_circumference: None,
            },
            on(2026, 1, 1),
            &ReferenceData::default(),
        )
        .unwrap();
        assert!(scores.weight_percentile.is_none());
        assert!(scores.height_percentile.is_none());
        assert_eq!(scores.overall_percentile, 50.0);
        assert_eq!(scores.issues.len(), 2);
    }

    #[test]
    fn bad_table_surfaces_reference_error() {
        let mut reference = ReferenceData::default();
        reference.growth.weight.male = vec![AnchorRow::new(0, &[3.0, 2.0, 1.0, 4.0, 5.0])];
        let err = score_growth(
            &baby(None),
            Measurements {
                weight: Some(3.0),
                ..Measurements::default()
            },
            on(2026, 1, 1),
            &reference,
        )
        .unwrap_err();
        assert!(matches!(err, AnalyticsError::InvalidReferenceData(_)));
    }
}
