use chrono::{DateTime, FixedOffset};
use serde::Serialize;
use serde_json::Value;

use super::age::age_in_months;
use super::development::{score_development, DevelopmentScore, MilestoneMatcher};
use super::feeding::{score_feeding, FeedingScore};
use super::growth::{score_growth, GrowthScores, Measurements};
use super::normalize::{feeding_sessions, milestone_entries, sleep_sessions};
use super::sleep::{score_sleep, SleepScore};
use crate::error::{AnalyticsError, Result};
use crate::model::{BabyProfile, DerivedScores, ProgressRecord};
use crate::reference::ReferenceData;

/// Every scorer's full output for one record.
///
/// A component is `None` when the record carries no input for it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordBreakdown {
    pub age_months: u32,
    pub growth: Option<GrowthScores>,
    pub sleep: Option<SleepScore>,
    pub feeding: Option<FeedingScore>,
    pub development: Option<DevelopmentScore>,
    /// Entries and measurements that were skipped.
    #[serde(skip)]
    pub issues: Vec<AnalyticsError>,
}

impl RecordBreakdown {
    pub fn derived(&self) -> DerivedScores {
        DerivedScores {
            growth_percentile: self.growth.as_ref().map(|g| g.overall_percentile),
            sleep_quality_index: self.sleep.as_ref().map(|s| s.index),
            feeding_efficiency: self.feeding.as_ref().map(|f| f.score),
            developmental_score: self.development.as_ref().map(|d| d.score),
        }
    }
}

/// A list only counts as input when it has at least one entry.
fn non_empty(list: &Option<Vec<Value>>) -> Option<&[Value]> {
    list.as_deref().filter(|l| !l.is_empty())
}

/// Run every scorer whose input is present, without touching the record.
pub fn score_record<M: MilestoneMatcher + ?Sized>(
    record: &ProgressRecord,
    baby: &BabyProfile,
    reference: &ReferenceData,
    matcher: &M,
    now: DateTime<FixedOffset>,
) -> Result<RecordBreakdown> {
    let age_months = age_in_months(baby.date_of_birth, record.record_date);
    let mut issues = Vec::new();

    let growth = if record.has_measurements() {
        let mut scores = score_growth(
            baby,
            Measurements {
                weight: record.weight,
                height: record.height,
                head_circumference: record.head_circumference,
            },
            record.record_date,
            reference,
        )?;
        issues.append(&mut scores.issues);
        Some(scores)
    } else {
        None
    };

    let sleep = non_empty(&record.sleep_schedule).map(|raw| {
        let mut normalized = sleep_sessions(raw);
        issues.append(&mut normalized.issues);
        score_sleep(&normalized.entries, now, &reference.sleep)
    });

    let feeding = match non_empty(&record.feeding_times) {
        Some(raw) => {
            let mut normalized = feeding_sessions(raw);
            issues.append(&mut normalized.issues);
            Some(score_feeding(&normalized.entries, age_months, &reference.feeding)?)
        }
        None => None,
    };

    let development = non_empty(&record.milestones).map(|raw| {
        let mut normalized = milestone_entries(raw);
        issues.append(&mut normalized.issues);
        score_development(
            &normalized.entries,
            age_months,
            baby,
            &reference.milestones,
            matcher,
        )
    });

    Ok(RecordBreakdown {
        age_months,
        growth,
        sleep,
        feeding,
        development,
        issues,
    })
}

/// Recompute all four derived fields of `record` in place.
///
/// Fields whose input is absent are reset, so reprocessing after an edit
/// never leaves a stale score behind.
pub fn process_record<M: MilestoneMatcher + ?Sized>(
    record: &mut ProgressRecord,
    baby: &BabyProfile,
    reference: &ReferenceData,
    matcher: &M,
    now: DateTime<FixedOffset>,
) -> Result<RecordBreakdown> {
    let breakdown = score_record(record, baby, reference, matcher, now)?;
    record.derived = breakdown.derived();

    for issue in &breakdown.issues {
        tracing::warn!(date = %record.record_date, "skipped input: {issue}");
    }

    Ok(breakdown)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::development::SubstringMatcher;
    use crate::analysis::normalize::parse_timestamp;
    use crate::reference::AnchorRow;
    use chrono::NaiveDate;
    use serde_json::json;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn baby() -> BabyProfile {
        BabyProfile::new("Test", date(2026, 1, 1), Some("female"))
    }

    fn now() -> DateTime<FixedOffset> {
        parse_timestamp("2026-03-02T12:00:00Z").unwrap()
    }

    fn full_record() -> ProgressRecord {
        let mut record = ProgressRecord::new(date(2026, 3, 2));
        record.weight = Some(5.2);
        record.feeding_times = Some(vec![
            json!({"start_time": "2026-03-02T06:00:00Z", "end_time": "2026-03-02T06:20:00Z", "type": "breast"}),
            json!({"start_time": "2026-03-02T08:00:00Z", "end_time": "2026-03-02T08:15:00Z", "type": "bottle"}),
        ]);
        record.sleep_schedule = Some(vec![
            json!({"start_time": "2026-03-01T20:30:00Z", "end_time": "2026-03-02T05:30:00Z", "quality": "good"}),
            json!({"start_time": "2026-03-02T09:00:00Z", "end_time": "2026-03-02T10:00:00Z", "quality": "fair"}),
        ]);
        record.milestones = Some(vec![
            json!({"milestone": "smiles", "achieved_date": "2026-02-20"}),
            json!({"milestone": "holds head up"}),
        ]);
        record
    }

    fn process(record: &mut ProgressRecord, reference: &ReferenceData) -> Result<RecordBreakdown> {
        process_record(record, &baby(), reference, &SubstringMatcher, now())
    }

    #[test]
    fn empty_record_derives_nothing() {
        let mut record = ProgressRecord::new(date(2026, 3, 2));
        let breakdown = process(&mut record, &ReferenceData::default()).unwrap();
        assert_eq!(record.derived, DerivedScores::default());
        assert!(breakdown.issues.is_empty());
    }

    #[test]
    fn empty_lists_count_as_absent() {
        let mut record = ProgressRecord::new(date(2026, 3, 2));
        record.sleep_schedule = Some(vec![]);
        record.feeding_times = Some(vec![]);
        record.milestones = Some(vec![]);
        process(&mut record, &ReferenceData::default()).unwrap();
        assert_eq!(record.derived, DerivedScores::default());
    }

    #[test]
    fn weight_only_sets_growth_only() {
        let mut record = ProgressRecord::new(date(2026, 3, 2));
        record.weight = Some(5.2);
        process(&mut record, &ReferenceData::default()).unwrap();

        let growth = record.derived.growth_percentile.unwrap();
        assert!(growth > 50.0 && growth < 85.0);
        assert!(record.derived.sleep_quality_index.is_none());
        assert!(record.derived.feeding_efficiency.is_none());
        assert!(record.derived.developmental_score.is_none());
    }

    #[test]
    fn full_record_is_bounded() {
        let mut record = full_record();
        let breakdown = process(&mut record, &ReferenceData::default()).unwrap();
        assert_eq!(breakdown.age_months, 2);

        let derived = &record.derived;
        for score in [
            derived.growth_percentile,
            derived.sleep_quality_index,
            derived.feeding_efficiency,
            derived.developmental_score,
        ] {
            let score = score.unwrap();
            assert!((0.0..=100.0).contains(&score), "out of range: {score}");
        }
    }

    #[test]
    fn processing_is_idempotent() {
        let mut record = full_record();
        process(&mut record, &ReferenceData::default()).unwrap();
        let first = record.clone();
        process(&mut record, &ReferenceData::default()).unwrap();
        assert_eq!(record, first);
    }

    #[test]
    fn removed_input_resets_stale_score() {
        let mut record = full_record();
        process(&mut record, &ReferenceData::default()).unwrap();
        assert!(record.derived.sleep_quality_index.is_some());

        record.sleep_schedule = None;
        process(&mut record, &ReferenceData::default()).unwrap();
        assert!(record.derived.sleep_quality_index.is_none());
        assert!(record.derived.feeding_efficiency.is_some());
    }

    #[test]
    fn malformed_entries_are_reported_and_skipped() {
        let mut record = ProgressRecord::new(date(2026, 3, 2));
        record.sleep_schedule = Some(vec![
            json!({"start_time": "garbage"}),
            json!({"start_time": "2026-03-02T09:00:00Z", "end_time": "2026-03-02T10:00:00Z"}),
        ]);
        let breakdown = process(&mut record, &ReferenceData::default()).unwrap();

        assert_eq!(breakdown.issues.len(), 1);
        let sleep = breakdown.sleep.unwrap();
        assert!((sleep.total_minutes - 60.0).abs() < 1e-9);
    }

    #[test]
    fn clearing_weight_drops_growth_percentile() {
        let mut record = ProgressRecord::new(date(2026, 3, 2));
        record.weight = Some(5.2);
        process(&mut record, &ReferenceData::default()).unwrap();
        assert!(record.derived.growth_percentile.is_some());

        let update: crate::model::ProgressInput =
            serde_json::from_str(r#"{ "weight": null }"#).unwrap();
        update.apply_to(&mut record);
        process(&mut record, &ReferenceData::default()).unwrap();
        assert_eq!(record.weight, None);
        assert_eq!(record.derived.growth_percentile, None);
    }

    #[test]
    fn null_sleep_quality_lowers_the_index() {
        let mut record = ProgressRecord::new(date(2026, 3, 2));
        record.sleep_schedule = Some(vec![json!({
            "start_time": "2026-03-01T20:00:00Z",
            "end_time": "2026-03-02T06:00:00Z",
            "quality": null
        })]);
        process(&mut record, &ReferenceData::default()).unwrap();
        let index = record.derived.sleep_quality_index.unwrap();
        assert!((index - 70.57).abs() < 0.01);
    }

    #[test]
    fn untyped_feeding_is_reported() {
        let mut record = ProgressRecord::new(date(2026, 3, 2));
        record.feeding_times = Some(vec![
            json!({"start_time": "2026-03-02T06:00:00Z"}),
            json!({"start_time": "2026-03-02T08:00:00Z", "type": "bottle"}),
        ]);
        let breakdown = process(&mut record, &ReferenceData::default()).unwrap();
        assert_eq!(breakdown.issues.len(), 1);
        assert!(record.derived.feeding_efficiency.is_some());
    }

    #[test]
    fn all_entries_malformed_scores_as_empty() {
        let mut record = ProgressRecord::new(date(2026, 3, 2));
        record.feeding_times = Some(vec![json!(42), json!({"type": "bottle"})]);
        let breakdown = process(&mut record, &ReferenceData::default()).unwrap();
        assert_eq!(breakdown.issues.len(), 2);
        assert_eq!(record.derived.feeding_efficiency, Some(50.0));
    }

    #[test]
    fn reference_error_fails_the_record() {
        let mut reference = ReferenceData::default();
        reference.growth.weight.female = vec![AnchorRow::new(2, &[1.0, 2.0])];
        let mut record = ProgressRecord::new(date(2026, 3, 2));
        record.weight = Some(5.2);
        let err = process(&mut record, &reference).unwrap_err();
        assert!(matches!(err, AnalyticsError::InvalidReferenceData(_)));
    }
}
