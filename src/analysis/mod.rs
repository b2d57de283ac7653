//! Per-record scoring and multi-record insights.
//!
//! [`Engine`] is the entry point. It owns a validated [`ReferenceData`] and a
//! milestone matcher, and is immutable after construction, so a single engine
//! can score records from any number of threads.

pub mod age;
pub mod development;
pub mod feeding;
pub mod growth;
pub mod insights;
pub mod normalize;
pub mod percentile;
pub mod processor;
pub mod sleep;

use chrono::{DateTime, FixedOffset, NaiveDate};

use crate::error::{AnalyticsError, Result};
use crate::model::{BabyProfile, ProgressRecord};
use crate::reference::ReferenceData;

pub use development::{MilestoneMatcher, SubstringMatcher};
pub use insights::{InsightsSummary, Timeframe, Trend};
pub use processor::RecordBreakdown;

pub struct Engine<M: MilestoneMatcher = SubstringMatcher> {
    reference: ReferenceData,
    matcher: M,
}

impl Engine<SubstringMatcher> {
    /// Validate `reference` and build an engine using substring matching
    /// for milestones.
    pub fn new(reference: ReferenceData) -> Result<Self> {
        Self::with_matcher(reference, SubstringMatcher)
    }
}

impl<M: MilestoneMatcher> Engine<M> {
    pub fn with_matcher(reference: ReferenceData, matcher: M) -> Result<Self> {
        Ok(Self {
            reference: reference.validated()?,
            matcher,
        })
    }

    pub fn reference(&self) -> &ReferenceData {
        &self.reference
    }

    /// Score `record` without modifying it.
    pub fn breakdown(
        &self,
        record: &ProgressRecord,
        baby: &BabyProfile,
        now: DateTime<FixedOffset>,
    ) -> Result<RecordBreakdown> {
        processor::score_record(record, baby, &self.reference, &self.matcher, now)
    }

    /// Recompute the derived scores stored on `record`.
    ///
    /// Returns the malformed entries that were skipped along the way. Only
    /// unusable reference data fails the call.
    pub fn process(
        &self,
        record: &mut ProgressRecord,
        baby: &BabyProfile,
        now: DateTime<FixedOffset>,
    ) -> Result<Vec<AnalyticsError>> {
        processor::process_record(record, baby, &self.reference, &self.matcher, now)
            .map(|breakdown| breakdown.issues)
    }

    pub fn aggregate(
        &self,
        baby: &BabyProfile,
        records: &[ProgressRecord],
        timeframe: Timeframe,
        today: NaiveDate,
    ) -> InsightsSummary {
        insights::aggregate(baby, records, timeframe, today)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::normalize::parse_timestamp;
    use crate::reference::AnchorRow;
    use serde_json::json;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn engine_is_shareable() {
        assert_send_sync::<Engine>();
    }

    #[test]
    fn invalid_reference_rejected_up_front() {
        let mut reference = ReferenceData::default();
        reference.growth.height.male = vec![AnchorRow::new(0, &[50.0, 49.0, 51.0, 52.0, 53.0])];
        assert!(matches!(
            Engine::new(reference),
            Err(AnalyticsError::InvalidReferenceData(_))
        ));
    }

    #[test]
    fn process_then_aggregate() {
        let engine = Engine::new(ReferenceData::default()).unwrap();
        let baby = BabyProfile::new("Ada", date(2026, 1, 1), Some("female"));
        let now = parse_timestamp("2026-03-20T12:00:00Z").unwrap();

        let mut early = ProgressRecord::new(date(2026, 3, 1));
        early.weight = Some(5.0);
        early.milestones = Some(vec![json!({"milestone": "coos"})]);

        let mut late = ProgressRecord::new(date(2026, 3, 15));
        late.weight = Some(5.3);
        late.milestones = Some(vec![
            json!({"milestone": "coos"}),
            json!({"milestone": "holds head up"}),
            json!({"milestone": 7}),
        ]);

        assert!(engine.process(&mut early, &baby, now).unwrap().is_empty());
        let issues = engine.process(&mut late, &baby, now).unwrap();
        assert_eq!(issues.len(), 1);

        let summary = engine.aggregate(&baby, &[early, late], Timeframe::All, date(2026, 3, 20));
        let insights = summary.insights().unwrap();
        assert_eq!(insights.total_records, 2);
        assert_eq!(insights.growth.weight_gain_per_week, Some(150.0));
        assert_eq!(insights.development.trend, Trend::Improving);
    }

    #[test]
    fn breakdown_leaves_record_untouched() {
        let engine = Engine::new(ReferenceData::default()).unwrap();
        let baby = BabyProfile::new("Ada", date(2026, 1, 1), None);
        let mut record = ProgressRecord::new(date(2026, 1, 1));
        record.weight = Some(3.3);

        let breakdown = engine
            .breakdown(&record, &baby, parse_timestamp("2026-01-01T12:00:00Z").unwrap())
            .unwrap();
        assert_eq!(breakdown.derived().growth_percentile, Some(50.0));
        assert!(record.derived.growth_percentile.is_none());
    }
}
