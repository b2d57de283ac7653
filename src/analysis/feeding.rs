use serde::Serialize;

use super::growth::NEUTRAL_SCORE;
use crate::error::{AnalyticsError, Result};
use crate::model::{FeedingKind, FeedingSession};
use crate::reference::FeedingExpectations;

const REGULARITY_WEIGHT: f64 = 0.4;
const FREQUENCY_WEIGHT: f64 = 0.3;
const DURATION_WEIGHT: f64 = 0.3;

/// Feeding efficiency with the sub-scores it was built from.
/// Sub-scores are fractions in 0..=1; `score` is 0-100.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedingScore {
    pub score: f64,
    pub interval_regularity: f64,
    pub frequency_score: f64,
    pub duration_score: f64,
    pub expected_feeds_per_day: f64,
    pub expected_interval_hours: f64,
    /// Only set when the sessions span enough hours to extrapolate a day.
    pub observed_feeds_per_day: Option<f64>,
}

/// Score a day's feeding sessions against the pattern expected for the
/// baby's age.
pub fn score_feeding(
    sessions: &[FeedingSession],
    age_months: u32,
    expectations: &FeedingExpectations,
) -> Result<FeedingScore> {
    let band = expectations.band_for(age_months).ok_or_else(|| {
        AnalyticsError::reference(format!("no feeding band covers age {age_months} months"))
    })?;
    let expected_feeds = band.feeds_per_day;
    let expected_interval = band.interval_hours;

    if sessions.is_empty() {
        return Ok(FeedingScore {
            score: NEUTRAL_SCORE,
            interval_regularity: 0.0,
            frequency_score: 0.0,
            duration_score: 0.0,
            expected_feeds_per_day: expected_feeds,
            expected_interval_hours: expected_interval,
            observed_feeds_per_day: None,
        });
    }

    let mut feeds: Vec<&FeedingSession> = sessions.iter().collect();
    feeds.sort_by_key(|f| f.start);

    // Start-to-start gaps, in hours
    let intervals: Vec<f64> = feeds
        .windows(2)
        .map(|pair| hours_between(pair[0], pair[1]))
        .collect();

    let interval_regularity = if intervals.is_empty() {
        0.0
    } else {
        let mean_deviation = intervals
            .iter()
            .map(|i| (i - expected_interval).abs())
            .sum::<f64>()
            / intervals.len() as f64;
        (1.0 - mean_deviation / expected_interval).max(0.0)
    };

    let span_hours = match (feeds.first(), feeds.last()) {
        (Some(first), Some(last)) if feeds.len() >= 2 => hours_between(first, last),
        _ => 0.0,
    };

    let observed_feeds_per_day = (feeds.len() >= 2 && span_hours >= expectations.min_span_hours)
        .then(|| feeds.len() as f64 / span_hours * 24.0);

    let frequency_score = match observed_feeds_per_day {
        Some(observed) => closeness(observed, expected_feeds),
        None => expectations.fallback_score,
    };

    let duration_score = duration_score(&feeds, expectations);

    let score = ((interval_regularity * REGULARITY_WEIGHT
        + frequency_score * FREQUENCY_WEIGHT
        + duration_score * DURATION_WEIGHT)
        * 100.0)
        .clamp(0.0, 100.0);

    tracing::debug!(
        feeds = feeds.len(),
        age_months,
        interval_regularity,
        frequency_score,
        duration_score,
        score,
        "feeding efficiency"
    );

    Ok(FeedingScore {
        score,
        interval_regularity,
        frequency_score,
        duration_score,
        expected_feeds_per_day: expected_feeds,
        expected_interval_hours: expected_interval,
        observed_feeds_per_day,
    })
}

/// 1 when `observed` equals `target`, falling linearly to 0 at a 100% miss.
fn closeness(observed: f64, target: f64) -> f64 {
    1.0 - ((observed - target).abs() / target).min(1.0)
}

fn hours_between(from: &FeedingSession, to: &FeedingSession) -> f64 {
    (to.start - from.start).num_milliseconds() as f64 / 3_600_000.0
}

fn duration_minutes(feed: &FeedingSession, expectations: &FeedingExpectations) -> f64 {
    match feed.end {
        Some(end) => (end - feed.start).num_milliseconds() as f64 / 60_000.0,
        None => expectations.default_duration_minutes,
    }
}

/// Average each feeding type's duration against its target. Types that are
/// absent score the fallback; if neither bottle nor breast appears at all,
/// the whole component is the fallback.
fn duration_score(feeds: &[&FeedingSession], expectations: &FeedingExpectations) -> f64 {
    let average_for = |kind: FeedingKind| -> Option<f64> {
        let durations: Vec<f64> = feeds
            .iter()
            .filter(|f| f.kind == kind)
            .map(|f| duration_minutes(f, expectations))
            .collect();
        (!durations.is_empty()).then(|| durations.iter().sum::<f64>() / durations.len() as f64)
    };

    let bottle = average_for(FeedingKind::Bottle)
        .map(|avg| closeness(avg, expectations.bottle_target_minutes));
    let breast = average_for(FeedingKind::Breast)
        .map(|avg| closeness(avg, expectations.breast_target_minutes));

    match (bottle, breast) {
        (Some(bottle), Some(breast)) => (bottle + breast) / 2.0,
        (Some(bottle), None) => bottle,
        (None, Some(breast)) => breast,
        (None, None) => expectations.fallback_score,
    }
}
