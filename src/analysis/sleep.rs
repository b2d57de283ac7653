use chrono::{DateTime, FixedOffset, Timelike};
use serde::Serialize;

use super::growth::NEUTRAL_SCORE;
use crate::model::{SleepQuality, SleepSession};
use crate::reference::SleepExpectations;

const DURATION_WEIGHT: f64 = 0.4;
const NIGHT_WEIGHT: f64 = 0.3;
const CONTINUITY_WEIGHT: f64 = 0.3;

/// Each interruption costs this fraction of the continuity score...
const INTERRUPTION_PENALTY: f64 = 0.1;
/// ...down to this floor.
const MIN_INTERRUPTION_FACTOR: f64 = 0.5;

/// Sleep quality index with the sub-scores it was built from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SleepScore {
    /// 0-100
    pub index: f64,
    pub duration_score: f64,
    pub night_ratio_score: f64,
    pub continuity_score: f64,
    pub total_minutes: f64,
    pub night_minutes: f64,
    pub interruptions: usize,
    pub quality_factor: f64,
}

impl SleepScore {
    fn neutral() -> Self {
        Self {
            index: NEUTRAL_SCORE,
            duration_score: 0.0,
            night_ratio_score: 0.0,
            continuity_score: 0.0,
            total_minutes: 0.0,
            night_minutes: 0.0,
            interruptions: 0,
            quality_factor: 0.0,
        }
    }
}

/// Weight of a parent's rating. A session without a `quality` key counts as
/// good; an explicit null weighs like any unrecognised rating.
fn quality_weight(quality: Option<&SleepQuality>) -> f64 {
    match quality {
        None | Some(SleepQuality::Good) => 1.0,
        Some(SleepQuality::Fair) => 0.7,
        Some(SleepQuality::Poor | SleepQuality::Unrated | SleepQuality::Other(_)) => 0.4,
    }
}

struct Span {
    start: DateTime<FixedOffset>,
    end: DateTime<FixedOffset>,
    minutes: f64,
    night: bool,
    quality: f64,
}

/// Score a day's sleep sessions.
///
/// Open sessions are closed at `now`, so the result for a record with an
/// ongoing nap depends on when it is evaluated. A session starting after
/// `now` counts as zero minutes.
///
/// index = 0.4 × duration + 0.3 × night ratio + 0.3 × continuity, where
/// - duration is total hours against the daily target, capped at 100
/// - night ratio is the share of minutes in sessions starting at night
/// - continuity is the mean quality rating times an interruption factor
pub fn score_sleep(
    sessions: &[SleepSession],
    now: DateTime<FixedOffset>,
    expectations: &SleepExpectations,
) -> SleepScore {
    if sessions.is_empty() {
        return SleepScore::neutral();
    }

    let mut spans: Vec<Span> = sessions
        .iter()
        .map(|s| {
            let end = s.end.unwrap_or(now).max(s.start);
            Span {
                start: s.start,
                end,
                minutes: minutes_between(s.start, end),
                night: expectations.is_night_hour(s.start.hour()),
                quality: quality_weight(s.quality.as_ref()),
            }
        })
        .collect();

    spans.sort_by_key(|s| s.start);

    let total_minutes: f64 = spans.iter().map(|s| s.minutes).sum();
    let night_minutes: f64 = spans.iter().filter(|s| s.night).map(|s| s.minutes).sum();

    let interruptions = spans
        .windows(2)
        .filter(|pair| minutes_between(pair[0].end, pair[1].start) < expectations.interruption_gap_minutes)
        .count();

    let quality_factor = spans.iter().map(|s| s.quality).sum::<f64>() / spans.len() as f64;
    let interruption_factor =
        (1.0 - interruptions as f64 * INTERRUPTION_PENALTY).max(MIN_INTERRUPTION_FACTOR);

    let hours = total_minutes / 60.0;
    let duration_score = (hours / expectations.target_hours * 100.0).min(100.0);
    let night_ratio_score = if total_minutes > 0.0 {
        night_minutes / total_minutes * 100.0
    } else {
        0.0
    };
    let continuity_score = quality_factor * interruption_factor * 100.0;

    let index = (duration_score * DURATION_WEIGHT
        + night_ratio_score * NIGHT_WEIGHT
        + continuity_score * CONTINUITY_WEIGHT)
        .clamp(0.0, 100.0);

    tracing::debug!(
        sessions = spans.len(),
        total_minutes,
        night_minutes,
        interruptions,
        index,
        "sleep quality"
    );

    SleepScore {
        index,
        duration_score,
        night_ratio_score,
        continuity_score,
        total_minutes,
        night_minutes,
        interruptions,
        quality_factor,
    }
}

/// Signed minutes from `from` to `to`.
fn minutes_between(from: DateTime<FixedOffset>, to: DateTime<FixedOffset>) -> f64 {
    (to - from).num_milliseconds() as f64 / 60_000.0
}
