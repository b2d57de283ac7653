use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};
use serde::Deserialize;
use serde_json::Value;

use crate::error::{AnalyticsError, EntryKind};
use crate::model::{
    explicit_null, FeedingKind, FeedingSession, MilestoneEntry, SleepQuality, SleepSession,
};

/// Typed entries that survived parsing, plus one issue per entry that did not.
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized<T> {
    pub entries: Vec<T>,
    pub issues: Vec<AnalyticsError>,
}

impl<T> Normalized<T> {
    fn new() -> Self {
        Self {
            entries: Vec::new(),
            issues: Vec::new(),
        }
    }
}

#[derive(Deserialize)]
struct RawFeeding {
    start_time: String,
    #[serde(default)]
    end_time: Option<String>,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    amount: Option<f64>,
    #[serde(default)]
    notes: Option<String>,
}

#[derive(Deserialize)]
struct RawSleep {
    start_time: String,
    #[serde(default)]
    end_time: Option<String>,
    #[serde(default, deserialize_with = "explicit_null")]
    quality: Option<Option<String>>,
    #[serde(default)]
    notes: Option<String>,
}

#[derive(Deserialize)]
struct RawMilestone {
    #[serde(alias = "label")]
    milestone: String,
    #[serde(default)]
    achieved_date: Option<String>,
    #[serde(default)]
    notes: Option<String>,
}

/// Parse an ISO-8601 timestamp. Values with an offset keep it, so the hour
/// seen by the night-sleep check is the wall-clock hour the caller logged.
/// Values without one are taken as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<FixedOffset>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts);
    }

    const NAIVE_FORMATS: [&str; 4] = [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
    ];
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc().fixed_offset())
}

/// Accepts a plain date or a full timestamp (its date part is used).
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| parse_timestamp(raw).map(|ts| ts.date_naive()))
}

fn parse_bounds(
    kind: EntryKind,
    index: usize,
    start: &str,
    end: Option<&str>,
) -> Result<(DateTime<FixedOffset>, Option<DateTime<FixedOffset>>), AnalyticsError> {
    let start_ts = parse_timestamp(start).ok_or_else(|| {
        AnalyticsError::malformed(kind, index, format!("unparsable start_time {start:?}"))
    })?;

    let end_ts = match end {
        Some(raw) => Some(parse_timestamp(raw).ok_or_else(|| {
            AnalyticsError::malformed(kind, index, format!("unparsable end_time {raw:?}"))
        })?),
        None => None,
    };

    if end_ts.is_some_and(|end| end < start_ts) {
        return Err(AnalyticsError::malformed(kind, index, "end_time is before start_time"));
    }

    Ok((start_ts, end_ts))
}

pub fn feeding_sessions(raw: &[Value]) -> Normalized<FeedingSession> {
    let mut out = Normalized::new();

    for (index, value) in raw.iter().enumerate() {
        let parsed = RawFeeding::deserialize(value)
            .map_err(|e| AnalyticsError::malformed(EntryKind::Feeding, index, e.to_string()))
            .and_then(|feed| {
                let (start, end) = parse_bounds(
                    EntryKind::Feeding,
                    index,
                    &feed.start_time,
                    feed.end_time.as_deref(),
                )?;
                if feed.kind.trim().is_empty() {
                    return Err(AnalyticsError::malformed(
                        EntryKind::Feeding,
                        index,
                        "feeding type is empty",
                    ));
                }
                Ok(FeedingSession {
                    start,
                    end,
                    kind: FeedingKind::from_label(&feed.kind),
                    amount: feed.amount,
                    notes: feed.notes,
                })
            });

        match parsed {
            Ok(session) => out.entries.push(session),
            Err(issue) => out.issues.push(issue),
        }
    }

    out
}

pub fn sleep_sessions(raw: &[Value]) -> Normalized<SleepSession> {
    let mut out = Normalized::new();

    for (index, value) in raw.iter().enumerate() {
        let parsed = RawSleep::deserialize(value)
            .map_err(|e| AnalyticsError::malformed(EntryKind::Sleep, index, e.to_string()))
            .and_then(|sleep| {
                let (start, end) = parse_bounds(
                    EntryKind::Sleep,
                    index,
                    &sleep.start_time,
                    sleep.end_time.as_deref(),
                )?;
                Ok(SleepSession {
                    start,
                    end,
                    quality: sleep.quality.map(|q| match q {
                        Some(label) => SleepQuality::from_label(&label),
                        None => SleepQuality::Unrated,
                    }),
                    notes: sleep.notes,
                })
            });

        match parsed {
            Ok(session) => out.entries.push(session),
            Err(issue) => out.issues.push(issue),
        }
    }

    out
}

/// A bad `achieved_date` is reported but the milestone itself is kept, since
/// the label alone still counts toward coverage.
pub fn milestone_entries(raw: &[Value]) -> Normalized<MilestoneEntry> {
    let mut out = Normalized::new();

    for (index, value) in raw.iter().enumerate() {
        let milestone = match RawMilestone::deserialize(value) {
            Ok(m) => m,
            Err(e) => {
                out.issues.push(AnalyticsError::malformed(
                    EntryKind::Milestone,
                    index,
                    e.to_string(),
                ));
                continue;
            }
        };

        // An empty label would be a substring of every catalog entry.
        if milestone.milestone.trim().is_empty() {
            out.issues.push(AnalyticsError::malformed(
                EntryKind::Milestone,
                index,
                "milestone label is empty",
            ));
            continue;
        }

        let achieved_date = match milestone.achieved_date.as_deref() {
            Some(raw) => {
                let parsed = parse_date(raw);
                if parsed.is_none() {
                    out.issues.push(AnalyticsError::malformed(
                        EntryKind::Milestone,
                        index,
                        format!("unparsable achieved_date {raw:?}"),
                    ));
                }
                parsed
            }
            None => None,
        };

        out.entries.push(MilestoneEntry {
            label: milestone.milestone,
            achieved_date,
            notes: milestone.notes,
        });
    }

    out
}
