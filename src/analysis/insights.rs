use std::fmt;
use std::str::FromStr;

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::age::age_in_months;
use crate::error::AnalyticsError;
use crate::model::{BabyProfile, ProgressRecord};

pub const NO_DATA_MESSAGE: &str = "No progress data available for the selected timeframe";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Timeframe {
    /// Records dated within the last 7 days.
    Week,
    /// Records dated within the last 30 days.
    Month,
    #[default]
    All,
}

impl Timeframe {
    pub fn as_str(self) -> &'static str {
        match self {
            Timeframe::Week => "week",
            Timeframe::Month => "month",
            Timeframe::All => "all",
        }
    }

    /// Earliest record date included, or `None` for no lower bound.
    pub fn cutoff(self, today: NaiveDate) -> Option<NaiveDate> {
        match self {
            Timeframe::Week => today.checked_sub_days(Days::new(7)),
            Timeframe::Month => today.checked_sub_days(Days::new(30)),
            Timeframe::All => None,
        }
    }
}

impl FromStr for Timeframe {
    type Err = AnalyticsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "week" => Ok(Timeframe::Week),
            "month" => Ok(Timeframe::Month),
            "all" => Ok(Timeframe::All),
            _ => Err(AnalyticsError::UnknownTimeframe(s.to_string())),
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Trend {
    #[serde(rename = "improving")]
    Improving,
    #[serde(rename = "declining")]
    Declining,
    #[serde(rename = "stable")]
    Stable,
    #[serde(rename = "as expected")]
    AsExpected,
    #[serde(rename = "not enough data")]
    NotEnoughData,
}

impl Trend {
    pub fn label(self) -> &'static str {
        match self {
            Trend::Improving => "improving",
            Trend::Declining => "declining",
            Trend::Stable => "stable",
            Trend::AsExpected => "as expected",
            Trend::NotEnoughData => "not enough data",
        }
    }

    /// First-vs-last comparison for a higher-is-better score. Intermediate
    /// records are ignored; a missing endpoint reads as stable.
    pub fn between(first: Option<f64>, last: Option<f64>) -> Trend {
        match (first, last) {
            (Some(first), Some(last)) if last > first => Trend::Improving,
            (Some(first), Some(last)) if last < first => Trend::Declining,
            _ => Trend::Stable,
        }
    }

    /// Like [`Trend::between`], but distinguishes the cases where the
    /// first or both endpoints have no score.
    pub fn development(first: Option<f64>, last: Option<f64>) -> Trend {
        match (first, last) {
            (Some(_), Some(_)) => Trend::between(first, last),
            (None, Some(_)) => Trend::AsExpected,
            (Some(_), None) => Trend::Stable,
            (None, None) => Trend::NotEnoughData,
        }
    }
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub date: NaiveDate,
    pub weight: Option<f64>,
    pub height: Option<f64>,
    pub head_circumference: Option<f64>,
}

impl Snapshot {
    fn of(record: &ProgressRecord) -> Self {
        Self {
            date: record.record_date,
            weight: record.weight,
            height: record.height,
            head_circumference: record.head_circumference,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GrowthInsights {
    pub first_record: Snapshot,
    pub latest_record: Snapshot,
    pub average_percentile: Option<f64>,
    /// g/week
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight_gain_per_week: Option<f64>,
    /// cm per 30 days
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height_gain_per_month: Option<f64>,
    /// cm per 30 days
    #[serde(skip_serializing_if = "Option::is_none")]
    pub head_circumference_gain_per_month: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SleepInsights {
    pub average_quality: Option<f64>,
    pub trend: Trend,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedingInsights {
    pub average_efficiency: Option<f64>,
    pub trend: Trend,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DevelopmentInsights {
    pub average_score: Option<f64>,
    pub trend: Trend,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Insights {
    pub total_records: usize,
    pub timeframe: Timeframe,
    pub baby_age_months: u32,
    pub growth: GrowthInsights,
    pub sleep: SleepInsights,
    pub feeding: FeedingInsights,
    pub development: DevelopmentInsights,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum InsightsSummary {
    NoData {
        message: String,
        insights: Map<String, Value>,
    },
    Available {
        baby_name: String,
        insights: Insights,
    },
}

impl InsightsSummary {
    pub fn no_data() -> Self {
        InsightsSummary::NoData {
            message: NO_DATA_MESSAGE.to_string(),
            insights: Map::new(),
        }
    }

    pub fn insights(&self) -> Option<&Insights> {
        match self {
            InsightsSummary::Available { insights, .. } => Some(insights),
            InsightsSummary::NoData { .. } => None,
        }
    }
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    (count > 0).then(|| sum / count as f64)
}

fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Change per `period_days`, when both endpoints have the value.
fn rate(first: Option<f64>, last: Option<f64>, days: i64, period_days: f64) -> Option<f64> {
    let (first, last) = (first?, last?);
    Some(round_tenth((last - first) / days as f64 * period_days))
}

/// Summarize the records falling inside `timeframe` as of `today`.
///
/// Records may arrive in any order; they are sorted by date (stable for
/// records sharing a date) before endpoints are taken.
pub fn aggregate(
    baby: &BabyProfile,
    records: &[ProgressRecord],
    timeframe: Timeframe,
    today: NaiveDate,
) -> InsightsSummary {
    let cutoff = timeframe.cutoff(today);
    let mut selected: Vec<&ProgressRecord> = records
        .iter()
        .filter(|r| cutoff.map_or(true, |c| r.record_date >= c))
        .collect();
    selected.sort_by_key(|r| r.record_date);

    let (Some(first), Some(last)) = (selected.first().copied(), selected.last().copied()) else {
        return InsightsSummary::no_data();
    };

    let mut growth = GrowthInsights {
        first_record: Snapshot::of(first),
        latest_record: Snapshot::of(last),
        average_percentile: mean(selected.iter().filter_map(|r| r.derived.growth_percentile)),
        weight_gain_per_week: None,
        height_gain_per_month: None,
        head_circumference_gain_per_month: None,
    };

    let days = (last.record_date - first.record_date).num_days();
    if selected.len() >= 2 && days > 0 {
        // kg → g, per week
        growth.weight_gain_per_week = rate(first.weight, last.weight, days, 7.0 * 1000.0);
        growth.height_gain_per_month = rate(first.height, last.height, days, 30.0);
        growth.head_circumference_gain_per_month =
            rate(first.head_circumference, last.head_circumference, days, 30.0);
    }

    let insights = Insights {
        total_records: selected.len(),
        timeframe,
        baby_age_months: age_in_months(baby.date_of_birth, today),
        growth,
        sleep: SleepInsights {
            average_quality: mean(selected.iter().filter_map(|r| r.derived.sleep_quality_index)),
            trend: Trend::between(
                first.derived.sleep_quality_index,
                last.derived.sleep_quality_index,
            ),
        },
        feeding: FeedingInsights {
            average_efficiency: mean(selected.iter().filter_map(|r| r.derived.feeding_efficiency)),
            trend: Trend::between(
                first.derived.feeding_efficiency,
                last.derived.feeding_efficiency,
            ),
        },
        development: DevelopmentInsights {
            average_score: mean(selected.iter().filter_map(|r| r.derived.developmental_score)),
            trend: Trend::development(
                first.derived.developmental_score,
                last.derived.developmental_score,
            ),
        },
    };

    tracing::debug!(
        records = insights.total_records,
        timeframe = %timeframe,
        "aggregated insights"
    );

    InsightsSummary::Available {
        baby_name: baby.name.clone(),
        insights,
    }
}
