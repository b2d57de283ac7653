use serde::{Deserialize, Serialize};

use crate::error::{AnalyticsError, Result};

/// Expected feeding pattern for babies younger than `below_months`.
/// The band with no upper bound applies to everyone older.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedingBand {
    pub below_months: Option<u32>,
    pub feeds_per_day: f64,
    pub interval_hours: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedingExpectations {
    pub bands: Vec<FeedingBand>,
    /// Assumed length of a feed logged without an end time.
    pub default_duration_minutes: f64,
    pub bottle_target_minutes: f64,
    pub breast_target_minutes: f64,
    /// Observation span needed before feeds/day is trusted.
    pub min_span_hours: f64,
    /// Sub-score used when a component cannot be assessed.
    pub fallback_score: f64,
}

impl FeedingExpectations {
    /// First bounded band the age falls under, else the open-ended band.
    /// Only `None` for tables that never went through validation.
    pub fn band_for(&self, age_months: u32) -> Option<&FeedingBand> {
        self.bands
            .iter()
            .find(|b| b.below_months.is_some_and(|limit| age_months < limit))
            .or_else(|| self.bands.iter().find(|b| b.below_months.is_none()))
    }

    pub(crate) fn normalize(&mut self) {
        // Bounded bands ascending, open-ended band last.
        self.bands
            .sort_by_key(|b| b.below_months.unwrap_or(u32::MAX));
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if !self.bands.iter().any(|b| b.below_months.is_none()) {
            return Err(AnalyticsError::reference(
                "feeding bands need one band without below_months",
            ));
        }
        for band in &self.bands {
            if !(band.feeds_per_day > 0.0 && band.interval_hours > 0.0) {
                return Err(AnalyticsError::reference(
                    "feeding band values must be positive",
                ));
            }
        }
        let positive = [
            self.default_duration_minutes,
            self.bottle_target_minutes,
            self.breast_target_minutes,
        ];
        if positive.iter().any(|v| !(*v > 0.0)) {
            return Err(AnalyticsError::reference(
                "feeding duration targets must be positive",
            ));
        }
        if !(0.0..=1.0).contains(&self.fallback_score) {
            return Err(AnalyticsError::reference(
                "feeding fallback_score must be within 0..=1",
            ));
        }
        Ok(())
    }
}

impl Default for FeedingExpectations {
    fn default() -> Self {
        let band = |below_months, feeds_per_day, interval_hours| FeedingBand {
            below_months,
            feeds_per_day,
            interval_hours,
        };
        Self {
            bands: vec![
                band(Some(1), 8.0, 2.0),
                band(Some(3), 7.0, 3.0),
                band(Some(6), 6.0, 3.5),
                band(None, 5.0, 4.0),
            ],
            default_duration_minutes: 15.0,
            bottle_target_minutes: 15.0,
            breast_target_minutes: 25.0,
            min_span_hours: 12.0,
            fallback_score: 0.7,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SleepExpectations {
    /// Daily sleep that earns a full duration sub-score.
    pub target_hours: f64,
    /// A session starting at or after this hour counts as night sleep...
    pub night_start_hour: u32,
    /// ...as does one starting at or before this hour.
    pub night_end_hour: u32,
    /// Gaps shorter than this between sessions count as interruptions.
    pub interruption_gap_minutes: f64,
}

impl SleepExpectations {
    pub fn is_night_hour(&self, hour: u32) -> bool {
        hour >= self.night_start_hour || hour <= self.night_end_hour
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if !(self.target_hours > 0.0) {
            return Err(AnalyticsError::reference("sleep target_hours must be positive"));
        }
        if self.night_start_hour > 23 || self.night_end_hour > 23 {
            return Err(AnalyticsError::reference("night hours must be within 0..=23"));
        }
        if !(self.interruption_gap_minutes >= 0.0) {
            return Err(AnalyticsError::reference(
                "interruption_gap_minutes must not be negative",
            ));
        }
        Ok(())
    }
}

impl Default for SleepExpectations {
    fn default() -> Self {
        Self {
            target_hours: 14.0,
            night_start_hour: 20,
            night_end_hour: 6,
            interruption_gap_minutes: 30.0,
        }
    }
}
