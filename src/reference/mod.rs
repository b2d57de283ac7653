//! Static lookup tables the scorers are evaluated against.
//!
//! Everything here is configuration, not logic: growth standards, the
//! percentile ladder, the milestone catalog and the expected feeding and
//! sleep patterns. A `ReferenceData` is built once (defaults or a TOML file),
//! validated, and then only ever read, so it can be shared freely between
//! threads.

pub mod growth;
pub mod milestones;
pub mod patterns;

use serde::{Deserialize, Serialize};

use crate::error::{AnalyticsError, Result};

pub use growth::{AnchorRow, AnchorTable, GrowthMetric, GrowthStandards};
pub use milestones::{MilestoneCatalog, MilestoneMonth};
pub use patterns::{FeedingBand, FeedingExpectations, SleepExpectations};

/// Percentile rungs the growth anchors are aligned to.
pub const DEFAULT_LADDER: [f64; 5] = [3.0, 15.0, 50.0, 85.0, 97.0];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReferenceData {
    /// Free-form label so stored scores can be traced to the tables used.
    pub version: String,
    pub ladder: Vec<f64>,
    pub growth: GrowthStandards,
    pub milestones: MilestoneCatalog,
    pub feeding: FeedingExpectations,
    pub sleep: SleepExpectations,
}

impl Default for ReferenceData {
    fn default() -> Self {
        Self {
            version: "who-excerpt-1".into(),
            ladder: DEFAULT_LADDER.to_vec(),
            growth: GrowthStandards::default(),
            milestones: MilestoneCatalog::default(),
            feeding: FeedingExpectations::default(),
            sleep: SleepExpectations::default(),
        }
    }
}

impl ReferenceData {
    /// Sort the tables into lookup order and check every invariant the
    /// scorers rely on. Fails on the first problem found.
    pub fn validated(mut self) -> Result<Self> {
        self.milestones.normalize();
        self.feeding.normalize();
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        validate_ladder(&self.ladder)?;
        self.growth.validate(self.ladder.len())?;
        self.milestones.validate()?;
        self.feeding.validate()?;
        self.sleep.validate()
    }

    /// Parse a TOML document. Sections left out keep their defaults.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let data: ReferenceData = toml::from_str(contents)
            .map_err(|e| AnalyticsError::reference(format!("unparsable tables: {e}")))?;
        data.validated()
    }
}

fn validate_ladder(ladder: &[f64]) -> Result<()> {
    if ladder.len() < 2 {
        return Err(AnalyticsError::reference("ladder needs at least two rungs"));
    }
    if ladder.iter().any(|p| !(0.0..=100.0).contains(p)) {
        return Err(AnalyticsError::reference("ladder rungs must be within 0..=100"));
    }
    if ladder.windows(2).any(|w| w[1] <= w[0]) {
        return Err(AnalyticsError::reference("ladder must be strictly increasing"));
    }
    Ok(())
}
