use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::analysis::Timeframe;
use crate::paths;
use crate::reference::ReferenceData;

/// Application configuration, loaded from <config_dir>/config.toml.
///
/// Every section is `#[serde(default)]`, so the file is optional and may
/// list only the keys the user wants to change.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub reference: ReferenceConfig,
    pub insights: InsightsConfig,
    pub report: ReportConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReferenceConfig {
    /// Reference tables to use instead of <config_dir>/reference.toml.
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InsightsConfig {
    /// Window used by `insights` and `report` when none is given.
    pub default_timeframe: Timeframe,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Render the PNG trend chart alongside the markdown report.
    pub chart: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self { chart: true }
    }
}

/// Load the application config from $XDG_CONFIG_HOME/babytrack/config.toml.
/// If the file doesn't exist, returns defaults.
pub fn load_config() -> Result<AppConfig> {
    load_config_from(&paths::config_file())
}

fn load_config_from(path: &Path) -> Result<AppConfig> {
    if !path.exists() {
        return Ok(AppConfig::default());
    }

    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    toml::from_str(&contents)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Resolve the reference tables for this run.
///
/// An explicitly configured path must exist. The default location is
/// optional; without it the built-in tables are used.
pub fn load_reference(config: &AppConfig) -> Result<ReferenceData> {
    match &config.reference.path {
        Some(path) => read_reference(path),
        None => {
            let path = paths::reference_file();
            if path.exists() {
                read_reference(&path)
            } else {
                Ok(ReferenceData::default())
            }
        }
    }
}

fn read_reference(path: &Path) -> Result<ReferenceData> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read reference tables: {}", path.display()))?;

    let reference = ReferenceData::from_toml(&contents)
        .with_context(|| format!("Invalid reference tables: {}", path.display()))?;

    tracing::debug!(
        path = %path.display(),
        version = %reference.version,
        "loaded reference tables"
    );
    Ok(reference)
}
