pub mod charts;
pub mod markdown;

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use console::style;

use crate::analysis::insights::aggregate;
use crate::analysis::Timeframe;
use crate::config::AppConfig;
use crate::paths;
use crate::storage::store;

/// Files written by [`generate_full_report`].
#[derive(Debug, Default)]
pub struct ReportFiles {
    pub markdown: Option<PathBuf>,
    pub chart: Option<PathBuf>,
}

/// Generate the progress report (markdown, plus a chart PNG unless disabled
/// in the config) for one baby from its stored records.
pub fn generate_full_report(
    config: &AppConfig,
    baby_id: i64,
    timeframe: Timeframe,
    today: NaiveDate,
) -> Result<ReportFiles> {
    let (baby, records) = store::load_history(baby_id, timeframe.cutoff(today))?;
    let mut files = ReportFiles::default();

    if records.is_empty() {
        println!("No progress records for {} in timeframe '{timeframe}'.", baby.name);
        return Ok(files);
    }

    let reports = paths::reports_dir();
    std::fs::create_dir_all(&reports)
        .with_context(|| format!("Failed to create directory: {}", reports.display()))?;
    let stem = paths::report_stem(baby_id, today);

    if config.report.chart {
        let chart_path = reports.join(format!("{stem}.png"));
        charts::generate_trend_chart(&format!("{}: Progress", baby.name), &records, &chart_path)?;
        println!("Chart saved to {}", style(chart_path.display()).green());
        files.chart = Some(chart_path);
    }

    let summary = aggregate(&baby, &records, timeframe, today);
    let md = markdown::generate_report(&baby, &records, &summary, today)?;
    let md_path = reports.join(format!("{stem}.md"));
    std::fs::write(&md_path, &md)
        .with_context(|| format!("Failed to write report: {}", md_path.display()))?;
    println!("Report saved to {}", style(md_path.display()).green());
    files.markdown = Some(md_path);

    Ok(files)
}
