use anyhow::Result;
use chrono::NaiveDate;

use crate::analysis::age::age_in_months;
use crate::analysis::insights::{Insights, InsightsSummary};
use crate::model::{BabyProfile, ProgressRecord};

/// Percentiles below this are flagged in the growth table.
const LOW_PERCENTILE: f64 = 3.0;
/// Daily scores below this are flagged.
const LOW_SCORE: f64 = 40.0;

/// Generate a markdown progress report for one baby.
///
/// `records` are the records inside the reported timeframe, oldest first,
/// and `summary` the insights aggregated from them. Returns the markdown
/// content; the caller decides where to save it.
pub fn generate_report(
    baby: &BabyProfile,
    records: &[ProgressRecord],
    summary: &InsightsSummary,
    today: NaiveDate,
) -> Result<String> {
    let mut md = String::new();

    md.push_str(&format!("# {}: Progress Report\n\n", baby.name));
    md.push_str(&format!("Generated: {today}  \n"));
    md.push_str(&format!(
        "Born: {} ({} months)  \n",
        baby.date_of_birth,
        age_in_months(baby.date_of_birth, today)
    ));
    md.push_str(&format!("Records: {}\n\n", records.len()));

    let insights = match summary {
        InsightsSummary::Available { insights, .. } if !records.is_empty() => insights,
        InsightsSummary::NoData { message, .. } => {
            md.push_str(&format!("{message}.\n"));
            return Ok(md);
        }
        InsightsSummary::Available { .. } => {
            md.push_str("No records to report.\n");
            return Ok(md);
        }
    };

    md.push_str("---\n\n");
    push_summary(&mut md, insights);

    md.push_str("## Growth\n\n");
    md.push_str("| Date | Weight (kg) | Length (cm) | Head (cm) | Percentile |\n");
    md.push_str("|------|------------|------------|----------|------------|\n");
    for r in records.iter().filter(|r| r.has_measurements()) {
        md.push_str(&format!(
            "| {} | {} | {} | {} | {}{} |\n",
            r.record_date,
            cell(r.weight, 2),
            cell(r.height, 1),
            cell(r.head_circumference, 1),
            cell(r.derived.growth_percentile, 1),
            flag_low(r.derived.growth_percentile, LOW_PERCENTILE),
        ));
    }
    md.push('\n');

    md.push_str("## Daily Scores\n\n");
    md.push_str("| Date | Sleep | Feeding | Development | Feeds | Sleep (h) | Notes |\n");
    md.push_str("|------|-------|---------|-------------|-------|-----------|-------|\n");
    for r in records {
        let d = &r.derived;
        md.push_str(&format!(
            "| {} | {}{} | {}{} | {}{} | {} | {} | {} |\n",
            r.record_date,
            cell(d.sleep_quality_index, 1),
            flag_low(d.sleep_quality_index, LOW_SCORE),
            cell(d.feeding_efficiency, 1),
            flag_low(d.feeding_efficiency, LOW_SCORE),
            cell(d.developmental_score, 1),
            flag_low(d.developmental_score, LOW_SCORE),
            r.feeding_times.as_ref().map_or(0, Vec::len),
            cell(r.total_sleep_hours, 1),
            r.notes.as_deref().unwrap_or("").replace('|', "/"),
        ));
    }
    md.push('\n');

    Ok(md)
}

fn push_summary(md: &mut String, insights: &Insights) {
    md.push_str(&format!("## Summary ({})\n\n", insights.timeframe));

    let g = &insights.growth;
    md.push_str(&format!(
        "- **Average growth percentile**: {}\n",
        cell(g.average_percentile, 1)
    ));
    if let Some(rate) = g.weight_gain_per_week {
        md.push_str(&format!("- **Weight gain**: {rate:+.1} g/week\n"));
    }
    if let Some(rate) = g.height_gain_per_month {
        md.push_str(&format!("- **Length gain**: {rate:+.1} cm/month\n"));
    }
    if let Some(rate) = g.head_circumference_gain_per_month {
        md.push_str(&format!("- **Head circumference gain**: {rate:+.1} cm/month\n"));
    }
    md.push_str(&format!(
        "- **Sleep quality**: {} ({})\n",
        cell(insights.sleep.average_quality, 1),
        insights.sleep.trend
    ));
    md.push_str(&format!(
        "- **Feeding efficiency**: {} ({})\n",
        cell(insights.feeding.average_efficiency, 1),
        insights.feeding.trend
    ));
    md.push_str(&format!(
        "- **Development**: {} ({})\n\n",
        cell(insights.development.average_score, 1),
        insights.development.trend
    ));
}

fn cell(value: Option<f64>, precision: usize) -> String {
    value
        .map(|v| format!("{v:.precision$}"))
        .unwrap_or_else(|| "-".into())
}

/// Append a flag marker if value is below threshold (lower is worse).
fn flag_low(value: Option<f64>, threshold: f64) -> &'static str {
    match value {
        Some(v) if v < threshold => " \u{26a0}", // ⚠
        _ => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::insights::{aggregate, Timeframe};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn baby() -> BabyProfile {
        BabyProfile::new("Ada", date(2026, 1, 1), Some("female"))
    }

    fn sample_record(d: NaiveDate, weight: f64, sleep: f64) -> ProgressRecord {
        let mut r = ProgressRecord::new(d);
        r.weight = Some(weight);
        r.derived.growth_percentile = Some(55.0);
        r.derived.sleep_quality_index = Some(sleep);
        r.notes = Some("fussy | teething".into());
        r
    }

    #[test]
    fn generates_markdown_with_tables() {
        let records = vec![
            sample_record(date(2026, 3, 1), 5.0, 70.0),
            sample_record(date(2026, 3, 15), 5.3, 35.0),
        ];
        let today = date(2026, 3, 15);
        let summary = aggregate(&baby(), &records, Timeframe::All, today);
        let md = generate_report(&baby(), &records, &summary, today).unwrap();

        assert!(md.contains("# Ada: Progress Report"));
        assert!(md.contains("## Growth"));
        assert!(md.contains("| 2026-03-01 | 5.00 |"));
        assert!(md.contains("+150.0 g/week"));
        assert!(md.contains("(declining)"));
        // low sleep score flagged, pipes in notes escaped
        assert!(md.contains("35.0 \u{26a0}"));
        assert!(md.contains("fussy / teething"));
    }

    #[test]
    fn missing_values_render_as_dash() {
        let records = vec![ProgressRecord::new(date(2026, 3, 1))];
        let summary = aggregate(&baby(), &records, Timeframe::All, date(2026, 3, 1));
        let md = generate_report(&baby(), &records, &summary, date(2026, 3, 1)).unwrap();
        assert!(md.contains("| 2026-03-01 | - | - | - |"));
        assert!(md.contains("(not enough data)"));
    }

    #[test]
    fn no_data_message() {
        let summary = InsightsSummary::no_data();
        let md = generate_report(&baby(), &[], &summary, date(2026, 3, 1)).unwrap();
        assert!(md.contains("No progress data available"));
        assert!(!md.contains("## Growth"));
    }
}
