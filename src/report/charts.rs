use std::path::Path;

use anyhow::{Context, Result};
use plotters::prelude::*;

use crate::model::ProgressRecord;

/// Chart dimensions
const WIDTH: u32 = 1200;
const PANEL_HEIGHT: u32 = 260;
const PANELS: u32 = 4;
const TOTAL_HEIGHT: u32 = PANEL_HEIGHT * PANELS + 80; // extra for title

const COLOR_PRIMARY: RGBColor = RGBColor(41, 128, 185); // blue
const COLOR_SECONDARY: RGBColor = RGBColor(231, 76, 60); // red
const COLOR_TERTIARY: RGBColor = RGBColor(46, 204, 113); // green
const COLOR_THRESHOLD: RGBColor = RGBColor(200, 200, 200); // light gray

type Panel<'a> = DrawingArea<BitMapBackend<'a>, plotters::coord::Shift>;

/// One line on a panel. Records without a value leave a gap.
struct Series {
    label: &'static str,
    color: RGBColor,
    values: Vec<Option<f64>>,
}

impl Series {
    fn new(
        label: &'static str,
        color: RGBColor,
        records: &[ProgressRecord],
        value: impl Fn(&ProgressRecord) -> Option<f64>,
    ) -> Self {
        Self {
            label,
            color,
            values: records.iter().map(value).collect(),
        }
    }

    fn points(&self) -> Vec<(usize, f64)> {
        self.values
            .iter()
            .enumerate()
            .filter_map(|(i, v)| v.map(|y| (i, y)))
            .collect()
    }
}

/// Render a multi-panel trend chart for `records` (oldest first) to a PNG.
///
/// Panels: weight, length and head circumference, growth percentile, and
/// the three daily scores.
pub fn generate_trend_chart(title: &str, records: &[ProgressRecord], output_path: &Path) -> Result<()> {
    if let Some(parent) = output_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let root = BitMapBackend::new(output_path, (WIDTH, TOTAL_HEIGHT)).into_drawing_area();
    root.fill(&WHITE).context("Failed to fill background")?;

    root.draw(&Text::new(
        title.to_string(),
        (WIDTH as i32 / 2 - 180, 15),
        ("sans-serif", 28).into_font().color(&BLACK),
    ))
    .context("Failed to draw title")?;

    let panels_area = root.margin(60, 10, 10, 10);
    let panels = panels_area.split_evenly((PANELS as usize, 1));

    let dates: Vec<String> = records
        .iter()
        .map(|r| r.record_date.format("%m-%d").to_string())
        .collect();

    draw_panel(
        &panels[0],
        "Weight (kg)",
        &dates,
        &[Series::new("Weight", COLOR_PRIMARY, records, |r| r.weight)],
        (2.0, 10.0),
        &[],
    )?;

    draw_panel(
        &panels[1],
        "Length & Head Circumference (cm)",
        &dates,
        &[
            Series::new("Length", COLOR_PRIMARY, records, |r| r.height),
            Series::new("Head", COLOR_SECONDARY, records, |r| r.head_circumference),
        ],
        (30.0, 80.0),
        &[],
    )?;

    draw_panel(
        &panels[2],
        "Growth Percentile",
        &dates,
        &[Series::new("Percentile", COLOR_TERTIARY, records, |r| {
            r.derived.growth_percentile
        })],
        (0.0, 100.0),
        &[15.0, 50.0, 85.0],
    )?;

    draw_panel(
        &panels[3],
        "Daily Scores",
        &dates,
        &[
            Series::new("Sleep", COLOR_PRIMARY, records, |r| r.derived.sleep_quality_index),
            Series::new("Feeding", COLOR_SECONDARY, records, |r| r.derived.feeding_efficiency),
            Series::new("Development", COLOR_TERTIARY, records, |r| {
                r.derived.developmental_score
            }),
        ],
        (0.0, 100.0),
        &[50.0],
    )?;

    root.present().context("Failed to write chart PNG")?;

    Ok(())
}

fn draw_panel(
    area: &Panel<'_>,
    caption: &str,
    dates: &[String],
    series: &[Series],
    y_default: (f64, f64),
    thresholds: &[f64],
) -> Result<()> {
    let all_vals: Vec<f64> = series
        .iter()
        .flat_map(|s| s.values.iter().filter_map(|v| *v))
        .collect();
    let (y_min, y_max) = min_max_with_margin(&all_vals, y_default.0, y_default.1);

    let mut chart = ChartBuilder::on(area)
        .caption(caption, ("sans-serif", 18))
        .margin(5)
        .x_label_area_size(30)
        .y_label_area_size(50)
        .build_cartesian_2d(0..dates.len().max(1), y_min..y_max)?;

    let labels = date_labels(dates);
    chart
        .configure_mesh()
        .x_labels(8)
        .x_label_formatter(&|x| {
            labels
                .iter()
                .find(|(i, _)| i == x)
                .map(|(_, l)| l.clone())
                .unwrap_or_default()
        })
        .draw()?;

    for &y in thresholds.iter().filter(|&&y| y >= y_min && y <= y_max) {
        chart.draw_series(DashedLineSeries::new(
            vec![(0usize, y), (dates.len(), y)],
            5,
            3,
            COLOR_THRESHOLD.into(),
        ))?;
    }

    for s in series {
        let points = s.points();
        let color = s.color;
        chart
            .draw_series(LineSeries::new(points.iter().copied(), color))?
            .label(s.label)
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
        chart.draw_series(points.iter().map(|&(x, y)| Circle::new((x, y), 4, color.filled())))?;
    }

    if series.len() > 1 {
        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()?;
    }

    Ok(())
}

/// X-axis labels, showing every Nth date to avoid crowding.
fn date_labels(dates: &[String]) -> Vec<(usize, String)> {
    let step = (dates.len() / 8).max(1);
    dates
        .iter()
        .enumerate()
        .filter(|(i, _)| i % step == 0 || *i + 1 == dates.len())
        .map(|(i, d)| (i, d.clone()))
        .collect()
}

/// Compute y-axis range with margin, falling back to defaults if no data.
fn min_max_with_margin(values: &[f64], default_min: f64, default_max: f64) -> (f64, f64) {
    if values.is_empty() {
        return (default_min, default_max);
    }
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let margin = (max - min).max(1.0) * 0.1;
    (min - margin, max + margin)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_thin_out_long_ranges() {
        let dates: Vec<String> = (1..=20).map(|d| format!("03-{d:02}")).collect();
        let labels = date_labels(&dates);
        assert!(labels.len() < dates.len());
        assert_eq!(labels.first().unwrap().1, "03-01");
        // the last date is always labelled
        assert_eq!(labels.last().unwrap().0, 19);
    }

    #[test]
    fn axis_range_has_margin() {
        let (lo, hi) = min_max_with_margin(&[5.0, 6.0], 0.0, 100.0);
        assert!(lo < 5.0 && hi > 6.0);
        assert_eq!(min_max_with_margin(&[], 0.0, 100.0), (0.0, 100.0));
    }

    #[test]
    fn series_skips_missing_values() {
        let mut a = ProgressRecord::new(chrono::NaiveDate::from_ymd_opt(2026, 3, 1).unwrap());
        a.weight = Some(5.0);
        let b = ProgressRecord::new(chrono::NaiveDate::from_ymd_opt(2026, 3, 2).unwrap());
        let mut c = ProgressRecord::new(chrono::NaiveDate::from_ymd_opt(2026, 3, 3).unwrap());
        c.weight = Some(5.2);

        let series = Series::new("Weight", COLOR_PRIMARY, &[a, b, c], |r| r.weight);
        assert_eq!(series.points(), vec![(0, 5.0), (2, 5.2)]);
    }
}
