//! Static bar charts for exported report sections using Plotters

use std::fs;
use std::ops::Range;
use std::path::{Path, PathBuf};

use plotters::coord::Shift;
use plotters::prelude::*;
use tracing::debug;

use crate::error::SurveyError;
use crate::report::{PageReport, SectionContent};

/// Bar palette, cycled per bar.
const BAR_COLORS: [RGBColor; 5] = [
    RGBColor(78, 205, 196),
    RGBColor(69, 183, 209),
    RGBColor(102, 126, 234),
    RGBColor(255, 107, 157),
    RGBColor(150, 206, 180),
];

const MAX_LABEL_CHARS: usize = 14;

fn chart_error<E: std::fmt::Display>(e: E) -> SurveyError {
    SurveyError::Chart(e.to_string())
}

/// Bars (label, height) for a section, if it is drawn as a bar chart.
pub fn chart_series(content: &SectionContent) -> Option<Vec<(String, f64)>> {
    let bars: Vec<(String, f64)> = match content {
        SectionContent::Counts(counts) => counts
            .entries()
            .iter()
            .map(|e| (e.value.clone(), e.count as f64))
            .collect(),
        SectionContent::Means(means) => means
            .iter()
            .filter_map(|m| m.mean.map(|v| (m.label.clone(), v)))
            .collect(),
        SectionContent::Personas(profiles) => profiles
            .iter()
            .map(|p| (p.persona.label().to_string(), p.count as f64))
            .collect(),
        _ => return None,
    };
    (!bars.is_empty()).then_some(bars)
}

/// Draw one PNG per chartable section into `out_dir`.
///
/// # Returns
/// * Paths of the written images, in section order
pub fn render_charts(report: &PageReport, out_dir: &Path) -> crate::Result<Vec<PathBuf>> {
    fs::create_dir_all(out_dir)?;

    let mut written = Vec::new();
    for section in &report.sections {
        let Some(bars) = chart_series(&section.content) else {
            continue;
        };
        let path = out_dir.join(format!("{}_{}.png", report.page.slug(), section.id));
        create_bar_chart(&bars, section.title, &path)?;
        debug!(path = %path.display(), "chart written");
        written.push(path);
    }
    Ok(written)
}

/// Axis ranges for a bar chart: one segment per bar, 10% headroom above the
/// tallest bar and never less than 1.
pub fn bar_extent(bars: &[(String, f64)]) -> (Range<u32>, Range<f64>) {
    let max_value = bars.iter().map(|(_, v)| *v).fold(0.0, f64::max).max(1.0);
    (0..bars.len() as u32, 0.0..max_value * 1.1)
}

/// Tick label for a segment, truncated to fit under the bar.
pub fn bar_label(bars: &[(String, f64)], value: &SegmentValue<u32>) -> String {
    let index = match value {
        SegmentValue::Exact(i) | SegmentValue::CenterOf(i) => *i as usize,
        SegmentValue::Last => return String::new(),
    };
    bars.get(index)
        .map(|(label, _)| label.chars().take(MAX_LABEL_CHARS).collect())
        .unwrap_or_default()
}

/// Vertical bar chart of labelled values.
pub fn create_bar_chart(bars: &[(String, f64)], title: &str, output_path: &Path) -> crate::Result<()> {
    let root = BitMapBackend::new(output_path, (800, 480)).into_drawing_area();
    draw_bars(&root, bars, Some(title))
}

/// Draw onto any backend. Without a title the chart carries no text at all.
fn draw_bars<DB>(root: &DrawingArea<DB, Shift>, bars: &[(String, f64)], title: Option<&str>) -> crate::Result<()>
where
    DB: DrawingBackend,
{
    root.fill(&WHITE).map_err(chart_error)?;

    let (x_range, y_range) = bar_extent(bars);
    let mut builder = ChartBuilder::on(root);
    builder.margin(10);
    if let Some(title) = title {
        builder
            .caption(title, ("sans-serif", 24))
            .x_label_area_size(50)
            .y_label_area_size(60);
    }
    let mut chart = builder
        .build_cartesian_2d(x_range.into_segmented(), y_range)
        .map_err(chart_error)?;

    if title.is_some() {
        let label_for = |value: &SegmentValue<u32>| bar_label(bars, value);
        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(bars.len())
            .x_label_formatter(&label_for)
            .axis_desc_style(("sans-serif", 15))
            .draw()
            .map_err(chart_error)?;
    }

    for (i, (_, value)) in bars.iter().enumerate() {
        let color = BAR_COLORS[i % BAR_COLORS.len()];
        chart
            .draw_series(
                Histogram::vertical(&chart)
                    .style(color.filled())
                    .margin(8)
                    .data(std::iter::once((i as u32, *value))),
            )
            .map_err(chart_error)?;
    }

    root.present().map_err(chart_error)?;
    Ok(())
}
