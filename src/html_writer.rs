//! HTML Writer
//!
//! Writes a self-contained page: the chart as inline SVG, a legend, a hover
//! tooltip and, when animation is on, the recorded frames replayed one per
//! browser animation frame.

use std::fs;
use std::path::{Path, PathBuf};

use askama::Template;
use serde::Serialize;

use crate::chart::Chart;
use crate::io::{ChartError, ChartResult, Writer};
use crate::svg_writer::SvgWriter;

/// Legend row for the template
#[derive(Debug, Clone)]
pub struct LegendData {
    pub category: String,
    pub color: String,
    pub count: usize,
}

/// Per-bubble details the tooltip shows
#[derive(Debug, Clone, Serialize)]
struct BubbleDetail<'a> {
    id: &'a str,
    city: &'a str,
    country: &'a str,
    size: f64,
}

#[derive(Template)]
#[template(path = "index.html")]
struct IndexTemplate<'a> {
    title: &'a str,
    version: &'a str,
    bubble_count: usize,
    skipped: usize,
    ticks: usize,
    svg: &'a str,
    legend: &'a [LegendData],
    bubbles_json: &'a str,
    /// Recorded frames, empty for a static page
    frames_json: &'a str,
    animate: bool,
    size_label: &'a str,
}

/// Make JSON safe to place inside a `<script>` element. `<` only occurs
/// inside JSON strings, where `\u003c` decodes to the same character.
fn script_safe(json: String) -> String {
    json.replace('<', "\\u003c")
}

/// Column name as a tooltip label: "flights" becomes "Flights"
fn label(column: &str) -> String {
    let mut chars = column.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Writer for the interactive HTML page
pub struct HtmlWriter {
    /// Whether to replay the layout animation (default: true)
    pub animate: bool,
}

impl Default for HtmlWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl HtmlWriter {
    /// Create a new HTML writer with default options (animation enabled)
    pub fn new() -> Self {
        Self { animate: true }
    }

    /// Create a new HTML writer with custom options
    pub fn with_options(animate: bool) -> Self {
        Self { animate }
    }

    /// Render the page for `chart`
    pub fn render(&self, chart: &Chart) -> ChartResult<String> {
        // Animated pages start from the seeded positions and play forward
        let start = match (self.animate, chart.frames.first()) {
            (true, Some(first)) => first.clone(),
            _ => chart.final_positions(),
        };
        let svg = SvgWriter::render(chart, &start)?;

        let legend: Vec<LegendData> = chart
            .legend
            .iter()
            .map(|e| LegendData {
                category: e.category.clone(),
                color: e.color.to_hex(),
                count: e.count,
            })
            .collect();

        let details: Vec<BubbleDetail> = chart
            .bubbles
            .iter()
            .map(|b| BubbleDetail {
                id: &b.id,
                city: &b.city,
                country: &b.country,
                size: b.size,
            })
            .collect();
        let bubbles_json = script_safe(serde_json::to_string(&details)?);
        let frames_json = if self.animate {
            script_safe(serde_json::to_string(&chart.frames)?)
        } else {
            String::new()
        };

        let size_label = label(&chart.size_label);
        let template = IndexTemplate {
            title: &chart.title,
            version: env!("CARGO_PKG_VERSION"),
            bubble_count: chart.bubbles.len(),
            skipped: chart.skipped,
            ticks: chart.ticks,
            svg: &svg,
            legend: &legend,
            bubbles_json: &bubbles_json,
            frames_json: &frames_json,
            animate: self.animate,
            size_label: &size_label,
        };
        Ok(template.render()?)
    }
}

impl Writer for HtmlWriter {
    fn write(&self, chart: &Chart, output_dir: &Path) -> ChartResult<PathBuf> {
        fs::create_dir_all(output_dir)?;

        let html = self.render(chart)?;
        let output_path = output_dir.join(self.file_name());
        fs::write(&output_path, html)
            .map_err(|e| ChartError::Write(format!("{}: {e}", output_path.display())))?;
        Ok(output_path)
    }

    fn format_id(&self) -> &str {
        "html"
    }

    fn file_name(&self) -> &str {
        "index.html"
    }
}
