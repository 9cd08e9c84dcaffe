//! JSON Writer
//!
//! Exports the resting layout as data for other tools to draw.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::chart::Chart;
use crate::io::{ChartError, ChartResult, Writer};

#[derive(Debug, Serialize)]
struct BubbleExport<'a> {
    id: &'a str,
    city: &'a str,
    country: &'a str,
    size: f64,
    radius: f64,
    x: f64,
    y: f64,
    fill: String,
    stroke: String,
}

#[derive(Debug, Serialize)]
struct LegendExport<'a> {
    category: &'a str,
    color: String,
    count: usize,
}

#[derive(Debug, Serialize)]
struct ChartExport<'a> {
    title: &'a str,
    width: f64,
    height: f64,
    ticks: usize,
    skipped: usize,
    bubbles: Vec<BubbleExport<'a>>,
    legend: Vec<LegendExport<'a>>,
}

impl<'a> ChartExport<'a> {
    fn from_chart(chart: &'a Chart) -> Self {
        let positions = chart.final_positions();
        let bubbles = chart
            .bubbles
            .iter()
            .zip(positions)
            .map(|(b, [x, y])| BubbleExport {
                id: &b.id,
                city: &b.city,
                country: &b.country,
                size: b.size,
                radius: b.radius,
                x,
                y,
                fill: b.fill.to_hex(),
                stroke: b.stroke.to_hex(),
            })
            .collect();
        let legend = chart
            .legend
            .iter()
            .map(|e| LegendExport {
                category: &e.category,
                color: e.color.to_hex(),
                count: e.count,
            })
            .collect();

        Self {
            title: &chart.title,
            width: chart.width,
            height: chart.height,
            ticks: chart.ticks,
            skipped: chart.skipped,
            bubbles,
            legend,
        }
    }
}

/// Writer for `chart.json`
pub struct JsonWriter {
    pub pretty: bool,
}

impl Default for JsonWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl JsonWriter {
    pub fn new() -> Self {
        Self { pretty: true }
    }

    pub fn render(&self, chart: &Chart) -> ChartResult<String> {
        let export = ChartExport::from_chart(chart);
        let json = if self.pretty {
            serde_json::to_string_pretty(&export)?
        } else {
            serde_json::to_string(&export)?
        };
        Ok(json)
    }
}

impl Writer for JsonWriter {
    fn write(&self, chart: &Chart, output_dir: &Path) -> ChartResult<PathBuf> {
        fs::create_dir_all(output_dir)?;

        let json = self.render(chart)?;
        let output_path = output_dir.join(self.file_name());
        fs::write(&output_path, json)
            .map_err(|e| ChartError::Write(format!("{}: {e}", output_path.display())))?;
        Ok(output_path)
    }

    fn format_id(&self) -> &str {
        "json"
    }

    fn file_name(&self) -> &str {
        "chart.json"
    }
}
