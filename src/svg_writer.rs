//! SVG Writer
//!
//! Draws each bubble as a `<circle>` with a `<title>` tooltip. The HTML
//! writer reuses [`SvgWriter::render`] for its inline chart.

use std::fs;
use std::path::{Path, PathBuf};

use askama::Template;

use crate::chart::Chart;
use crate::io::{ChartError, ChartResult, Writer};

/// One circle, with every attribute already formatted
#[derive(Debug, Clone)]
pub struct CircleData {
    pub id: String,
    pub cx: String,
    pub cy: String,
    pub r: String,
    pub fill: String,
    pub stroke: String,
    pub title: String,
}

#[derive(Template)]
#[template(path = "chart.svg")]
struct SvgTemplate<'a> {
    width: &'a str,
    height: &'a str,
    circles: &'a [CircleData],
    stroke_width: Option<&'a str>,
}

/// Format a coordinate or length for an SVG attribute
pub(crate) fn fmt_number(v: f64) -> String {
    let s = format!("{v:.2}");
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" { "0".to_string() } else { s.to_string() }
}

/// Format a size value the way a person would read it
pub(crate) fn fmt_size(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{v:.0}")
    } else {
        v.to_string()
    }
}

/// Writer for a standalone SVG of the resting layout
pub struct SvgWriter;

impl Default for SvgWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl SvgWriter {
    pub fn new() -> Self {
        Self
    }

    /// Circle data with bubbles placed at `positions` (bubble order)
    pub fn circles(chart: &Chart, positions: &[[f64; 2]]) -> Vec<CircleData> {
        chart
            .bubbles
            .iter()
            .zip(positions)
            .map(|(b, &[x, y])| CircleData {
                id: b.id.clone(),
                cx: fmt_number(x),
                cy: fmt_number(y),
                r: fmt_number(b.radius),
                fill: b.fill.to_hex(),
                stroke: b.stroke.to_hex(),
                title: format!("{}: {}, {} ({})", b.id, b.city, b.country, fmt_size(b.size)),
            })
            .collect()
    }

    /// Render the chart with bubbles at `positions`
    pub fn render(chart: &Chart, positions: &[[f64; 2]]) -> ChartResult<String> {
        let circles = Self::circles(chart, positions);
        let stroke_width = chart.stroke_width.map(fmt_number);
        let template = SvgTemplate {
            width: &fmt_number(chart.width),
            height: &fmt_number(chart.height),
            circles: &circles,
            stroke_width: stroke_width.as_deref(),
        };
        Ok(template.render()?)
    }
}

impl Writer for SvgWriter {
    fn write(&self, chart: &Chart, output_dir: &Path) -> ChartResult<PathBuf> {
        fs::create_dir_all(output_dir)?;

        let svg = Self::render(chart, &chart.final_positions())?;
        let output_path = output_dir.join(self.file_name());
        fs::write(&output_path, svg)
            .map_err(|e| ChartError::Write(format!("{}: {e}", output_path.display())))?;
        Ok(output_path)
    }

    fn format_id(&self) -> &str {
        "svg"
    }

    fn file_name(&self) -> &str {
        "chart.svg"
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::nodes::{Bubble, LegendEntry};
    use crate::scale::Rgb;
    use crate::simulation::Particle;

    /// Two settled bubbles with hand-picked values
    pub(crate) fn sample_chart() -> Chart {
        let blue = Rgb::parse_hex("#1f77b4").unwrap();
        let orange = Rgb::parse_hex("#ff7f0e").unwrap();
        let bubble = |id: &str, size: f64, radius: f64, city: &str, country: &str, fill: Rgb, x, y| {
            Bubble {
                id: id.to_string(),
                radius,
                size,
                city: city.to_string(),
                country: country.to_string(),
                fill,
                stroke: fill.darker(1.0),
                particle: Particle::at(x, y),
            }
        };

        Chart {
            title: "Airports".to_string(),
            width: 1024.0,
            height: 768.0,
            bubbles: vec![
                bubble("LHR", 1600.0, 22.75, "London", "UK", orange, 500.0, 380.5),
                bubble("JFK", 400.0, 12.375, "New York", "US", blue, 530.25, 390.0),
            ],
            legend: vec![
                LegendEntry {
                    category: "US".to_string(),
                    color: blue,
                    count: 1,
                },
                LegendEntry {
                    category: "UK".to_string(),
                    color: orange,
                    count: 1,
                },
            ],
            frames: vec![
                vec![[10.0, 20.0], [30.0, 40.0]],
                vec![[500.0, 380.5], [530.25, 390.0]],
            ],
            ticks: 2,
            skipped: 0,
            stroke_width: None,
            size_label: "flights".to_string(),
        }
    }

    #[test]
    fn svg_writer_format_id() {
        assert_eq!(SvgWriter::new().format_id(), "svg");
    }

    #[test]
    fn numbers_are_compact() {
        assert_eq!(fmt_number(1024.0), "1024");
        assert_eq!(fmt_number(12.375), "12.38");
        assert_eq!(fmt_number(380.5), "380.5");
        assert_eq!(fmt_number(-0.001), "0");
        assert_eq!(fmt_size(1600.0), "1600");
        assert_eq!(fmt_size(12.5), "12.5");
    }

    #[test]
    fn circles_use_given_positions() {
        let chart = sample_chart();
        let circles = SvgWriter::circles(&chart, &chart.frames[0]);
        assert_eq!(circles.len(), 2);
        assert_eq!((circles[0].cx.as_str(), circles[0].cy.as_str()), ("10", "20"));
        assert_eq!(circles[0].r, "22.75");
        assert_eq!(circles[0].fill, "#ff7f0e");
        assert_eq!(circles[1].title, "JFK: New York, US (400)");
    }

    #[test]
    fn render_draws_every_bubble() {
        let chart = sample_chart();
        let svg = SvgWriter::render(&chart, &chart.final_positions()).unwrap();

        assert!(svg.starts_with("<svg"));
        assert!(svg.contains("viewBox=\"0 0 1024 768\""));
        assert_eq!(svg.matches("<circle").count(), 2);
        assert!(svg.contains("cx=\"530.25\""));
        assert!(svg.contains("data-id=\"LHR\""));
        assert!(!svg.contains("stroke-width"));
    }

    #[test]
    fn render_adds_outline_when_enabled() {
        let mut chart = sample_chart();
        chart.stroke_width = Some(2.0);
        let svg = SvgWriter::render(&chart, &chart.final_positions()).unwrap();
        assert!(svg.contains("stroke=\"#16537e\""));
        assert!(svg.contains("stroke-width=\"2\""));
    }

    #[test]
    fn render_escapes_text() {
        let mut chart = sample_chart();
        chart.bubbles[0].city = "<Lon & don>".to_string();
        let svg = SvgWriter::render(&chart, &chart.final_positions()).unwrap();
        assert!(!svg.contains("<Lon"));
        assert!(!svg.contains("& don"));
        assert!(svg.contains("&#60;Lon &#38; don&#62;"));
    }

    #[test]
    fn write_creates_file() {
        let chart = sample_chart();
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("nested");

        let path = SvgWriter::new().write(&chart, &out).unwrap();
        assert_eq!(path, out.join("chart.svg"));
        let svg = fs::read_to_string(path).unwrap();
        assert!(svg.contains("</svg>"));
    }
}
