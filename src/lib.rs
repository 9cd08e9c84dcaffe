//! bubblechart - lays out tabular data as a force-directed bubble chart.
//!
//! Each row becomes a circle sized by one column and coloured by another.
//! A force simulation packs the circles around the centre of the canvas,
//! and writers render the result as an animated HTML page, SVG or JSON.

pub mod chart;
pub mod config;
pub mod data;
pub mod generate;
pub mod html_writer;
pub mod io;
pub mod json_writer;
pub mod nodes;
pub mod scale;
pub mod simulation;
pub mod svg_writer;
