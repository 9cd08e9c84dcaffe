//! Reader/Writer traits and format dispatch
//!
//! Readers turn an input file into a [`Dataset`]; writers turn a laid-out
//! [`Chart`] into files in an output directory. The [`FormatRegistry`] picks
//! a reader by file extension and writers by format id.

use std::path::Path;

use thiserror::Error;

use crate::chart::Chart;
use crate::data::{CsvReader, Dataset, JsonReader};
use crate::html_writer::HtmlWriter;
use crate::json_writer::JsonWriter;
use crate::svg_writer::SvgWriter;

/// Errors that can occur while reading data, laying out or writing a chart
#[derive(Error, Debug)]
pub enum ChartError {
    /// The file format is not supported
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    /// The file extension could not be determined
    #[error("could not determine file format from path: {0}")]
    UnknownExtension(String),

    /// An I/O error occurred
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The CSV input could not be read
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON input or output failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The YAML config could not be parsed
    #[error("config error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A parsing error occurred
    #[error("parse error: {0}")]
    Parse(String),

    /// The configuration is inconsistent
    #[error("invalid config: {0}")]
    Config(String),

    /// A rendering/writing error occurred
    #[error("write error: {0}")]
    Write(String),

    /// Template rendering failed
    #[error("template error: {0}")]
    Template(#[from] askama::Error),
}

/// Result type for chart operations
pub type ChartResult<T> = Result<T, ChartError>;

/// A reader parses an input file into a [`Dataset`]
pub trait Reader {
    /// Parse the input file
    fn read(&self, input: &Path) -> ChartResult<Dataset>;

    /// File extensions this reader can handle (e.g., ["csv"])
    fn supported_extensions(&self) -> &[&str];

    /// Check if this reader can handle the given file extension
    fn supports_extension(&self, ext: &str) -> bool {
        self.supported_extensions()
            .iter()
            .any(|e| e.eq_ignore_ascii_case(ext))
    }
}

/// A writer outputs a laid-out chart in a specific format
pub trait Writer {
    /// Write the chart into `output_dir`, returning the path of the file written
    fn write(&self, chart: &Chart, output_dir: &Path) -> ChartResult<std::path::PathBuf>;

    /// Identifier for this output format (e.g., "html", "svg")
    fn format_id(&self) -> &str;

    /// File name the writer produces inside the output directory
    fn file_name(&self) -> &str;
}

/// Registry of available readers and writers
pub struct FormatRegistry {
    readers: Vec<Box<dyn Reader>>,
    writers: Vec<Box<dyn Writer>>,
}

impl Default for FormatRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl FormatRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            readers: Vec::new(),
            writers: Vec::new(),
        }
    }

    /// Create a registry with all default readers and writers registered
    ///
    /// Currently registers:
    /// - Readers: `CsvReader` (csv), `JsonReader` (json)
    /// - Writers: `HtmlWriter` (html), `SvgWriter` (svg), `JsonWriter` (json)
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register_reader(Box::new(CsvReader::new()));
        registry.register_reader(Box::new(JsonReader::new()));
        registry.register_writer(Box::new(HtmlWriter::new()));
        registry.register_writer(Box::new(SvgWriter::new()));
        registry.register_writer(Box::new(JsonWriter::new()));
        registry
    }

    /// Register a reader
    pub fn register_reader(&mut self, reader: Box<dyn Reader>) {
        self.readers.push(reader);
    }

    /// Register a writer, replacing any writer with the same format ID
    pub fn register_writer(&mut self, writer: Box<dyn Writer>) {
        self.writers
            .retain(|w| !w.format_id().eq_ignore_ascii_case(writer.format_id()));
        self.writers.push(writer);
    }

    /// Find a reader for the given file extension
    pub fn reader_for_extension(&self, ext: &str) -> Option<&dyn Reader> {
        self.readers
            .iter()
            .find(|r| r.supports_extension(ext))
            .map(|r| r.as_ref())
    }

    /// Find a writer by format ID
    pub fn writer_for_format(&self, format_id: &str) -> Option<&dyn Writer> {
        self.writers
            .iter()
            .find(|w| w.format_id().eq_ignore_ascii_case(format_id))
            .map(|w| w.as_ref())
    }

    /// Get file extension from a path
    pub fn extension_from_path(path: &Path) -> ChartResult<&str> {
        path.extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| ChartError::UnknownExtension(path.display().to_string()))
    }

    /// Find a reader for the given path based on its extension
    pub fn reader_for_path(&self, path: &Path) -> ChartResult<&dyn Reader> {
        let ext = Self::extension_from_path(path)?;
        self.reader_for_extension(ext)
            .ok_or_else(|| ChartError::UnsupportedFormat(ext.to_string()))
    }

    /// Resolve a list of format ids to writers, failing on the first unknown id
    pub fn writers_for_formats(&self, formats: &[String]) -> ChartResult<Vec<&dyn Writer>> {
        formats
            .iter()
            .map(|f| {
                self.writer_for_format(f)
                    .ok_or_else(|| ChartError::UnsupportedFormat(f.clone()))
            })
            .collect()
    }
}
