//! One generation pass: read the input, lay out the chart, write every
//! requested format. Shared by the `generate` command and the dev server.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::chart::Chart;
use crate::config::ChartConfig;
use crate::html_writer::HtmlWriter;
use crate::io::{ChartResult, FormatRegistry};

/// Everything needed to produce a chart from an input file
#[derive(Debug, Clone)]
pub struct Job {
    pub input: PathBuf,
    pub output: PathBuf,
    /// YAML chart config; defaults apply when absent
    pub config: Option<PathBuf>,
    /// Output format ids, e.g. `["html", "svg"]`
    pub formats: Vec<String>,
    /// Overrides the config's seed
    pub seed: Option<u64>,
    /// Replay the layout animation in the HTML page
    pub animate: bool,
}

/// Result of a generation pass
#[derive(Debug, Clone)]
pub struct Outcome {
    pub title: String,
    pub bubbles: usize,
    pub skipped: usize,
    pub ticks: usize,
    pub files: Vec<PathBuf>,
}

impl Job {
    pub fn new(input: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
            config: None,
            formats: vec!["html".to_string()],
            seed: None,
            animate: true,
        }
    }

    /// Load the config file (if any) and apply command-line overrides
    pub fn load_config(&self) -> ChartResult<ChartConfig> {
        let mut config = match &self.config {
            Some(path) => ChartConfig::load(path)?,
            None => ChartConfig::default(),
        };
        if let Some(seed) = self.seed {
            config.seeding.seed = Some(seed);
        }
        Ok(config)
    }

    /// Files that should trigger a rerun when they change
    pub fn watched_files(&self) -> Vec<&Path> {
        let mut files = vec![self.input.as_path()];
        files.extend(self.config.as_deref());
        files
    }

    pub fn run(&self) -> ChartResult<Outcome> {
        let mut registry = FormatRegistry::with_defaults();
        if !self.animate {
            registry.register_writer(Box::new(HtmlWriter::with_options(false)));
        }
        // Resolve writers up front so a bad format fails before the layout runs
        let writers = registry.writers_for_formats(&self.formats)?;

        let config = self.load_config()?;
        let reader = registry.reader_for_path(&self.input)?;
        let dataset = reader.read(&self.input)?;
        debug!(
            input = %self.input.display(),
            rows = dataset.len(),
            columns = dataset.columns.len(),
            "read dataset"
        );

        let chart = Chart::build(&dataset, &config)?;

        let files = writers
            .iter()
            .map(|w| w.write(&chart, &self.output))
            .collect::<ChartResult<Vec<_>>>()?;
        info!(output = %self.output.display(), files = files.len(), "wrote chart");

        Ok(Outcome {
            title: chart.title,
            bubbles: chart.bubbles.len(),
            skipped: chart.skipped,
            ticks: chart.ticks,
            files,
        })
    }
}
