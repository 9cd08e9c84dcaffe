//! Chart configuration
//!
//! Every tunable of the chart lives here with its default. A YAML file may
//! override any subset of fields; missing fields keep their defaults.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::io::{ChartError, ChartResult};
use crate::scale::CATEGORY10;

/// Complete chart configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartConfig {
    /// Page title
    pub title: String,
    /// Canvas width in pixels
    pub width: f64,
    /// Canvas height in pixels
    pub height: f64,
    pub columns: Columns,
    pub radius: RadiusConfig,
    pub colors: ColorConfig,
    pub forces: ForceConfig,
    pub seeding: SeedingConfig,
    pub animation: AnimationConfig,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            title: "Bubble Chart".to_string(),
            width: 1024.0,
            height: 768.0,
            columns: Columns::default(),
            radius: RadiusConfig::default(),
            colors: ColorConfig::default(),
            forces: ForceConfig::default(),
            seeding: SeedingConfig::default(),
            animation: AnimationConfig::default(),
        }
    }
}

/// Names of the input columns each bubble field is read from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Columns {
    pub id: String,
    /// Numeric column driving the bubble area
    pub size: String,
    pub city: String,
    /// Categorical column driving the fill colour
    pub country: String,
}

impl Default for Columns {
    fn default() -> Self {
        Self {
            id: "id".to_string(),
            size: "flights".to_string(),
            city: "city".to_string(),
            country: "country".to_string(),
        }
    }
}

/// Power scale from size to radius
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RadiusConfig {
    pub exponent: f64,
    pub range_min: f64,
    pub range_max: f64,
    /// Sizes are divided by this before scaling; the domain still ends at the raw maximum
    pub divisor: f64,
}

impl Default for RadiusConfig {
    fn default() -> Self {
        Self {
            exponent: 0.5,
            range_min: 2.0,
            range_max: 85.0,
            divisor: 16.0,
        }
    }
}

/// Categorical colour scale
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorConfig {
    /// Known categories, in palette order
    pub domain: Vec<String>,
    /// `#rrggbb` colours, recycled when categories outnumber them
    pub palette: Vec<String>,
    /// Outline each bubble with a darker shade of its fill
    pub stroke: bool,
    pub stroke_width: f64,
}

impl Default for ColorConfig {
    fn default() -> Self {
        Self {
            domain: [
                "US", "UK", "China", "France", "Spain", "Germany", "Italy", "Others",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            palette: CATEGORY10.iter().map(|s| s.to_string()).collect(),
            stroke: false,
            stroke_width: 2.0,
        }
    }
}

/// Simulation forces and cooling schedule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForceConfig {
    /// Strength of the x/y centering springs, also the charge multiplier
    pub strength: f64,
    pub velocity_decay: f64,
    pub alpha_min: f64,
    /// Defaults to `1 - alpha_min^(1/300)`, i.e. ~300 ticks
    pub alpha_decay: Option<f64>,
    /// Barnes-Hut accuracy for the charge force
    pub theta: f64,
    /// Enables collision resolution with radius `r + padding`
    pub collision_padding: Option<f64>,
    /// Enables the centroid-translating center force
    pub center: bool,
}

impl Default for ForceConfig {
    fn default() -> Self {
        Self {
            strength: 0.03,
            velocity_decay: 0.2,
            alpha_min: 0.001,
            alpha_decay: None,
            theta: 0.9,
            collision_padding: None,
            center: false,
        }
    }
}

impl ForceConfig {
    pub fn alpha_decay(&self) -> f64 {
        self.alpha_decay
            .unwrap_or_else(|| 1.0 - self.alpha_min.powf(1.0 / 300.0))
    }
}

/// Random initial placement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeedingConfig {
    pub spread_x: f64,
    pub spread_y: f64,
    /// Fixed RNG seed for reproducible layouts
    pub seed: Option<u64>,
}

impl Default for SeedingConfig {
    fn default() -> Self {
        Self {
            spread_x: 900.0,
            spread_y: 800.0,
            seed: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationConfig {
    /// Record positions every Nth tick
    pub frame_interval: usize,
    /// Upper bound on ticks per layout
    pub max_ticks: usize,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            frame_interval: 2,
            max_ticks: 1000,
        }
    }
}

impl ChartConfig {
    /// Load configuration from a YAML file
    pub fn load(path: &Path) -> ChartResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    /// Parse configuration from YAML text and validate it
    pub fn from_yaml(contents: &str) -> ChartResult<Self> {
        let config: Self = serde_yaml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Point the centering forces pull toward
    pub fn centre(&self) -> (f64, f64) {
        (self.width / 2.0, self.height / 2.0)
    }

    pub fn validate(&self) -> ChartResult<()> {
        if !(self.width > 0.0 && self.height > 0.0) {
            return Err(ChartError::Config(format!(
                "width and height must be positive, got {}x{}",
                self.width, self.height
            )));
        }
        if self.colors.palette.is_empty() {
            return Err(ChartError::Config("colour palette is empty".to_string()));
        }
        if self.radius.divisor == 0.0 {
            return Err(ChartError::Config("radius divisor must be non-zero".to_string()));
        }
        if self.animation.frame_interval == 0 {
            return Err(ChartError::Config(
                "frame_interval must be at least 1".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.forces.velocity_decay) {
            return Err(ChartError::Config(format!(
                "velocity_decay must be within [0, 1], got {}",
                self.forces.velocity_decay
            )));
        }
        let forces = &self.forces;
        if !(forces.alpha_min > 0.0 && forces.alpha_min <= 1.0) {
            return Err(ChartError::Config(format!(
                "alpha_min must be within (0, 1], got {}",
                forces.alpha_min
            )));
        }
        if let Some(decay) = forces.alpha_decay {
            if !(0.0..=1.0).contains(&decay) {
                return Err(ChartError::Config(format!(
                    "alpha_decay must be within [0, 1], got {decay}"
                )));
            }
        }
        for (name, value) in [
            ("forces.strength", forces.strength),
            ("forces.theta", forces.theta),
            ("radius.exponent", self.radius.exponent),
        ] {
            if !value.is_finite() {
                return Err(ChartError::Config(format!(
                    "{name} must be a finite number, got {value}"
                )));
            }
        }
        Ok(())
    }
}
