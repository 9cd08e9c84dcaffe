//! Chart assembly: map the dataset to bubbles, configure the force
//! simulation, run it to rest and record animation frames along the way.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::info;

use crate::config::ChartConfig;
use crate::data::Dataset;
use crate::io::ChartResult;
use crate::nodes::{Bubble, LegendEntry, create_bubbles};
use crate::simulation::{Center, Collide, ManyBody, PositionX, PositionY, Simulation, constant};

/// Bubble centres for one recorded tick, in bubble order
pub type Frame = Vec<[f64; 2]>;

/// A laid-out chart, ready for the writers
#[derive(Debug, Clone)]
pub struct Chart {
    pub title: String,
    pub width: f64,
    pub height: f64,
    /// Bubbles at their resting positions, largest first
    pub bubbles: Vec<Bubble>,
    pub legend: Vec<LegendEntry>,
    /// Starting positions first, resting positions last
    pub frames: Vec<Frame>,
    /// Simulation steps run
    pub ticks: usize,
    /// Rows dropped while mapping
    pub skipped: usize,
    /// Outline width when outlines are enabled
    pub stroke_width: Option<f64>,
    /// Name of the column bubble sizes came from
    pub size_label: String,
}

fn snapshot(bubbles: &[Bubble]) -> Frame {
    let round = |v: f64| (v * 100.0).round() / 100.0;
    bubbles
        .iter()
        .map(|b| [round(b.particle.x), round(b.particle.y)])
        .collect()
}

/// Charge proportional to area pushes big bubbles apart harder; two springs
/// pull everything toward the centre of the canvas.
pub fn configure_simulation(bubbles: Vec<Bubble>, config: &ChartConfig) -> Simulation<Bubble> {
    let forces = &config.forces;
    let strength = forces.strength;
    let (cx, cy) = config.centre();

    let charge = ManyBody::new()
        .with_strength(Box::new(move |b: &Bubble| -b.radius.powi(2) * strength))
        .with_theta(forces.theta);

    let mut simulation = Simulation::new(bubbles)
        .with_velocity_decay(forces.velocity_decay)
        .with_alpha_min(forces.alpha_min)
        .with_alpha_decay(forces.alpha_decay())
        .with_force("charge", charge)
        .with_force(
            "x",
            PositionX::new(constant(cx)).with_strength(constant(strength)),
        )
        .with_force(
            "y",
            PositionY::new(constant(cy)).with_strength(constant(strength)),
        );

    if let Some(padding) = forces.collision_padding {
        simulation = simulation.with_force(
            "collision",
            Collide::new(Box::new(move |b: &Bubble| b.radius + padding)),
        );
    }
    if forces.center {
        simulation = simulation.with_force("center", Center::new(cx, cy));
    }
    simulation
}

impl Chart {
    /// Lay out `dataset` according to `config`
    pub fn build(dataset: &Dataset, config: &ChartConfig) -> ChartResult<Self> {
        config.validate()?;

        let mut rng = match config.seeding.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let mapping = create_bubbles(dataset, config, &mut rng)?;

        let mut frames = vec![snapshot(&mapping.bubbles)];
        let mut simulation =
            configure_simulation(mapping.bubbles, config).with_seed(rng.r#gen());

        let interval = config.animation.frame_interval;
        let ticks = simulation.run(config.animation.max_ticks, |step, nodes| {
            if (step + 1) % interval == 0 {
                frames.push(snapshot(nodes));
            }
        });
        if ticks % interval != 0 {
            frames.push(snapshot(simulation.nodes()));
        }

        let bubbles = simulation.into_nodes();
        info!(
            bubbles = bubbles.len(),
            ticks,
            frames = frames.len(),
            skipped = mapping.skipped,
            "laid out chart"
        );

        Ok(Self {
            title: config.title.clone(),
            width: config.width,
            height: config.height,
            bubbles,
            legend: mapping.legend,
            frames,
            ticks,
            skipped: mapping.skipped,
            stroke_width: config
                .colors
                .stroke
                .then_some(config.colors.stroke_width),
            size_label: config.columns.size.clone(),
        })
    }

    /// Resting position of every bubble, in bubble order
    pub fn final_positions(&self) -> Frame {
        snapshot(&self.bubbles)
    }
}
