//! CPU force simulation
//!
//! Semi-implicit Euler integration with a cooling `alpha`, the same model
//! browser force-layout engines use: each tick cools alpha toward its target,
//! lets every registered force nudge node velocities, then damps velocities
//! and moves the nodes by the damped velocity. The simulation is headless; [`Simulation::run`] drives
//! the tick loop and hands every step to a callback for rendering.

pub mod forces;
pub mod quadtree;

use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, trace};

pub use forces::{Accessor, Center, Collide, Force, ManyBody, PositionX, PositionY, constant};

/// Physics state of one node
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Particle {
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
    /// Pinned x; the node is held here and its x velocity zeroed every tick
    pub fx: Option<f64>,
    /// Pinned y
    pub fy: Option<f64>,
}

impl Particle {
    pub fn at(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            ..Self::default()
        }
    }
}

/// Anything the simulation can move
pub trait Body {
    fn particle(&self) -> &Particle;
    fn particle_mut(&mut self) -> &mut Particle;
}

impl Body for Particle {
    fn particle(&self) -> &Particle {
        self
    }

    fn particle_mut(&mut self) -> &mut Particle {
        self
    }
}

/// Force simulation over nodes of type `T`
pub struct Simulation<T: Body> {
    nodes: Vec<T>,
    forces: Vec<(String, Box<dyn Force<T>>)>,
    alpha: f64,
    alpha_min: f64,
    alpha_decay: f64,
    alpha_target: f64,
    /// Fraction of velocity kept per tick
    velocity_decay: f64,
    rng: StdRng,
    running: bool,
}

impl<T: Body> Simulation<T> {
    /// Create a simulation with default cooling (about 300 ticks) and no forces
    pub fn new(nodes: Vec<T>) -> Self {
        let alpha_min = 0.001;
        Self {
            nodes,
            forces: Vec::new(),
            alpha: 1.0,
            alpha_min,
            alpha_decay: 1.0 - f64::powf(alpha_min, 1.0 / 300.0),
            alpha_target: 0.0,
            velocity_decay: 0.6,
            rng: StdRng::from_entropy(),
            running: true,
        }
    }

    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    pub fn with_alpha_min(mut self, alpha_min: f64) -> Self {
        self.alpha_min = alpha_min;
        self
    }

    pub fn with_alpha_decay(mut self, alpha_decay: f64) -> Self {
        self.alpha_decay = alpha_decay;
        self
    }

    pub fn with_alpha_target(mut self, alpha_target: f64) -> Self {
        self.alpha_target = alpha_target;
        self
    }

    /// Fraction of velocity lost per tick (0.2 keeps 80%)
    pub fn with_velocity_decay(mut self, velocity_decay: f64) -> Self {
        self.velocity_decay = 1.0 - velocity_decay;
        self
    }

    /// Seed the RNG used for jiggling coincident nodes
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Register a force under `name`, replacing any force with the same name
    pub fn with_force(mut self, name: &str, force: impl Force<T> + 'static) -> Self {
        self.set_force(name, Box::new(force));
        self
    }

    pub fn set_force(&mut self, name: &str, mut force: Box<dyn Force<T>>) {
        force.initialize(&self.nodes);
        match self.forces.iter_mut().find(|(n, _)| n == name) {
            Some(slot) => slot.1 = force,
            None => self.forces.push((name.to_string(), force)),
        }
    }

    /// Remove the force registered under `name`, returning whether one existed
    pub fn remove_force(&mut self, name: &str) -> bool {
        let before = self.forces.len();
        self.forces.retain(|(n, _)| n != name);
        self.forces.len() != before
    }

    /// Replace the node set and re-initialize every force
    pub fn set_nodes(&mut self, nodes: Vec<T>) {
        self.nodes = nodes;
        for (_, force) in &mut self.forces {
            force.initialize(&self.nodes);
        }
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn set_alpha(&mut self, alpha: f64) {
        self.alpha = alpha;
    }

    pub fn force_names(&self) -> impl Iterator<Item = &str> {
        self.forces.iter().map(|(n, _)| n.as_str())
    }

    pub fn nodes(&self) -> &[T] {
        &self.nodes
    }

    pub fn nodes_mut(&mut self) -> &mut [T] {
        &mut self.nodes
    }

    pub fn into_nodes(self) -> Vec<T> {
        self.nodes
    }

    /// Halt the tick loop; node state is kept
    pub fn stop(&mut self) {
        self.running = false;
    }

    /// Resume the tick loop without touching alpha
    pub fn restart(&mut self) {
        self.running = true;
    }

    pub fn is_running(&self) -> bool {
        self.running && self.alpha >= self.alpha_min
    }

    /// Advance one step regardless of the running state
    pub fn tick(&mut self) {
        self.alpha += (self.alpha_target - self.alpha) * self.alpha_decay;

        for (_, force) in &mut self.forces {
            force.apply(&mut self.nodes, self.alpha, &mut self.rng);
        }

        for node in &mut self.nodes {
            let p = node.particle_mut();
            match p.fx {
                Some(fx) => {
                    p.x = fx;
                    p.vx = 0.0;
                }
                None => {
                    p.vx *= self.velocity_decay;
                    p.x += p.vx;
                }
            }
            match p.fy {
                Some(fy) => {
                    p.y = fy;
                    p.vy = 0.0;
                }
                None => {
                    p.vy *= self.velocity_decay;
                    p.y += p.vy;
                }
            }
        }
        trace!(alpha = self.alpha, "tick");
    }

    /// Tick until alpha cools below `alpha_min` or `max_ticks` steps have run,
    /// calling `on_tick(step, nodes)` after each step. Returns the step count.
    pub fn run<F>(&mut self, max_ticks: usize, mut on_tick: F) -> usize
    where
        F: FnMut(usize, &[T]),
    {
        let mut ticks = 0;
        while self.running && ticks < max_ticks {
            self.tick();
            on_tick(ticks, &self.nodes);
            ticks += 1;
            if self.alpha < self.alpha_min {
                self.running = false;
            }
        }
        debug!(ticks, alpha = self.alpha, "simulation finished");
        ticks
    }
}
