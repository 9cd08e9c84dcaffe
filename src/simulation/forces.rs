//! Forces that act on node velocities each tick
//!
//! Per-node parameters (charge strength, target, collision radius) are read
//! through accessor closures once at initialization, so a force can depend on
//! any node field without knowing the node type.

use rand::Rng;
use rand::rngs::StdRng;

use super::Body;
use super::quadtree::{CellKind, QuadTree};

/// Reads a per-node parameter
pub type Accessor<T> = Box<dyn Fn(&T) -> f64>;

/// Accessor returning the same value for every node
pub fn constant<T>(value: f64) -> Accessor<T> {
    Box::new(move |_| value)
}

/// A force nudges node velocities once per tick
pub trait Force<T> {
    /// Called when the force is registered and whenever the node set changes
    fn initialize(&mut self, nodes: &[T]);

    /// Apply the force at the current `alpha`
    fn apply(&mut self, nodes: &mut [T], alpha: f64, rng: &mut StdRng);
}

/// Tiny random offset used to separate nodes with identical coordinates
fn jiggle(rng: &mut StdRng) -> f64 {
    (rng.r#gen::<f64>() - 0.5) * 1e-6
}

fn positions<T: Body>(nodes: &[T]) -> Vec<(f64, f64)> {
    nodes
        .iter()
        .map(|n| {
            let p = n.particle();
            (p.x, p.y)
        })
        .collect()
}

/// N-body charge between every pair of nodes, approximated with Barnes-Hut.
///
/// Negative strengths repel, positive strengths attract. The force between
/// two nodes falls off with distance; distances below `distance_min` are
/// softened and pairs beyond `distance_max` are ignored.
pub struct ManyBody<T> {
    strength: Accessor<T>,
    strengths: Vec<f64>,
    theta2: f64,
    distance_min2: f64,
    distance_max2: f64,
}

impl<T: Body> Default for ManyBody<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Body> ManyBody<T> {
    pub fn new() -> Self {
        Self {
            strength: constant(-30.0),
            strengths: Vec::new(),
            theta2: 0.81,
            distance_min2: 1.0,
            distance_max2: f64::INFINITY,
        }
    }

    pub fn with_strength(mut self, strength: Accessor<T>) -> Self {
        self.strength = strength;
        self
    }

    /// Barnes-Hut accuracy; 0 computes every pair exactly
    pub fn with_theta(mut self, theta: f64) -> Self {
        self.theta2 = theta * theta;
        self
    }

    pub fn with_distance_min(mut self, distance: f64) -> Self {
        self.distance_min2 = distance * distance;
        self
    }

    pub fn with_distance_max(mut self, distance: f64) -> Self {
        self.distance_max2 = distance * distance;
        self
    }

    /// Per-cell total strength and |strength|-weighted centre
    fn accumulate(&self, tree: &QuadTree) -> (Vec<f64>, Vec<(f64, f64)>) {
        let mut value = vec![0.0_f64; tree.len()];
        let mut centre = vec![(0.0, 0.0); tree.len()];

        for id in tree.post_order() {
            match &tree.cell(id).kind {
                CellKind::Internal(children) => {
                    let (mut strength, mut weight, mut x, mut y) = (0.0, 0.0, 0.0, 0.0);
                    for &child in children.iter().flatten() {
                        let c = value[child].abs();
                        if c != 0.0 {
                            strength += value[child];
                            weight += c;
                            x += c * centre[child].0;
                            y += c * centre[child].1;
                        }
                    }
                    value[id] = strength;
                    centre[id] = (x / weight, y / weight);
                }
                CellKind::Leaf { x, y, points } => {
                    value[id] = points.iter().map(|&i| self.strengths[i]).sum();
                    centre[id] = (*x, *y);
                }
            }
        }
        (value, centre)
    }
}

impl<T: Body> Force<T> for ManyBody<T> {
    fn initialize(&mut self, nodes: &[T]) {
        self.strengths = nodes.iter().map(|n| (self.strength)(n)).collect();
    }

    fn apply(&mut self, nodes: &mut [T], alpha: f64, rng: &mut StdRng) {
        let points = positions(nodes);
        let tree = QuadTree::build(&points);
        let (value, centre) = self.accumulate(&tree);

        for (i, node) in nodes.iter_mut().enumerate() {
            let (xi, yi) = points[i];
            let (mut vx, mut vy) = (0.0, 0.0);

            tree.visit(|id, cell| {
                if value[id] == 0.0 {
                    return true;
                }

                let mut dx = centre[id].0 - xi;
                let mut dy = centre[id].1 - yi;
                let w = cell.width();
                let mut l = dx * dx + dy * dy;

                // Far enough away: treat the whole cell as one body
                if w * w / self.theta2 < l {
                    if l < self.distance_max2 {
                        if dx == 0.0 {
                            dx = jiggle(rng);
                            l += dx * dx;
                        }
                        if dy == 0.0 {
                            dy = jiggle(rng);
                            l += dy * dy;
                        }
                        if l < self.distance_min2 {
                            l = (self.distance_min2 * l).sqrt();
                        }
                        vx += dx * value[id] * alpha / l;
                        vy += dy * value[id] * alpha / l;
                    }
                    return true;
                }

                let CellKind::Leaf { points: members, .. } = &cell.kind else {
                    return false;
                };
                if l >= self.distance_max2 {
                    return true;
                }

                if members.len() > 1 || members[0] != i {
                    if dx == 0.0 {
                        dx = jiggle(rng);
                        l += dx * dx;
                    }
                    if dy == 0.0 {
                        dy = jiggle(rng);
                        l += dy * dy;
                    }
                    if l < self.distance_min2 {
                        l = (self.distance_min2 * l).sqrt();
                    }
                }

                for &j in members {
                    if j != i {
                        let w = self.strengths[j] * alpha / l;
                        vx += dx * w;
                        vy += dy * w;
                    }
                }
                true
            });

            let p = node.particle_mut();
            p.vx += vx;
            p.vy += vy;
        }
    }
}

/// Spring pulling each node's x toward a target x
pub struct PositionX<T> {
    target: Accessor<T>,
    strength: Accessor<T>,
    targets: Vec<f64>,
    strengths: Vec<f64>,
}

impl<T: Body> PositionX<T> {
    pub fn new(target: Accessor<T>) -> Self {
        Self {
            target,
            strength: constant(0.1),
            targets: Vec::new(),
            strengths: Vec::new(),
        }
    }

    pub fn with_strength(mut self, strength: Accessor<T>) -> Self {
        self.strength = strength;
        self
    }
}

impl<T: Body> Force<T> for PositionX<T> {
    fn initialize(&mut self, nodes: &[T]) {
        (self.targets, self.strengths) = position_params(nodes, &self.target, &self.strength);
    }

    fn apply(&mut self, nodes: &mut [T], alpha: f64, _rng: &mut StdRng) {
        for ((node, &target), &strength) in nodes.iter_mut().zip(&self.targets).zip(&self.strengths)
        {
            if target.is_nan() {
                continue;
            }
            let p = node.particle_mut();
            p.vx += (target - p.x) * strength * alpha;
        }
    }
}

/// Spring pulling each node's y toward a target y
pub struct PositionY<T> {
    target: Accessor<T>,
    strength: Accessor<T>,
    targets: Vec<f64>,
    strengths: Vec<f64>,
}

impl<T: Body> PositionY<T> {
    pub fn new(target: Accessor<T>) -> Self {
        Self {
            target,
            strength: constant(0.1),
            targets: Vec::new(),
            strengths: Vec::new(),
        }
    }

    pub fn with_strength(mut self, strength: Accessor<T>) -> Self {
        self.strength = strength;
        self
    }
}

impl<T: Body> Force<T> for PositionY<T> {
    fn initialize(&mut self, nodes: &[T]) {
        (self.targets, self.strengths) = position_params(nodes, &self.target, &self.strength);
    }

    fn apply(&mut self, nodes: &mut [T], alpha: f64, _rng: &mut StdRng) {
        for ((node, &target), &strength) in nodes.iter_mut().zip(&self.targets).zip(&self.strengths)
        {
            if target.is_nan() {
                continue;
            }
            let p = node.particle_mut();
            p.vy += (target - p.y) * strength * alpha;
        }
    }
}

/// Targets and strengths; a NaN target disables the spring for that node
/// (strength 0, and `apply` skips it)
fn position_params<T>(
    nodes: &[T],
    target: &Accessor<T>,
    strength: &Accessor<T>,
) -> (Vec<f64>, Vec<f64>) {
    nodes
        .iter()
        .map(|n| {
            let t = target(n);
            let s = if t.is_nan() { 0.0 } else { strength(n) };
            (t, s)
        })
        .unzip()
}

/// Pushes overlapping circles apart.
///
/// Uses predicted positions (position plus velocity) and splits the
/// correction between the two nodes in proportion to the other's area.
pub struct Collide<T> {
    radius: Accessor<T>,
    radii: Vec<f64>,
    strength: f64,
    iterations: usize,
}

impl<T: Body> Collide<T> {
    pub fn new(radius: Accessor<T>) -> Self {
        Self {
            radius,
            radii: Vec::new(),
            strength: 1.0,
            iterations: 1,
        }
    }

    /// Fraction of the overlap resolved per iteration, in [0, 1]
    pub fn with_strength(mut self, strength: f64) -> Self {
        self.strength = strength;
        self
    }

    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations.max(1);
        self
    }
}

impl<T: Body> Force<T> for Collide<T> {
    fn initialize(&mut self, nodes: &[T]) {
        self.radii = nodes.iter().map(|n| (self.radius)(n)).collect();
    }

    fn apply(&mut self, nodes: &mut [T], _alpha: f64, rng: &mut StdRng) {
        let current = positions(nodes);
        let mut velocity: Vec<(f64, f64)> = nodes
            .iter()
            .map(|n| (n.particle().vx, n.particle().vy))
            .collect();

        for _ in 0..self.iterations {
            let predicted: Vec<(f64, f64)> = current
                .iter()
                .zip(&velocity)
                .map(|(&(x, y), &(vx, vy))| (x + vx, y + vy))
                .collect();
            let tree = QuadTree::build(&predicted);

            // Largest radius below each cell, for pruning
            let mut max_radius = vec![0.0_f64; tree.len()];
            for id in tree.post_order() {
                max_radius[id] = match &tree.cell(id).kind {
                    CellKind::Internal(children) => children
                        .iter()
                        .flatten()
                        .map(|&c| max_radius[c])
                        .fold(0.0, f64::max),
                    CellKind::Leaf { points, .. } => points
                        .iter()
                        .map(|&j| self.radii[j])
                        .fold(0.0, f64::max),
                };
            }

            for i in 0..nodes.len() {
                let ri = self.radii[i];
                let ri2 = ri * ri;
                let xi = current[i].0 + velocity[i].0;
                let yi = current[i].1 + velocity[i].1;

                tree.visit(|id, cell| {
                    let CellKind::Leaf { points, .. } = &cell.kind else {
                        let r = ri + max_radius[id];
                        return cell.x0 > xi + r
                            || cell.x1 < xi - r
                            || cell.y0 > yi + r
                            || cell.y1 < yi - r;
                    };

                    // Each pair is resolved once, from the lower index
                    for &j in points.iter().filter(|&&j| j > i) {
                        let rj = self.radii[j];
                        let r = ri + rj;
                        let mut dx = xi - current[j].0 - velocity[j].0;
                        let mut dy = yi - current[j].1 - velocity[j].1;
                        let mut l = dx * dx + dy * dy;
                        if l >= r * r {
                            continue;
                        }
                        if dx == 0.0 {
                            dx = jiggle(rng);
                            l += dx * dx;
                        }
                        if dy == 0.0 {
                            dy = jiggle(rng);
                            l += dy * dy;
                        }
                        let dist = l.sqrt();
                        let k = (r - dist) / dist * self.strength;
                        dx *= k;
                        dy *= k;

                        let rj2 = rj * rj;
                        let share = rj2 / (ri2 + rj2);
                        velocity[i].0 += dx * share;
                        velocity[i].1 += dy * share;
                        velocity[j].0 -= dx * (1.0 - share);
                        velocity[j].1 -= dy * (1.0 - share);
                    }
                    true
                });
            }
        }

        for (node, (vx, vy)) in nodes.iter_mut().zip(velocity) {
            let p = node.particle_mut();
            p.vx = vx;
            p.vy = vy;
        }
    }
}

/// Translates all nodes so their centroid moves toward a fixed point.
///
/// Does not touch velocities, so it never fights the other forces.
pub struct Center {
    x: f64,
    y: f64,
    strength: f64,
}

impl Center {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y, strength: 1.0 }
    }

    pub fn with_strength(mut self, strength: f64) -> Self {
        self.strength = strength;
        self
    }
}

impl<T: Body> Force<T> for Center {
    fn initialize(&mut self, _nodes: &[T]) {}

    fn apply(&mut self, nodes: &mut [T], _alpha: f64, _rng: &mut StdRng) {
        if nodes.is_empty() {
            return;
        }
        let n = nodes.len() as f64;
        let (sx, sy) = nodes.iter().fold((0.0, 0.0), |(sx, sy), node| {
            let p = node.particle();
            (sx + p.x, sy + p.y)
        });
        let shift_x = (sx / n - self.x) * self.strength;
        let shift_y = (sy / n - self.y) * self.strength;

        for node in nodes.iter_mut() {
            let p = node.particle_mut();
            p.x -= shift_x;
            p.y -= shift_y;
        }
    }
}
