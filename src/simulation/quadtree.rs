//! Arena quadtree over point coordinates
//!
//! Built fresh every tick by the forces that need spatial pruning. Cells are
//! stored in a flat `Vec` and reference each other by index; leaves hold
//! the indices of the points that fell into them.

/// Splitting stops at this depth; points still sharing a cell stay in one leaf
const MAX_DEPTH: usize = 48;

/// Contents of a cell
#[derive(Debug, Clone, PartialEq)]
pub enum CellKind {
    /// Children in quadrant order: top-left, top-right, bottom-left, bottom-right
    Internal([Option<usize>; 4]),
    /// Point indices located at (`x`, `y`), the position of the first point
    Leaf { x: f64, y: f64, points: Vec<usize> },
}

/// A square region of the tree
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
    pub kind: CellKind,
}

impl Cell {
    fn new(bounds: [f64; 4], kind: CellKind) -> Self {
        let [x0, y0, x1, y1] = bounds;
        Self { x0, y0, x1, y1, kind }
    }

    /// Side length of the cell
    pub fn width(&self) -> f64 {
        self.x1 - self.x0
    }

    /// Quadrant index of (`x`, `y`) and that quadrant's bounds
    fn quadrant(&self, x: f64, y: f64) -> (usize, [f64; 4]) {
        let xm = (self.x0 + self.x1) / 2.0;
        let ym = (self.y0 + self.y1) / 2.0;
        let right = x >= xm;
        let bottom = y >= ym;

        let (x0, x1) = if right { (xm, self.x1) } else { (self.x0, xm) };
        let (y0, y1) = if bottom { (ym, self.y1) } else { (self.y0, ym) };

        ((bottom as usize) << 1 | right as usize, [x0, y0, x1, y1])
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self.kind, CellKind::Leaf { .. })
    }
}

enum Step {
    Descend(usize),
    Attach(usize, [f64; 4]),
    Append,
    Split(f64, f64),
}

#[derive(Debug, Clone, Default)]
pub struct QuadTree {
    cells: Vec<Cell>,
}

impl QuadTree {
    /// Build a tree over `points`; indices into `points` are stored in the leaves.
    ///
    /// Points with a non-finite coordinate are left out.
    pub fn build(points: &[(f64, f64)]) -> Self {
        let mut tree = Self::default();

        let finite: Vec<usize> = (0..points.len())
            .filter(|&i| points[i].0.is_finite() && points[i].1.is_finite())
            .collect();
        let Some(&first) = finite.first() else {
            return tree;
        };

        let (mut x0, mut y0) = points[first];
        let (mut x1, mut y1) = (x0, y0);
        for &i in &finite {
            let (x, y) = points[i];
            x0 = x0.min(x);
            y0 = y0.min(y);
            x1 = x1.max(x);
            y1 = y1.max(y);
        }

        // Square extent so cells stay square all the way down
        let mut side = (x1 - x0).max(y1 - y0);
        if side <= 0.0 {
            side = 1.0;
        }

        let (fx, fy) = points[first];
        tree.cells.push(Cell::new(
            [x0, y0, x0 + side, y0 + side],
            CellKind::Leaf {
                x: fx,
                y: fy,
                points: vec![first],
            },
        ));

        for &i in &finite[1..] {
            let (x, y) = points[i];
            tree.insert(i, x, y);
        }
        tree
    }

    fn insert(&mut self, index: usize, x: f64, y: f64) {
        let mut id = 0;
        let mut depth = 0;

        loop {
            let cell = &self.cells[id];
            let step = match &cell.kind {
                CellKind::Internal(children) => {
                    let (q, bounds) = cell.quadrant(x, y);
                    match children[q] {
                        Some(child) => Step::Descend(child),
                        None => Step::Attach(q, bounds),
                    }
                }
                CellKind::Leaf { x: lx, y: ly, .. } => {
                    if (*lx == x && *ly == y) || depth >= MAX_DEPTH {
                        Step::Append
                    } else {
                        Step::Split(*lx, *ly)
                    }
                }
            };

            match step {
                Step::Descend(child) => {
                    id = child;
                    depth += 1;
                }
                Step::Attach(q, bounds) => {
                    let child = self.push(Cell::new(
                        bounds,
                        CellKind::Leaf {
                            x,
                            y,
                            points: vec![index],
                        },
                    ));
                    if let CellKind::Internal(children) = &mut self.cells[id].kind {
                        children[q] = Some(child);
                    }
                    return;
                }
                Step::Append => {
                    if let CellKind::Leaf { points, .. } = &mut self.cells[id].kind {
                        points.push(index);
                    }
                    return;
                }
                Step::Split(lx, ly) => {
                    // Push the existing leaf one level down, then retry here
                    let (q, bounds) = self.cells[id].quadrant(lx, ly);
                    let old = std::mem::replace(
                        &mut self.cells[id].kind,
                        CellKind::Internal([None; 4]),
                    );
                    let child = self.push(Cell::new(bounds, old));
                    if let CellKind::Internal(children) = &mut self.cells[id].kind {
                        children[q] = Some(child);
                    }
                }
            }
        }
    }

    fn push(&mut self, cell: Cell) -> usize {
        self.cells.push(cell);
        self.cells.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Number of cells (internal and leaf)
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn root(&self) -> Option<usize> {
        if self.cells.is_empty() { None } else { Some(0) }
    }

    pub fn cell(&self, id: usize) -> &Cell {
        &self.cells[id]
    }

    /// Cell ids with every child before its parent
    pub fn post_order(&self) -> Vec<usize> {
        let mut order = Vec::with_capacity(self.cells.len());
        let Some(root) = self.root() else {
            return order;
        };

        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            order.push(id);
            if let CellKind::Internal(children) = &self.cells[id].kind {
                stack.extend(children.iter().flatten());
            }
        }
        order.reverse();
        order
    }

    /// Pre-order traversal; returning `true` from `f` skips that cell's children
    pub fn visit<F>(&self, mut f: F)
    where
        F: FnMut(usize, &Cell) -> bool,
    {
        let Some(root) = self.root() else {
            return;
        };

        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            let cell = &self.cells[id];
            if f(id, cell) {
                continue;
            }
            if let CellKind::Internal(children) = &cell.kind {
                stack.extend(children.iter().rev().flatten());
            }
        }
    }
}
