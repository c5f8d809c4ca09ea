use strum::VariantArray;

use crate::graph::{EdgeTable, Graph};

/// The six neighbor directions of the flattened hex lattice the spiral grows
/// on. Offsets use the original lattice scale (1.5 horizontal pitch, 1.3
/// vertical half-pitch), so "unit distance" on this lattice is 1.5.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, VariantArray)]
pub enum HexDir {
    /// +a
    Right,
    /// +a/2, +b
    UpRight,
    /// −a/2, +b
    UpLeft,
    /// −a
    Left,
    /// −a/2, −b
    DownLeft,
    /// +a/2, −b
    DownRight,
}

impl HexDir {
    fn offset(&self) -> [f64; 2] {
        match self {
            Self::Right => [1.5, 0.0],
            Self::UpRight => [0.75, 1.3],
            Self::UpLeft => [-0.75, 1.3],
            Self::Left => [-1.5, 0.0],
            Self::DownLeft => [-0.75, -1.3],
            Self::DownRight => [0.75, -1.3],
        }
    }

    fn step(&self, from: [f64; 2]) -> [f64; 2] {
        let [dx, dy] = self.offset();
        [from[0] + dx, from[1] + dy]
    }
}

/// position equality slack on the flattened lattice
const POS_TOL: f64 = 0.1;

fn close(a: [f64; 2], b: [f64; 2]) -> bool {
    (a[0] - b[0]).abs() < POS_TOL && (a[1] - b[1]).abs() < POS_TOL
}

/// The deterministic penny spiral S_n: an embedded hex-lattice graph whose
/// edges are all lattice-adjacent placed pairs.
pub struct Spiral {
    positions: Vec<[f64; 2]>,
    edges: Vec<(usize, usize)>,
}

impl Spiral {
    /// Number of placed nodes.
    pub fn n(&self) -> usize {
        self.positions.len()
    }

    /// Lattice positions, indexed by node.
    pub fn positions(&self) -> &[[f64; 2]] {
        &self.positions
    }

    /// Edges as `(i, j)` with `i < j`.
    pub fn edges(&self) -> &[(usize, usize)] {
        &self.edges
    }

    /// The spiral as a [`Graph`] against a matching table.
    pub fn graph(&self, table: &EdgeTable) -> Graph {
        assert_eq!(table.n(), self.n(), "spiral order does not match table");
        Graph::from_edges(table, self.edges.iter().copied())
    }
}

/// Build S_n. Node 0 sits at the origin; each later node takes the free hex
/// neighbor of the previously placed node that maximizes contacts with the
/// placed set, breaking ties toward the origin.
pub fn build_spiral(n: usize) -> Spiral {
    let mut positions: Vec<[f64; 2]> = Vec::with_capacity(n);
    let mut edges = Vec::with_capacity(n * 3);
    if n == 0 {
        return Spiral { positions, edges };
    }
    positions.push([0.0, 0.0]);

    for node in 1..n {
        let prev = positions[node - 1];

        let mut best: Option<([f64; 2], usize, f64)> = None;
        for dir in HexDir::VARIANTS {
            let cand = dir.step(prev);
            if positions.iter().any(|&p| close(cand, p)) {
                continue;
            }

            let contacts = positions
                .iter()
                .filter(|&&p| HexDir::VARIANTS.iter().any(|d| close(cand, d.step(p))))
                .count();
            let dist2 = cand[0] * cand[0] + cand[1] * cand[1];

            let better = match best {
                None => true,
                Some((_, c, d)) => contacts > c || (contacts == c && dist2 < d),
            };
            if better {
                best = Some((cand, contacts, dist2));
            }
        }

        let (pos, _, _) = best.expect("the previous spiral node always has a free neighbor");
        for (i, &p) in positions.iter().enumerate() {
            if HexDir::VARIANTS.iter().any(|d| close(pos, d.step(p))) {
                edges.push((i, node));
            }
        }
        positions.push(pos);
    }

    Spiral { positions, edges }
}

/// Whether `n` is centered hexagonal, `n = 1 + 3k(k + 1)`: exactly the orders
/// whose spiral closes into a regular hexagon with 6-fold symmetry.
pub fn is_centered_hexagonal(n: usize) -> bool {
    let mut k = 0usize;
    loop {
        let h = 1 + 3 * k * (k + 1);
        if h == n {
            return true;
        }
        if h > n {
            return false;
        }
        k += 1;
    }
}

/// One representative slot per symmetry orbit of a centered-hexagonal
/// spiral.
///
/// Orbits of the 6-fold rotation group coincide with distance classes from
/// the center (center, ring interiors, ring corners, ring edge-centers), so
/// slots are clustered by squared distance and the lowest slot of each
/// cluster is kept. Restricting item 0 to these slots breaks the outer
/// rotational symmetry of the search.
pub fn symmetry_seed_slots(spiral: &Spiral) -> Vec<usize> {
    debug_assert!(is_centered_hexagonal(spiral.n()));

    let mut by_dist: Vec<(f64, usize)> = spiral
        .positions()
        .iter()
        .enumerate()
        .map(|(slot, p)| (p[0] * p[0] + p[1] * p[1], slot))
        .collect();
    by_dist.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

    // orbit distances are well separated; within-orbit jitter from the
    // flattened 1.3 lattice stays under 0.1
    let mut seeds = Vec::new();
    let mut last_dist = f64::NEG_INFINITY;
    for (dist2, slot) in by_dist {
        if dist2 - last_dist > 0.5 {
            seeds.push(slot);
        }
        last_dist = dist2;
    }
    seeds.sort_unstable();
    seeds
}
