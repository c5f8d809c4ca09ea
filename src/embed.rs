use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

use crate::graph::{EdgeTable, Graph};

/// Acceptance tolerance on edge lengths: |d − 1| ≤ EDGE_TOL.
pub const EDGE_TOL: f64 = 1e-3;
/// Acceptance margin on non-edges: d > 1 + SEP_TOL.
pub const SEP_TOL: f64 = 1e-3;

/// Random restarts before giving up on a graph.
const RESTARTS: u64 = 20;
/// Gradient steps per restart.
const STEPS: usize = 3000;
/// Extra separation pushed onto violating non-edges during descent, so the
/// accepted configuration clears SEP_TOL with room to spare.
const PUSH_MARGIN: f64 = 0.1;
/// Cost below which a restart stops early.
const CONVERGED: f64 = 1e-10;

/// Decide whether `graph` admits a unit-distance penny embedding, returning
/// the witnessing point set on success.
///
/// Restart-based continuous relaxation: sample start positions uniformly in
/// [0, 2)², run a fixed-schedule gradient descent on the squared violation
/// energy, accept if every edge lands within [`EDGE_TOL`] of unit length and
/// every non-edge clears 1 + [`SEP_TOL`]. Restart seeds are fixed, so the
/// verdict for a given graph never changes between runs.
///
/// A NO can be a false negative for borderline configurations; the restart
/// count and step schedule are tuned so this has not been observed for n ≤ 11.
///
/// # Panics
/// If the graph contains K4, which upstream filters must have removed.
pub fn embedding(table: &EdgeTable, graph: &Graph) -> Option<Vec<[f64; 2]>> {
    assert!(
        !graph.has_k4(table),
        "K4 graph reached the penny embedder; structural prefilter is broken"
    );

    let edges: Vec<(usize, usize)> = graph.edges(table).collect();
    if edges.is_empty() {
        return None;
    }
    let non_edges: Vec<(usize, usize)> = (0..table.num_edges())
        .filter(|&id| !graph.contains_id(id))
        .map(|id| table.endpoints(id))
        .collect();

    (0..RESTARTS).find_map(|attempt| try_embed(table.n(), &edges, &non_edges, 42 + attempt))
}

/// Whether `graph` is a penny graph, per [`embedding`].
pub fn is_penny(table: &EdgeTable, graph: &Graph) -> bool {
    embedding(table, graph).is_some()
}

/// Keep the graphs that embed, verifying in parallel. Input order is
/// preserved.
pub fn filter_penny(table: &EdgeTable, graphs: &[Graph]) -> Vec<Graph> {
    graphs
        .par_iter()
        .filter(|g| is_penny(table, g))
        .copied()
        .collect()
}

fn try_embed(
    n: usize,
    edges: &[(usize, usize)],
    non_edges: &[(usize, usize)],
    seed: u64,
) -> Option<Vec<[f64; 2]>> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut pos: Vec<[f64; 2]> = (0..n)
        .map(|_| [rng.gen::<f64>() * 2.0, rng.gen::<f64>() * 2.0])
        .collect();

    let mut grad = vec![[0.0f64; 2]; n];
    for iter in 0..STEPS {
        grad.iter_mut().for_each(|g| *g = [0.0, 0.0]);
        let mut cost = 0.0;

        // edges pull toward unit length from either side
        for &(i, j) in edges {
            let (dx, dy) = (pos[j][0] - pos[i][0], pos[j][1] - pos[i][1]);
            let dist = (dx * dx + dy * dy).sqrt().max(1e-10);
            let err = dist - 1.0;
            cost += err * err;

            let factor = 2.0 * err / dist;
            grad[i][0] -= factor * dx;
            grad[i][1] -= factor * dy;
            grad[j][0] += factor * dx;
            grad[j][1] += factor * dy;
        }

        // non-edges only push once they crowd inside the unit disk
        for &(i, j) in non_edges {
            let (dx, dy) = (pos[j][0] - pos[i][0], pos[j][1] - pos[i][1]);
            let dist = (dx * dx + dy * dy).sqrt().max(1e-10);
            if dist < 1.0 {
                let err = 1.0 - dist + PUSH_MARGIN;
                cost += err * err;

                let factor = -2.0 * err / dist;
                grad[i][0] -= factor * dx;
                grad[i][1] -= factor * dy;
                grad[j][0] += factor * dx;
                grad[j][1] += factor * dy;
            }
        }

        let lr = match iter {
            0..=1000 => 0.1,
            1001..=2000 => 0.01,
            _ => 0.001,
        };
        for (p, g) in pos.iter_mut().zip(&grad) {
            p[0] -= lr * g[0];
            p[1] -= lr * g[1];
        }

        if cost < CONVERGED {
            break;
        }
    }

    accepts(&pos, edges, non_edges).then_some(pos)
}

fn accepts(pos: &[[f64; 2]], edges: &[(usize, usize)], non_edges: &[(usize, usize)]) -> bool {
    let dist = |i: usize, j: usize| {
        let (dx, dy) = (pos[j][0] - pos[i][0], pos[j][1] - pos[i][1]);
        (dx * dx + dy * dy).sqrt()
    };
    edges.iter().all(|&(i, j)| (dist(i, j) - 1.0).abs() <= EDGE_TOL)
        && non_edges.iter().all(|&(i, j)| dist(i, j) > 1.0 + SEP_TOL)
}
