use itertools::Itertools;
use log::debug;

use crate::graph::{EdgeTable, Graph};

/// Whether some relabeling of `g` is a subgraph of `h`.
///
/// Exhaustive over all n! relabelings, which keeps it honest and keeps it
/// small-n only; the polyiamond route supplies maximal graphs past n ≈ 10.
pub fn is_isomorphic_subgraph_of(table: &EdgeTable, g: &Graph, h: &Graph) -> bool {
    if g.edge_count() > h.edge_count() {
        return false;
    }
    (0..table.n())
        .permutations(table.n())
        .any(|perm| g.relabeled(table, &perm).is_subgraph_of(h))
}

/// Keep the graphs that are not an isomorphic subgraph of any other graph in
/// the pool.
///
/// The pool is walked in edge-count descending order, seeding the maximal set
/// with the densest graph; each later graph only needs testing against the
/// graphs already accepted.
pub fn filter_maximal(table: &EdgeTable, graphs: &[Graph]) -> Vec<Graph> {
    let ordered = graphs
        .iter()
        .copied()
        .sorted_by_key(|g| std::cmp::Reverse(g.edge_count()))
        .collect_vec();

    let mut maximal: Vec<Graph> = Vec::new();
    for (done, g) in ordered.into_iter().enumerate() {
        if done % 100 == 0 {
            debug!("maximality filter: {done} processed, {} kept", maximal.len());
        }
        if !maximal
            .iter()
            .any(|h| is_isomorphic_subgraph_of(table, &g, h))
        {
            maximal.push(g);
        }
    }
    maximal
}
