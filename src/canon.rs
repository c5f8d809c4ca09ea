use std::collections::{HashMap, HashSet};

use itertools::Itertools;
use log::debug;
use rayon::prelude::*;

use crate::graph::{EdgeTable, Graph};

/// WL refinement rounds. Three rounds stabilize every graph this toolkit
/// meets; more buys nothing.
pub const WL_ROUNDS: usize = 3;

/// Per-vertex invariant tuples, sorted into a relabeling-invariant sequence.
///
/// Graphs with different fingerprints are non-isomorphic; equal fingerprints
/// decide nothing.
pub type Fingerprint = Vec<(usize, usize, Vec<usize>)>;

/// Stage-1 invariant fingerprint: per vertex (degree, triangles through it,
/// sorted neighbor degrees), sorted descending by (degree, triangles) then
/// ascending by the neighbor-degree multiset.
pub fn invariant_fingerprint(table: &EdgeTable, graph: &Graph) -> Fingerprint {
    let degrees = graph.degrees(table);
    let mut tuples: Fingerprint = (0..table.n())
        .map(|v| {
            let neighbors = graph.neighbors(table, v);
            let triangles = neighbors
                .iter()
                .tuple_combinations()
                .filter(|(&a, &b)| graph.has_edge(table, a, b))
                .count();
            let neighbor_degrees = neighbors.iter().map(|&u| degrees[u]).sorted().collect_vec();
            (degrees[v], triangles, neighbor_degrees)
        })
        .collect();

    tuples.sort_by(|a, b| {
        b.0.cmp(&a.0)
            .then(b.1.cmp(&a.1))
            .then_with(|| a.2.cmp(&b.2))
    });
    tuples
}

/// Stage-2 fingerprint: 1-dimensional Weisfeiler–Lehman color refinement.
///
/// Initial color is the degree; each round recolors a vertex by (old color,
/// sorted neighbor colors). Signatures are renumbered densely in sorted
/// order so the resulting color multiset is comparable across graphs.
pub fn wl_fingerprint(table: &EdgeTable, graph: &Graph, rounds: usize) -> Vec<usize> {
    let n = table.n();
    let mut colors = graph.degrees(table);

    for _ in 0..rounds {
        let signatures = (0..n)
            .map(|v| {
                let neighbor_colors = graph
                    .neighbors(table, v)
                    .into_iter()
                    .map(|u| colors[u])
                    .sorted()
                    .collect_vec();
                (colors[v], neighbor_colors)
            })
            .collect_vec();

        let palette = signatures.iter().cloned().sorted().dedup().collect_vec();
        colors = signatures
            .into_iter()
            .map(|sig| palette.binary_search(&sig).unwrap())
            .collect();
    }

    colors.sort_unstable();
    colors
}

/// Canonical form by exhaustive relabeling: the minimum edge mask over all
/// n! vertex permutations. Exact, and only feasible for small n; past n ≈ 8
/// the external `shortg` path takes over.
pub fn canonical_form(table: &EdgeTable, graph: &Graph) -> Graph {
    (0..table.n())
        .permutations(table.n())
        .map(|perm| graph.relabeled(table, &perm))
        .min()
        .unwrap()
}

/// Whether two graphs on the same table are isomorphic, by canonical-form
/// equality. Small n only.
pub fn are_isomorphic(table: &EdgeTable, a: &Graph, b: &Graph) -> bool {
    canonical_form(table, a) == canonical_form(table, b)
}

/// Partition a pool by the stage-1 invariant fingerprint.
pub fn group_by_fingerprint(table: &EdgeTable, graphs: &[Graph]) -> Vec<Vec<Graph>> {
    let mut groups: HashMap<Fingerprint, Vec<Graph>> = HashMap::new();
    for &g in graphs {
        groups
            .entry(invariant_fingerprint(table, &g))
            .or_default()
            .push(g);
    }
    log_group_sizes("fingerprint", graphs.len(), groups.len());
    groups.into_values().collect()
}

/// Split each group further by the WL fingerprint.
pub fn refine_groups_wl(table: &EdgeTable, groups: Vec<Vec<Graph>>) -> Vec<Vec<Graph>> {
    let before = groups.len();
    let refined: Vec<Vec<Graph>> = groups
        .into_iter()
        .flat_map(|group| {
            let mut sub: HashMap<Vec<usize>, Vec<Graph>> = HashMap::new();
            for g in group {
                sub.entry(wl_fingerprint(table, &g, WL_ROUNDS))
                    .or_default()
                    .push(g);
            }
            sub.into_values().collect_vec()
        })
        .collect();
    debug!(
        "WL refinement: {before} groups -> {} groups ({} splits)",
        refined.len(),
        refined.len() - before
    );
    refined
}

/// Collapse refined groups to one canonical representative per isomorphism
/// class, in parallel over groups. Output is sorted for determinism.
pub fn canonical_reps(table: &EdgeTable, groups: Vec<Vec<Graph>>) -> Vec<Graph> {
    let mut reps: Vec<Graph> = groups
        .par_iter()
        .map(|group| {
            group
                .iter()
                .map(|g| canonical_form(table, g))
                .collect::<HashSet<Graph>>()
        })
        .reduce(HashSet::new, |mut acc, set| {
            acc.extend(set);
            acc
        })
        .into_iter()
        .collect();
    reps.sort_unstable();
    reps
}

/// The full in-process reduction pipeline: fingerprint grouping, WL
/// refinement, canonical labeling inside each group.
pub fn reduce_to_reps(table: &EdgeTable, graphs: &[Graph]) -> Vec<Graph> {
    let groups = group_by_fingerprint(table, graphs);
    let groups = refine_groups_wl(table, groups);
    canonical_reps(table, groups)
}

fn log_group_sizes(stage: &str, total: usize, groups: usize) {
    debug!("{stage} grouping: {total} graphs in {groups} groups");
}
