use std::collections::HashSet;

use itertools::Itertools;
use petgraph::graphmap::UnGraphMap;
use rayon::prelude::*;

use crate::graph::{EdgeTable, Graph};

/// A point of the triangular lattice in oblique (a, b) coordinates; the two
/// basis vectors meet at 60°, so every lattice segment of the tiling has unit
/// length.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct LatticePoint {
    /// First oblique coordinate.
    pub a: i32,
    /// Second oblique coordinate.
    pub b: i32,
}

impl LatticePoint {
    fn rotated60(self) -> Self {
        Self { a: -self.b, b: self.a + self.b }
    }

    fn reflected(self) -> Self {
        Self { a: self.a + self.b, b: -self.b }
    }

    fn translated(self, da: i32, db: i32) -> Self {
        Self { a: self.a + da, b: self.b + db }
    }
}

/// One unit triangle of the lattice, corners kept sorted.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct Triangle([LatticePoint; 3]);

impl Triangle {
    /// Build from three corners in any order.
    pub fn new(p: LatticePoint, q: LatticePoint, r: LatticePoint) -> Self {
        let mut corners = [p, q, r];
        corners.sort_unstable();
        Self(corners)
    }

    /// The corners, sorted.
    pub fn corners(&self) -> [LatticePoint; 3] {
        self.0
    }

    fn transformed(&self, rotations: usize, reflect: bool) -> Self {
        let map = |mut v: LatticePoint| {
            if reflect {
                v = v.reflected();
            }
            for _ in 0..rotations % 6 {
                v = v.rotated60();
            }
            v
        };
        Self::new(map(self.0[0]), map(self.0[1]), map(self.0[2]))
    }

    fn translated(&self, da: i32, db: i32) -> Self {
        Self::new(
            self.0[0].translated(da, db),
            self.0[1].translated(da, db),
            self.0[2].translated(da, db),
        )
    }

    /// The three edge-adjacent triangles, each completing the parallelogram
    /// over one side.
    fn neighbors(&self) -> [Triangle; 3] {
        let [p, q, r] = self.0;
        let fourth = |v1: LatticePoint, v2: LatticePoint, v3: LatticePoint| LatticePoint {
            a: v1.a + v2.a - v3.a,
            b: v1.b + v2.b - v3.b,
        };
        [
            Triangle::new(p, q, fourth(p, q, r)),
            Triangle::new(q, r, fourth(q, r, p)),
            Triangle::new(r, p, fourth(r, p, q)),
        ]
    }
}

/// An edge-connected set of distinct unit triangles, stored normalized:
/// translated against the coordinate origin and sorted.
///
/// The canonical form under the 12-element lattice symmetry group doubles as
/// the dedup key: the structure itself hashes, no string serialization.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct Polyiamond {
    triangles: Vec<Triangle>,
}

impl Polyiamond {
    /// The single upward triangle at the origin.
    pub fn unit() -> Self {
        Self::normalized(vec![Triangle::new(
            LatticePoint { a: 0, b: 0 },
            LatticePoint { a: 1, b: 0 },
            LatticePoint { a: 0, b: 1 },
        )])
    }

    /// Number of triangles.
    pub fn size(&self) -> usize {
        self.triangles.len()
    }

    /// The triangles, normalized and sorted.
    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    fn normalized(mut triangles: Vec<Triangle>) -> Self {
        let min_a = triangles
            .iter()
            .flat_map(|t| t.corners())
            .map(|v| v.a)
            .min()
            .expect("polyiamonds are nonempty");
        let min_b = triangles
            .iter()
            .flat_map(|t| t.corners())
            .map(|v| v.b)
            .min()
            .unwrap();
        for t in &mut triangles {
            *t = t.translated(-min_a, -min_b);
        }
        triangles.sort_unstable();
        Self { triangles }
    }

    fn transformed(&self, rotations: usize, reflect: bool) -> Self {
        Self::normalized(
            self.triangles
                .iter()
                .map(|t| t.transformed(rotations, reflect))
                .collect(),
        )
    }

    /// The lexicographically least element of the orbit under the 6 rotations
    /// and their reflections.
    pub fn canonical(&self) -> Self {
        (0..6)
            .cartesian_product([false, true])
            .map(|(rot, refl)| self.transformed(rot, refl))
            .min()
            .unwrap()
    }

    /// Triangles outside the shape sharing an edge with it: the growth sites.
    pub fn boundary(&self) -> Vec<Triangle> {
        let mut sites: Vec<Triangle> = self
            .triangles
            .iter()
            .flat_map(|t| t.neighbors())
            .filter(|t| self.triangles.binary_search(t).is_err())
            .collect();
        sites.sort_unstable();
        sites.dedup();
        sites
    }

    /// This shape with one more triangle, canonicalized.
    pub fn grown(&self, extra: Triangle) -> Self {
        let mut triangles = self.triangles.clone();
        triangles.push(extra);
        Self::normalized(triangles).canonical()
    }

    /// The contact graph as a map over lattice points: the union of all
    /// triangle corners, joined along all triangle sides.
    pub fn contact_map(&self) -> UnGraphMap<LatticePoint, ()> {
        let mut map = UnGraphMap::new();
        for t in &self.triangles {
            let [p, q, r] = t.corners();
            map.add_edge(p, q, ());
            map.add_edge(q, r, ());
            map.add_edge(r, p, ());
        }
        map
    }

    /// Vertex and edge counts of the contact graph.
    pub fn contact_counts(&self) -> (usize, usize) {
        let map = self.contact_map();
        (map.node_count(), map.edge_count())
    }

    /// The contact graph re-indexed onto `0..n` in sorted lattice-point
    /// order.
    ///
    /// # Panics
    /// If the contact graph's vertex count differs from the table's `n`.
    pub fn contact_graph(&self, table: &EdgeTable) -> Graph {
        let map = self.contact_map();
        let points = map.nodes().sorted().collect_vec();
        assert_eq!(
            points.len(),
            table.n(),
            "contact graph order does not match the edge table"
        );
        let index_of = |p: LatticePoint| points.binary_search(&p).unwrap();
        Graph::from_edges(
            table,
            map.all_edges().map(|(p, q, _)| (index_of(p), index_of(q))),
        )
    }
}

/// All canonical polyiamonds of each size `1..=max_size`, grown layer by
/// layer.
///
/// Workers split the previous layer into chunks, grow and canonicalize
/// locally, and merge their dedup sets; each layer is then sorted so the
/// output is deterministic regardless of worker count.
pub fn enumerate_layers(max_size: usize) -> Vec<Vec<Polyiamond>> {
    let mut layers: Vec<Vec<Polyiamond>> = Vec::with_capacity(max_size);
    if max_size == 0 {
        return layers;
    }
    layers.push(vec![Polyiamond::unit().canonical()]);

    for _ in 1..max_size {
        let previous = layers.last().unwrap();
        let mut grown: Vec<Polyiamond> = previous
            .par_chunks(previous.len().div_ceil(rayon::current_num_threads()).max(1))
            .map(|chunk| {
                let mut local = HashSet::new();
                for shape in chunk {
                    for site in shape.boundary() {
                        local.insert(shape.grown(site));
                    }
                }
                local
            })
            .reduce(HashSet::new, |mut acc, set| {
                acc.extend(set);
                acc
            })
            .into_iter()
            .collect();
        grown.sort_unstable();
        layers.push(grown);
    }

    layers
}

/// Contact graphs of all polyiamonds in the size range whose contact graph
/// has exactly `vertices` and `edges`, re-indexed onto `table`.
///
/// The list may still contain isomorphic duplicates coming from distinct
/// polyiamonds; run it through an isomorphism reduction before treating it as
/// a family of candidate maximal penny graphs.
pub fn contact_graphs_matching(
    table: &EdgeTable,
    min_size: usize,
    max_size: usize,
    edges: usize,
) -> Vec<Graph> {
    let layers = enumerate_layers(max_size);
    let first_layer = min_size.saturating_sub(1).min(layers.len());
    layers[first_layer..]
        .iter()
        .flatten()
        .filter(|p| p.contact_counts() == (table.n(), edges))
        .map(|p| p.contact_graph(table))
        .collect()
}
