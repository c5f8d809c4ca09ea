use crate::graph::{EdgeTable, Graph};

/// Contact degree cap: a disk touches at most six others in the plane.
pub const MAX_CONTACT_DEGREE: usize = 6;

/// The structural prefilter chain every candidate must pass before the
/// expensive embedding check, cheapest test first.
pub fn passes_structural_filters(table: &EdgeTable, graph: &Graph) -> bool {
    !graph.has_isolated_vertex(table)
        && graph.max_degree(table) <= MAX_CONTACT_DEGREE
        && graph.is_connected(table)
        && !graph.has_k4(table)
}

/// Streaming generator of candidate graphs with exactly `m` edges.
///
/// Enumerates the m-subsets of edge ids in lexicographic order and yields the
/// graphs that pass [`passes_structural_filters`]. Single-threaded by design;
/// downstream consumers batch the stream.
pub struct CandidateGenerator<'a> {
    table: &'a EdgeTable,
    combo: Vec<usize>,
    started: bool,
    exhausted: bool,
    checked: u64,
}

impl<'a> CandidateGenerator<'a> {
    /// Generator over `m`-edge subsets of K_n for the table's `n`.
    ///
    /// # Panics
    /// If `m` is zero or exceeds C(n, 2).
    pub fn new(table: &'a EdgeTable, m: usize) -> Self {
        assert!(
            (1..=table.num_edges()).contains(&m),
            "edge count {m} outside 1..={}",
            table.num_edges()
        );
        Self {
            table,
            combo: (0..m).collect(),
            started: false,
            exhausted: false,
            checked: 0,
        }
    }

    /// Total subsets examined so far, including rejected ones.
    pub fn checked(&self) -> u64 {
        self.checked
    }

    // lexicographic successor of the current combination; false when spent
    fn advance(&mut self) -> bool {
        if !self.started {
            self.started = true;
            return true;
        }
        let m = self.combo.len();
        let num_edges = self.table.num_edges();
        // rightmost position with room to move; everything after restarts
        // tight against it, which is exactly the startIdx + remaining bound
        for i in (0..m).rev() {
            if self.combo[i] < num_edges - m + i {
                self.combo[i] += 1;
                for j in (i + 1)..m {
                    self.combo[j] = self.combo[j - 1] + 1;
                }
                return true;
            }
        }
        false
    }
}

impl Iterator for CandidateGenerator<'_> {
    type Item = Graph;

    fn next(&mut self) -> Option<Graph> {
        if self.exhausted {
            return None;
        }
        while self.advance() {
            self.checked += 1;
            let mut graph = Graph::empty();
            for &id in &self.combo {
                graph.insert_id(id);
            }
            if passes_structural_filters(self.table, &graph) {
                return Some(graph);
            }
        }
        self.exhausted = true;
        None
    }
}
