use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use ndarray::Array2;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use unordered_pair::UnorderedPair;

use crate::graph::{EdgeTable, Graph};

/// Dense indexing of unordered item pairs, mirroring the edge-id scheme:
/// pair `{a, b}` with `a < b` gets id `a·(2n−a−1)/2 + (b−a−1)`.
pub struct PairTable {
    n: usize,
    index: Array2<usize>,
    pairs: Vec<(usize, usize)>,
}

impl PairTable {
    /// Pair indexing for `n` items.
    pub fn new(n: usize) -> Self {
        let mut index = Array2::zeros((n, n));
        let mut pairs = Vec::with_capacity(n * (n - 1) / 2);
        for a in 0..n {
            for b in (a + 1)..n {
                index[(a, b)] = pairs.len();
                index[(b, a)] = pairs.len();
                pairs.push((a, b));
            }
        }
        Self { n, index, pairs }
    }

    /// The item count.
    #[inline]
    pub fn n(&self) -> usize {
        self.n
    }

    /// C(n, 2).
    #[inline]
    pub fn num_pairs(&self) -> usize {
        self.pairs.len()
    }

    /// Dense id of an unordered pair of distinct items.
    #[inline]
    pub fn pair_id(&self, pair: UnorderedPair<usize>) -> usize {
        debug_assert_ne!(pair.0, pair.1);
        self.index[(pair.0, pair.1)]
    }

    /// The items `(a, b)` with `a < b` of the pair with this id.
    #[inline]
    pub fn items(&self, pair_id: usize) -> (usize, usize) {
        self.pairs[pair_id]
    }
}

/// Which unordered item pairs some arrangement has already made adjacent.
#[derive(Clone)]
pub struct Coverage {
    bits: Vec<bool>,
    covered: usize,
}

impl Coverage {
    /// Empty coverage over `num_pairs` pairs.
    pub fn new(num_pairs: usize) -> Self {
        Self { bits: vec![false; num_pairs], covered: 0 }
    }

    /// Number of covered pairs.
    #[inline]
    pub fn covered(&self) -> usize {
        self.covered
    }

    /// Whether every pair is covered.
    #[inline]
    pub fn is_complete(&self) -> bool {
        self.covered == self.bits.len()
    }

    /// Whether the pair with this id is covered.
    #[inline]
    pub fn contains(&self, pair_id: usize) -> bool {
        self.bits[pair_id]
    }

    /// Mark a pair covered; returns whether it was new.
    #[inline]
    pub fn insert(&mut self, pair_id: usize) -> bool {
        if self.bits[pair_id] {
            return false;
        }
        self.bits[pair_id] = true;
        self.covered += 1;
        true
    }

    /// Unmark a pair previously inserted by this frame.
    #[inline]
    pub fn remove(&mut self, pair_id: usize) {
        debug_assert!(self.bits[pair_id]);
        self.bits[pair_id] = false;
        self.covered -= 1;
    }
}

/// Slot structure of one graph, precomputed for the backtracker: adjacency
/// lists, degrees, edge list.
pub struct Shape {
    n: usize,
    edges: Vec<(usize, usize)>,
    adjacency: Vec<Vec<usize>>,
    degrees: Vec<usize>,
}

impl Shape {
    /// Shape of a [`Graph`].
    pub fn from_graph(table: &EdgeTable, graph: &Graph) -> Self {
        Self::from_edges(table.n(), graph.edges(table))
    }

    /// Shape from raw `(i, j)` edges on `n` slots.
    pub fn from_edges(n: usize, edges: impl IntoIterator<Item = (usize, usize)>) -> Self {
        let edges: Vec<(usize, usize)> = edges.into_iter().collect();
        let mut adjacency = vec![Vec::new(); n];
        for &(i, j) in &edges {
            adjacency[i].push(j);
            adjacency[j].push(i);
        }
        let degrees = adjacency.iter().map(Vec::len).collect();
        Self { n, edges, adjacency, degrees }
    }

    /// Slot count.
    pub fn n(&self) -> usize {
        self.n
    }

    /// The edges.
    pub fn edges(&self) -> &[(usize, usize)] {
        &self.edges
    }

    /// Slots adjacent to `slot`.
    pub fn neighbors(&self, slot: usize) -> &[usize] {
        &self.adjacency[slot]
    }

    /// Degree of `slot`.
    pub fn degree(&self, slot: usize) -> usize {
        self.degrees[slot]
    }

    /// The slot of strictly smallest degree, if it is unique.
    pub fn unique_min_degree_slot(&self) -> Option<usize> {
        let min = *self.degrees.iter().min()?;
        let mut slots = self.degrees.iter().enumerate().filter(|(_, &d)| d == min);
        let (slot, _) = slots.next()?;
        slots.next().is_none().then_some(slot)
    }

    /// Mark the item pairs induced by laying `arrangement` on this shape.
    pub fn apply(&self, pairs: &PairTable, arrangement: &[usize], coverage: &mut Coverage) {
        for &(u, v) in &self.edges {
            coverage.insert(pairs.pair_id(UnorderedPair(arrangement[u], arrangement[v])));
        }
    }
}

/// Structural knobs of the backtracker. Every specialist search is this one
/// engine under a different configuration.
#[derive(Clone, Default)]
pub struct SearchPolicy {
    /// Per-level overlap caps for levels `1..k`, overriding the arithmetic
    /// default `numEdges − ceil(missing / remaining)`. Zero at every
    /// intermediate level demands a perfect cover.
    pub overlap_caps: Option<Vec<usize>>,
    /// Slots where item 0 may be placed at level 1, cutting the outer
    /// rotational symmetry of hexagonal spirals. `None` allows all slots.
    pub item0_seed_slots: Option<Vec<usize>>,
    /// At the last level, fill a uniquely-lowest-degree slot first and only
    /// try items whose uncovered-partner count fits its degree.
    pub special_last_slot: bool,
}

impl SearchPolicy {
    /// The default policy with the special-slot optimization enabled.
    pub fn standard() -> Self {
        Self { special_last_slot: true, ..Self::default() }
    }
}

/// A complete solution: one arrangement per level, `arrangements[0]` always
/// the identity.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Witness {
    /// Slot-to-item bijections, one per shape.
    pub arrangements: Vec<Vec<usize>>,
}

impl Witness {
    /// Re-derive coverage from scratch and check that every pair is covered.
    pub fn covers_all(&self, pairs: &PairTable, shapes: &[&Shape]) -> bool {
        assert_eq!(self.arrangements.len(), shapes.len());
        let mut coverage = Coverage::new(pairs.num_pairs());
        for (shape, arrangement) in shapes.iter().zip(&self.arrangements) {
            shape.apply(pairs, arrangement, &mut coverage);
        }
        coverage.is_complete()
    }
}

/// Per-worker search inputs: the order items are tried in at every slot, and
/// an optional shard pinning the first placement of level 1.
pub struct WorkerCtx {
    order: Vec<usize>,
    shard_first_item: Option<usize>,
}

impl WorkerCtx {
    /// Try items in natural order.
    pub fn natural(n: usize) -> Self {
        Self { order: (0..n).collect(), shard_first_item: None }
    }

    /// Try items in a seed-determined shuffled order. Does not change what
    /// the exhausted search decides, only how fast first witnesses surface.
    pub fn shuffled(n: usize, seed: u64) -> Self {
        let mut order: Vec<usize> = (0..n).collect();
        order.shuffle(&mut StdRng::seed_from_u64(seed));
        Self { order, shard_first_item: None }
    }

    /// Restrict the first slot of level 1 to one item, sharding an
    /// exhaustive run across workers.
    pub fn with_shard(mut self, first_item: usize) -> Self {
        self.shard_first_item = Some(first_item);
        self
    }
}

/// The arrangement search over `k` shapes: does some tuple of arrangements
/// cover every item pair, with arrangement 0 fixed to the identity?
///
/// Shared between workers; all mutable search state lives on worker stacks.
/// The only cross-worker traffic is the stop flag and the node counter.
pub struct CoverSearch<'a> {
    pairs: &'a PairTable,
    shapes: Vec<&'a Shape>,
    policy: SearchPolicy,
    suffix_edges: Vec<usize>,
    homogeneous_suffix: Vec<bool>,
    found: AtomicBool,
    nodes: AtomicU64,
}

impl<'a> CoverSearch<'a> {
    /// Set up a search over the given level shapes (repetition is fine).
    ///
    /// # Panics
    /// If no shape is given or shapes disagree on the slot count.
    pub fn new(pairs: &'a PairTable, shapes: Vec<&'a Shape>, policy: SearchPolicy) -> Self {
        assert!(!shapes.is_empty());
        assert!(shapes.iter().all(|s| s.n() == pairs.n()));

        // suffix_edges[l] = total edges available at levels l.., the
        // can-it-still-be-done bound
        let k = shapes.len();
        let mut suffix_edges = vec![0; k + 1];
        for l in (0..k).rev() {
            suffix_edges[l] = suffix_edges[l + 1] + shapes[l].edges().len();
        }

        // homogeneous_suffix[l]: levels l.. all lay on one shape, making
        // their arrangements interchangeable
        let mut homogeneous_suffix = vec![true; k];
        for l in (0..k - 1).rev() {
            homogeneous_suffix[l] =
                homogeneous_suffix[l + 1] && std::ptr::eq(shapes[l], shapes[l + 1]);
        }

        Self {
            pairs,
            shapes,
            policy,
            suffix_edges,
            homogeneous_suffix,
            found: AtomicBool::new(false),
            nodes: AtomicU64::new(0),
        }
    }

    /// Number of levels.
    pub fn k(&self) -> usize {
        self.shapes.len()
    }

    /// The item count n.
    pub fn item_count(&self) -> usize {
        self.pairs.n()
    }

    pub(crate) fn progress_counter(&self) -> &AtomicU64 {
        &self.nodes
    }

    /// Ask all workers to unwind at their next branch entry.
    pub fn request_stop(&self) {
        self.found.store(true, Ordering::Relaxed);
    }

    /// Whether the stop flag is set.
    pub fn stopped(&self) -> bool {
        self.found.load(Ordering::Relaxed)
    }

    /// Win the right to publish the first witness. At most one caller ever
    /// gets `true`.
    pub(crate) fn claim_first(&self) -> bool {
        self.found
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::Relaxed)
            .is_ok()
    }

    /// Complete arrangements enumerated so far, across all workers.
    pub fn arrangements_tried(&self) -> u64 {
        self.nodes.load(Ordering::Relaxed)
    }

    /// Coverage after arrangement 0 (the identity on shape 0).
    pub fn initial_coverage(&self) -> Coverage {
        let n = self.pairs.n();
        let identity: Vec<usize> = (0..n).collect();
        let mut coverage = Coverage::new(self.pairs.num_pairs());
        self.shapes[0].apply(self.pairs, &identity, &mut coverage);
        coverage
    }

    /// Run the search to the first witness this worker can reach, or to
    /// exhaustion of its share of the space.
    ///
    /// This is a decision procedure when the context is unsharded and the
    /// run is not stopped externally: `None` then means no completion of the
    /// identity arrangement covers all pairs under this policy's caps.
    pub fn run(&self, ctx: &WorkerCtx) -> Option<Witness> {
        let n = self.pairs.n();
        let identity: Vec<usize> = (0..n).collect();
        let coverage = self.initial_coverage();

        if self.k() == 1 {
            // nothing is ever searched here, so sharding does not apply
            return coverage
                .is_complete()
                .then(|| Witness { arrangements: vec![identity] });
        }

        let mut prefix = vec![identity];
        self.solve_level(1, &coverage, &mut prefix, ctx)
    }

    fn solve_level(
        &self,
        level: usize,
        parent_coverage: &Coverage,
        prefix: &mut Vec<Vec<usize>>,
        ctx: &WorkerCtx,
    ) -> Option<Witness> {
        if self.stopped() {
            return None;
        }

        let n = self.pairs.n();
        let shape = self.shapes[level];
        let last_level = level == self.k() - 1;
        let remaining = self.k() - level;
        let missing = self.pairs.num_pairs() - parent_coverage.covered();

        if missing > self.suffix_edges[level] {
            return None;
        }

        let max_overlap = match &self.policy.overlap_caps {
            Some(caps) if level - 1 < caps.len() => caps[level - 1],
            _ => {
                // the fair-share quota ceil(missing / remaining) relies on the
                // remaining arrangements being interchangeable: some remaining
                // arrangement covers that many new pairs, and on one shape it
                // may as well come first. With mixed shapes per level only the
                // capacity of the shapes actually assigned later can be
                // deducted.
                let min_new = if self.homogeneous_suffix[level] {
                    missing.div_ceil(remaining)
                } else {
                    missing.saturating_sub(self.suffix_edges[level + 1])
                };
                shape.edges().len().saturating_sub(min_new)
            }
        };

        // slot fill order; the special slot leads at the last level
        let special_slot = (last_level && self.policy.special_last_slot)
            .then(|| shape.unique_min_degree_slot())
            .flatten();
        let slot_order: Vec<usize> = match special_slot {
            Some(s) => std::iter::once(s).chain((0..n).filter(|&x| x != s)).collect(),
            None => (0..n).collect(),
        };

        // rem_edges[d] = shape edges with an endpoint among slots not yet
        // filled at depth d; each edge counts at its later-ordered endpoint
        let mut rem_edges = vec![0usize; n + 1];
        for d in (0..n).rev() {
            let slot = slot_order[d];
            let later = &slot_order[d + 1..];
            rem_edges[d] = rem_edges[d + 1]
                + shape
                    .neighbors(slot)
                    .iter()
                    .filter(|&&adj| !later.contains(&adj))
                    .count();
        }

        let mut frame = LevelFrame {
            search: self,
            shape,
            level,
            remaining,
            max_overlap,
            slot_order,
            rem_edges,
            arrangement: vec![usize::MAX; n],
            used: vec![false; n],
            filled_slots: Vec::with_capacity(n),
            coverage: parent_coverage.clone(),
            special_first: special_slot.is_some(),
        };
        frame.enumerate(0, 0, prefix, ctx)
    }
}

struct LevelFrame<'s, 'a> {
    search: &'s CoverSearch<'a>,
    shape: &'a Shape,
    level: usize,
    remaining: usize,
    max_overlap: usize,
    slot_order: Vec<usize>,
    rem_edges: Vec<usize>,
    arrangement: Vec<usize>,
    used: Vec<bool>,
    filled_slots: Vec<usize>,
    coverage: Coverage,
    special_first: bool,
}

impl LevelFrame<'_, '_> {
    fn enumerate(
        &mut self,
        depth: usize,
        overlap: usize,
        prefix: &mut Vec<Vec<usize>>,
        ctx: &WorkerCtx,
    ) -> Option<Witness> {
        let search = self.search;
        if search.stopped() {
            return None;
        }

        let n = self.shape.n();
        if depth == n {
            search.nodes.fetch_add(1, Ordering::Relaxed);
            return self.descend(prefix, ctx);
        }

        let missing_now = search.pairs.num_pairs() - self.coverage.covered();
        if missing_now > self.rem_edges[depth] + search.suffix_edges[self.level + 1] {
            return None;
        }

        let slot = self.slot_order[depth];
        let candidates = self.candidates(depth, slot, ctx);

        for item in candidates {
            if search.stopped() {
                return None;
            }

            // pairs this placement induces against already-filled neighbors
            let mut new_overlap = 0;
            let mut new_pairs: Vec<usize> = Vec::new();
            for &adj in self.shape.neighbors(slot) {
                let adj_item = self.arrangement[adj];
                if adj_item == usize::MAX {
                    continue;
                }
                let pair = search.pairs.pair_id(UnorderedPair(item, adj_item));
                if self.coverage.contains(pair) {
                    new_overlap += 1;
                } else {
                    new_pairs.push(pair);
                }
            }

            if overlap + new_overlap > self.max_overlap {
                continue;
            }

            // in the final arrangement, an uncovered pair of placed items
            // that does not meet here can never meet at all
            if self.remaining == 1 && self.doomed(item, &new_pairs) {
                continue;
            }

            self.arrangement[slot] = item;
            self.used[item] = true;
            self.filled_slots.push(slot);
            for &pair in &new_pairs {
                self.coverage.insert(pair);
            }

            let witness = self.enumerate(depth + 1, overlap + new_overlap, prefix, ctx);

            self.arrangement[slot] = usize::MAX;
            self.used[item] = false;
            self.filled_slots.pop();
            for &pair in &new_pairs {
                self.coverage.remove(pair);
            }

            if witness.is_some() {
                return witness;
            }
        }

        None
    }

    fn candidates(&self, depth: usize, slot: usize, ctx: &WorkerCtx) -> Vec<usize> {
        let search = self.search;

        if self.level == 1 && depth == 0 {
            if let Some(first) = ctx.shard_first_item {
                return vec![first];
            }
        }

        let seed_blocked = |item: usize| {
            self.level == 1
                && item == 0
                && search
                    .policy
                    .item0_seed_slots
                    .as_ref()
                    .is_some_and(|seeds| !seeds.contains(&slot))
        };

        if self.special_first && depth == 0 {
            // the low-degree slot only fits items with few partners left
            let slot_degree = self.shape.degree(slot);
            ctx.order
                .iter()
                .copied()
                .filter(|&item| {
                    !self.used[item]
                        && !seed_blocked(item)
                        && self.needed_partners(item) <= slot_degree
                })
                .collect()
        } else {
            ctx.order
                .iter()
                .copied()
                .filter(|&item| !self.used[item] && !seed_blocked(item))
                .collect()
        }
    }

    fn needed_partners(&self, item: usize) -> usize {
        let n = self.shape.n();
        (0..n)
            .filter(|&other| {
                other != item
                    && !self
                        .coverage
                        .contains(self.search.pairs.pair_id(UnorderedPair(item, other)))
            })
            .count()
    }

    fn doomed(&self, item: usize, new_pairs: &[usize]) -> bool {
        self.filled_slots.iter().any(|&filled| {
            let other = self.arrangement[filled];
            let pair = self.search.pairs.pair_id(UnorderedPair(item, other));
            !self.coverage.contains(pair) && !new_pairs.contains(&pair)
        })
    }

    fn descend(&mut self, prefix: &mut Vec<Vec<usize>>, ctx: &WorkerCtx) -> Option<Witness> {
        let search = self.search;
        prefix.push(self.arrangement.clone());

        let witness = if self.level == search.k() - 1 {
            self.coverage
                .is_complete()
                .then(|| Witness { arrangements: prefix.clone() })
        } else {
            search.solve_level(self.level + 1, &self.coverage, prefix, ctx)
        };

        prefix.pop();
        witness
    }
}
