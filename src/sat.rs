use std::convert::identity;

use itertools::Itertools;
use ndarray::Array2;
use unordered_pair::UnorderedPair;
use varisat::{CnfFormula, ExtendFormula, Lit, Solver, Var};

use crate::cover::{Coverage, PairTable, Shape};
use crate::logic::exactly_one;

/// Reasons a SAT completion attempt fails without deciding anything.
///
/// UNSAT is not a failure; it is the decision `None` from
/// [`CompletionProblem::solve`].
#[derive(Debug)]
pub enum SatFailure {
    /// The solver library errored out mid-solve. Fatal for this candidate
    /// only; the dispatcher moves on.
    Solver(String),
}

/// Slot adjacency of a shape as a dense boolean matrix, the form the CNF
/// encoder consumes.
pub fn adjacency_matrix(shape: &Shape) -> Array2<bool> {
    let n = shape.n();
    let mut adjacency = Array2::from_elem((n, n), false);
    for &(u, v) in shape.edges() {
        adjacency[(u, v)] = true;
        adjacency[(v, u)] = true;
    }
    adjacency
}

/// Coverage accumulated by a prefix of arrangements laid on their shapes.
pub fn prefix_coverage(pairs: &PairTable, shapes: &[&Shape], arrangements: &[Vec<usize>]) -> Coverage {
    assert_eq!(shapes.len(), arrangements.len());
    let mut coverage = Coverage::new(pairs.num_pairs());
    for (shape, arrangement) in shapes.iter().zip(arrangements) {
        shape.apply(pairs, arrangement, &mut coverage);
    }
    coverage
}

/// The pairs a coverage state still misses.
pub fn uncovered_pairs(pairs: &PairTable, coverage: &Coverage) -> Vec<UnorderedPair<usize>> {
    (0..pairs.num_pairs())
        .filter(|&id| !coverage.contains(id))
        .map(|id| UnorderedPair::from(pairs.items(id)))
        .collect()
}

/// "Does one more arrangement finish the cover?", encoded as CNF.
///
/// Used when a perfect-(k−1) prefix is in hand: the final arrangement then
/// has a tight, structurally clean obligation, and an off-the-shelf SAT
/// solver decides it faster than the backtracker would.
pub struct CompletionProblem<'a> {
    n: usize,
    adjacency: &'a Array2<bool>,
    uncovered: &'a [UnorderedPair<usize>],
}

impl<'a> CompletionProblem<'a> {
    /// Problem over `n` slots with the given slot adjacency and missing
    /// pairs.
    pub fn new(n: usize, adjacency: &'a Array2<bool>, uncovered: &'a [UnorderedPair<usize>]) -> Self {
        assert_eq!(adjacency.dim(), (n, n));
        Self { n, adjacency, uncovered }
    }

    // x(item, slot) ≡ "item sits in slot"
    fn placement(&self, item: usize, slot: usize) -> Var {
        Var::from_index(item * self.n + slot)
    }

    /// Decide the completion. `Ok(Some(arrangement))` on SAT with the decoded
    /// slot-to-item bijection, `Ok(None)` on UNSAT.
    ///
    /// # Encoding
    /// Placement variables get exactly-one clauses in both directions, which
    /// pins a bijection. For every uncovered pair {a, b} and every adjacent
    /// ordered slot pair (s, t), an auxiliary variable y is defined by
    /// y ⇔ (x(a, s) ∧ x(b, t)); the disjunction of a pair's auxiliaries
    /// demands that the pair be realized on some edge.
    ///
    /// # Panics
    /// If a SAT model decodes to a non-permutation, which would be a bug in
    /// the encoding, not in the input.
    pub fn solve(&self) -> Result<Option<Vec<usize>>, SatFailure> {
        let n = self.n;
        let mut formula = CnfFormula::new();

        for item in 0..n {
            for clause in exactly_one(
                (0..n).map(|slot| self.placement(item, slot).positive()).collect_vec(),
            ) {
                formula.add_clause(&clause);
            }
        }
        for slot in 0..n {
            for clause in exactly_one(
                (0..n).map(|item| self.placement(item, slot).positive()).collect_vec(),
            ) {
                formula.add_clause(&clause);
            }
        }

        let mut next_aux = n * n;
        for &UnorderedPair(a, b) in self.uncovered {
            let mut realizations: Vec<Lit> = Vec::new();
            for s in 0..n {
                for t in 0..n {
                    if !self.adjacency[(s, t)] {
                        continue;
                    }
                    let y = Var::from_index(next_aux);
                    next_aux += 1;
                    let (xa, xb) = (self.placement(a, s), self.placement(b, t));

                    // y <=> xa * xb
                    formula.add_clause(&[y.negative(), xa.positive()]);
                    formula.add_clause(&[y.negative(), xb.positive()]);
                    formula.add_clause(&[xa.negative(), xb.negative(), y.positive()]);
                    realizations.push(y.positive());
                }
            }
            formula.add_clause(&realizations);
        }

        let mut solver = Solver::new();
        solver.add_formula(&formula);
        match solver.solve() {
            Err(err) => Err(SatFailure::Solver(err.to_string())),
            Ok(false) => Ok(None),
            Ok(true) => {
                let model = solver.model().unwrap();
                Ok(Some(self.decode(&model)))
            }
        }
    }

    fn decode(&self, model: &[Lit]) -> Vec<usize> {
        let n = self.n;
        let arrangement = (0..n)
            .map(|slot| {
                (0..n)
                    .find(|&item| {
                        model
                            .get(self.placement(item, slot).index())
                            .is_some_and(|lit| lit.is_positive())
                    })
                    .expect("SAT model leaves a slot unfilled")
            })
            .collect_vec();

        let mut seen = vec![false; n];
        arrangement.iter().for_each(|&item| seen[item] = true);
        assert!(
            seen.into_iter().all(identity),
            "SAT model decoded to a non-permutation; the bijectivity encoding is broken"
        );
        arrangement
    }
}
