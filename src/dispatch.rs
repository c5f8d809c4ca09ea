use std::num::NonZero;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use itertools::Itertools;
use log::{info, warn};
use thiserror::Error;

use crate::cover::{CoverSearch, PairTable, SearchPolicy, Shape, Witness, WorkerCtx};
use crate::prefix::PrefixCandidate;
use crate::sat::{self, CompletionProblem, SatFailure};

/// Run-level dispatcher failures.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Every dispatched candidate died in the solver; something is wrong
    /// with the run, not with individual inputs.
    #[error("all {0} SAT candidates failed in the solver")]
    AllCandidatesFailed(u64),
}

/// A SAT completion hit: the prefix that worked and the arrangement that
/// finishes it.
#[derive(Debug)]
pub struct SatSolution {
    /// The winning candidate prefix.
    pub candidate: PrefixCandidate,
    /// The decoded final arrangement.
    pub completion: Vec<usize>,
}

const TICK: Duration = Duration::from_secs(1);

fn with_progress_ticker<R>(label: &str, counter: &AtomicU64, total: u64, body: impl FnOnce() -> R) -> R {
    let done = AtomicBool::new(false);
    thread::scope(|outer| {
        let ticker = outer.spawn(|| {
            while !done.load(Ordering::Relaxed) {
                thread::park_timeout(TICK);
                let count = counter.load(Ordering::Relaxed);
                if count > 0 && !done.load(Ordering::Relaxed) {
                    if total > 0 {
                        info!("{label}: {count}/{total}");
                    } else {
                        info!("{label}: {count}");
                    }
                }
            }
        });
        let result = body();
        done.store(true, Ordering::Relaxed);
        ticker.thread().unpark();
        result
    })
}

/// Fan a witness hunt out to `workers` seeded threads.
///
/// Every worker explores the whole space in its own shuffled item order;
/// randomized orders find first witnesses much sooner than the natural order,
/// and the stop flag ends everyone as soon as one wins. The first witness to
/// pass the compare-and-swap is the one returned; later finds are dropped.
pub fn run_backtrack(search: &CoverSearch<'_>, workers: NonZero<usize>, base_seed: u64) -> Option<Witness> {
    let (tx, rx) = mpsc::sync_channel::<Witness>(1);

    with_progress_ticker("arrangements tried", search.progress_counter(), 0, || {
        thread::scope(|scope| {
            for w in 0..workers.get() {
                let tx = tx.clone();
                let ctx = WorkerCtx::shuffled(
                    search.item_count(),
                    base_seed.wrapping_add(w as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15),
                );
                scope.spawn(move || {
                    if let Some(witness) = search.run(&ctx) {
                        if search.claim_first() {
                            let _ = tx.send(witness);
                        }
                    }
                });
            }
        });
    });

    drop(tx);
    rx.try_recv().ok()
}

/// Exhaustively decide the search by sharding on the item placed first at
/// level 1: n independent shards, pulled from a shared cursor by `workers`
/// threads, each explored fully in natural order.
///
/// `None` is a definitive no-coverage answer (provided nothing set the stop
/// flag from outside); it distinguishes "exhausted" from "not yet explored"
/// by construction, because the function only returns after every shard ran
/// dry.
pub fn run_backtrack_sharded(search: &CoverSearch<'_>, workers: NonZero<usize>) -> Option<Witness> {
    let n = search.item_count();

    // k = 1 is decided by the identity arrangement alone; there is no
    // first-item choice to shard on
    if search.k() == 1 {
        return search.run(&WorkerCtx::natural(n));
    }

    let cursor = AtomicUsize::new(0);
    let (tx, rx) = mpsc::sync_channel::<Witness>(1);

    with_progress_ticker("arrangements tried", search.progress_counter(), 0, || {
        thread::scope(|scope| {
            for _ in 0..workers.get().min(n) {
                let tx = tx.clone();
                let cursor = &cursor;
                scope.spawn(move || loop {
                    let shard = cursor.fetch_add(1, Ordering::Relaxed);
                    if shard >= n || search.stopped() {
                        break;
                    }
                    let ctx = WorkerCtx::natural(n).with_shard(shard);
                    if let Some(witness) = search.run(&ctx) {
                        if search.claim_first() {
                            let _ = tx.send(witness);
                        }
                        break;
                    }
                });
            }
        });
    });

    drop(tx);
    rx.try_recv().ok()
}

/// Decide coverage over every non-decreasing assignment of `shapes` to the
/// `k` levels. Reordering levels never changes the union, so ascending
/// index tuples (shape₀ ≤ shape₁ ≤ …) exhaust the combinations.
///
/// Returns the first witness along with the shape indices that produced it,
/// or `None` after all combinations exhaust.
pub fn search_shape_combinations(
    pairs: &PairTable,
    shapes: &[&Shape],
    k: usize,
    policy: &SearchPolicy,
    workers: NonZero<usize>,
) -> Option<(Vec<usize>, Witness)> {
    for combo in (0..shapes.len()).combinations_with_replacement(k) {
        info!("testing shape combination {combo:?}");
        let level_shapes: Vec<&Shape> = combo.iter().map(|&i| shapes[i]).collect();
        let search = CoverSearch::new(pairs, level_shapes, policy.clone());
        if let Some(witness) = run_backtrack_sharded(&search, workers) {
            return Some((combo, witness));
        }
    }
    None
}

/// The backtracking dispatch modes of [`Decider::Backtrack`].
pub enum BacktrackMode {
    /// Seeded-shuffle workers racing to a first witness.
    Seeded(u64),
    /// First-item sharding, every shard explored fully.
    Sharded,
}

/// The two engines that decide coverage, behind one `decide` capability.
/// Construction chooses the variant; callers only see the witness or the
/// exhaustion.
pub enum Decider<'a> {
    /// Bounded-overlap backtracking over the level shapes of a
    /// [`CoverSearch`].
    Backtrack {
        /// The configured search.
        search: CoverSearch<'a>,
        /// Worker thread count.
        workers: NonZero<usize>,
        /// How workers split the space.
        mode: BacktrackMode,
    },
    /// SAT completion over a stream of perfect-prefix candidates, all levels
    /// on one shape.
    SatStream {
        /// Pair indexing for the run.
        pairs: &'a PairTable,
        /// The single shape every level lays on.
        shape: &'a Shape,
        /// The candidate prefixes to try.
        candidates: Vec<PrefixCandidate>,
        /// Worker thread count.
        workers: NonZero<usize>,
    },
}

impl Decider<'_> {
    /// Run the chosen engine to a decision: `Ok(Some)` with a full witness,
    /// `Ok(None)` when the space is exhausted without one.
    pub fn decide(self) -> Result<Option<Witness>, DispatchError> {
        match self {
            Decider::Backtrack { search, workers, mode } => Ok(match mode {
                BacktrackMode::Seeded(seed) => run_backtrack(&search, workers, seed),
                BacktrackMode::Sharded => run_backtrack_sharded(&search, workers),
            }),
            Decider::SatStream { pairs, shape, candidates, workers } => {
                let n = pairs.n();
                Ok(run_sat_stream(pairs, shape, candidates, workers)?.map(|solution| {
                    let mut arrangements = vec![(0..n).collect::<Vec<usize>>()];
                    arrangements.extend(solution.candidate.arrangements);
                    arrangements.push(solution.completion);
                    Witness { arrangements }
                }))
            }
        }
    }
}

/// Dispatch a stream of perfect-prefix candidates to SAT workers, stopping at
/// the first SAT.
///
/// All levels lay on the single `shape` (the spiral case). Each worker owns
/// its solver and has exactly one solve in flight; candidates are pulled from
/// a shared cursor. Per-candidate solver failures are counted and skipped;
/// if every candidate failed that way the run itself failed.
pub fn run_sat_stream(
    pairs: &PairTable,
    shape: &Shape,
    candidates: Vec<PrefixCandidate>,
    workers: NonZero<usize>,
) -> Result<Option<SatSolution>, DispatchError> {
    let n = pairs.n();
    let adjacency = sat::adjacency_matrix(shape);
    let identity: Vec<usize> = (0..n).collect();

    let stop = AtomicBool::new(false);
    let cursor = AtomicUsize::new(0);
    let checked = AtomicU64::new(0);
    let failures = AtomicU64::new(0);
    let (tx, rx) = mpsc::sync_channel::<SatSolution>(1);

    with_progress_ticker("candidates checked", &checked, candidates.len() as u64, || {
        thread::scope(|scope| {
            for _ in 0..workers.get() {
                let tx = tx.clone();
                let (stop, cursor, checked, failures) = (&stop, &cursor, &checked, &failures);
                let (candidates, adjacency, identity) = (&candidates, &adjacency, &identity);
                scope.spawn(move || loop {
                    let index = cursor.fetch_add(1, Ordering::Relaxed);
                    if index >= candidates.len() || stop.load(Ordering::Relaxed) {
                        break;
                    }
                    let candidate = &candidates[index];

                    let mut prefix_shapes = vec![shape];
                    let mut prefix_arrangements = vec![identity.clone()];
                    for arrangement in &candidate.arrangements {
                        prefix_shapes.push(shape);
                        prefix_arrangements.push(arrangement.clone());
                    }
                    let coverage = sat::prefix_coverage(pairs, &prefix_shapes, &prefix_arrangements);
                    let uncovered = sat::uncovered_pairs(pairs, &coverage);

                    let problem = CompletionProblem::new(n, adjacency, &uncovered);
                    let outcome = problem.solve();
                    checked.fetch_add(1, Ordering::Relaxed);
                    match outcome {
                        Ok(Some(completion)) => {
                            if stop
                                .compare_exchange(false, true, Ordering::SeqCst, Ordering::Relaxed)
                                .is_ok()
                            {
                                let _ = tx.send(SatSolution {
                                    candidate: candidate.clone(),
                                    completion,
                                });
                            }
                            break;
                        }
                        Ok(None) => {}
                        Err(SatFailure::Solver(message)) => {
                            failures.fetch_add(1, Ordering::Relaxed);
                            warn!("solver failed on candidate {}: {message}", candidate.index);
                        }
                    }
                });
            }
        });
    });

    drop(tx);
    let solution = rx.try_recv().ok();
    let failed = failures.load(Ordering::Relaxed);
    if solution.is_none() && !candidates.is_empty() && failed == candidates.len() as u64 {
        return Err(DispatchError::AllCandidatesFailed(failed));
    }
    Ok(solution)
}
