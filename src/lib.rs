#![warn(missing_docs)]

//! # `clinker`
//!
//! A research toolkit for the Hexagon Clink problem: given n abstract items,
//! find the minimum number k(n) of item-to-slot assignments on maximal
//! [penny graphs](https://en.wikipedia.org/wiki/Penny_graph) such that every
//! unordered pair of items is adjacent under at least one assignment.
//! Lower bounds come from exhaustive search; upper bounds come with explicit
//! witness arrangements.
//!
//! # Internals
//!
//! Two cooperating pipelines produce the family of maximal penny graphs on n
//! vertices:
//!
//! 1. Generate–canonicalize–verify: [`generate`] streams edge subsets of K_n
//!    under structural prefilters, [`canon`] (optionally delegating to the
//!    external `shortg` helper via [`shortg`]) removes isomorphs, [`embed`]
//!    verifies a unit-distance embedding numerically, and [`maximal`] keeps
//!    the graphs no other graph contains.
//! 2. [`polyiamond`] enumerates triangular-lattice polyiamonds up to symmetry
//!    and projects them to contact graphs, which are penny graphs by
//!    construction; this is the only feasible route past n ≈ 10.
//!
//! Given the family, [`cover`] hosts a single parameterized backtracker over
//! k arrangements (overlap caps, special low-degree slot, doomed-pair
//! pruning, symmetry seeds), [`sat`] reduces the "one more arrangement
//! finishes the cover" step to CNF for an off-the-shelf solver, and
//! [`dispatch`] fans independent search roots out to worker threads with a
//! shared stop flag and a single-witness channel. The deterministic
//! [`spiral`] supplies the one-graph-per-n fallback input.

pub use cover::{CoverSearch, Coverage, PairTable, SearchPolicy, Shape, Witness, WorkerCtx};
pub use graph::{EdgeTable, Graph, MAX_VERTICES};

pub mod canon;
pub mod codec;
pub mod cover;
pub mod dispatch;
pub mod embed;
pub mod family;
pub mod generate;
pub mod graph;
mod logic;
pub mod maximal;
pub mod polyiamond;
pub mod prefix;
pub mod sat;
pub mod shortg;
pub mod spiral;
mod tests;
