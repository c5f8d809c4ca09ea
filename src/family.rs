use log::info;

use crate::embed;
use crate::generate::CandidateGenerator;
use crate::graph::{EdgeTable, Graph};
use crate::maximal;
use crate::polyiamond;
use crate::shortg::{self, ShortgError};

/// The two ways of producing the family 𝒢_n of maximal penny graphs, behind
/// one `produce` capability. Construction picks the route; callers only see
/// the family.
pub enum FamilySource {
    /// Generate, canonicalize, verify: stream m-edge candidates, reduce to
    /// isomorphism representatives, keep the ones that embed, then keep the
    /// ones no other graph contains. Feasible up to n ≈ 10.
    GenerateVerify {
        /// Exact edge count of the candidates.
        edge_count: usize,
    },
    /// Project polyiamonds in a triangle-count range to contact graphs with
    /// matching (n, edge_count). Contact graphs are penny and the selected
    /// counts make them the maximal candidates, so no embedding pass is
    /// needed.
    Polyiamond {
        /// Smallest polyiamond size to project.
        min_size: usize,
        /// Largest polyiamond size to project.
        max_size: usize,
        /// Required contact-graph edge count.
        edge_count: usize,
    },
}

impl FamilySource {
    /// Produce one representative per isomorphism class of the family on the
    /// table's `n`.
    pub fn produce(&self, table: &EdgeTable) -> Result<Vec<Graph>, ShortgError> {
        match *self {
            FamilySource::GenerateVerify { edge_count } => {
                let candidates: Vec<Graph> = CandidateGenerator::new(table, edge_count).collect();
                info!("{} structural candidates", candidates.len());
                let reps = shortg::reduce_preferring_shortg(table, &candidates)?;
                info!("{} isomorphism classes", reps.len());
                let penny = embed::filter_penny(table, &reps);
                info!("{} classes embed", penny.len());
                Ok(maximal::filter_maximal(table, &penny))
            }
            FamilySource::Polyiamond { min_size, max_size, edge_count } => {
                let matches =
                    polyiamond::contact_graphs_matching(table, min_size, max_size, edge_count);
                info!("{} matching contact graphs", matches.len());
                shortg::reduce_preferring_shortg(table, &matches)
            }
        }
    }
}
