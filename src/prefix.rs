use std::io::{self, BufRead};

use log::warn;
use thiserror::Error;

/// Reasons one candidate-prefix line is rejected.
#[derive(Debug, Error)]
pub enum PrefixError {
    /// An entry did not parse as an integer.
    #[error("bad integer {0:?}")]
    BadInteger(String),
    /// A permutation part had the wrong number of entries.
    #[error("permutation has {found} entries, expected {expected}")]
    WrongLength {
        /// Entries found in the part.
        found: usize,
        /// The run's item count.
        expected: usize,
    },
    /// A part was not a permutation of 0..n.
    #[error("not a permutation of 0..{0}")]
    NotAPermutation(usize),
}

/// A parsed perfect-prefix candidate: the non-identity arrangements of one
/// dataset line, in level order, plus the line's position for reporting.
#[derive(Debug, Clone)]
pub struct PrefixCandidate {
    /// Zero-based position among the accepted lines.
    pub index: usize,
    /// Arrangements a₁, a₂, … (a₀ is the identity by convention and never
    /// stored).
    pub arrangements: Vec<Vec<usize>>,
}

/// Parse one line of the persisted prefix format: comma-separated
/// permutations joined by `;`, identity arrangement omitted.
pub fn parse_prefix_line(n: usize, line: &str) -> Result<Vec<Vec<usize>>, PrefixError> {
    line.trim()
        .split(';')
        .map(|part| parse_permutation(n, part))
        .collect()
}

fn parse_permutation(n: usize, part: &str) -> Result<Vec<usize>, PrefixError> {
    let entries = part
        .split(',')
        .map(|s| {
            s.trim()
                .parse::<usize>()
                .map_err(|_| PrefixError::BadInteger(s.trim().to_owned()))
        })
        .collect::<Result<Vec<usize>, PrefixError>>()?;

    if entries.len() != n {
        return Err(PrefixError::WrongLength { found: entries.len(), expected: n });
    }
    let mut seen = vec![false; n];
    for &item in &entries {
        if item >= n || seen[item] {
            return Err(PrefixError::NotAPermutation(n));
        }
        seen[item] = true;
    }
    Ok(entries)
}

/// Read a prefix dataset, skipping malformed lines with a warning counter.
/// Blank lines are ignored.
pub fn read_prefix_lines<R: BufRead>(
    n: usize,
    reader: R,
) -> io::Result<(Vec<PrefixCandidate>, u64)> {
    let mut candidates = Vec::new();
    let mut skipped = 0u64;

    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match parse_prefix_line(n, &line) {
            Ok(arrangements) => candidates.push(PrefixCandidate {
                index: candidates.len(),
                arrangements,
            }),
            Err(err) => {
                skipped += 1;
                warn!("skipping malformed prefix line: {err}");
            }
        }
    }

    Ok((candidates, skipped))
}
