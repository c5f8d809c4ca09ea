use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, ErrorKind, Write};
use std::path::PathBuf;
use std::process::Command;
use std::sync::atomic::{AtomicU64, Ordering};

use log::{info, warn};
use thiserror::Error;

use crate::canon;
use crate::codec;
use crate::graph::{EdgeTable, Graph};

/// Failures of the external canonicalization helper.
#[derive(Debug, Error)]
pub enum ShortgError {
    /// The `shortg` binary could not be started at all.
    #[error("could not launch shortg")]
    Launch(#[source] io::Error),
    /// The helper ran but exited unsuccessfully.
    #[error("shortg exited with {0}")]
    Failed(std::process::ExitStatus),
    /// Temp-file traffic around the helper failed. Fatal for the run.
    #[error("i/o around shortg")]
    Io(#[from] io::Error),
}

static INVOCATION: AtomicU64 = AtomicU64::new(0);

fn scratch_path(suffix: &str) -> PathBuf {
    let stamp = INVOCATION.fetch_add(1, Ordering::Relaxed);
    std::env::temp_dir().join(format!(
        "clinker-shortg-{}-{stamp}.{suffix}",
        std::process::id()
    ))
}

/// Reduce a pool to one representative per isomorphism class by running
/// `shortg -q` over a temporary graph6 file.
///
/// The representative labeling is whatever the tool chooses; callers must not
/// mix its output with the in-process canonical form in one equality domain.
pub fn canonicalize_with_shortg(
    table: &EdgeTable,
    graphs: &[Graph],
) -> Result<Vec<Graph>, ShortgError> {
    let input = scratch_path("in.g6");
    let output = scratch_path("out.g6");

    let mut writer = BufWriter::new(File::create(&input)?);
    codec::write_graph6_lines(table, &mut writer, graphs)?;
    writer.flush()?;
    drop(writer);

    let status = Command::new("shortg")
        .arg("-q")
        .arg(&input)
        .arg(&output)
        .status();

    let result = match status {
        Err(err) => Err(ShortgError::Launch(err)),
        Ok(status) if !status.success() => Err(ShortgError::Failed(status)),
        Ok(_) => {
            let reader = BufReader::new(File::open(&output)?);
            let (reps, skipped) = codec::read_graph6_lines(table, reader)?;
            if skipped.malformed > 0 || skipped.wrong_order > 0 {
                warn!(
                    "shortg output contained {} malformed and {} wrong-order records",
                    skipped.malformed, skipped.wrong_order
                );
            }
            Ok(reps)
        }
    };

    let _ = fs::remove_file(&input);
    let _ = fs::remove_file(&output);
    result
}

/// Isomorphism reduction preferring the external helper, falling back to the
/// in-process pipeline when the tool is not installed. Any other helper
/// failure is fatal for the run and propagates.
pub fn reduce_preferring_shortg(
    table: &EdgeTable,
    graphs: &[Graph],
) -> Result<Vec<Graph>, ShortgError> {
    match canonicalize_with_shortg(table, graphs) {
        Ok(reps) => Ok(reps),
        Err(ShortgError::Launch(err)) if err.kind() == ErrorKind::NotFound => {
            info!("shortg not found, using in-process canonicalization");
            Ok(canon::reduce_to_reps(table, graphs))
        }
        Err(err) => Err(err),
    }
}
