use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::num::NonZero;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use log::info;

use clinker::cover::{PairTable, SearchPolicy, Shape, Witness};
use clinker::graph::{EdgeTable, Graph};
use clinker::{canon, codec, dispatch, embed, generate, maximal, polyiamond, prefix, shortg, spiral};

const USAGE: &str = "\
Usage: clinker <command> [options]

Commands:
  enumerate           --n N --edges M --out FILE
  canonicalize        --n N --in FILE --out FILE [--no-shortg]
  verify-penny        --n N --in FILE --out FILE [--workers W]
  filter-maximal      --n N --out FILE INPUT...
  polyiamond          --n N --edges E --min-triangles A --max-triangles B --out FILE
  spiral              --n N
  arrangement-search  --n N --k K [--workers W] [--seed S] [--max-overlap L,L,...]
                      [--graphs FILE] [--sharded] [--hex-seeds]
  sat-complete        --n N [--workers W] INPUT...

Graph files ending in .g6 are graph6 text; anything else is the binary
record format. Exit code 0 means a decision was returned, including
no-witness; other codes mean bad input or a failed run.
";

fn main() -> ExitCode {
    env_logger::init();

    let mut args = pico_args::Arguments::from_env();
    let command = match args.subcommand() {
        Ok(Some(command)) => command,
        _ => {
            eprint!("{USAGE}");
            return ExitCode::from(2);
        }
    };

    let outcome = match command.as_str() {
        "enumerate" => cmd_enumerate(args),
        "canonicalize" => cmd_canonicalize(args),
        "verify-penny" => cmd_verify_penny(args),
        "filter-maximal" => cmd_filter_maximal(args),
        "polyiamond" => cmd_polyiamond(args),
        "spiral" => cmd_spiral(args),
        "arrangement-search" => cmd_arrangement_search(args),
        "sat-complete" => cmd_sat_complete(args),
        other => {
            eprintln!("unknown command {other:?}");
            eprint!("{USAGE}");
            return ExitCode::from(2);
        }
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::from(err.code)
        }
    }
}

struct CliError {
    code: u8,
    message: String,
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

fn usage_error(message: impl Into<String>) -> CliError {
    CliError { code: 2, message: message.into() }
}

fn run_error(message: impl std::fmt::Display) -> CliError {
    CliError { code: 1, message: message.to_string() }
}

type CliResult = Result<(), CliError>;

fn required<T: std::str::FromStr>(
    args: &mut pico_args::Arguments,
    key: &'static str,
) -> Result<T, CliError>
where
    T::Err: std::fmt::Display,
{
    args.value_from_str(key)
        .map_err(|err| usage_error(format!("{key}: {err}")))
}

fn optional<T: std::str::FromStr>(
    args: &mut pico_args::Arguments,
    key: &'static str,
) -> Result<Option<T>, CliError>
where
    T::Err: std::fmt::Display,
{
    args.opt_value_from_str(key)
        .map_err(|err| usage_error(format!("{key}: {err}")))
}

fn workers_arg(args: &mut pico_args::Arguments) -> Result<NonZero<usize>, CliError> {
    match optional::<usize>(args, "--workers")? {
        Some(w) => NonZero::new(w).ok_or_else(|| usage_error("--workers must be positive")),
        None => Ok(std::thread::available_parallelism().unwrap_or(NonZero::new(1).unwrap())),
    }
}

fn is_g6(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "g6")
}

fn read_graphs(table: &EdgeTable, path: &Path) -> Result<Vec<Graph>, CliError> {
    let file = File::open(path).map_err(|err| usage_error(format!("{}: {err}", path.display())))?;
    if is_g6(path) {
        let (graphs, skipped) =
            codec::read_graph6_lines(table, BufReader::new(file)).map_err(run_error)?;
        if skipped.malformed + skipped.wrong_order > 0 {
            info!(
                "{}: skipped {} malformed, {} wrong-order records",
                path.display(),
                skipped.malformed,
                skipped.wrong_order
            );
        }
        Ok(graphs)
    } else {
        codec::read_records(table, &mut BufReader::new(file)).map_err(run_error)
    }
}

fn write_graphs(table: &EdgeTable, path: &Path, graphs: &[Graph]) -> CliResult {
    let file = File::create(path).map_err(run_error)?;
    let mut writer = BufWriter::new(file);
    if is_g6(path) {
        codec::write_graph6_lines(table, &mut writer, graphs).map_err(run_error)?;
    } else {
        codec::write_records(table, &mut writer, graphs).map_err(run_error)?;
    }
    writer.flush().map_err(run_error)?;
    info!("wrote {} graphs to {}", graphs.len(), path.display());
    Ok(())
}

fn cmd_enumerate(mut args: pico_args::Arguments) -> CliResult {
    let n: usize = required(&mut args, "--n")?;
    let edges: usize = required(&mut args, "--edges")?;
    let out: PathBuf = required(&mut args, "--out")?;

    let table = EdgeTable::new(n);
    let candidates: Vec<Graph> = generate::CandidateGenerator::new(&table, edges).collect();
    info!("{} candidates with {edges} edges on {n} vertices", candidates.len());
    write_graphs(&table, &out, &candidates)
}

fn cmd_canonicalize(mut args: pico_args::Arguments) -> CliResult {
    let n: usize = required(&mut args, "--n")?;
    let input: PathBuf = required(&mut args, "--in")?;
    let out: PathBuf = required(&mut args, "--out")?;
    let no_shortg = args.contains("--no-shortg");

    let table = EdgeTable::new(n);
    let graphs = read_graphs(&table, &input)?;
    let reps = if no_shortg {
        canon::reduce_to_reps(&table, &graphs)
    } else {
        shortg::reduce_preferring_shortg(&table, &graphs).map_err(run_error)?
    };
    info!("{} graphs reduced to {} representatives", graphs.len(), reps.len());
    write_graphs(&table, &out, &reps)
}

fn cmd_verify_penny(mut args: pico_args::Arguments) -> CliResult {
    let n: usize = required(&mut args, "--n")?;
    let input: PathBuf = required(&mut args, "--in")?;
    let out: PathBuf = required(&mut args, "--out")?;
    let workers = workers_arg(&mut args)?;

    rayon::ThreadPoolBuilder::new()
        .num_threads(workers.get())
        .build_global()
        .map_err(run_error)?;

    let table = EdgeTable::new(n);
    let graphs = read_graphs(&table, &input)?;
    let penny = embed::filter_penny(&table, &graphs);
    info!("{} of {} graphs embed", penny.len(), graphs.len());
    write_graphs(&table, &out, &penny)
}

fn cmd_filter_maximal(mut args: pico_args::Arguments) -> CliResult {
    let n: usize = required(&mut args, "--n")?;
    let out: PathBuf = required(&mut args, "--out")?;

    let table = EdgeTable::new(n);
    let mut pool = Vec::new();
    let inputs = args.finish();
    if inputs.is_empty() {
        return Err(usage_error("filter-maximal needs at least one input file"));
    }
    for input in inputs {
        pool.extend(read_graphs(&table, Path::new(&input))?);
    }

    let kept = maximal::filter_maximal(&table, &pool);
    info!("{} of {} graphs are maximal", kept.len(), pool.len());
    write_graphs(&table, &out, &kept)
}

fn cmd_polyiamond(mut args: pico_args::Arguments) -> CliResult {
    let n: usize = required(&mut args, "--n")?;
    let edges: usize = required(&mut args, "--edges")?;
    let min_triangles: usize = required(&mut args, "--min-triangles")?;
    let max_triangles: usize = required(&mut args, "--max-triangles")?;
    let out: PathBuf = required(&mut args, "--out")?;

    let table = EdgeTable::new(n);
    let matches = polyiamond::contact_graphs_matching(&table, min_triangles, max_triangles, edges);
    info!("{} contact graphs match ({n} vertices, {edges} edges)", matches.len());
    let unique = shortg::reduce_preferring_shortg(&table, &matches).map_err(run_error)?;
    info!("{} after isomorphism reduction", unique.len());
    write_graphs(&table, &out, &unique)
}

fn cmd_spiral(mut args: pico_args::Arguments) -> CliResult {
    let n: usize = required(&mut args, "--n")?;
    let s = spiral::build_spiral(n);
    println!("spiral on {n} nodes: {} edges", s.edges().len());
    for &(a, b) in s.edges() {
        println!("{a} {b}");
    }
    Ok(())
}

fn parse_overlap_caps(raw: Option<String>) -> Result<Option<Vec<usize>>, CliError> {
    raw.map(|list| {
        list.split(',')
            .map(|part| {
                part.trim()
                    .parse::<usize>()
                    .map_err(|_| usage_error(format!("bad overlap cap {part:?}")))
            })
            .collect::<Result<Vec<usize>, CliError>>()
    })
    .transpose()
}

fn cmd_arrangement_search(mut args: pico_args::Arguments) -> CliResult {
    let n: usize = required(&mut args, "--n")?;
    let k: usize = required(&mut args, "--k")?;
    let workers = workers_arg(&mut args)?;
    let seed: u64 = optional(&mut args, "--seed")?.unwrap_or(0);
    let overlap_caps = parse_overlap_caps(optional(&mut args, "--max-overlap")?)?;
    let graphs_path: Option<PathBuf> = optional(&mut args, "--graphs")?;
    let sharded = args.contains("--sharded");
    let hex_seeds = args.contains("--hex-seeds");

    if k == 0 {
        return Err(usage_error("--k must be positive"));
    }

    let pairs = PairTable::new(n);
    let built_spiral = spiral::build_spiral(n);

    let mut policy = SearchPolicy {
        overlap_caps,
        ..SearchPolicy::standard()
    };
    if hex_seeds {
        if !spiral::is_centered_hexagonal(n) {
            return Err(usage_error(
                "--hex-seeds needs a centered-hexagonal n (1, 7, 19, ...)",
            ));
        }
        policy.item0_seed_slots = Some(spiral::symmetry_seed_slots(&built_spiral));
    }

    let shapes: Vec<Shape> = match &graphs_path {
        Some(path) => {
            let table = EdgeTable::new(n);
            read_graphs(&table, path)?
                .iter()
                .map(|g| Shape::from_graph(&table, g))
                .collect()
        }
        None => vec![Shape::from_edges(n, built_spiral.edges().iter().copied())],
    };
    if shapes.is_empty() {
        return Err(usage_error("no shapes to search over"));
    }
    let shape_refs: Vec<&Shape> = shapes.iter().collect();

    info!(
        "searching {k} arrangements of {n} items over {} shape(s), {workers} workers",
        shapes.len()
    );

    let found = if shapes.len() > 1 {
        dispatch::search_shape_combinations(&pairs, &shape_refs, k, &policy, workers).map(
            |(combo, witness)| {
                println!("shape combination: {combo:?}");
                let level_shapes: Vec<&Shape> = combo.iter().map(|&i| shape_refs[i]).collect();
                (level_shapes, witness)
            },
        )
    } else {
        let level_shapes: Vec<&Shape> = vec![shape_refs[0]; k];
        let search = clinker::CoverSearch::new(&pairs, level_shapes.clone(), policy);
        let witness = if sharded {
            dispatch::run_backtrack_sharded(&search, workers)
        } else {
            dispatch::run_backtrack(&search, workers, seed)
        };
        witness.map(|w| (level_shapes, w))
    };

    match found {
        Some((level_shapes, witness)) => {
            assert!(witness.covers_all(&pairs, &level_shapes));
            print_witness(&witness);
        }
        None => println!("no witness: {k} arrangements do not cover all pairs"),
    }
    Ok(())
}

fn print_witness(witness: &Witness) {
    println!("witness found:");
    for (level, arrangement) in witness.arrangements.iter().enumerate() {
        let rendered = arrangement
            .iter()
            .map(usize::to_string)
            .collect::<Vec<String>>()
            .join(",");
        println!("  arr{level}: [{rendered}]");
    }
}

fn cmd_sat_complete(mut args: pico_args::Arguments) -> CliResult {
    let n: usize = required(&mut args, "--n")?;
    let workers = workers_arg(&mut args)?;

    let inputs = args.finish();
    if inputs.is_empty() {
        return Err(usage_error("sat-complete needs at least one prefix dataset file"));
    }

    let mut candidates = Vec::new();
    let mut skipped = 0;
    for input in &inputs {
        let file = File::open(Path::new(input))
            .map_err(|err| usage_error(format!("{}: {err}", input.to_string_lossy())))?;
        let (mut batch, bad) =
            prefix::read_prefix_lines(n, BufReader::new(file)).map_err(run_error)?;
        for candidate in &mut batch {
            candidate.index += candidates.len();
        }
        candidates.extend(batch);
        skipped += bad;
    }
    info!("{} candidate prefixes loaded ({skipped} skipped)", candidates.len());

    let pairs = PairTable::new(n);
    let shape = Shape::from_edges(n, spiral::build_spiral(n).edges().iter().copied());

    match dispatch::run_sat_stream(&pairs, &shape, candidates, workers).map_err(run_error)? {
        Some(solution) => {
            println!("completion found for candidate {}", solution.candidate.index);
            let mut arrangements = vec![(0..n).collect::<Vec<usize>>()];
            arrangements.extend(solution.candidate.arrangements.iter().cloned());
            arrangements.push(solution.completion);
            print_witness(&Witness { arrangements });
        }
        None => println!("no candidate prefix admits a completing arrangement"),
    }
    Ok(())
}
