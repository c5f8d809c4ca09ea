use std::io::{self, BufRead, Read, Write};

use log::warn;
use thiserror::Error;

use crate::graph::{EdgeTable, Graph, MAX_VERTICES};

/// Reasons a single graph record cannot be decoded.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The record is an empty line.
    #[error("empty graph6 record")]
    Empty,
    /// The record encodes a different vertex count than the run's.
    #[error("graph6 record is on {found} vertices, run is on {expected}")]
    WrongOrder {
        /// Vertex count found in the record.
        found: usize,
        /// Vertex count of the current run.
        expected: usize,
    },
    /// A character outside the printable graph6 range `'?'..='~'`.
    #[error("invalid graph6 character {0:#04x}")]
    BadChar(u8),
    /// The record ends before the upper triangle is complete.
    #[error("graph6 record truncated")]
    Truncated,
    /// The edge set does not fit a binary record (C(n, 2) > 64).
    #[error("{0} edge slots do not fit the binary record format")]
    TooWide(usize),
    /// An underlying stream failure. Fatal for the run.
    #[error("i/o failure in graph transit")]
    Io(#[from] io::Error),
}

/// Skip counters accumulated by the tolerant line readers.
///
/// Malformed records are worth a warning; records for a different vertex
/// count are routine when several runs share a directory and are only
/// counted.
#[derive(Debug, Default, Clone, Copy)]
pub struct SkipCounters {
    /// Records that failed to decode.
    pub malformed: u64,
    /// Well-formed records on the wrong vertex count.
    pub wrong_order: u64,
}

/// Encode a graph in graph6: first byte `n + 63`, then the upper triangle
/// read column-major (for each `j`, all `i < j`), packed 6 bits per byte with
/// zero padding, each byte offset by 63.
pub fn encode_graph6(table: &EdgeTable, graph: &Graph) -> String {
    let n = table.n();
    let mut out = Vec::with_capacity(1 + table.num_edges() / 6 + 1);
    out.push(b'?' + n as u8); // '?' == 63

    let mut acc = 0u8;
    let mut filled = 0;
    for j in 1..n {
        for i in 0..j {
            acc = (acc << 1) | u8::from(graph.has_edge(table, i, j));
            filled += 1;
            if filled == 6 {
                out.push(acc + 63);
                acc = 0;
                filled = 0;
            }
        }
    }
    if filled > 0 {
        out.push((acc << (6 - filled)) + 63);
    }

    // all bytes are printable ASCII by construction
    String::from_utf8(out).unwrap()
}

/// Decode one graph6 record against the run's [`EdgeTable`].
pub fn decode_graph6(table: &EdgeTable, line: &str) -> Result<Graph, CodecError> {
    let bytes = line.trim().as_bytes();
    let first = *bytes.first().ok_or(CodecError::Empty)?;
    if !(b'?'..=b'~').contains(&first) {
        return Err(CodecError::BadChar(first));
    }
    let found = (first - b'?') as usize;
    if found != table.n() {
        return Err(CodecError::WrongOrder { found, expected: table.n() });
    }

    let mut bits = bytes[1..].iter().flat_map(|&b| {
        (0..6).rev().map(move |shift| {
            if !(b'?'..=b'~').contains(&b) {
                Err(CodecError::BadChar(b))
            } else {
                Ok((b - b'?') >> shift & 1 == 1)
            }
        })
    });

    let n = table.n();
    let mut graph = Graph::empty();
    for j in 1..n {
        for i in 0..j {
            if bits.next().ok_or(CodecError::Truncated)?? {
                graph.insert_id(table.edge_id(i, j));
            }
        }
    }
    Ok(graph)
}

/// Read graph6 lines, skipping records that fail to decode.
///
/// Blank lines are ignored outright. Decode failures and wrong-order records
/// are counted per the error policy; neither aborts the batch.
pub fn read_graph6_lines<R: BufRead>(
    table: &EdgeTable,
    reader: R,
) -> io::Result<(Vec<Graph>, SkipCounters)> {
    let mut graphs = Vec::new();
    let mut skipped = SkipCounters::default();

    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match decode_graph6(table, &line) {
            Ok(g) => graphs.push(g),
            Err(CodecError::WrongOrder { .. }) => skipped.wrong_order += 1,
            Err(err) => {
                skipped.malformed += 1;
                warn!("skipping malformed graph6 record: {err}");
            }
        }
    }

    Ok((graphs, skipped))
}

/// Write graphs one graph6 record per line.
pub fn write_graph6_lines<W: Write>(
    table: &EdgeTable,
    writer: &mut W,
    graphs: &[Graph],
) -> io::Result<()> {
    for g in graphs {
        writeln!(writer, "{}", encode_graph6(table, g))?;
    }
    Ok(())
}

/// Bytes per binary record for this vertex count: 4 when C(n, 2) ≤ 32, 8 when
/// it fits 64 bits. Larger orders must travel as graph6.
pub fn record_width(table: &EdgeTable) -> Result<usize, CodecError> {
    match table.num_edges() {
        m if m <= 32 => Ok(4),
        m if m <= 64 => Ok(8),
        m => Err(CodecError::TooWide(m)),
    }
}

fn write_record<W: Write>(writer: &mut W, graph: &Graph, width: usize) -> io::Result<()> {
    let bits = graph
        .to_bits_u64()
        .expect("record width was validated against the edge table");
    match width {
        4 => writer.write_all(&(bits as u32).to_le_bytes()),
        _ => writer.write_all(&bits.to_le_bytes()),
    }
}

// distinguishes clean end of stream (None) from a trailing partial record,
// which is dropped with a warning
fn read_record<R: Read>(reader: &mut R, width: usize) -> io::Result<Option<Graph>> {
    let mut buf = [0u8; 8];
    let buf = &mut buf[..width];
    let mut filled = 0;
    while filled < width {
        match reader.read(&mut buf[filled..])? {
            0 if filled == 0 => return Ok(None),
            0 => {
                warn!("dropping trailing partial binary record");
                return Ok(None);
            }
            read => filled += read,
        }
    }
    let bits = match width {
        4 => u32::from_le_bytes(buf[..4].try_into().unwrap()) as u64,
        _ => u64::from_le_bytes(buf[..8].try_into().unwrap()),
    };
    Ok(Some(Graph::from_bits_u64(bits)))
}

/// Write graphs as fixed-width little-endian records.
pub fn write_records<W: Write>(
    table: &EdgeTable,
    writer: &mut W,
    graphs: &[Graph],
) -> Result<(), CodecError> {
    let width = record_width(table)?;
    for g in graphs {
        write_record(writer, g, width).map_err(io_to_codec)?;
    }
    Ok(())
}

/// Read fixed-width binary records until end of stream. A trailing partial
/// record is dropped with a warning.
pub fn read_records<R: Read>(table: &EdgeTable, reader: &mut R) -> Result<Vec<Graph>, CodecError> {
    let width = record_width(table)?;
    let mut graphs = Vec::new();
    while let Some(g) = read_record(reader, width).map_err(io_to_codec)? {
        graphs.push(g);
    }
    Ok(graphs)
}

/// Write a grouped binary stream: a `u32` group count, then per group a `u32`
/// size followed by that many records. Used between equivalence-class
/// pipeline stages.
pub fn write_grouped<W: Write>(
    table: &EdgeTable,
    writer: &mut W,
    groups: &[Vec<Graph>],
) -> Result<(), CodecError> {
    let width = record_width(table)?;
    writer
        .write_all(&(groups.len() as u32).to_le_bytes())
        .map_err(io_to_codec)?;
    for group in groups {
        writer
            .write_all(&(group.len() as u32).to_le_bytes())
            .map_err(io_to_codec)?;
        for g in group {
            write_record(writer, g, width).map_err(io_to_codec)?;
        }
    }
    Ok(())
}

/// Read a grouped binary stream written by [`write_grouped`].
pub fn read_grouped<R: Read>(
    table: &EdgeTable,
    reader: &mut R,
) -> Result<Vec<Vec<Graph>>, CodecError> {
    let width = record_width(table)?;
    let num_groups = read_u32(reader).map_err(io_to_codec)?;
    let mut groups = Vec::with_capacity(num_groups as usize);
    for _ in 0..num_groups {
        let size = read_u32(reader).map_err(io_to_codec)?;
        let mut group = Vec::with_capacity(size as usize);
        for _ in 0..size {
            match read_record(reader, width).map_err(io_to_codec)? {
                Some(g) => group.push(g),
                None => return Err(CodecError::Truncated),
            }
        }
        groups.push(group);
    }
    Ok(groups)
}

fn read_u32<R: Read>(reader: &mut R) -> io::Result<u32> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

fn io_to_codec(err: io::Error) -> CodecError {
    if err.kind() == io::ErrorKind::UnexpectedEof {
        CodecError::Truncated
    } else {
        CodecError::Io(err)
    }
}

const _: () = assert!(MAX_VERTICES < 63, "single-character graph6 order byte");
