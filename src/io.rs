//! Graph input (spec §6, §9). Parsing the `rows cols nnz` header plus an
//! ASCII edge list is out of scope as a *feature* per spec §1 — but the
//! rewrite still needs one production source to compile and run against,
//! and one in-memory source for tests, both behind the `GraphSource`
//! pull-iterator trait spec §9's design note calls for.

use crate::error::{Error, Result};
use crate::model::Edge;
use memmap2::Mmap;
use std::fs::File;
use std::path::Path;

/// A pull source of canonical edges. Self-loops are never yielded; callers
/// drive it with `while let Some(edge) = source.next_edge() { ... }`.
pub trait GraphSource {
    fn next_edge(&mut self) -> Option<Edge>;

    /// Declared node/edge counts from the source header, when known ahead
    /// of a full scan (used to size the color-hash range and progress bar).
    fn header(&self) -> Option<Header> {
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub rows: u32,
    pub cols: u32,
    pub nnz: u64,
}

/// Memory-mapped text reader over the `rows cols nnz` + edge-list format
/// (spec §6). Comment lines starting with `%` before the header are
/// skipped; self-loops are discarded silently, matching spec §3/§6.
pub struct MmapGraphSource {
    mmap: Mmap,
    cursor: usize,
    header: Header,
}

impl MmapGraphSource {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        let mmap = unsafe { Mmap::map(&file)? };
        let mut cursor = 0usize;
        skip_comments(&mmap, &mut cursor);
        let header = parse_header(&mmap, &mut cursor)
            .ok_or_else(|| Error::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("unparseable header in {}", path.as_ref().display()),
            )))?;
        Ok(MmapGraphSource { mmap, cursor, header })
    }
}

impl GraphSource for MmapGraphSource {
    fn next_edge(&mut self) -> Option<Edge> {
        loop {
            let (u, v) = parse_edge_line(&self.mmap, &mut self.cursor)?;
            if let Some(edge) = Edge::canonical(u, v) {
                return Some(edge);
            }
            // self-loop: keep scanning for the next line
        }
    }

    fn header(&self) -> Option<Header> {
        Some(self.header)
    }
}

fn skip_comments(bytes: &[u8], cursor: &mut usize) {
    while *cursor < bytes.len() && bytes[*cursor] == b'%' {
        advance_past_newline(bytes, cursor);
    }
}

fn advance_past_newline(bytes: &[u8], cursor: &mut usize) {
    while *cursor < bytes.len() && bytes[*cursor] != b'\n' {
        *cursor += 1;
    }
    if *cursor < bytes.len() {
        *cursor += 1;
    }
}

fn parse_header(bytes: &[u8], cursor: &mut usize) -> Option<Header> {
    let line_end = find_line_end(bytes, *cursor);
    let line = std::str::from_utf8(&bytes[*cursor..line_end]).ok()?;
    let mut fields = line.split_ascii_whitespace();
    let rows: u32 = fields.next()?.parse().ok()?;
    let cols: u32 = fields.next()?.parse().ok()?;
    let nnz: u64 = fields.next()?.parse().ok()?;
    *cursor = line_end;
    if *cursor < bytes.len() {
        *cursor += 1;
    }
    Some(Header { rows, cols, nnz })
}

fn parse_edge_line(bytes: &[u8], cursor: &mut usize) -> Option<(u32, u32)> {
    while *cursor < bytes.len() {
        let line_end = find_line_end(bytes, *cursor);
        let line = std::str::from_utf8(&bytes[*cursor..line_end]).ok();
        let start = *cursor;
        *cursor = if line_end < bytes.len() { line_end + 1 } else { line_end };
        let line = line?;
        let mut fields = line.split_ascii_whitespace();
        let u = fields.next().and_then(|f| f.parse::<u32>().ok());
        let v = fields.next().and_then(|f| f.parse::<u32>().ok());
        if let (Some(u), Some(v)) = (u, v) {
            return Some((u, v));
        }
        if start == *cursor {
            // no progress was made (e.g. trailing blank byte) — bail to avoid looping forever
            return None;
        }
    }
    None
}

fn find_line_end(bytes: &[u8], start: usize) -> usize {
    bytes[start..]
        .iter()
        .position(|&b| b == b'\n')
        .map(|i| start + i)
        .unwrap_or(bytes.len())
}

/// In-memory source used by tests to avoid touching the filesystem (spec
/// §9's substitutability requirement).
pub struct VecGraphSource {
    edges: std::vec::IntoIter<Edge>,
    header: Option<Header>,
}

impl VecGraphSource {
    pub fn new(edges: Vec<Edge>) -> Self {
        VecGraphSource { edges: edges.into_iter(), header: None }
    }

    pub fn with_header(edges: Vec<Edge>, header: Header) -> Self {
        VecGraphSource { edges: edges.into_iter(), header: Some(header) }
    }
}

impl GraphSource for VecGraphSource {
    fn next_edge(&mut self) -> Option<Edge> {
        self.edges.next()
    }

    fn header(&self) -> Option<Header> {
        self.header
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn parses_header_and_edges() {
        let file = write_temp("4 4 3\n0 1\n1 2\n2 3\n");
        let mut source = MmapGraphSource::open(file.path()).unwrap();
        assert_eq!(source.header(), Some(Header { rows: 4, cols: 4, nnz: 3 }));
        assert_eq!(source.next_edge(), Edge::canonical(0, 1));
        assert_eq!(source.next_edge(), Edge::canonical(1, 2));
        assert_eq!(source.next_edge(), Edge::canonical(2, 3));
        assert_eq!(source.next_edge(), None);
    }

    #[test]
    fn skips_comment_lines_before_header() {
        let file = write_temp("% generated by a test\n% second comment\n2 2 1\n0 1\n");
        let mut source = MmapGraphSource::open(file.path()).unwrap();
        assert_eq!(source.header().unwrap().nnz, 1);
        assert_eq!(source.next_edge(), Edge::canonical(0, 1));
    }

    #[test]
    fn discards_self_loops() {
        let file = write_temp("3 3 2\n0 0\n0 1\n");
        let mut source = MmapGraphSource::open(file.path()).unwrap();
        assert_eq!(source.next_edge(), Edge::canonical(0, 1));
        assert_eq!(source.next_edge(), None);
    }

    #[test]
    fn vec_source_round_trips() {
        let edges = vec![Edge::canonical(0, 1).unwrap(), Edge::canonical(2, 3).unwrap()];
        let mut source = VecGraphSource::new(edges.clone());
        assert_eq!(source.next_edge(), Some(edges[0]));
        assert_eq!(source.next_edge(), Some(edges[1]));
        assert_eq!(source.next_edge(), None);
    }
}
