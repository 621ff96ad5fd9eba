//! Line scanner for sorted, whitespace-delimited record files
//!
//! The scanner walks a source file one line at a time, skipping `#` comments and blank
//! lines, and yields the chromosome, position, and starting byte offset of each record.
//! It is used once front-to-back when building an index, and from an arbitrary offset
//! when confirming the bounds of a region query.

use std::{
    fs::File,
    io::{BufRead, BufReader, Seek, SeekFrom},
    path::Path,
};

use crate::error::{Error, Result, ScanError};

/// Leading byte that marks a comment or header line
pub const COMMENT: u8 = b'#';

/// A borrowed view of one record line
#[derive(Debug, Clone, Copy)]
pub struct SourceRecord<'a> {
    /// First field of the line
    pub chrom: &'a str,
    /// Second field of the line
    pub position: u32,
    /// Byte offset of the first byte of the line
    pub offset: u64,
    /// Line number counted from where scanning started (1-based)
    pub line: usize,
    /// The raw line, including its terminating newline if present
    pub raw: &'a [u8],
}

/// Splits the first two whitespace-delimited fields off a line
///
/// Returns `None` when the line has fewer than two fields, the chromosome is not UTF-8,
/// or the position is not an unsigned integer.
#[must_use]
pub fn parse_fields(line: &[u8]) -> Option<(&str, u32)> {
    let mut fields = line
        .split(u8::is_ascii_whitespace)
        .filter(|field| !field.is_empty());
    let chrom = std::str::from_utf8(fields.next()?).ok()?;
    let position = std::str::from_utf8(fields.next()?).ok()?.parse().ok()?;
    Some((chrom, position))
}

fn is_skippable(line: &[u8]) -> bool {
    match line.first() {
        Some(&COMMENT) => true,
        _ => line.iter().all(u8::is_ascii_whitespace),
    }
}

/// Streams records out of a buffered reader while tracking byte offsets
#[derive(Debug)]
pub struct Scanner<R: BufRead> {
    /// Inner reader
    inner: R,

    /// Reusable line buffer
    buffer: Vec<u8>,

    /// Byte offset of the next unread line
    offset: u64,

    /// Number of lines consumed so far
    n_lines: usize,
}
impl Scanner<BufReader<File>> {
    /// Opens a source file for scanning from its first byte
    ///
    /// # Errors
    ///
    /// Returns [`Error::FileOpen`] if the file cannot be opened.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| Error::file_open(path, e))?;
        Ok(Self::new(BufReader::new(file)))
    }
}
impl<R: BufRead> Scanner<R> {
    /// Creates a scanner that assumes `inner` is positioned at byte 0
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            buffer: Vec::new(),
            offset: 0,
            n_lines: 0,
        }
    }

    /// Byte offset of the next unread line
    #[must_use]
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Advances to the next record, skipping comments and blank lines
    ///
    /// Returns `None` at the end of input.
    pub fn next(&mut self) -> Option<Result<SourceRecord<'_>>> {
        loop {
            self.buffer.clear();
            let start = self.offset;
            match self.inner.read_until(b'\n', &mut self.buffer) {
                Ok(0) => return None,
                Ok(n) => self.offset += n as u64,
                Err(e) => return Some(Err(e.into())),
            }
            self.n_lines += 1;
            if is_skippable(&self.buffer) {
                continue;
            }
            let line = self.n_lines;
            let Some((chrom, position)) = parse_fields(&self.buffer) else {
                return Some(Err(ScanError::MalformedRecord {
                    line,
                    offset: start,
                    content: String::from_utf8_lossy(&self.buffer).trim_end().to_string(),
                }
                .into()));
            };
            return Some(Ok(SourceRecord {
                chrom,
                position,
                offset: start,
                line,
                raw: &self.buffer,
            }));
        }
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}
impl<R: BufRead + Seek> Scanner<R> {
    /// Repositions the scanner so that the next record starts at `offset`
    ///
    /// Line numbers restart from this point.
    pub fn seek(&mut self, offset: u64) -> Result<()> {
        self.inner.seek(SeekFrom::Start(offset))?;
        self.offset = offset;
        self.n_lines = 0;
        Ok(())
    }
}
