//! In-memory index and its binary container
//!
//! An [`Index`] is built once from a sorted source file (see [`IndexBuilder`](crate::IndexBuilder)),
//! optionally persisted next to the source, and reloaded any number of times. It is never
//! mutated once built.
//!
//! ```text
//! ┌──────────────────────┐
//! │   Index Header       │ 12 bytes
//! ├──────────────────────┤
//! │ name (32) │ n (4)    │
//! │ n × bin start (u32)  │ chromosome record
//! │ n × offset (u64)     │
//! ├──────────────────────┤
//! │         ...          │ one record per chromosome block
//! └──────────────────────┘
//! ```

use std::{
    fs::File,
    io::{BufWriter, Read, Write},
    path::Path,
    time::Instant,
};

use log::{info, warn};
use memmap2::Mmap;

use crate::{
    chrom::ChromosomeIndex,
    error::{Error, IndexError, Result},
    header::{IndexHeader, SIZE_HEADER},
    utils::index_path,
};

/// Number of chromosome slots reserved each time the chromosome list runs out of capacity
pub const CHROM_CHUNK: usize = 0x20;

/// Positional bin index over a sorted record file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Index {
    /// Width of every bin in coordinate units
    bin_size: u32,

    /// Chromosome blocks in order of first appearance in the source
    chroms: Vec<ChromosomeIndex>,
}
impl Index {
    pub(crate) fn new(bin_size: u32) -> Self {
        Self {
            bin_size,
            chroms: Vec::new(),
        }
    }

    /// Appends a finished chromosome block, growing storage in chunks of [`CHROM_CHUNK`]
    pub(crate) fn push_chromosome(&mut self, chrom: ChromosomeIndex) -> Result<()> {
        if self.chroms.len() == self.chroms.capacity() {
            self.chroms.try_reserve_exact(CHROM_CHUNK)?;
        }
        self.chroms.push(chrom);
        Ok(())
    }

    #[must_use]
    pub fn bin_size(&self) -> u32 {
        self.bin_size
    }

    #[must_use]
    pub fn n_chromosomes(&self) -> usize {
        self.chroms.len()
    }

    /// Total number of bins across all chromosomes
    #[must_use]
    pub fn n_bins(&self) -> usize {
        self.chroms.iter().map(ChromosomeIndex::n_bins).sum()
    }

    #[must_use]
    pub fn chromosomes(&self) -> &[ChromosomeIndex] {
        &self.chroms
    }

    /// Resolves a chromosome name to its bin list
    ///
    /// A linear scan over the chromosome list; if the source repeated a chromosome block,
    /// the first block wins.
    #[must_use]
    pub fn get_chromosome(&self, name: &str) -> Option<&ChromosomeIndex> {
        self.chroms.iter().find(|chrom| chrom.name() == name)
    }

    #[must_use]
    pub fn header(&self) -> IndexHeader {
        IndexHeader::new(self.bin_size, self.chroms.len() as u32)
    }

    /// Number of bytes the index occupies once serialized
    #[must_use]
    pub fn serialized_size(&self) -> usize {
        SIZE_HEADER
            + self
                .chroms
                .iter()
                .map(ChromosomeIndex::serialized_size)
                .sum::<usize>()
    }

    /// Serializes the header and every chromosome record, back to back
    pub fn write_bytes<W: Write>(&self, writer: &mut W) -> Result<()> {
        self.header().write_bytes(writer)?;
        self.chroms
            .iter()
            .try_for_each(|chrom| chrom.write_bytes(writer))
    }

    /// Saves the index to a file
    ///
    /// # Errors
    ///
    /// Returns [`Error::FileOpen`] if `path` cannot be created.
    pub fn save_to_path<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let start = Instant::now();
        let mut writer = File::create(path)
            .map(BufWriter::new)
            .map_err(|e| Error::file_open(path, e))?;
        self.write_bytes(&mut writer)?;
        writer.flush()?;
        info!(
            "Saved index to {} ({} bytes) in {:.2?}",
            path.display(),
            self.serialized_size(),
            start.elapsed()
        );
        Ok(())
    }

    /// Deserializes an index from a complete in-memory container
    ///
    /// # Errors
    ///
    /// * [`IndexError::BadMagic`] if the buffer is not an index
    /// * [`IndexError::Truncated`] if the buffer ends before the header's promises are met
    pub fn from_bytes(buffer: &[u8]) -> Result<Self> {
        let header = IndexHeader::from_buffer(buffer)?;
        let mut index = Self::new(header.bin_size);
        let mut pos = SIZE_HEADER;
        for record in 0..header.n_chroms as usize {
            let chrom = ChromosomeIndex::from_buffer(buffer, &mut pos, record)?;
            index.push_chromosome(chrom)?;
        }
        if pos < buffer.len() {
            warn!(
                "Ignoring {} trailing bytes after the last chromosome record",
                buffer.len() - pos
            );
        }
        Ok(index)
    }

    /// Reads an index from any reader
    pub fn from_reader<R: Read>(mut reader: R) -> Result<Self> {
        let mut buffer = Vec::new();
        reader.read_to_end(&mut buffer)?;
        Self::from_bytes(&buffer)
    }

    /// Reads an index file from a path
    ///
    /// # Errors
    ///
    /// Returns [`Error::FileOpen`] if `path` cannot be opened, otherwise the same errors
    /// as [`Index::from_bytes`].
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let start = Instant::now();
        let file = File::open(path).map_err(|e| Error::file_open(path, e))?;
        let mmap = unsafe { Mmap::map(&file)? };
        let index = Self::from_bytes(&mmap)?;
        info!(
            "Loaded index {} ({} chromosomes, {} bins) in {:.2?}",
            path.display(),
            index.n_chromosomes(),
            index.n_bins(),
            start.elapsed()
        );
        Ok(index)
    }

    /// Loads the index stored next to `source` (`<source>.idx`)
    pub fn load_for<P: AsRef<Path>>(source: P) -> Result<Self> {
        Self::from_path(index_path(source))
    }
}
