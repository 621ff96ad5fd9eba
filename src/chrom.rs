//! Per-chromosome bin lists
//!
//! A [`ChromosomeIndex`] holds the bins of one contiguous chromosome block of the source
//! file. Bin starts and file offsets are stored as two parallel arrays so that each can be
//! written to the index container as a single run of fixed-width integers.

use std::io::Write;

use byteorder::{ByteOrder, LittleEndian, WriteBytesExt};

use crate::{
    error::{IndexError, Result},
    utils::take,
};

/// Width of the NUL-padded chromosome name field in bytes
pub const NAME_SIZE: usize = 32;

/// Longest chromosome name accepted when building (one byte is kept for the NUL terminator)
pub const MAX_NAME_LEN: usize = NAME_SIZE - 1;

/// Number of bins reserved each time the bin arrays run out of capacity
pub const BIN_CHUNK: usize = 0x400;

/// Serialized size of a single bin (u32 start + u64 offset)
const SIZE_BIN: usize = 12;

/// A coordinate boundary paired with the byte offset at which it was opened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bin {
    /// Coordinate at which the bin begins
    pub start: u32,
    /// Byte offset of the first source line recorded for this bin
    pub offset: u64,
}

/// Ordered bin list covering one chromosome's observed positions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChromosomeIndex {
    /// Chromosome name as it appears in the first field of the source
    name: String,

    /// Start coordinate of each bin (strictly increasing by the bin size)
    bin_starts: Vec<u32>,

    /// Byte offset recorded for each bin
    offsets: Vec<u64>,
}
impl ChromosomeIndex {
    /// Creates an empty chromosome index
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::NameTooLong`] if `name` does not fit the fixed-width name field.
    pub fn new(name: &str) -> Result<Self> {
        if name.len() > MAX_NAME_LEN {
            return Err(IndexError::NameTooLong {
                name: name.to_string(),
                max: MAX_NAME_LEN,
            }
            .into());
        }
        Ok(Self {
            name: name.to_string(),
            bin_starts: Vec::new(),
            offsets: Vec::new(),
        })
    }

    /// Appends a bin, growing storage in chunks of [`BIN_CHUNK`]
    pub(crate) fn push_bin(&mut self, start: u32, offset: u64) -> Result<()> {
        if self.bin_starts.len() == self.bin_starts.capacity() {
            self.bin_starts.try_reserve_exact(BIN_CHUNK)?;
        }
        if self.offsets.len() == self.offsets.capacity() {
            self.offsets.try_reserve_exact(BIN_CHUNK)?;
        }
        self.bin_starts.push(start);
        self.offsets.push(offset);
        Ok(())
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn n_bins(&self) -> usize {
        self.bin_starts.len()
    }

    #[must_use]
    pub fn bin_starts(&self) -> &[u32] {
        &self.bin_starts
    }

    #[must_use]
    pub fn offsets(&self) -> &[u64] {
        &self.offsets
    }

    #[must_use]
    pub fn bin(&self, idx: usize) -> Option<Bin> {
        Some(Bin {
            start: *self.bin_starts.get(idx)?,
            offset: *self.offsets.get(idx)?,
        })
    }

    /// Estimates which bin to seek to for records at or after `start`
    ///
    /// The candidate is `(start - first_bin_start) / bin_size`, clamped to the first bin
    /// below the indexed range and to the last bin beyond it. After a large gap the bin
    /// starts lag behind the recorded positions, so the candidate is only a starting point;
    /// [`search`](crate::search) steps back from it until the seek point precedes `start`.
    ///
    /// Returns `None` for a chromosome without bins.
    #[must_use]
    pub fn candidate_bin(&self, start: u32, bin_size: u32) -> Option<usize> {
        let first = *self.bin_starts.first()?;
        let idx = start
            .saturating_sub(first)
            .checked_div(bin_size)
            .unwrap_or(0) as usize;
        Some(idx.min(self.n_bins() - 1))
    }

    /// Number of bytes this record occupies in the index container
    #[must_use]
    pub fn serialized_size(&self) -> usize {
        NAME_SIZE + 4 + self.n_bins() * SIZE_BIN
    }

    /// Serializes the chromosome record
    ///
    /// Layout: 32-byte NUL-padded name, u32 bin count, bin starts (u32 each), then
    /// offsets (u64 each), all little endian.
    pub fn write_bytes<W: Write>(&self, writer: &mut W) -> Result<()> {
        if self.name.len() > MAX_NAME_LEN {
            return Err(IndexError::NameTooLong {
                name: self.name.clone(),
                max: MAX_NAME_LEN,
            }
            .into());
        }
        let mut name = [0u8; NAME_SIZE];
        name[..self.name.len()].copy_from_slice(self.name.as_bytes());
        writer.write_all(&name)?;
        writer.write_u32::<LittleEndian>(self.n_bins() as u32)?;
        self.bin_starts
            .iter()
            .try_for_each(|&start| writer.write_u32::<LittleEndian>(start))?;
        self.offsets
            .iter()
            .try_for_each(|&offset| writer.write_u64::<LittleEndian>(offset))?;
        Ok(())
    }

    /// Deserializes the chromosome record starting at `pos`, advancing `pos` past it
    ///
    /// `record` is the index of this record in the container and is only used for error
    /// reporting. Bin arrays are bounds-checked before they are allocated.
    pub(crate) fn from_buffer(buffer: &[u8], pos: &mut usize, record: usize) -> Result<Self> {
        let raw_name = take(buffer, pos, NAME_SIZE)?;
        let name_len = raw_name.iter().position(|&b| b == 0).unwrap_or(NAME_SIZE);
        let name = std::str::from_utf8(&raw_name[..name_len])
            .map_err(|_| IndexError::InvalidName(record))?
            .to_string();

        let n_bins = LittleEndian::read_u32(take(buffer, pos, 4)?) as usize;
        let starts = take(buffer, pos, n_bins.saturating_mul(4))?;
        let offsets = take(buffer, pos, n_bins.saturating_mul(8))?;

        let mut bin_starts = Vec::new();
        bin_starts.try_reserve_exact(n_bins)?;
        bin_starts.extend(starts.chunks_exact(4).map(LittleEndian::read_u32));

        let mut bin_offsets = Vec::new();
        bin_offsets.try_reserve_exact(n_bins)?;
        bin_offsets.extend(offsets.chunks_exact(8).map(LittleEndian::read_u64));

        Ok(Self {
            name,
            bin_starts,
            offsets: bin_offsets,
        })
    }
}
