//! Header module for the vcfidx index container
//!
//! The header is the fixed 12-byte preamble of an index file. It identifies the file
//! as an index, records the bin size shared by every chromosome, and declares how many
//! chromosome records follow.

use byteorder::{ByteOrder, LittleEndian};
use std::io::Write;

use crate::error::{IndexError, Result};

/// Magic bytes at the start of every index file: "IDX" followed by format version 1
pub const MAGIC: [u8; 4] = *b"IDX\x01";

/// Size of the header in bytes
pub const SIZE_HEADER: usize = 12;

/// Header structure for index files
///
/// Serialized layout (little endian):
/// - Bytes 0-3: magic (`IDX\x01`)
/// - Bytes 4-7: bin size (u32)
/// - Bytes 8-11: number of chromosome records (u32)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexHeader {
    /// Magic bytes identifying the file format
    ///
    /// 4 bytes
    pub magic: [u8; 4],

    /// Width of every bin in coordinate units
    ///
    /// 4 bytes
    pub bin_size: u32,

    /// Number of chromosome records following the header
    ///
    /// 4 bytes
    pub n_chroms: u32,
}
impl IndexHeader {
    /// Creates a new header for an index with the given bin size and chromosome count
    #[must_use]
    pub fn new(bin_size: u32, n_chroms: u32) -> Self {
        Self {
            magic: MAGIC,
            bin_size,
            n_chroms,
        }
    }

    /// Parses a header from a fixed-size byte array
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::BadMagic`] if the first four bytes are not [`MAGIC`].
    pub fn from_bytes(buffer: &[u8; SIZE_HEADER]) -> Result<Self> {
        let mut magic = [0u8; 4];
        magic.copy_from_slice(&buffer[0..4]);
        if magic != MAGIC {
            return Err(IndexError::BadMagic(magic).into());
        }
        Ok(Self {
            magic,
            bin_size: LittleEndian::read_u32(&buffer[4..8]),
            n_chroms: LittleEndian::read_u32(&buffer[8..12]),
        })
    }

    /// Parses a header from the beginning of an arbitrarily sized buffer
    ///
    /// The magic is checked as soon as four bytes are available, so a short file that is
    /// not an index at all reports [`IndexError::BadMagic`] rather than a truncation.
    pub fn from_buffer(buffer: &[u8]) -> Result<Self> {
        if buffer.len() >= MAGIC.len() && buffer[..MAGIC.len()] != MAGIC {
            let mut magic = [0u8; 4];
            magic.copy_from_slice(&buffer[..MAGIC.len()]);
            return Err(IndexError::BadMagic(magic).into());
        }
        if buffer.len() < SIZE_HEADER {
            return Err(IndexError::Truncated {
                needed: SIZE_HEADER,
                available: buffer.len(),
            }
            .into());
        }
        let mut bytes = [0u8; SIZE_HEADER];
        bytes.copy_from_slice(&buffer[..SIZE_HEADER]);
        Self::from_bytes(&bytes)
    }

    /// Writes the header to a writer
    pub fn write_bytes<W: Write>(&self, writer: &mut W) -> Result<()> {
        let mut buffer = [0u8; SIZE_HEADER];
        buffer[0..4].copy_from_slice(&self.magic);
        LittleEndian::write_u32(&mut buffer[4..8], self.bin_size);
        LittleEndian::write_u32(&mut buffer[8..12], self.n_chroms);
        writer.write_all(&buffer)?;
        Ok(())
    }
}
