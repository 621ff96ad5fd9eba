use std::path::PathBuf;

/// Custom Result type for vcfidx operations, wrapping the custom [`Error`] type
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for the vcfidx library, encompassing all fatal error cases
/// that can occur while building, persisting, loading, or querying an index.
///
/// Recoverable query mistakes (an inverted range, an unknown chromosome) are not
/// errors: they produce an empty [`RegionHits`](crate::RegionHits).
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// A source or index path could not be opened or created
    #[error("Failed to open {}: {source}", path.display())]
    FileOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Memory for the bin or chromosome arrays could not be obtained
    #[error("Failed to allocate index storage: {0}")]
    Allocation(#[from] std::collections::TryReserveError),

    /// Errors related to the binary index container
    #[error(transparent)]
    IndexError(#[from] IndexError),

    /// Errors raised while building an index from a source file
    #[error(transparent)]
    BuildError(#[from] BuildError),

    /// Errors raised while tokenizing source records
    #[error(transparent)]
    ScanError(#[from] ScanError),

    /// Errors raised while parsing a region string
    #[error(transparent)]
    RegionError(#[from] RegionError),

    /// Standard I/O errors from the Rust standard library
    #[error(transparent)]
    IoError(#[from] std::io::Error),

    /// Generic errors that can occur in any part of the system
    #[error(transparent)]
    AnyhowError(#[from] anyhow::Error),
}
impl Error {
    /// Wraps an I/O error raised while opening `path`
    pub fn file_open<P: Into<PathBuf>>(path: P, source: std::io::Error) -> Self {
        Self::FileOpen {
            path: path.into(),
            source,
        }
    }
}

/// Errors specific to reading and writing the binary index container
#[derive(thiserror::Error, Debug)]
pub enum IndexError {
    /// The leading bytes do not match the index magic
    ///
    /// # Arguments
    /// * `[u8; 4]` - The bytes that were found instead
    #[error("Invalid magic bytes: {0:02x?} - not an index file")]
    BadMagic([u8; 4]),

    /// Fewer bytes are available than the header or a chromosome record promises
    ///
    /// # Fields
    /// * `needed` - Total number of bytes required to read the next field
    /// * `available` - Total number of bytes present in the container
    #[error("Index is truncated: needed {needed} bytes, only {available} available")]
    Truncated { needed: usize, available: usize },

    /// A chromosome name does not fit in the fixed-width name field
    ///
    /// # Fields
    /// * `name` - The offending chromosome name
    /// * `max` - The largest accepted name length in bytes
    #[error("Chromosome name '{name}' exceeds {max} bytes")]
    NameTooLong { name: String, max: usize },

    /// A stored chromosome name is not valid UTF-8
    #[error("Chromosome record {0} has a non UTF-8 name")]
    InvalidName(usize),
}

/// Errors that can occur while building an index
#[derive(thiserror::Error, Debug)]
pub enum BuildError {
    /// A position decreased within a contiguous chromosome block
    ///
    /// # Fields
    /// * `chrom` - The chromosome block in which the violation occurred
    /// * `line` - The 1-based line number of the offending record
    /// * `position` - The offending position
    /// * `previous` - The last position accepted for this chromosome
    #[error(
        "Source must be sorted by chromosome and position: {chrom}:{position} on line {line} follows {chrom}:{previous}"
    )]
    OrderViolation {
        chrom: String,
        line: usize,
        position: u32,
        previous: u32,
    },

    /// Bins must cover at least one coordinate
    #[error("Bin size must be greater than zero")]
    InvalidBinSize,
}

/// Errors that can occur while tokenizing a source record
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    /// A record line is missing the chromosome/position fields or the position is not an integer
    ///
    /// # Fields
    /// * `line` - The 1-based line number, counted from where scanning started
    /// * `offset` - The byte offset of the start of the line
    /// * `content` - The offending line, lossily decoded
    #[error("Malformed record at line {line} (byte offset {offset}): '{content}'")]
    MalformedRecord {
        line: usize,
        offset: u64,
        content: String,
    },
}

/// Errors raised while parsing a `chrom:start-end` region
#[derive(thiserror::Error, Debug)]
pub enum RegionError {
    /// The region string could not be parsed
    #[error("Invalid region '{0}': expected CHROM:START-END")]
    InvalidRegion(String),
}
