//! # vcfidx
//!
//! A positional bin index for large, sorted, line-oriented genomic record files (VCF and
//! similar). The index records, for each chromosome, a sparse list of coordinate bins and
//! the byte offset at which each bin was opened, so that a region query can seek close to
//! its answer instead of scanning the file from the beginning.
//!
//! The lifecycle is build once, persist, query many:
//!
//! 1. [`IndexBuilder`] scans the source once and produces an [`Index`]. The source must be
//!    grouped by chromosome and non-decreasing in position within each group.
//! 2. [`Index::save_to_path`] writes the compact binary container (conventionally next to
//!    the source as `<source>.idx`, see [`index_path`]).
//! 3. [`Index::from_path`] reloads it; [`search`], [`Searcher`], or [`search_parallel`]
//!    answer region queries by seeking into the source and confirming bounds line by line.
//!
//! ## Example
//!
//! ```rust,no_run
//! use vcfidx::{search_path, Index, IndexBuilder};
//!
//! let source = "calls.sorted.vcf";
//! IndexBuilder::new().bin_size(1000).build_and_save(source).unwrap();
//!
//! let index = Index::load_for(source).unwrap();
//! let hits = search_path(source, &index, "chr5", 11814, 12112).unwrap();
//! match hits.first_offset {
//!     Some(offset) => println!("{} records, first at byte {offset}", hits.count),
//!     None => println!("no records in region"),
//! }
//! ```
//!
//! ## Query semantics
//!
//! Queries are inclusive on both ends. An inverted range or an unknown chromosome is not an
//! error and yields [`RegionHits::empty`]. If the source repeated a chromosome block after a
//! different chromosome, the index holds one entry per block and queries only see the first.

mod builder;
mod chrom;
mod error;
mod header;
mod index;
mod parallel;
mod region;
mod scanner;
mod search;
mod utils;

pub use builder::{IndexBuilder, DEFAULT_BIN_SIZE};
pub use chrom::{Bin, ChromosomeIndex, MAX_NAME_LEN, NAME_SIZE};
pub use error::{BuildError, Error, IndexError, RegionError, Result, ScanError};
pub use header::{IndexHeader, MAGIC, SIZE_HEADER};
pub use index::Index;
pub use parallel::search_parallel;
pub use region::Region;
pub use scanner::{parse_fields, Scanner, SourceRecord};
pub use search::{for_each_in_region, search, search_path, RegionHits, Searcher};
pub use utils::{index_path, INDEX_SUFFIX};
