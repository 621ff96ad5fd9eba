//! Index construction
//!
//! The builder makes a single pass over a sorted source file. Each contiguous chromosome
//! block becomes one [`ChromosomeIndex`]; within a block a new bin is opened whenever a
//! record lands more than one bin size past the active bin's start.
//!
//! Bin starts advance by exactly one bin size per triggering record, however large the
//! gap to the new position is. After a long gap the bin starts lag behind the observed
//! positions until enough records arrive to catch up; queries into such regions seek to
//! the nearest earlier recorded offset and scan forward from there.

use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
    time::Instant,
};

use log::{debug, info, warn};

use crate::{
    chrom::ChromosomeIndex,
    error::{BuildError, Error, Result},
    index::Index,
    scanner::{Scanner, SourceRecord},
    utils::index_path,
};

/// Bin size used when none is configured
pub const DEFAULT_BIN_SIZE: u32 = 1000;

/// Builder for [`Index`] construction
///
/// # Examples
///
/// ```rust,no_run
/// use vcfidx::IndexBuilder;
///
/// let index = IndexBuilder::new()
///     .bin_size(500)
///     .build_from_path("calls.sorted.vcf")
///     .unwrap();
/// println!("Indexed {} chromosomes", index.n_chromosomes());
/// ```
#[derive(Debug, Clone, Copy)]
pub struct IndexBuilder {
    bin_size: Option<u32>,
}
impl Default for IndexBuilder {
    fn default() -> Self {
        Self::new()
    }
}
impl IndexBuilder {
    #[must_use]
    pub fn new() -> Self {
        IndexBuilder { bin_size: None }
    }

    #[must_use]
    pub fn bin_size(mut self, bin_size: u32) -> Self {
        self.bin_size = Some(bin_size);
        self
    }

    fn resolve_bin_size(self) -> Result<u32> {
        match self.bin_size.unwrap_or(DEFAULT_BIN_SIZE) {
            0 => Err(BuildError::InvalidBinSize.into()),
            bin_size => Ok(bin_size),
        }
    }

    /// Builds an index by scanning the source file at `path`
    ///
    /// # Errors
    ///
    /// * [`Error::FileOpen`] if the source cannot be opened
    /// * [`BuildError::OrderViolation`] if positions decrease within a chromosome block
    /// * [`ScanError::MalformedRecord`](crate::ScanError::MalformedRecord) on unparseable lines
    pub fn build_from_path<P: AsRef<Path>>(self, path: P) -> Result<Index> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| Error::file_open(path, e))?;
        info!("Building index for {}", path.display());
        self.build_from_reader(BufReader::new(file))
    }

    /// Builds an index from any buffered reader positioned at the start of the source
    pub fn build_from_reader<R: BufRead>(self, reader: R) -> Result<Index> {
        let bin_size = self.resolve_bin_size()?;
        let start = Instant::now();

        let mut index = Index::new(bin_size);
        let mut scanner = Scanner::new(reader);
        let mut active: Option<ActiveChrom> = None;
        let mut n_records = 0usize;

        while let Some(record) = scanner.next() {
            let record = record?;
            n_records += 1;
            match active.as_mut() {
                Some(chrom) if chrom.index.name() == record.chrom => {
                    chrom.observe(&record, bin_size)?;
                }
                _ => {
                    if let Some(done) = active.take() {
                        done.close(&mut index)?;
                    }
                    if index.get_chromosome(record.chrom).is_some() {
                        warn!(
                            "Chromosome {} reappears at line {}; source is not grouped by chromosome",
                            record.chrom, record.line
                        );
                    }
                    active = Some(ActiveChrom::open(&record, bin_size)?);
                }
            }
        }
        if let Some(done) = active.take() {
            done.close(&mut index)?;
        }

        info!(
            "Indexed {} records ({} chromosomes, {} bins, bin size {}) in {:.2?}",
            n_records,
            index.n_chromosomes(),
            index.n_bins(),
            bin_size,
            start.elapsed()
        );
        Ok(index)
    }

    /// Builds the index for `source` and saves it next to it as `<source>.idx`
    pub fn build_and_save<P: AsRef<Path>>(self, source: P) -> Result<Index> {
        let index = self.build_from_path(&source)?;
        index.save_to_path(index_path(&source))?;
        Ok(index)
    }
}

/// The chromosome block currently being accumulated
struct ActiveChrom {
    index: ChromosomeIndex,

    /// Start of the most recently opened bin
    bin_start: u32,

    /// Last position accepted for this block
    last_position: u32,
}
impl ActiveChrom {
    fn open(record: &SourceRecord<'_>, bin_size: u32) -> Result<Self> {
        let mut index = ChromosomeIndex::new(record.chrom)?;
        let bin_start = record.position - record.position % bin_size;
        index.push_bin(bin_start, record.offset)?;
        Ok(Self {
            index,
            bin_start,
            last_position: record.position,
        })
    }

    fn observe(&mut self, record: &SourceRecord<'_>, bin_size: u32) -> Result<()> {
        if record.position < self.last_position {
            return Err(BuildError::OrderViolation {
                chrom: record.chrom.to_string(),
                line: record.line,
                position: record.position,
                previous: self.last_position,
            }
            .into());
        }
        self.last_position = record.position;

        // one bin per triggering record, regardless of the gap
        if record.position - self.bin_start > bin_size {
            self.bin_start += bin_size;
            self.index.push_bin(self.bin_start, record.offset)?;
        }
        Ok(())
    }

    fn close(self, index: &mut Index) -> Result<()> {
        debug!(
            "Closed chromosome {} with {} bins",
            self.index.name(),
            self.index.n_bins()
        );
        index.push_chromosome(self.index)
    }
}

#[cfg(test)]
mod testing {
    use super::*;
    use std::io::Cursor;

    use crate::{IndexError, ScanError};

    fn build(source: &str, bin_size: u32) -> Result<Index> {
        IndexBuilder::new()
            .bin_size(bin_size)
            .build_from_reader(Cursor::new(source.as_bytes()))
    }

    fn line_offset(source: &str, needle: &str) -> u64 {
        source.find(needle).unwrap() as u64
    }

    #[test]
    fn test_literal_bins() -> Result<()> {
        let source = "#CHROM\tPOS\nchr1\t100\tA\nchr1\t250\tB\nchr1\t500\tC\nchr1\t900\tD\n";
        let index = build(source, 200)?;
        let chr1 = index.get_chromosome("chr1").unwrap();
        assert_eq!(chr1.bin_starts(), &[0, 200, 400, 600]);
        assert_eq!(
            chr1.offsets(),
            &[
                line_offset(source, "chr1\t100"),
                line_offset(source, "chr1\t250"),
                line_offset(source, "chr1\t500"),
                line_offset(source, "chr1\t900"),
            ]
        );
        Ok(())
    }

    #[test]
    fn test_first_bin_is_floored() -> Result<()> {
        let index = build("chr1\t1234\nchr1\t1300\n", 1000)?;
        assert_eq!(index.chromosomes()[0].bin_starts(), &[1000]);
        Ok(())
    }

    #[test]
    fn test_bin_opens_only_past_bin_size() -> Result<()> {
        // 200 - 0 is not greater than the bin size, 201 - 0 is
        let index = build("chr1\t0\nchr1\t200\nchr1\t201\n", 200)?;
        let chr1 = &index.chromosomes()[0];
        assert_eq!(chr1.bin_starts(), &[0, 200]);
        assert_eq!(chr1.offsets(), &[0, 16]);
        Ok(())
    }

    #[test]
    fn test_large_gap_advances_one_bin() -> Result<()> {
        let source = "chr1\t10\nchr1\t5000\nchr1\t5001\nchr1\t5002\n";
        let index = build(source, 100)?;
        let chr1 = &index.chromosomes()[0];
        assert_eq!(chr1.bin_starts(), &[0, 100, 200, 300]);
        assert_eq!(
            chr1.offsets(),
            &[
                0,
                line_offset(source, "chr1\t5000"),
                line_offset(source, "chr1\t5001"),
                line_offset(source, "chr1\t5002"),
            ]
        );
        Ok(())
    }

    #[test]
    fn test_chromosome_order_and_reset() -> Result<()> {
        let source = "chr2\t900\nchr2\t950\nchr1\t5\nchr10\t1\n";
        let index = build(source, 100)?;
        let names: Vec<_> = index.chromosomes().iter().map(ChromosomeIndex::name).collect();
        assert_eq!(names, vec!["chr2", "chr1", "chr10"]);
        assert_eq!(index.get_chromosome("chr1").unwrap().bin_starts(), &[0]);
        Ok(())
    }

    #[test]
    fn test_order_violation() {
        let source = "chr1\t100\nchr1\t300\nchr1\t200\nchr1\tnot-a-number\n";
        match build(source, 100) {
            Err(Error::BuildError(BuildError::OrderViolation {
                chrom,
                line,
                position,
                previous,
            })) => {
                assert_eq!(chrom, "chr1");
                assert_eq!(line, 3);
                assert_eq!(position, 200);
                assert_eq!(previous, 300);
            }
            other => panic!("expected order violation, got {other:?}"),
        }
    }

    #[test]
    fn test_equal_positions_are_sorted() -> Result<()> {
        let index = build("chr1\t100\nchr1\t100\nchr1\t100\n", 100)?;
        assert_eq!(index.n_bins(), 1);
        Ok(())
    }

    #[test]
    fn test_repeated_chromosome_block() -> Result<()> {
        let index = build("chr1\t500\nchr2\t10\nchr1\t20\n", 100)?;
        assert_eq!(index.n_chromosomes(), 3);
        let first = index.get_chromosome("chr1").unwrap();
        assert_eq!(first.bin_starts(), &[500]);
        assert_eq!(index.chromosomes()[2].bin_starts(), &[0]);
        Ok(())
    }

    #[test]
    fn test_invalid_bin_size() {
        assert!(matches!(
            build("chr1\t1\n", 0),
            Err(Error::BuildError(BuildError::InvalidBinSize))
        ));
    }

    #[test]
    fn test_default_bin_size() -> Result<()> {
        let index = IndexBuilder::default().build_from_reader(Cursor::new(b"chr1\t1\n"))?;
        assert_eq!(index.bin_size(), DEFAULT_BIN_SIZE);
        Ok(())
    }

    #[test]
    fn test_malformed_line() {
        assert!(matches!(
            build("chr1\t100\nchr1\n", 100),
            Err(Error::ScanError(ScanError::MalformedRecord { line: 2, .. }))
        ));
    }

    #[test]
    fn test_long_chromosome_name() {
        let source = format!("{}\t1\n", "c".repeat(40));
        assert!(matches!(
            build(&source, 100),
            Err(Error::IndexError(IndexError::NameTooLong { .. }))
        ));
    }

    #[test]
    fn test_empty_source() -> Result<()> {
        let index = build("##only a header\n", 100)?;
        assert_eq!(index.n_chromosomes(), 0);
        Ok(())
    }
}
