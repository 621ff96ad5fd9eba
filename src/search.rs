//! Region queries against an indexed source file
//!
//! A query seeks the source to the bin estimated for the region start and then re-reads
//! lines until it leaves the chromosome block or passes the region end. The index only
//! narrows where scanning begins; the bounds are always confirmed against the source.
//!
//! The estimate is arithmetic (`(start - first_bin_start) / bin_size`). Because a bin is
//! recorded at the first record past its start, and bin starts lag behind positions after a
//! large gap, the estimated seek point can sit on a record that already lies inside the
//! region. In that case the search steps back one bin at a time until the record at the
//! seek point precedes the region start, so no matching record is skipped.

use std::{
    fs::File,
    io::{BufRead, BufReader, Cursor, Seek},
    path::Path,
};

use log::{debug, warn};
use memmap2::Mmap;

use crate::{
    error::{Error, Result},
    index::Index,
    region::Region,
    scanner::{Scanner, SourceRecord},
};

/// Outcome of a region query
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegionHits {
    /// Number of records with a position inside the region
    pub count: u32,

    /// Byte offset of the first matching line, present exactly when `count > 0`
    pub first_offset: Option<u64>,
}
impl RegionHits {
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    fn record(&mut self, offset: u64) {
        self.first_offset.get_or_insert(offset);
        self.count += 1;
    }
}

/// Visits every record of `chrom` with a position in `[start, end]`
///
/// Inverted bounds and unknown chromosomes are caller mistakes rather than faults: both
/// log a warning and return [`RegionHits::empty`].
pub fn for_each_in_region<R, F>(
    reader: &mut R,
    index: &Index,
    chrom: &str,
    start: u32,
    end: u32,
    mut visit: F,
) -> Result<RegionHits>
where
    R: BufRead + Seek,
    F: FnMut(&SourceRecord<'_>) -> Result<()>,
{
    if start > end {
        warn!("Invalid region {chrom}:{start}-{end} (start > end)");
        return Ok(RegionHits::empty());
    }
    let Some(chrom_index) = index.get_chromosome(chrom) else {
        warn!("Chromosome {chrom} not found in index");
        return Ok(RegionHits::empty());
    };
    let Some(candidate) = chrom_index.candidate_bin(start, index.bin_size()) else {
        return Ok(RegionHits::empty());
    };

    // step back until the seek point lands on a record before `start`
    let mut scanner = Scanner::new(reader);
    let mut idx = candidate;
    while idx > 0 {
        scanner.seek(chrom_index.offsets()[idx])?;
        match scanner.next().transpose()? {
            Some(record) if record.chrom == chrom && record.position < start => break,
            _ => idx -= 1,
        }
    }
    if idx != candidate {
        debug!("Stepped back from bin {candidate} to bin {idx} for {chrom}:{start}");
    }
    scanner.seek(chrom_index.offsets()[idx])?;

    let mut hits = RegionHits::empty();
    while let Some(record) = scanner.next() {
        let record = record?;
        if record.chrom != chrom || record.position > end {
            break;
        }
        if record.position < start {
            continue;
        }
        hits.record(record.offset);
        visit(&record)?;
    }
    Ok(hits)
}

/// Counts the records of `chrom` with a position in `[start, end]`
///
/// # Examples
///
/// ```rust,no_run
/// use std::{fs::File, io::BufReader};
/// use vcfidx::{search, Index};
///
/// let index = Index::load_for("calls.vcf").unwrap();
/// let mut reader = BufReader::new(File::open("calls.vcf").unwrap());
/// let hits = search(&mut reader, &index, "chr5", 11814, 12112).unwrap();
/// if let Some(offset) = hits.first_offset {
///     println!("{} records starting at byte {offset}", hits.count);
/// }
/// ```
pub fn search<R: BufRead + Seek>(
    reader: &mut R,
    index: &Index,
    chrom: &str,
    start: u32,
    end: u32,
) -> Result<RegionHits> {
    for_each_in_region(reader, index, chrom, start, end, |_| Ok(()))
}

/// Opens the source at `path` and runs a single [`search`] against it
pub fn search_path<P: AsRef<Path>>(
    path: P,
    index: &Index,
    chrom: &str,
    start: u32,
    end: u32,
) -> Result<RegionHits> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| Error::file_open(path, e))?;
    search(&mut BufReader::new(file), index, chrom, start, end)
}

/// Memory-mapped source paired with its index, for answering many queries
///
/// Every query runs on its own cursor over the mapping, so a `Searcher` can be shared
/// by reference across threads.
pub struct Searcher {
    map: Mmap,
    index: Index,
}
impl Searcher {
    /// Maps the source at `path` for use with an already loaded index
    pub fn new<P: AsRef<Path>>(path: P, index: Index) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| Error::file_open(path, e))?;
        let map = unsafe { Mmap::map(&file)? };
        Ok(Self { map, index })
    }

    /// Maps the source at `path` and loads its `<path>.idx` index
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let index = Index::load_for(&path)?;
        Self::new(path, index)
    }

    #[must_use]
    pub fn index(&self) -> &Index {
        &self.index
    }

    pub fn search(&self, chrom: &str, start: u32, end: u32) -> Result<RegionHits> {
        search(&mut Cursor::new(&self.map[..]), &self.index, chrom, start, end)
    }

    pub fn search_region(&self, region: &Region) -> Result<RegionHits> {
        self.search(&region.chrom, region.start, region.end)
    }

    /// Returns the raw lines of every record in `region`, newlines included
    pub fn records(&self, region: &Region) -> Result<Vec<&[u8]>> {
        let mut lines = Vec::new();
        for_each_in_region(
            &mut Cursor::new(&self.map[..]),
            &self.index,
            &region.chrom,
            region.start,
            region.end,
            |record| {
                let start = record.offset as usize;
                lines.push(&self.map[start..start + record.raw.len()]);
                Ok(())
            },
        )?;
        Ok(lines)
    }
}
