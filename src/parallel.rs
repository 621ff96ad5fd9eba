use std::{
    fs::File,
    io::BufReader,
    path::Path,
    sync::Arc,
};

use anyhow::anyhow;
use log::debug;

use crate::{
    error::{Error, Result},
    index::Index,
    region::Region,
    search::{search, RegionHits},
};

/// Runs many region queries against one index across threads
///
/// Regions are split into contiguous chunks, one per thread, and each thread opens its
/// own handle on the source so no cursor is shared. Results are returned in the order of
/// `regions`.
///
/// # Arguments
///
/// * `source` - Path of the indexed source file
/// * `index` - The index built for `source`
/// * `regions` - Regions to query
/// * `num_threads` - Number of threads to spawn (0 uses all available cores; larger
///   values are capped at the number of cores)
pub fn search_parallel<P: AsRef<Path>>(
    source: P,
    index: Arc<Index>,
    regions: &[Region],
    num_threads: usize,
) -> Result<Vec<RegionHits>> {
    if regions.is_empty() {
        return Ok(Vec::new());
    }

    // Calculate the number of threads to use
    let num_threads = if num_threads == 0 {
        num_cpus::get()
    } else {
        num_threads.min(num_cpus::get())
    };
    let regions_per_thread = regions.len().div_ceil(num_threads);

    let regions: Arc<[Region]> = Arc::from(regions);
    let source = Arc::<Path>::from(source.as_ref());

    // Build thread handles
    let mut handles = Vec::new();
    for tid in 0..num_threads {
        let index = index.clone();
        let regions = regions.clone();
        let source = source.clone();

        let handle = std::thread::spawn(move || -> Result<Vec<RegionHits>> {
            let start_idx = tid * regions_per_thread;
            let end_idx = (start_idx + regions_per_thread).min(regions.len());

            if start_idx >= end_idx {
                return Ok(Vec::new()); // No regions for this thread
            }
            debug!("Thread {tid} searching regions {start_idx}..{end_idx}");

            let file = File::open(&*source).map_err(|e| Error::file_open(&*source, e))?;
            let mut reader = BufReader::new(file);
            regions[start_idx..end_idx]
                .iter()
                .map(|region| {
                    search(
                        &mut reader,
                        &index,
                        &region.chrom,
                        region.start,
                        region.end,
                    )
                })
                .collect()
        });
        handles.push(handle);
    }

    let mut hits = Vec::with_capacity(regions.len());
    for (tid, handle) in handles.into_iter().enumerate() {
        let thread_hits = handle
            .join()
            .map_err(|_| anyhow!("Search thread {tid} panicked"))??;
        hits.extend(thread_hits);
    }
    Ok(hits)
}

#[cfg(test)]
mod testing {
    use super::*;
    use std::io::Write;

    use crate::{search_path, IndexBuilder};

    #[test]
    fn test_parallel_matches_sequential() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("calls.vcf");
        let mut file = File::create(&path)?;
        for chrom in ["chr1", "chr2", "chr3"] {
            for pos in (0..5_000).step_by(7) {
                writeln!(file, "{chrom}\t{pos}\tid\tA\tC")?;
            }
        }
        file.flush()?;

        let index = Arc::new(IndexBuilder::new().bin_size(100).build_from_path(&path)?);
        let regions: Vec<Region> = (0..50)
            .map(|i| {
                let chrom = ["chr1", "chr2", "chr3", "chrX"][i % 4];
                let start = (i as u32) * 97;
                Region::new(chrom, start, start + 250)
            })
            .collect();

        let hits = search_parallel(&path, index.clone(), &regions, 4)?;
        assert_eq!(hits.len(), regions.len());
        for (region, hit) in regions.iter().zip(&hits) {
            let expected = search_path(&path, &index, &region.chrom, region.start, region.end)?;
            assert_eq!(*hit, expected, "mismatch for {region}");
        }
        Ok(())
    }

    #[test]
    fn test_empty_regions() -> Result<()> {
        let index = Arc::new(Index::new(100));
        assert!(search_parallel("/nonexistent/calls.vcf", index, &[], 0)?.is_empty());
        Ok(())
    }

    #[test]
    fn test_missing_source() {
        let index = Arc::new(Index::new(100));
        let regions = [Region::new("chr1", 1, 10)];
        assert!(matches!(
            search_parallel("/nonexistent/calls.vcf", index, &regions, 1),
            Err(Error::FileOpen { .. })
        ));
    }
}
