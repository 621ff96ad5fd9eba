use std::{
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
    sync::Arc,
};

use tempfile::TempDir;
use vcfidx::{
    index_path, search_parallel, search_path, BuildError, Error, Index, IndexBuilder,
    IndexError, Region, Searcher, MAGIC, SIZE_HEADER,
};

const CALLS: &str = "##fileformat=VCFv4.2\n\
    ##source=test\n\
    #CHROM\tPOS\tID\tREF\tALT\tQUAL\n\
    chr1\t100\trs1\tA\tG\t50\n\
    chr1\t250\trs2\tC\tT\t50\n\
    chr1\t500\trs3\tG\tA\t50\n\
    chr1\t900\trs4\tT\tC\t50\n\
    chr2\t300\trs5\tA\tC\t50\n\
    chr2\t12000\trs6\tG\tT\t50\n";

fn write_source(dir: &TempDir, name: &str, contents: &str) -> vcfidx::Result<PathBuf> {
    let path = dir.path().join(name);
    File::create(&path)?.write_all(contents.as_bytes())?;
    Ok(path)
}

fn offset_of(needle: &str) -> Option<u64> {
    CALLS.find(needle).map(|o| o as u64)
}

fn indexed_calls(dir: &TempDir) -> vcfidx::Result<PathBuf> {
    let path = write_source(dir, "calls.vcf", CALLS)?;
    IndexBuilder::new().bin_size(200).build_and_save(&path)?;
    Ok(path)
}

#[test]
fn test_build_save_load_query() -> vcfidx::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = indexed_calls(&dir)?;
    assert!(index_path(&path).exists());

    let index = Index::load_for(&path)?;
    assert_eq!(index.bin_size(), 200);
    assert_eq!(index.n_chromosomes(), 2);
    assert_eq!(
        index.get_chromosome("chr1").map(|c| c.bin_starts().to_vec()),
        Some(vec![0, 200, 400, 600])
    );

    let hits = search_path(&path, &index, "chr1", 200, 600)?;
    assert_eq!(hits.count, 2);
    assert_eq!(hits.first_offset, offset_of("chr1\t250"));

    let hits = search_path(&path, &index, "chr1", 900, 900)?;
    assert_eq!(hits.count, 1);
    assert_eq!(hits.first_offset, offset_of("chr1\t900"));

    assert!(search_path(&path, &index, "chr1", 1, 50)?.is_empty());
    assert!(search_path(&path, &index, "chr1", 600, 200)?.is_empty());
    assert!(search_path(&path, &index, "chrX", 1, 1000)?.is_empty());

    let hits = search_path(&path, &index, "chr2", 11_000, 13_000)?;
    assert_eq!(hits.count, 1);
    assert_eq!(hits.first_offset, offset_of("chr2\t12000"));
    Ok(())
}

#[test]
fn test_batch_and_mapped_queries_agree() -> vcfidx::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = indexed_calls(&dir)?;
    let regions: Vec<Region> = ["chr1:200-600", "chr1:900", "chr2:1-20,000", "chr3:1-10"]
        .iter()
        .map(|s| s.parse::<Region>())
        .collect::<Result<_, _>>()?;

    let searcher = Searcher::open(&path)?;
    let index = Arc::new(Index::load_for(&path)?);
    let batch = search_parallel(&path, index, &regions, 2)?;
    for (region, hits) in regions.iter().zip(&batch) {
        assert_eq!(*hits, searcher.search_region(region)?, "{region}");
    }
    assert_eq!(
        batch.iter().map(|h| h.count).collect::<Vec<_>>(),
        vec![2, 1, 2, 0]
    );
    Ok(())
}

fn corrupt(path: &Path, bytes: &[u8]) -> vcfidx::Result<()> {
    fs::write(index_path(path), bytes)?;
    Ok(())
}

#[test]
fn test_corrupt_index_files() -> vcfidx::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = indexed_calls(&dir)?;
    let valid = fs::read(index_path(&path))?;
    assert_eq!(&valid[..4], &MAGIC);

    let mut bad_magic = valid.clone();
    bad_magic[0] = b'X';
    corrupt(&path, &bad_magic)?;
    assert!(matches!(
        Index::load_for(&path),
        Err(Error::IndexError(IndexError::BadMagic(_)))
    ));

    corrupt(&path, &valid[..SIZE_HEADER - 2])?;
    assert!(matches!(
        Index::load_for(&path),
        Err(Error::IndexError(IndexError::Truncated { .. }))
    ));

    corrupt(&path, &valid[..valid.len() - 3])?;
    assert!(matches!(
        Index::load_for(&path),
        Err(Error::IndexError(IndexError::Truncated { .. }))
    ));
    Ok(())
}

#[test]
fn test_unsorted_source_is_rejected() -> vcfidx::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = write_source(
        &dir,
        "unsorted.vcf",
        "#CHROM\tPOS\nchr1\t100\nchr1\t300\nchr1\t200\nchr1\t400\n",
    )?;
    match IndexBuilder::new().bin_size(100).build_and_save(&path) {
        Err(Error::BuildError(BuildError::OrderViolation {
            line,
            position,
            previous,
            ..
        })) => {
            assert_eq!((line, position, previous), (4, 200, 300));
        }
        other => panic!("expected an order violation, got {other:?}"),
    }
    assert!(!index_path(&path).exists());
    Ok(())
}

#[test]
fn test_missing_source() {
    assert!(matches!(
        IndexBuilder::new().build_from_path("/nonexistent/calls.vcf"),
        Err(Error::FileOpen { .. })
    ));
    assert!(matches!(
        Index::load_for("/nonexistent/calls.vcf"),
        Err(Error::FileOpen { .. })
    ));
}
