use std::{
    fs::File,
    io::{BufReader, BufWriter, Write},
    path::PathBuf,
    sync::Arc,
};

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use log::{info, warn, LevelFilter};

use vcfidx::{
    for_each_in_region, index_path, search_parallel, Index, IndexBuilder, Region,
    DEFAULT_BIN_SIZE,
};

#[derive(Parser, Debug)]
#[command(
    version = env!("CARGO_PKG_VERSION"),
    about = env!("CARGO_PKG_DESCRIPTION"),
    long_about = None)]
struct Cli {
    /// Log debug messages (RUST_LOG takes precedence when set)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build an index next to the source file (<SOURCE>.idx)
    Build(BuildArgs),

    /// Query regions, building the index first if it is missing
    Query(QueryArgs),
}

#[derive(Args, Debug)]
struct BuildArgs {
    /// Sorted source file (grouped by chromosome, non-decreasing positions)
    source: PathBuf,

    /// Width of each bin in coordinate units
    #[arg(short, long, default_value_t = DEFAULT_BIN_SIZE)]
    bin_size: u32,
}

#[derive(Args, Debug)]
struct QueryArgs {
    /// Sorted source file (grouped by chromosome, non-decreasing positions)
    source: PathBuf,

    /// Regions to query as CHROM:START-END (inclusive) or CHROM:POS
    #[arg(required = true)]
    regions: Vec<Region>,

    /// Bin size used if the index has to be built
    #[arg(short, long, default_value_t = DEFAULT_BIN_SIZE)]
    bin_size: u32,

    /// Rebuild the index even if one exists
    #[arg(long)]
    rebuild: bool,

    /// Number of search threads (0 uses all cores)
    #[arg(short = 't', long, default_value_t = 1)]
    threads: usize,

    /// Print the matching records instead of counts and offsets
    #[arg(long)]
    records: bool,
}

fn init_logger(verbose: bool) -> Result<()> {
    let mut builder = pretty_env_logger::formatted_builder();
    builder.filter_level(if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    });
    if let Ok(filters) = std::env::var("RUST_LOG") {
        builder.parse_filters(&filters);
    }
    builder.try_init()?;
    Ok(())
}

fn build(args: &BuildArgs) -> Result<()> {
    let index = IndexBuilder::new()
        .bin_size(args.bin_size)
        .build_and_save(&args.source)?;
    info!(
        "Wrote {} ({} chromosomes)",
        index_path(&args.source).display(),
        index.n_chromosomes()
    );
    Ok(())
}

fn load_or_build(args: &QueryArgs) -> Result<Index> {
    let path = index_path(&args.source);
    if args.rebuild || !path.exists() {
        return Ok(IndexBuilder::new()
            .bin_size(args.bin_size)
            .build_and_save(&args.source)?);
    }
    let index = Index::from_path(&path)?;
    if args.bin_size != DEFAULT_BIN_SIZE && args.bin_size != index.bin_size() {
        warn!(
            "Existing index uses bin size {} (requested {}); pass --rebuild to change it",
            index.bin_size(),
            args.bin_size
        );
    }
    Ok(index)
}

fn write_records(args: &QueryArgs, index: &Index) -> Result<()> {
    let file = File::open(&args.source)
        .map_err(|e| vcfidx::Error::file_open(&args.source, e))?;
    let mut reader = BufReader::new(file);
    let mut out = BufWriter::new(std::io::stdout().lock());
    for region in &args.regions {
        for_each_in_region(
            &mut reader,
            index,
            &region.chrom,
            region.start,
            region.end,
            |record| {
                out.write_all(record.raw)?;
                if !record.raw.ends_with(b"\n") {
                    out.write_all(b"\n")?;
                }
                Ok(())
            },
        )?;
    }
    out.flush()?;
    Ok(())
}

fn write_hits(args: &QueryArgs, index: Index) -> Result<()> {
    let hits = search_parallel(&args.source, Arc::new(index), &args.regions, args.threads)?;
    let mut out = BufWriter::new(std::io::stdout().lock());
    let mut ibuf = itoa::Buffer::new();
    for (region, hit) in args.regions.iter().zip(hits) {
        write!(out, "{region}\t")?;
        out.write_all(ibuf.format(hit.count).as_bytes())?;
        out.write_all(b"\t")?;
        match hit.first_offset {
            Some(offset) => out.write_all(ibuf.format(offset).as_bytes())?,
            None => out.write_all(b".")?,
        }
        out.write_all(b"\n")?;
    }
    out.flush()?;
    Ok(())
}

fn query(args: &QueryArgs) -> Result<()> {
    let index = load_or_build(args)?;
    if args.records {
        write_records(args, &index)
    } else {
        write_hits(args, index)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logger(cli.verbose)?;
    match &cli.command {
        Command::Build(args) => build(args),
        Command::Query(args) => query(args),
    }
}
