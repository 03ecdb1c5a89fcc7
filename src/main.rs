use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

use thefile::processing::{self, ProcessingConfig, Query};
use thefile::reader::LoaderConfig;

#[derive(Parser, Debug)]
#[command(name = "thefile")]
#[command(about = "Split flat text files into titled pages and query them")]
#[command(version)]
struct Args {
    /// Files or glob patterns to process
    #[arg(required = true)]
    patterns: Vec<String>,

    /// Use memory-mapped I/O instead of async buffered reads
    #[arg(long)]
    use_mmap: bool,

    /// Abort on first error
    #[arg(long)]
    fail_fast: bool,

    /// Suppress console progress bar
    #[arg(long)]
    no_progress: bool,

    /// Stats output file path
    #[arg(long, default_value = "run_stats.json")]
    stats_out: PathBuf,

    /// Select pages whose first title is NAME
    #[arg(long, value_name = "NAME")]
    named: Option<String>,

    /// Select pages tagged TAG (repeat to require several)
    #[arg(long, value_name = "TAG")]
    tagged: Vec<String>,

    /// Select pages with THING as a secondary title (repeat to accept any)
    #[arg(long = "in", value_name = "THING")]
    secondary: Vec<String>,

    /// Drop pages tagged TAG
    #[arg(long, value_name = "TAG")]
    exclude_tagged: Vec<String>,

    /// Select the page starting at line N
    #[arg(long, value_name = "N")]
    address: Option<usize>,

    /// Print every selected page, all pages if no selector is given
    #[arg(long)]
    list: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // WHY: stdout carries page listings, logs go to stderr
    tracing_subscriber::fmt()
        .with_target(false)
        .with_writer(std::io::stderr)
        .json()
        .init();

    let args = Args::parse();

    info!("Starting thefile");
    info!(?args, "Parsed CLI arguments");

    let paths = processing::expand_patterns(&args.patterns, args.fail_fast)?;
    info!("Pattern expansion completed: {} files", paths.len());

    let config = ProcessingConfig {
        fail_fast: args.fail_fast,
        show_progress: !args.no_progress,
        loader: LoaderConfig {
            use_mmap: args.use_mmap,
            ..Default::default()
        },
    };
    let query = Query {
        named: args.named,
        tagged: args.tagged,
        secondary: args.secondary,
        exclude_tagged: args.exclude_tagged,
        address: args.address,
        list: args.list,
    };

    let output = processing::process_files(&paths, &config, &query).await?;

    for found in &output.matches {
        println!("{}:{}\t{}\t{}", found.path, found.address, found.name, found.hash64);
    }

    processing::write_run_stats(&args.stats_out, &output.stats).await?;
    info!("Run statistics written to {}", args.stats_out.display());

    eprintln!(
        "thefile v{}: {} files, {} pages, {} failed",
        env!("CARGO_PKG_VERSION"),
        output.stats.files_processed,
        output.stats.total_pages_found,
        output.stats.files_failed
    );

    Ok(())
}
