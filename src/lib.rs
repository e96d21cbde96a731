//! Ballset: build a balls / no-balls image dataset from annotated archives.
//!
//! Ballset downloads a list of zipped datasets, copies every annotated image
//! into `balls/` and every unannotated image into `no_balls/`, renames both
//! into dense numeric sequences, and appends the renamed annotation rows to
//! a single CSV next to the `balls/` images.
//!
//! # Modules
//!
//! - [`urls`]: URL list loading
//! - [`fetch`]: Archive download (the [`fetch::ArchiveSource`] seam)
//! - [`annotations`]: Annotation CSV parsing and appending
//! - [`extract`]: Classification and extraction of one archive
//! - [`pipeline`]: The per-URL loop and its report
//! - [`error`]: Error types for ballset operations

pub mod annotations;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod pipeline;
pub mod urls;

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

pub use error::BallsetError;

/// The ballset CLI application.
#[derive(Parser)]
#[command(name = "ballset")]
#[command(version, about)]
struct Cli {
    /// Path for a URL text file.
    #[arg(short = 'u', long = "url-file", default_value = "dataset_urls.txt")]
    url_file: PathBuf,

    /// A directory where the dataset will be placed.
    #[arg(short = 'd', long = "dir", default_value = "dataset")]
    dir: PathBuf,
}

/// Run the ballset CLI.
///
/// This is the main entry point for the CLI, called from `main.rs`.
pub fn run() -> Result<(), BallsetError> {
    let cli = Cli::parse();
    setup_logging();

    let output = extract::OutputLayout::new(&cli.dir);
    output.create()?;

    let urls = urls::read_url_list(&cli.url_file)?;

    let report = if urls.is_empty() {
        println!("Nothing to download from");
        pipeline::RunReport::new()
    } else {
        let fetcher = fetch::HttpFetcher::new();
        pipeline::run_pipeline(
            &urls,
            &fetcher,
            &extract::ArchiveLayout::default(),
            &output,
        )?
    };

    for (url, outcome) in report.failures() {
        eprintln!("Cannot download from {}: {}", url, outcome);
    }
    print!("{}", report);

    Ok(())
}

fn setup_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("ballset=info,warn"));

    // A subscriber may already be installed when embedded in another binary.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .try_init();
}
