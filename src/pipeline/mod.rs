//! Per-URL download and extraction loop.
//!
//! URLs are processed strictly in order, one archive at a time. A failure
//! that concerns a single URL (bad status, unreachable host, invalid zip,
//! malformed annotations) is logged and recorded in the [`RunReport`], and
//! the run moves on. Images and counters from earlier archives are kept.
//! Failures of the output filesystem abort the run.

mod report;

pub use report::{RunReport, UrlOutcome};

use tracing::{error, info, warn};

use crate::error::BallsetError;
use crate::extract::{self, ArchiveLayout, ExtractOutcome, OutputLayout};
use crate::fetch::ArchiveSource;

/// Downloads and extracts every URL in `urls`.
pub fn run_pipeline(
    urls: &[String],
    source: &dyn ArchiveSource,
    layout: &ArchiveLayout,
    output: &OutputLayout,
) -> Result<RunReport, BallsetError> {
    let mut report = RunReport::new();

    for url in urls {
        info!(%url, "downloading archive");
        let outcome = process_url(url, source, layout, output, &mut report)?;
        report.record(url.as_str(), outcome);
    }

    info!(
        balls = report.counters.balls,
        no_balls = report.counters.no_balls,
        failed = report.failed_count(),
        "run finished"
    );

    Ok(report)
}

fn process_url(
    url: &str,
    source: &dyn ArchiveSource,
    layout: &ArchiveLayout,
    output: &OutputLayout,
    report: &mut RunReport,
) -> Result<UrlOutcome, BallsetError> {
    let mut archive = match source.fetch(url) {
        Ok(archive) => archive,
        Err(err) if err.is_transport() => {
            warn!(%url, error = %err, "could not download a zip file");
            return Ok(UrlOutcome::TransportFailed(err));
        }
        Err(err) => {
            error!(%url, error = %err, "cannot open downloaded archive");
            return Ok(UrlOutcome::ArchiveFailed(err.to_string()));
        }
    };

    match extract::extract_archive(&mut archive, layout, output, &mut report.counters) {
        Ok(ExtractOutcome::NoAnnotations) => {
            warn!(%url, "cannot find annotation file, skipping");
            Ok(UrlOutcome::NoAnnotations)
        }
        Ok(ExtractOutcome::Extracted { balls, no_balls }) => {
            info!(%url, balls, no_balls, "archive extracted");
            Ok(UrlOutcome::Extracted { balls, no_balls })
        }
        Err(err) if err.is_fatal() => Err(err),
        Err(err) => {
            error!(%url, error = %err, "cannot extract archive");
            Ok(UrlOutcome::ArchiveFailed(err.to_string()))
        }
    }
}
