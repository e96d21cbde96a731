//! Run report types.
//!
//! A [`RunReport`] records what happened to every URL of a run together
//! with the final image counts.

use std::fmt;

use crate::extract::Counters;
use crate::fetch::FetchError;

/// What happened to one URL.
#[derive(Debug)]
pub enum UrlOutcome {
    /// Images were extracted from the archive.
    Extracted { balls: u64, no_balls: u64 },
    /// The archive had no annotations CSV and was skipped.
    NoAnnotations,
    /// The archive could not be downloaded.
    TransportFailed(FetchError),
    /// The archive was downloaded but could not be processed.
    ArchiveFailed(String),
}

impl UrlOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            UrlOutcome::TransportFailed(_) | UrlOutcome::ArchiveFailed(_)
        )
    }
}

impl fmt::Display for UrlOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UrlOutcome::Extracted { balls, no_balls } => {
                write!(f, "extracted {} with balls, {} without", balls, no_balls)
            }
            UrlOutcome::NoAnnotations => write!(f, "skipped: no annotation file"),
            UrlOutcome::TransportFailed(err) => write!(f, "download failed: {}", err),
            UrlOutcome::ArchiveFailed(message) => write!(f, "extraction failed: {}", message),
        }
    }
}

/// The result of a whole run.
#[derive(Debug, Default)]
pub struct RunReport {
    /// Final image counts.
    pub counters: Counters,
    /// One entry per URL, in processing order.
    pub outcomes: Vec<(String, UrlOutcome)>,
}

impl RunReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, url: impl Into<String>, outcome: UrlOutcome) {
        self.outcomes.push((url.into(), outcome));
    }

    /// Number of URLs that failed to download or extract.
    pub fn failed_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|(_, outcome)| outcome.is_failure())
            .count()
    }

    /// Iterates over the URLs that failed, with their outcome.
    pub fn failures(&self) -> impl Iterator<Item = (&str, &UrlOutcome)> {
        self.outcomes
            .iter()
            .filter(|(_, outcome)| outcome.is_failure())
            .map(|(url, outcome)| (url.as_str(), outcome))
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} images with balls", self.counters.balls)?;
        writeln!(f, "{} images without balls", self.counters.no_balls)
    }
}
