//! Archive retrieval.
//!
//! [`ArchiveSource`] is the seam between the pipeline and the network: the
//! pipeline asks for a URL and receives an opened zip archive backed by an
//! in-memory buffer. [`HttpFetcher`] is the real implementation.

use std::io::{Cursor, Read};
use std::time::Duration;

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use thiserror::Error;
use zip::ZipArchive;

/// A fully downloaded archive, opened for random access.
pub type Fetched = ZipArchive<Cursor<Vec<u8>>>;

/// Why an archive could not be obtained for a URL.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("responded with status code: {status}")]
    Status { status: u16 },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("not a valid zip archive: {0}")]
    Archive(#[from] zip::result::ZipError),
}

impl FetchError {
    /// Returns true if the archive was never received.
    pub fn is_transport(&self) -> bool {
        matches!(self, FetchError::Status { .. } | FetchError::Transport(_))
    }
}

/// Something that can turn a URL into an opened archive.
pub trait ArchiveSource {
    fn fetch(&self, url: &str) -> Result<Fetched, FetchError>;
}

/// Opens a zip archive from a fully materialized body.
pub fn open_archive(bytes: Vec<u8>) -> Result<Fetched, FetchError> {
    Ok(ZipArchive::new(Cursor::new(bytes))?)
}

const CHUNK_SIZE: usize = 64 * 1024;
const MAX_PREALLOCATION: u64 = 64 * 1024 * 1024;

/// Downloads archives over HTTP(S) with a progress bar on stderr.
pub struct HttpFetcher {
    agent: ureq::Agent,
    show_progress: bool,
}

impl HttpFetcher {
    pub fn new() -> Self {
        let config = ureq::Agent::config_builder()
            .timeout_connect(Some(Duration::from_secs(30)))
            .build();

        Self {
            agent: config.into(),
            show_progress: true,
        }
    }

    /// Disables the download progress bar.
    pub fn without_progress(mut self) -> Self {
        self.show_progress = false;
        self
    }

    fn progress_bar(&self, content_length: Option<u64>) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }

        let pb = match content_length {
            Some(total) => {
                let pb = ProgressBar::new(total);
                pb.set_style(
                    ProgressStyle::with_template(
                        "{spinner:.green} [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec}, {eta})",
                    )
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("#>-"),
                );
                pb
            }
            None => {
                let pb = ProgressBar::new_spinner();
                pb.set_style(
                    ProgressStyle::with_template("{spinner:.green} {bytes} ({bytes_per_sec})")
                        .unwrap_or_else(|_| ProgressStyle::default_spinner()),
                );
                pb
            }
        };
        pb.set_draw_target(ProgressDrawTarget::stderr());
        pb
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl ArchiveSource for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<Fetched, FetchError> {
        let parsed = url::Url::parse(url)
            .map_err(|source| FetchError::Transport(format!("invalid URL: {source}")))?;

        let response = match self.agent.get(parsed.as_str()).call() {
            Ok(response) => response,
            Err(ureq::Error::StatusCode(status)) => return Err(FetchError::Status { status }),
            Err(source) => return Err(FetchError::Transport(source.to_string())),
        };

        let content_length = response
            .headers()
            .get("content-length")
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.parse::<u64>().ok());

        let pb = self.progress_bar(content_length);
        let mut reader = response.into_body().into_reader();
        let capacity = content_length.unwrap_or(0).min(MAX_PREALLOCATION) as usize;
        let mut content = Vec::with_capacity(capacity);
        let mut chunk = vec![0u8; CHUNK_SIZE];

        loop {
            let read = reader
                .read(&mut chunk)
                .map_err(|source| FetchError::Transport(source.to_string()))?;
            if read == 0 {
                break;
            }
            content.extend_from_slice(&chunk[..read]);
            pb.inc(read as u64);
        }
        pb.finish_and_clear();

        open_archive(content)
    }
}
