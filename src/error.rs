use std::path::PathBuf;
use thiserror::Error;

/// The main error type for ballset operations.
#[derive(Debug, Error)]
pub enum BallsetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to read URL list from {path}: {source}")]
    UrlList {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse annotation CSV '{entry}': {source}")]
    AnnotationCsvParse {
        entry: String,
        #[source]
        source: csv::Error,
    },

    #[error("Failed to write annotation CSV to {path}: {source}")]
    AnnotationCsvWrite {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Annotation CSV '{entry}' has no 'filename' column")]
    MissingFilenameColumn { entry: String },

    #[error(
        "Annotation columns [{found}] do not match columns [{expected}] already in {path}"
    )]
    SchemaMismatch {
        path: PathBuf,
        expected: String,
        found: String,
    },

    #[error("Archive entry '{entry}' referenced by the annotations is missing")]
    MissingArchiveEntry { entry: String },

    #[error("Failed to read archive entry '{entry}': {source}")]
    ArchiveEntry {
        entry: String,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("Failed to write image to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl BallsetError {
    /// Returns true if the error means the output filesystem can no longer
    /// be trusted, as opposed to a problem with one archive's contents.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            BallsetError::Io(_) | BallsetError::Write { .. } | BallsetError::AnnotationCsvWrite { .. }
        )
    }
}
