//! Annotation table reader and appender.
//!
//! Each dataset archive carries one annotations CSV with at least a
//! `filename` column. Every other column (class, bounding box, image size)
//! is opaque and passed through unchanged. Tables from all archives are
//! appended to one persisted CSV, whose header is written exactly once.
//!
//! # Schema
//!
//! The persisted CSV has a single header. A table whose columns differ from
//! the header already on disk is rejected with
//! [`BallsetError::SchemaMismatch`] instead of being appended.

use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use csv::StringRecord;

use crate::error::BallsetError;

/// Name of the column holding the image file name.
pub const FILENAME_COLUMN: &str = "filename";

/// Rows of one annotations CSV sharing a single header.
#[derive(Clone, Debug, PartialEq)]
pub struct AnnotationTable {
    headers: StringRecord,
    rows: Vec<StringRecord>,
    filename_index: usize,
}

impl AnnotationTable {
    /// Parses an annotations CSV from a reader.
    ///
    /// `entry` names the source in error messages (an archive path or a
    /// file path).
    pub fn from_reader<R: Read>(reader: R, entry: &str) -> Result<Self, BallsetError> {
        let parse_err = |source| BallsetError::AnnotationCsvParse {
            entry: entry.to_string(),
            source,
        };

        let mut csv_reader = csv::Reader::from_reader(reader);
        let headers = csv_reader.headers().map_err(parse_err)?.clone();
        let filename_index = headers
            .iter()
            .position(|column| column == FILENAME_COLUMN)
            .ok_or_else(|| BallsetError::MissingFilenameColumn {
                entry: entry.to_string(),
            })?;

        let mut rows = Vec::new();
        for result in csv_reader.records() {
            rows.push(result.map_err(parse_err)?);
        }

        Ok(Self {
            headers,
            rows,
            filename_index,
        })
    }

    /// Parses an annotations CSV from bytes.
    ///
    /// Useful for fuzzing and for tests without an archive.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, BallsetError> {
        Self::from_reader(bytes, "<bytes>")
    }

    pub fn headers(&self) -> &StringRecord {
        &self.headers
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Iterates over the `filename` value of every row, in row order.
    pub fn filenames(&self) -> impl Iterator<Item = &str> {
        self.rows
            .iter()
            .map(|row| row.get(self.filename_index).unwrap_or(""))
    }

    /// Replaces the `filename` value of row `row`.
    ///
    /// # Panics
    /// Panics if `row` is out of bounds.
    pub fn set_filename(&mut self, row: usize, new_name: &str) {
        let index = self.filename_index;
        let record: StringRecord = self.rows[row]
            .iter()
            .enumerate()
            .map(|(column, value)| if column == index { new_name } else { value })
            .collect();
        self.rows[row] = record;
    }

    /// Checks that this table can be appended to the CSV at `path`.
    ///
    /// A missing or empty file accepts any schema.
    pub fn check_schema(&self, path: &Path) -> Result<(), BallsetError> {
        let Some(existing) = read_persisted_headers(path)? else {
            return Ok(());
        };

        if existing == self.headers {
            Ok(())
        } else {
            Err(BallsetError::SchemaMismatch {
                path: path.to_path_buf(),
                expected: join_columns(&existing),
                found: join_columns(&self.headers),
            })
        }
    }

    /// Appends all rows to the CSV at `path`, creating it if needed.
    ///
    /// The header is written only when the file does not exist yet or is
    /// empty, so repeated appends never duplicate it.
    pub fn append_to_csv(&self, path: &Path) -> Result<(), BallsetError> {
        self.check_schema(path)?;

        let write_header = !path.exists() || std::fs::metadata(path)?.len() == 0;

        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let mut csv_writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(BufWriter::new(file));

        let write_err = |source| BallsetError::AnnotationCsvWrite {
            path: path.to_path_buf(),
            source,
        };

        if write_header {
            csv_writer.write_record(&self.headers).map_err(write_err)?;
        }
        for row in &self.rows {
            csv_writer.write_record(row).map_err(write_err)?;
        }

        csv_writer
            .into_inner()
            .map_err(|e| BallsetError::Io(e.into_error()))?
            .flush()?;

        Ok(())
    }
}

fn read_persisted_headers(path: &Path) -> Result<Option<StringRecord>, BallsetError> {
    if !path.exists() || std::fs::metadata(path)?.len() == 0 {
        return Ok(None);
    }

    let file = File::open(path)?;
    let mut csv_reader = csv::Reader::from_reader(BufReader::new(file));
    let headers = csv_reader
        .headers()
        .map_err(|source| BallsetError::AnnotationCsvParse {
            entry: path.display().to_string(),
            source,
        })?
        .clone();

    Ok(Some(headers))
}

fn join_columns(record: &StringRecord) -> String {
    record.iter().collect::<Vec<_>>().join(",")
}
