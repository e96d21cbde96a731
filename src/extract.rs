//! Archive classification and extraction.
//!
//! An archive is split into two classes:
//!
//! - **balls**: every row of the annotations CSV. The referenced image is
//!   written to `balls/` under the next free number and the row's
//!   `filename` is rewritten to match.
//! - **no_balls**: every other archive entry whose extension is `png`,
//!   `jpg` or `jpeg`. Written to `no_balls/` under the next free number.
//!
//! Numbering comes from [`Counters`], which the caller owns and threads
//! through every archive of a run, so numbers never repeat within a class.

use std::collections::{BTreeSet, HashSet};
use std::fs::File;
use std::io::{ErrorKind, Read, Seek, Write};
use std::path::{Path, PathBuf};

use tracing::debug;
use zip::result::ZipError;
use zip::ZipArchive;

use crate::annotations::AnnotationTable;
use crate::error::BallsetError;

/// Directory inside the archive that holds images and annotations.
pub const DEFAULT_IMAGE_DIR: &str = "train";

/// File name of the annotations CSV, both in archives and in the output.
pub const DEFAULT_ANNOTATIONS_FILE: &str = "_annotations.csv";

/// Extensions accepted for unannotated images. Matching is case-sensitive.
pub const IMAGE_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

const COPY_CHUNK_SIZE: usize = 64 * 1024;

/// Where annotations and images live inside an archive.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArchiveLayout {
    pub image_dir: String,
    pub annotations_file: String,
}

impl Default for ArchiveLayout {
    fn default() -> Self {
        Self {
            image_dir: DEFAULT_IMAGE_DIR.to_string(),
            annotations_file: DEFAULT_ANNOTATIONS_FILE.to_string(),
        }
    }
}

impl ArchiveLayout {
    /// Path of the annotations CSV inside the archive.
    pub fn annotations_path(&self) -> String {
        self.entry_path(&self.annotations_file)
    }

    /// Path inside the archive of an image named in the annotations.
    pub fn entry_path(&self, filename: &str) -> String {
        if self.image_dir.is_empty() {
            filename.to_string()
        } else {
            format!("{}/{}", self.image_dir.trim_end_matches('/'), filename)
        }
    }
}

/// Output directories and the persisted annotations CSV.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutputLayout {
    pub balls_dir: PathBuf,
    pub no_balls_dir: PathBuf,
    pub annotations_csv: PathBuf,
}

impl OutputLayout {
    pub fn new(root: &Path) -> Self {
        let balls_dir = root.join("balls");
        let annotations_csv = balls_dir.join(DEFAULT_ANNOTATIONS_FILE);
        Self {
            no_balls_dir: root.join("no_balls"),
            balls_dir,
            annotations_csv,
        }
    }

    /// Creates both image directories if they do not exist.
    pub fn create(&self) -> Result<(), BallsetError> {
        std::fs::create_dir_all(&self.balls_dir)?;
        std::fs::create_dir_all(&self.no_balls_dir)?;
        Ok(())
    }
}

/// Number of images written so far, per class.
///
/// The current value is the number given to the next image of that class.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Counters {
    pub balls: u64,
    pub no_balls: u64,
}

/// What happened to one archive.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExtractOutcome {
    /// The archive has no annotations CSV and was left alone.
    NoAnnotations,
    /// Images written from this archive.
    Extracted { balls: u64, no_balls: u64 },
}

/// Returns the text after the last `.` in `name`, or `""` if there is none.
pub fn extension_of(name: &str) -> &str {
    name.rsplit_once('.').map(|(_, ext)| ext).unwrap_or("")
}

/// Returns true if an unannotated entry with this extension is an image.
pub fn is_image_extension(ext: &str) -> bool {
    IMAGE_EXTENSIONS.contains(&ext)
}

/// Builds the output file name for image number `number`.
pub fn new_image_name(number: u64, ext: &str) -> String {
    if ext.is_empty() {
        number.to_string()
    } else {
        format!("{number}.{ext}")
    }
}

/// Returns the entries not in `annotated`, keeping their original order.
pub fn partition_entries<'a, I>(entries: I, annotated: &BTreeSet<String>) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    entries
        .into_iter()
        .filter(|entry| !annotated.contains(*entry))
        .map(str::to_string)
        .collect()
}

/// Extracts one archive into `output`, advancing `counters`.
///
/// Nothing is written if the annotations cannot be parsed, do not match the
/// persisted CSV's columns, or reference an entry the archive lacks.
pub fn extract_archive<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    layout: &ArchiveLayout,
    output: &OutputLayout,
    counters: &mut Counters,
) -> Result<ExtractOutcome, BallsetError> {
    let entries: Vec<String> = archive.file_names().map(str::to_string).collect();
    let annotations_path = layout.annotations_path();

    if !entries.iter().any(|entry| *entry == annotations_path) {
        return Ok(ExtractOutcome::NoAnnotations);
    }

    let mut table = read_annotations(archive, &annotations_path)?;

    let balls: Vec<(String, String)> = table
        .filenames()
        .map(|filename| (filename.to_string(), layout.entry_path(filename)))
        .collect();
    let annotated: BTreeSet<String> = balls.iter().map(|(_, entry)| entry.clone()).collect();
    let no_balls = partition_entries(entries.iter().map(String::as_str), &annotated);

    table.check_schema(&output.annotations_csv)?;
    let present: HashSet<&str> = entries.iter().map(String::as_str).collect();
    if let Some((_, missing)) = balls.iter().find(|(_, entry)| !present.contains(entry.as_str())) {
        return Err(BallsetError::MissingArchiveEntry {
            entry: missing.clone(),
        });
    }

    let start = *counters;

    for (row, (filename, entry)) in balls.iter().enumerate() {
        let new_name = new_image_name(counters.balls, extension_of(filename));
        copy_entry(archive, entry, &output.balls_dir.join(&new_name))?;
        counters.balls += 1;
        table.set_filename(row, &new_name);
    }
    table.append_to_csv(&output.annotations_csv)?;

    for entry in &no_balls {
        let ext = extension_of(entry);
        if !is_image_extension(ext) {
            continue;
        }

        let new_name = new_image_name(counters.no_balls, ext);
        copy_entry(archive, entry, &output.no_balls_dir.join(&new_name))?;
        counters.no_balls += 1;
    }

    let outcome = ExtractOutcome::Extracted {
        balls: counters.balls - start.balls,
        no_balls: counters.no_balls - start.no_balls,
    };
    debug!(?outcome, "archive extracted");

    Ok(outcome)
}

fn read_annotations<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    path: &str,
) -> Result<AnnotationTable, BallsetError> {
    let file = archive.by_name(path).map_err(|source| entry_error(path, source))?;
    AnnotationTable::from_reader(file, path)
}

/// Streams `entry` into a new file at `dest`.
///
/// Reads in fixed-size chunks whatever size the archive declares. A read
/// failure removes the partially written file.
fn copy_entry<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    entry: &str,
    dest: &Path,
) -> Result<(), BallsetError> {
    let mut file = archive
        .by_name(entry)
        .map_err(|source| entry_error(entry, source))?;

    let write_err = |source| BallsetError::Write {
        path: dest.to_path_buf(),
        source,
    };

    let mut out = File::create(dest).map_err(write_err)?;
    let mut chunk = vec![0u8; COPY_CHUNK_SIZE];

    loop {
        let read = match file.read(&mut chunk) {
            Ok(0) => break,
            Ok(read) => read,
            Err(source) if source.kind() == ErrorKind::Interrupted => continue,
            Err(source) => {
                drop(out);
                let _ = std::fs::remove_file(dest);
                return Err(entry_error(entry, ZipError::Io(source)));
            }
        };
        out.write_all(&chunk[..read]).map_err(write_err)?;
    }

    out.flush().map_err(write_err)
}

fn entry_error(entry: &str, source: ZipError) -> BallsetError {
    match source {
        ZipError::FileNotFound => BallsetError::MissingArchiveEntry {
            entry: entry.to_string(),
        },
        source => BallsetError::ArchiveEntry {
            entry: entry.to_string(),
            source,
        },
    }
}
