#![allow(dead_code)]

use std::collections::HashMap;
use std::io::{Cursor, Write};
use std::path::Path;

use ballset::fetch::{open_archive, ArchiveSource, FetchError, Fetched};
use zip::write::SimpleFileOptions;

/// Builds a zip archive in memory. Names ending in `/` become directories.
pub fn zip_bytes(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    for (name, bytes) in entries {
        if name.ends_with('/') {
            writer
                .add_directory(*name, SimpleFileOptions::default())
                .expect("add directory");
        } else {
            writer
                .start_file(*name, SimpleFileOptions::default())
                .expect("start file");
            writer.write_all(bytes).expect("write entry");
        }
    }
    writer.finish().expect("finish zip").into_inner()
}

/// Fake image payload; the pipeline never decodes images.
pub fn image_bytes(tag: &str) -> Vec<u8> {
    let mut bytes = vec![0xFF, 0xD8, 0xFF, 0xE0];
    bytes.extend_from_slice(tag.as_bytes());
    bytes
}

/// What a [`MemorySource`] serves for a URL.
pub enum Served {
    Zip(Vec<u8>),
    Status(u16),
}

/// An archive source backed by a map of URL to response.
///
/// Unknown URLs behave like an unreachable host.
#[derive(Default)]
pub struct MemorySource {
    routes: HashMap<String, Served>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn zip(mut self, url: &str, bytes: Vec<u8>) -> Self {
        self.routes.insert(url.to_string(), Served::Zip(bytes));
        self
    }

    pub fn status(mut self, url: &str, status: u16) -> Self {
        self.routes.insert(url.to_string(), Served::Status(status));
        self
    }
}

impl ArchiveSource for MemorySource {
    fn fetch(&self, url: &str) -> Result<Fetched, FetchError> {
        match self.routes.get(url) {
            Some(Served::Zip(bytes)) => open_archive(bytes.clone()),
            Some(Served::Status(status)) => Err(FetchError::Status { status: *status }),
            None => Err(FetchError::Transport(format!("no route to {url}"))),
        }
    }
}

/// Sorted file names in `dir`.
pub fn list_dir(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .expect("read dir")
        .map(|entry| {
            entry
                .expect("dir entry")
                .file_name()
                .to_string_lossy()
                .to_string()
        })
        .collect();
    names.sort();
    names
}

/// Sorted image file names in `dir`, leaving out the annotations CSV.
pub fn list_images(dir: &Path) -> Vec<String> {
    list_dir(dir)
        .into_iter()
        .filter(|name| name != "_annotations.csv")
        .collect()
}

/// Builds a zip whose entries are stored uncompressed with zip64 headers.
pub fn zip64_stored_bytes(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let options = SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Stored)
        .large_file(true);
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    for (name, bytes) in entries {
        writer.start_file(*name, options).expect("start file");
        writer.write_all(bytes).expect("write entry");
    }
    writer.finish().expect("finish zip").into_inner()
}

/// Rewrites the uncompressed size the central directory records for `entry`.
///
/// Uses the zip64 extra field when the entry has one, otherwise the 32-bit
/// field (clamped below the zip64 marker).
pub fn patch_declared_size(zip: &mut [u8], entry: &str, declared: u64) {
    const CENTRAL_HEADER: [u8; 4] = [0x50, 0x4b, 0x01, 0x02];
    const ZIP64_EXTRA_ID: u16 = 0x0001;

    let read_u16 = |bytes: &[u8], at: usize| u16::from_le_bytes([bytes[at], bytes[at + 1]]);

    let mut pos = 0;
    while pos + 46 <= zip.len() {
        if zip[pos..pos + 4] != CENTRAL_HEADER {
            pos += 1;
            continue;
        }

        let name_len = read_u16(&*zip, pos + 28) as usize;
        let extra_len = read_u16(&*zip, pos + 30) as usize;
        let name_start = pos + 46;
        if &zip[name_start..name_start + name_len] != entry.as_bytes() {
            pos = name_start + name_len;
            continue;
        }

        let size32 = u32::from_le_bytes([zip[pos + 24], zip[pos + 25], zip[pos + 26], zip[pos + 27]]);
        if size32 != u32::MAX {
            let clamped = declared.min(u64::from(u32::MAX - 1)) as u32;
            zip[pos + 24..pos + 28].copy_from_slice(&clamped.to_le_bytes());
            return;
        }

        let mut extra = name_start + name_len;
        let extra_end = extra + extra_len;
        while extra + 4 <= extra_end {
            let id = read_u16(&*zip, extra);
            let len = read_u16(&*zip, extra + 2) as usize;
            if id == ZIP64_EXTRA_ID {
                zip[extra + 4..extra + 12].copy_from_slice(&declared.to_le_bytes());
                return;
            }
            extra += 4 + len;
        }
        panic!("entry '{entry}' has no zip64 extra field");
    }
    panic!("entry '{entry}' not found in central directory");
}
