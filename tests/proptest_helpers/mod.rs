#![allow(dead_code)]

use proptest::prelude::*;
use proptest::test_runner::{Config as ProptestConfig, FileFailurePersistence};

pub fn proptest_config() -> ProptestConfig {
    let cases = std::env::var("PROPTEST_CASES")
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(32);

    let mut config = ProptestConfig::with_failure_persistence(FileFailurePersistence::WithSource(
        "proptest-regressions",
    ));
    config.cases = cases;
    config.max_shrink_iters = 256;
    config
}

/// Shape of one generated archive.
#[derive(Clone, Debug)]
pub struct ArchiveShape {
    /// Extensions of annotated images, one row each.
    pub annotated: Vec<&'static str>,
    /// Extensions of unannotated entries, images or not.
    pub unannotated: Vec<&'static str>,
    /// Whether the archive carries an annotations CSV at all.
    pub has_annotations: bool,
}

impl ArchiveShape {
    pub fn expected_balls(&self) -> u64 {
        if self.has_annotations {
            self.annotated.len() as u64
        } else {
            0
        }
    }

    pub fn expected_no_balls(&self) -> u64 {
        if !self.has_annotations {
            return 0;
        }
        self.unannotated
            .iter()
            .filter(|ext| matches!(**ext, "png" | "jpg" | "jpeg"))
            .count() as u64
    }
}

pub fn arb_extension() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec!["png", "jpg", "jpeg", "txt", "db", "JPG", ""])
}

pub fn arb_archive_shape() -> impl Strategy<Value = ArchiveShape> {
    (
        prop::collection::vec(arb_extension(), 0..5),
        prop::collection::vec(arb_extension(), 0..5),
        prop::bool::weighted(0.85),
    )
        .prop_map(|(annotated, unannotated, has_annotations)| ArchiveShape {
            annotated,
            unannotated,
            has_annotations,
        })
}

fn entry_name(prefix: &str, index: usize, ext: &str) -> String {
    if ext.is_empty() {
        format!("train/{prefix}{index}")
    } else {
        format!("train/{prefix}{index}.{ext}")
    }
}

/// Builds the zip bytes described by `shape`.
pub fn build_archive(shape: &ArchiveShape) -> Vec<u8> {
    let mut entries: Vec<(String, Vec<u8>)> = Vec::new();

    if shape.has_annotations {
        let mut csv = String::from("filename,class\n");
        for (index, ext) in shape.annotated.iter().enumerate() {
            let name = entry_name("ball", index, ext);
            let file_name = name.trim_start_matches("train/");
            csv.push_str(&format!("{file_name},ball\n"));
        }
        entries.push(("train/_annotations.csv".to_string(), csv.into_bytes()));
    }

    for (index, ext) in shape.annotated.iter().enumerate() {
        let name = entry_name("ball", index, ext);
        entries.push((name.clone(), name.into_bytes()));
    }
    for (index, ext) in shape.unannotated.iter().enumerate() {
        let name = entry_name("other", index, ext);
        entries.push((name.clone(), name.into_bytes()));
    }

    let borrowed: Vec<(&str, &[u8])> = entries
        .iter()
        .map(|(name, bytes)| (name.as_str(), bytes.as_slice()))
        .collect();
    crate::common::zip_bytes(&borrowed)
}
