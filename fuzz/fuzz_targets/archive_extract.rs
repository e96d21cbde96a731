//! Fuzz target for archive extraction.
//!
//! Arbitrary bytes are opened as a zip archive and, when that succeeds,
//! extracted into a scratch directory that is deleted afterwards.

#![no_main]

use ballset::extract::{extract_archive, ArchiveLayout, Counters, OutputLayout};
use ballset::fetch::open_archive;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() > 1024 * 1024 {
        return;
    }

    let Ok(mut archive) = open_archive(data.to_vec()) else {
        return;
    };

    // Removed when dropped at the end of each input.
    let Ok(scratch) = tempfile::tempdir() else {
        return;
    };
    let output = OutputLayout::new(scratch.path());
    if output.create().is_err() {
        return;
    }

    let mut counters = Counters::default();
    let _ = extract_archive(&mut archive, &ArchiveLayout::default(), &output, &mut counters);
});
