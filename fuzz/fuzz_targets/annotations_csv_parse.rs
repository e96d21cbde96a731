//! Fuzz target for annotation CSV parsing.
//!
//! This fuzzer feeds arbitrary byte sequences to the annotation table
//! parser, checking for panics, crashes, or hangs.

#![no_main]

use ballset::annotations::AnnotationTable;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() > 10 * 1024 * 1024 {
        return;
    }

    if let Ok(mut table) = AnnotationTable::from_slice(data) {
        for row in 0..table.len() {
            table.set_filename(row, "0.jpg");
        }
    }
});
