//! Entry-level archive comparison.
//!
//! A byte-level mismatch between two archives is tolerated only when the
//! archives are structurally identical (same entry count, names and
//! declared sizes, in iteration order) and every checksum-divergent entry
//! is an image within the pixel tolerance. Anything unreadable compares as
//! not equal.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use zip::ZipArchive;

use crate::image_diff::images_match;

/// Returns true if the two archives match, tolerating lossy re-encoding of
/// embedded images up to `tolerance`.
pub fn archives_match(gold: &Path, test: &Path, tolerance: u8) -> bool {
    compare_archives(gold, test, tolerance).unwrap_or(false)
}

/// None signals an open/read failure, which callers treat as not equal.
fn compare_archives(gold: &Path, test: &Path, tolerance: u8) -> Option<bool> {
    let mut gold_zip = ZipArchive::new(File::open(gold).ok()?).ok()?;
    let mut test_zip = ZipArchive::new(File::open(test).ok()?).ok()?;

    if gold_zip.len() != test_zip.len() {
        return Some(false);
    }

    for index in 0..gold_zip.len() {
        let (gold_name, gold_size, gold_crc) = entry_info(&mut gold_zip, index)?;
        let (test_name, test_size, test_crc) = entry_info(&mut test_zip, index)?;

        if gold_name != test_name || gold_size != test_size {
            return Some(false);
        }
        if gold_crc != test_crc {
            let gold_bytes = read_entry(&mut gold_zip, index)?;
            let test_bytes = read_entry(&mut test_zip, index)?;
            if !images_match(&gold_bytes, &test_bytes, tolerance) {
                return Some(false);
            }
        }
    }
    Some(true)
}

fn entry_info(archive: &mut ZipArchive<File>, index: usize) -> Option<(String, u64, u32)> {
    let entry = archive.by_index(index).ok()?;
    Some((entry.name().to_string(), entry.size(), entry.crc32()))
}

fn read_entry(archive: &mut ZipArchive<File>, index: usize) -> Option<Vec<u8>> {
    let mut entry = archive.by_index(index).ok()?;
    let mut bytes = Vec::with_capacity(entry.size() as usize);
    entry.read_to_end(&mut bytes).ok()?;
    Some(bytes)
}
