//! Shared helpers for integration tests: the dataset fixture writer and temp files.
#![allow(dead_code)]

#[path = "../../src/core/fixture.rs"]
mod fixture;

use std::io::Write;

pub use fixture::*;

/// Writes `bytes` to a fresh temp file that lives as long as the returned handle.
pub fn dataset_file(bytes: &[u8]) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    file.write_all(bytes).expect("write dataset");
    file.flush().expect("flush dataset");
    file
}
