//! Manifest discovery.
//!
//! Expands the paths given on the command line into the list of hash-lists
//! to process. Files are taken as given; directories are walked recursively
//! and every file with an `.mhl` extension (any case) is collected.
//!
//! ```text
//! tapes/
//! ├── KD0097.mhl       ✓
//! ├── KD0097.md5
//! ├── shoot-2/
//! │   └── KD0098.MHL   ✓
//! └── notes.txt
//! ```
//!
//! The result is sorted and deduplicated, so batch output is stable no
//! matter how the arguments overlap.

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub const MANIFEST_EXTENSION: &str = "mhl";

/// True if `path` has an `.mhl` extension, case-insensitively.
pub fn is_manifest(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(MANIFEST_EXTENSION))
}

/// Every manifest under `inputs`, sorted and deduplicated.
///
/// A path that does not exist, or a file that is not a manifest, is skipped
/// with a warning. Unreadable directory entries are skipped the same way.
pub fn collect_manifests(inputs: &[PathBuf]) -> Vec<PathBuf> {
    let mut found = Vec::new();

    for input in inputs {
        if input.is_file() {
            if is_manifest(input) {
                found.push(input.clone());
            } else {
                tracing::warn!(path = %input.display(), "not a .mhl file, skipping");
            }
        } else if input.is_dir() {
            for entry in WalkDir::new(input).follow_links(true) {
                match entry {
                    Ok(e) if e.file_type().is_file() && is_manifest(e.path()) => {
                        found.push(e.into_path());
                    }
                    Ok(_) => {}
                    Err(err) => tracing::warn!(error = %err, "skipping unreadable entry"),
                }
            }
        } else {
            tracing::warn!(path = %input.display(), "path does not exist, skipping");
        }
    }

    found.sort();
    found.dedup();
    tracing::debug!(count = found.len(), "collected manifests");
    found
}
