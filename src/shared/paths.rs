use std::path::{Path, PathBuf};

use anyhow::Result;
use walkdir::WalkDir;

use crate::dat::DAT_EXTENSION;

/// Determine file extension in lowercase.
pub fn extension(path: impl AsRef<Path>) -> String {
    path.as_ref()
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase()
}

pub fn is_dat_file(path: impl AsRef<Path>) -> bool {
    extension(path) == DAT_EXTENSION
}

/// Gather `.dat` paths from a file or directory, sorted for stable output.
pub fn gather_dat_paths(input: impl AsRef<Path>, recursive: bool) -> Result<Vec<PathBuf>> {
    let input_path = input.as_ref();
    let mut paths = Vec::new();

    if input_path.is_file() {
        if is_dat_file(input_path) {
            paths.push(input_path.to_path_buf());
        }
    } else if input_path.is_dir() {
        if recursive {
            for entry in WalkDir::new(input_path).into_iter().filter_map(|e| e.ok()) {
                if entry.file_type().is_file() && is_dat_file(entry.path()) {
                    paths.push(entry.into_path());
                }
            }
        } else {
            for entry in std::fs::read_dir(input_path)? {
                let p = entry?.path();
                if p.is_file() && is_dat_file(&p) {
                    paths.push(p);
                }
            }
        }
    }

    paths.sort();
    Ok(paths)
}
