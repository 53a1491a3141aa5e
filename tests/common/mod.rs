#![allow(dead_code)]

use std::path::{Path, PathBuf};

use uuid::Uuid;

/// A unique path in the system temp directory ending in `name`.
pub fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("wlicloud-{}-{}", Uuid::new_v4(), name))
}

/// A fresh, empty directory in the system temp directory.
pub fn temp_dir() -> PathBuf {
    let dir = std::env::temp_dir().join(format!("wlicloud-{}", Uuid::new_v4()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

pub fn write_file(path: &Path, contents: impl AsRef<[u8]>) {
    std::fs::write(path, contents).unwrap();
}

pub fn dat_file(contents: impl AsRef<[u8]>) -> PathBuf {
    let path = temp_path("measurement.dat");
    write_file(&path, contents);
    path
}
