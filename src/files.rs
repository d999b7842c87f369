//! Upload boundary: turn command-line paths into [`SourceFile`]s.
//!
//! Directories are walked recursively in sorted order; hidden entries are
//! skipped. A path that cannot be read becomes a [`FileFailure`] so it shows
//! up in the batch report next to parser failures.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::LoadError;
use crate::models::{FileFailure, SourceFile};

pub fn read_sources(paths: &[PathBuf]) -> (Vec<SourceFile>, Vec<FileFailure>) {
    let mut files = Vec::new();
    let mut failed = Vec::new();

    for path in expand(paths) {
        let name = path.display().to_string();
        match std::fs::read(&path) {
            Ok(bytes) => files.push(SourceFile::new(name, bytes)),
            Err(e) => {
                tracing::warn!(file = %name, error = %e, "could not read upload");
                failed.push(FileFailure {
                    file: name,
                    reason: LoadError::Read(e.to_string()),
                });
            }
        }
    }

    (files, failed)
}

fn expand(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut out = Vec::new();
    for path in paths {
        if path.is_dir() {
            let mut found: Vec<PathBuf> = WalkDir::new(path)
                .into_iter()
                .filter_entry(|e| e.depth() == 0 || !is_hidden(e.path()))
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_file())
                .map(|e| e.into_path())
                .collect();
            found.sort();
            out.extend(found);
        } else {
            out.push(path.clone());
        }
    }
    out
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.starts_with('.'))
        .unwrap_or(false)
}
