use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use walkdir::WalkDir;

use crate::discovery::domain::video_classifier::is_candidate;

#[derive(Error, Debug)]
pub enum EnumerationError {
    #[error("input path not found: {0}")]
    NotFound(PathBuf),
    #[error("input path is neither a file nor a directory: {0}")]
    Unsupported(PathBuf),
    #[error("failed to read input path {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Collects the inputs for one run.
///
/// - A regular file is returned as-is, whatever its extension.
/// - A directory yields every regular file passing [`is_candidate`], searched
///   one level deep, or the whole tree when `recursive` is set.
///
/// The whole tree is walked before returning. Results are sorted by path so
/// that repeated runs process files in the same order.
pub fn enumerate(root: &Path, recursive: bool) -> Result<Vec<PathBuf>, EnumerationError> {
    let metadata = fs::metadata(root).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => EnumerationError::NotFound(root.to_path_buf()),
        _ => EnumerationError::Io {
            path: root.to_path_buf(),
            source: e,
        },
    })?;

    if metadata.is_file() {
        return Ok(vec![root.to_path_buf()]);
    }
    if !metadata.is_dir() {
        return Err(EnumerationError::Unsupported(root.to_path_buf()));
    }

    let max_depth = if recursive { usize::MAX } else { 1 };
    let mut inputs = Vec::new();

    for entry in WalkDir::new(root)
        .min_depth(1)
        .max_depth(max_depth)
        .follow_links(true)
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                log::warn!("Skipping unreadable entry under {}: {e}", root.display());
                continue;
            }
        };

        if entry.file_type().is_file() && is_candidate(entry.path()) {
            inputs.push(entry.into_path());
        }
    }

    inputs.sort();
    log::debug!("Found {} input(s) under {}", inputs.len(), root.display());
    Ok(inputs)
}
