use std::path::Path;

use crate::shared::constants::VIDEO_EXTENSIONS;

/// Whether `path` names a video file we know how to convert.
///
/// Only the final extension is considered, compared case-insensitively.
/// No I/O is performed.
pub fn is_candidate(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| VIDEO_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}
