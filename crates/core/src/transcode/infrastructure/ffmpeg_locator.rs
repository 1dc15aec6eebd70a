use std::env;
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::shared::constants::{BUNDLED_FFMPEG_DIR, FFMPEG_BINARY_NAME};

#[derive(Error, Debug)]
pub enum LocateError {
    #[error("ffmpeg not found at {0}")]
    ExplicitNotFound(PathBuf),
    #[error("ffmpeg not found in PATH (or use --ffmpeg)")]
    NotFound,
}

/// Shared-library search variable consulted by the dynamic loader.
#[cfg(target_os = "windows")]
pub const LIBRARY_PATH_VAR: &str = "PATH";
#[cfg(target_os = "macos")]
pub const LIBRARY_PATH_VAR: &str = "DYLD_LIBRARY_PATH";
#[cfg(not(any(target_os = "windows", target_os = "macos")))]
pub const LIBRARY_PATH_VAR: &str = "LD_LIBRARY_PATH";

/// A resolved ffmpeg executable, plus the directory holding its shared
/// libraries when it is a bundled build.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FfmpegLocation {
    pub executable: PathBuf,
    pub lib_dir: Option<PathBuf>,
}

impl FfmpegLocation {
    pub fn new(executable: PathBuf) -> Self {
        Self {
            executable,
            lib_dir: None,
        }
    }

    /// The `(variable, value)` pair to set on the child process so a bundled
    /// build finds its libraries. `None` for system builds.
    ///
    /// The library directory is prepended to the parent's current value; the
    /// parent environment itself is only read.
    pub fn library_env(&self) -> Option<(&'static str, OsString)> {
        let lib_dir = self.lib_dir.as_ref()?;
        prepend_search_path(lib_dir, env::var_os(LIBRARY_PATH_VAR))
            .map(|value| (LIBRARY_PATH_VAR, value))
    }
}

/// Resolve the ffmpeg executable.
///
/// Resolution order:
/// 1. Explicit path (or bare name looked up in `PATH`)
/// 2. Bundled build under `<bundled_root>/third_party/ffmpeg/bin/`
/// 3. `ffmpeg` on `PATH`
pub fn resolve(
    explicit: Option<&Path>,
    bundled_root: Option<&Path>,
) -> Result<FfmpegLocation, LocateError> {
    resolve_with(explicit, bundled_root, |name| which::which(name).ok())
}

fn resolve_with<F>(
    explicit: Option<&Path>,
    bundled_root: Option<&Path>,
    search: F,
) -> Result<FfmpegLocation, LocateError>
where
    F: Fn(&OsStr) -> Option<PathBuf>,
{
    // 1. Explicit override
    if let Some(path) = explicit {
        if path.is_file() {
            return Ok(FfmpegLocation::new(path.to_path_buf()));
        }
        return search(path.as_os_str())
            .map(FfmpegLocation::new)
            .ok_or_else(|| LocateError::ExplicitNotFound(path.to_path_buf()));
    }

    // 2. Bundled build next to the running executable
    if let Some(root) = bundled_root {
        if let Some(location) = bundled(root) {
            return Ok(location);
        }
    }

    // 3. PATH
    search(OsStr::new(FFMPEG_BINARY_NAME))
        .map(FfmpegLocation::new)
        .ok_or(LocateError::NotFound)
}

fn bundled(root: &Path) -> Option<FfmpegLocation> {
    let base = root.join(BUNDLED_FFMPEG_DIR);
    let executable = base
        .join("bin")
        .join(format!("{FFMPEG_BINARY_NAME}{}", env::consts::EXE_SUFFIX));
    if !executable.is_file() {
        return None;
    }
    let lib_dir = base.join("lib");
    Some(FfmpegLocation {
        executable,
        lib_dir: lib_dir.is_dir().then_some(lib_dir),
    })
}

fn prepend_search_path(dir: &Path, existing: Option<OsString>) -> Option<OsString> {
    let mut paths = vec![dir.to_path_buf()];
    if let Some(existing) = existing {
        paths.extend(env::split_paths(&existing));
    }
    match env::join_paths(paths) {
        Ok(value) => Some(value),
        Err(e) => {
            log::warn!("Cannot add {} to {LIBRARY_PATH_VAR}: {e}", dir.display());
            None
        }
    }
}
