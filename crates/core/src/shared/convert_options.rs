use std::path::{Path, PathBuf};

use crate::transcode::domain::encode_settings::{AudioEncodeSettings, VideoEncodeSettings};

/// What to do with the rest of the batch after a job fails.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Stop at the first failed job; later inputs are not attempted.
    #[default]
    FailFast,
    /// Attempt every input and report all failures at the end.
    KeepGoing,
}

/// Run-wide settings, fixed before the first job starts.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConvertOptions {
    pub recursive: bool,
    pub keep_webm: bool,
    pub force: bool,
    pub audio: bool,
    pub video: VideoEncodeSettings,
    pub audio_encoding: AudioEncodeSettings,
    pub failure_policy: FailurePolicy,
    /// Explicit transcoder executable; resolved by the caller.
    pub ffmpeg: Option<PathBuf>,
}

/// Where a run places its outputs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutputLayout {
    /// Receives `.video` containers and intermediate `.webm` files.
    pub video_dir: PathBuf,
    /// Receives extracted `.opus` tracks.
    pub audio_dir: PathBuf,
}

impl OutputLayout {
    /// Uses `audio_dir` when given, otherwise the conventional sibling of
    /// `video_dir` (see [`default_audio_dir`]).
    pub fn new(video_dir: PathBuf, audio_dir: Option<PathBuf>) -> Self {
        let audio_dir = audio_dir.unwrap_or_else(|| default_audio_dir(&video_dir));
        Self {
            video_dir,
            audio_dir,
        }
    }
}

/// `out/videos` -> `out/videos_audio`. A directory without a final component
/// (`.`, `/`) gets an `audio` subdirectory instead.
pub fn default_audio_dir(video_dir: &Path) -> PathBuf {
    match video_dir.file_name() {
        Some(name) => {
            let mut sibling = name.to_owned();
            sibling.push("_audio");
            video_dir.with_file_name(sibling)
        }
        None => video_dir.join("audio"),
    }
}
