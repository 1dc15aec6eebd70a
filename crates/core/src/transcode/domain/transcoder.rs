use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::transcode::domain::encode_settings::{AudioEncodeSettings, VideoEncodeSettings};

#[derive(Error, Debug)]
pub enum TranscodeError {
    #[error("failed to launch {program}: {source}")]
    Launch {
        program: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{program} exited with {status}\n{output}")]
    Failed {
        program: PathBuf,
        status: String,
        output: String,
    },
}

/// Abstracts the external encoder so the pipeline can be driven without
/// depending on a specific transcoder binary.
pub trait Transcoder: Send {
    /// Encode the video stream of `input` to a video-only VP9/WebM file.
    ///
    /// When `overwrite` is false an existing `output` must be left alone and
    /// reported as a failure.
    fn encode_video(
        &self,
        input: &Path,
        output: &Path,
        settings: &VideoEncodeSettings,
        overwrite: bool,
    ) -> Result<(), TranscodeError>;

    /// Extract the audio stream of `input` to an audio-only Opus file.
    fn extract_audio(
        &self,
        input: &Path,
        output: &Path,
        settings: &AudioEncodeSettings,
        overwrite: bool,
    ) -> Result<(), TranscodeError>;
}
