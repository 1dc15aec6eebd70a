use std::ffi::OsStr;
use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::container::domain::container_header::ContainerError;
use crate::shared::constants::{AUDIO_EXTENSION, CONTAINER_EXTENSION, INTERMEDIATE_EXTENSION};
use crate::shared::convert_options::OutputLayout;
use crate::transcode::domain::transcoder::TranscodeError;

/// One input file and every path derived from it.
///
/// Outputs are named after the input's stem and placed flat in the layout's
/// directories, so inputs sharing a stem map to the same outputs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Job {
    pub input: PathBuf,
    pub webm_path: PathBuf,
    pub video_path: PathBuf,
    pub audio_path: Option<PathBuf>,
}

impl Job {
    pub fn plan(input: &Path, layout: &OutputLayout, with_audio: bool) -> Self {
        let stem = input.file_stem().unwrap_or_else(|| input.as_os_str());
        Self {
            input: input.to_path_buf(),
            webm_path: derived(&layout.video_dir, stem, INTERMEDIATE_EXTENSION),
            video_path: derived(&layout.video_dir, stem, CONTAINER_EXTENSION),
            audio_path: with_audio.then(|| derived(&layout.audio_dir, stem, AUDIO_EXTENSION)),
        }
    }
}

fn derived(dir: &Path, stem: &OsStr, extension: &str) -> PathBuf {
    let mut name = stem.to_owned();
    name.push(".");
    name.push(extension);
    dir.join(name)
}

/// Where a job is in its lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum JobStage {
    Pending,
    Transcoding,
    Wrapping,
    AudioExtracting,
    Cleanup,
    Done,
}

impl JobStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStage::Pending => "pending",
            JobStage::Transcoding => "transcode",
            JobStage::Wrapping => "wrap",
            JobStage::AudioExtracting => "audio",
            JobStage::Cleanup => "cleanup",
            JobStage::Done => "done",
        }
    }
}

impl fmt::Display for JobStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failed job. Every variant names the input that caused it.
#[derive(Error, Debug)]
pub enum JobError {
    #[error("ffmpeg failed for {input}: {source}")]
    Transcode {
        input: PathBuf,
        #[source]
        source: TranscodeError,
    },
    #[error("output exists: {output} (from {input}; use --force to overwrite)")]
    OutputExists { input: PathBuf, output: PathBuf },
    #[error("failed to write {output} for {input}: {source}")]
    Container {
        input: PathBuf,
        output: PathBuf,
        #[source]
        source: ContainerError,
    },
    #[error("audio extraction failed for {input}: {source}")]
    AudioExtraction {
        input: PathBuf,
        #[source]
        source: TranscodeError,
    },
}

impl JobError {
    pub fn input(&self) -> &Path {
        match self {
            JobError::Transcode { input, .. }
            | JobError::OutputExists { input, .. }
            | JobError::Container { input, .. }
            | JobError::AudioExtraction { input, .. } => input,
        }
    }

    /// The stage the job was in when it failed.
    pub fn stage(&self) -> JobStage {
        match self {
            JobError::Transcode { .. } => JobStage::Transcoding,
            JobError::OutputExists { .. } | JobError::Container { .. } => JobStage::Wrapping,
            JobError::AudioExtraction { .. } => JobStage::AudioExtracting,
        }
    }
}

/// Final state of one enumerated input.
#[derive(Debug)]
pub enum JobOutcome {
    Built { input: PathBuf, container: PathBuf },
    Failed(JobError),
    /// Not attempted because an earlier job stopped the run.
    Skipped { input: PathBuf },
}

impl JobOutcome {
    pub fn input(&self) -> &Path {
        match self {
            JobOutcome::Built { input, .. } | JobOutcome::Skipped { input } => input,
            JobOutcome::Failed(error) => error.input(),
        }
    }
}
