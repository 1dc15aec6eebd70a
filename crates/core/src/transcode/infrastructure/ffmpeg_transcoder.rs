use std::ffi::OsString;
use std::path::Path;
use std::process::Command;

use crate::transcode::domain::encode_settings::{AudioEncodeSettings, VideoEncodeSettings};
use crate::transcode::domain::transcoder::{TranscodeError, Transcoder};
use crate::transcode::infrastructure::ffmpeg_locator::FfmpegLocation;

/// Lines of ffmpeg output kept in a failure report.
const OUTPUT_TAIL_LINES: usize = 20;

/// Runs an ffmpeg executable as a child process, one blocking call per pass.
///
/// No timeout is applied: a hung ffmpeg blocks the caller.
pub struct FfmpegTranscoder {
    location: FfmpegLocation,
}

impl FfmpegTranscoder {
    pub fn new(location: FfmpegLocation) -> Self {
        Self { location }
    }

    fn run(&self, args: Vec<OsString>) -> Result<(), TranscodeError> {
        let program = &self.location.executable;
        let mut cmd = Command::new(program);
        cmd.args(&args);
        if let Some((var, value)) = self.location.library_env() {
            cmd.env(var, value);
        }

        log::debug!("Running {cmd:?}");
        let output = cmd.output().map_err(|e| TranscodeError::Launch {
            program: program.clone(),
            source: e,
        })?;

        if output.status.success() {
            return Ok(());
        }

        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));
        Err(TranscodeError::Failed {
            program: program.clone(),
            status: output.status.to_string(),
            output: tail_lines(&combined, OUTPUT_TAIL_LINES),
        })
    }
}

impl Transcoder for FfmpegTranscoder {
    fn encode_video(
        &self,
        input: &Path,
        output: &Path,
        settings: &VideoEncodeSettings,
        overwrite: bool,
    ) -> Result<(), TranscodeError> {
        self.run(video_args(input, output, settings, overwrite))
    }

    fn extract_audio(
        &self,
        input: &Path,
        output: &Path,
        settings: &AudioEncodeSettings,
        overwrite: bool,
    ) -> Result<(), TranscodeError> {
        self.run(audio_args(input, output, settings, overwrite))
    }
}

/// `-y` lets ffmpeg replace an existing output, `-n` makes it fail instead.
fn overwrite_flag(overwrite: bool) -> &'static str {
    if overwrite {
        "-y"
    } else {
        "-n"
    }
}

/// Video-only VP9 in constant-quality mode (`-b:v 0` + `-crf`).
pub fn video_args(
    input: &Path,
    output: &Path,
    settings: &VideoEncodeSettings,
    overwrite: bool,
) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec![overwrite_flag(overwrite).into(), "-i".into()];
    args.push(input.as_os_str().to_owned());
    args.extend(["-c:v", "libvpx-vp9", "-b:v", "0", "-crf"].map(OsString::from));
    args.push(settings.crf.to_string().into());
    args.extend(
        ["-row-mt", "1", "-deadline", settings.deadline.as_str(), "-cpu-used"].map(OsString::from),
    );
    args.push(settings.cpu_used.to_string().into());
    args.push("-an".into());
    args.push(output.as_os_str().to_owned());
    args
}

pub fn audio_args(
    input: &Path,
    output: &Path,
    settings: &AudioEncodeSettings,
    overwrite: bool,
) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec![overwrite_flag(overwrite).into(), "-i".into()];
    args.push(input.as_os_str().to_owned());
    args.extend(["-vn", "-c:a", "libopus", "-b:a"].map(OsString::from));
    args.push(format!("{}k", settings.bitrate_kbps).into());
    args.push(output.as_os_str().to_owned());
    args
}

fn tail_lines(text: &str, count: usize) -> String {
    let lines: Vec<&str> = text.lines().collect();
    let start = lines.len().saturating_sub(count);
    lines[start..].join("\n")
}
