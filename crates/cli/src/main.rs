use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, ValueEnum};

use vidpack_core::discovery::infrastructure::input_enumerator;
use vidpack_core::pipeline::convert_videos_use_case::ConvertVideosUseCase;
use vidpack_core::pipeline::pipeline_logger::{PipelineLogger, StdoutPipelineLogger};
use vidpack_core::shared::constants::{
    CPU_USED_RANGE, DEFAULT_AUDIO_BITRATE_KBPS, DEFAULT_CPU_USED, DEFAULT_CRF, MAX_CRF,
};
use vidpack_core::shared::convert_options::{ConvertOptions, FailurePolicy, OutputLayout};
use vidpack_core::transcode::domain::encode_settings::{
    AudioEncodeSettings, Deadline, VideoEncodeSettings,
};
use vidpack_core::transcode::infrastructure::ffmpeg_locator;
use vidpack_core::transcode::infrastructure::ffmpeg_transcoder::FfmpegTranscoder;

/// Convert videos to WebM (VP9) and wrap them into .video containers.
#[derive(Parser, Debug)]
#[command(name = "vidpack", version)]
struct Cli {
    /// Input video file or directory.
    input: PathBuf,

    /// Output directory for .video files.
    output: PathBuf,

    /// Scan the input directory recursively.
    #[arg(long)]
    recursive: bool,

    /// Keep intermediate .webm files.
    #[arg(long)]
    keep_webm: bool,

    /// Overwrite outputs if they exist.
    #[arg(long)]
    force: bool,

    /// Also extract the audio track as Opus.
    #[arg(long)]
    audio: bool,

    /// Opus bitrate in kbps.
    #[arg(long, default_value_t = DEFAULT_AUDIO_BITRATE_KBPS)]
    audio_bitrate: u32,

    /// Directory for extracted audio (default: <output>_audio next to the output directory).
    #[arg(long)]
    audio_out: Option<PathBuf>,

    /// VP9 quality (0-63, lower = better, 15-40 typical).
    #[arg(long, default_value_t = DEFAULT_CRF)]
    crf: u32,

    /// Encoding deadline.
    #[arg(long, value_enum, default_value_t = DeadlineArg::Good)]
    deadline: DeadlineArg,

    /// VP9 speed/quality trade-off (-8 to 8, higher = faster).
    #[arg(long, default_value_t = DEFAULT_CPU_USED, allow_negative_numbers = true)]
    cpu_used: i32,

    /// Path to the ffmpeg binary.
    #[arg(long)]
    ffmpeg: Option<PathBuf>,

    /// Continue with the remaining inputs after a failure.
    #[arg(long)]
    keep_going: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum DeadlineArg {
    Realtime,
    Good,
    Best,
}

impl From<DeadlineArg> for Deadline {
    fn from(arg: DeadlineArg) -> Self {
        match arg {
            DeadlineArg::Realtime => Deadline::Realtime,
            DeadlineArg::Good => Deadline::Good,
            DeadlineArg::Best => Deadline::Best,
        }
    }
}

/// How a run that did not hit a fatal error ended.
#[derive(Debug, PartialEq, Eq)]
enum RunStatus {
    Completed,
    NoInputs,
    JobsFailed,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(RunStatus::Completed) => {}
        Ok(RunStatus::NoInputs) => process::exit(1),
        Ok(RunStatus::JobsFailed) => process::exit(2),
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(2);
        }
    }
}

fn run(cli: Cli) -> Result<RunStatus, Box<dyn std::error::Error>> {
    validate(&cli)?;
    let input = cli.input.clone();
    let (options, layout) = into_options(cli);

    let mut logger = StdoutPipelineLogger::new();
    let bundled_root = executable_dir();
    let location = ffmpeg_locator::resolve(options.ffmpeg.as_deref(), bundled_root.as_deref())?;
    logger.info(&format!("Using ffmpeg: {}", location.executable.display()));
    if let Some(lib_dir) = &location.lib_dir {
        logger.info(&format!("Using ffmpeg libs: {}", lib_dir.display()));
    }

    let inputs = input_enumerator::enumerate(&input, options.recursive)?;
    if inputs.is_empty() {
        logger.info("No input videos found.");
        return Ok(RunStatus::NoInputs);
    }
    log::info!(
        "Converting {} input(s) into {}",
        inputs.len(),
        layout.video_dir.display()
    );

    let mut use_case = ConvertVideosUseCase::new(
        Box::new(FfmpegTranscoder::new(location)),
        Box::new(logger),
        options,
        layout,
    );
    let report = use_case.execute(&inputs)?;

    let mut failed = false;
    for error in report.failures() {
        eprintln!("Error: {error}");
        failed = true;
    }
    let skipped = report.skipped().count();
    if skipped > 0 {
        eprintln!("Stopped early; {skipped} input(s) not attempted.");
    }

    Ok(if failed {
        RunStatus::JobsFailed
    } else {
        RunStatus::Completed
    })
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if cli.crf > MAX_CRF {
        return Err(format!("CRF must be between 0 and {MAX_CRF}, got {}", cli.crf).into());
    }
    if !CPU_USED_RANGE.contains(&cli.cpu_used) {
        return Err(format!(
            "cpu-used must be between {} and {}, got {}",
            CPU_USED_RANGE.start(),
            CPU_USED_RANGE.end(),
            cli.cpu_used
        )
        .into());
    }
    if cli.audio_bitrate == 0 {
        return Err("Audio bitrate must be a positive number of kbps".into());
    }
    Ok(())
}

fn into_options(cli: Cli) -> (ConvertOptions, OutputLayout) {
    let options = ConvertOptions {
        recursive: cli.recursive,
        keep_webm: cli.keep_webm,
        force: cli.force,
        audio: cli.audio,
        video: VideoEncodeSettings {
            crf: cli.crf,
            deadline: cli.deadline.into(),
            cpu_used: cli.cpu_used,
        },
        audio_encoding: AudioEncodeSettings {
            bitrate_kbps: cli.audio_bitrate,
        },
        failure_policy: if cli.keep_going {
            FailurePolicy::KeepGoing
        } else {
            FailurePolicy::FailFast
        },
        ffmpeg: cli.ffmpeg,
    };
    let layout = OutputLayout::new(cli.output, cli.audio_out);
    (options, layout)
}

/// Directory holding the running binary; a bundled ffmpeg is looked up here.
fn executable_dir() -> Option<PathBuf> {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
}
