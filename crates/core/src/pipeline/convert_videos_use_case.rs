use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Instant;

use thiserror::Error;

use crate::container::domain::container_header::ContainerError;
use crate::container::infrastructure::container_file_writer::wrap_file;
use crate::pipeline::job::{Job, JobError, JobOutcome, JobStage};
use crate::pipeline::pipeline_logger::PipelineLogger;
use crate::shared::convert_options::{ConvertOptions, FailurePolicy, OutputLayout};
use crate::transcode::domain::transcoder::Transcoder;

#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("failed to create output directory {path}: {source}")]
    OutputDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Per-input outcomes of one run, in enumeration order.
#[derive(Debug, Default)]
pub struct RunReport {
    pub outcomes: Vec<JobOutcome>,
}

impl RunReport {
    pub fn built(&self) -> impl Iterator<Item = &Path> {
        self.outcomes.iter().filter_map(|o| match o {
            JobOutcome::Built { container, .. } => Some(container.as_path()),
            _ => None,
        })
    }

    pub fn failures(&self) -> impl Iterator<Item = &JobError> {
        self.outcomes.iter().filter_map(|o| match o {
            JobOutcome::Failed(error) => Some(error),
            _ => None,
        })
    }

    pub fn skipped(&self) -> impl Iterator<Item = &Path> {
        self.outcomes.iter().filter_map(|o| match o {
            JobOutcome::Skipped { input } => Some(input.as_path()),
            _ => None,
        })
    }

    pub fn first_failure(&self) -> Option<&JobError> {
        self.failures().next()
    }

    pub fn is_success(&self) -> bool {
        self.first_failure().is_none()
    }
}

/// Batch pipeline: for each input, transcode → wrap → (extract audio) →
/// clean up, strictly one job at a time.
///
/// Outputs that already exist are never replaced without `force`, so an
/// interrupted batch can be re-run with the same arguments once the
/// offending outputs are dealt with.
pub struct ConvertVideosUseCase {
    transcoder: Box<dyn Transcoder>,
    logger: Box<dyn PipelineLogger>,
    options: ConvertOptions,
    layout: OutputLayout,
}

impl ConvertVideosUseCase {
    pub fn new(
        transcoder: Box<dyn Transcoder>,
        logger: Box<dyn PipelineLogger>,
        options: ConvertOptions,
        layout: OutputLayout,
    ) -> Self {
        Self {
            transcoder,
            logger,
            options,
            layout,
        }
    }

    /// Runs every input through the pipeline, honoring the failure policy.
    ///
    /// Job failures are reported in the returned [`RunReport`]; only a
    /// failure to prepare the output directories is an `Err`.
    pub fn execute(&mut self, inputs: &[PathBuf]) -> Result<RunReport, ConvertError> {
        create_dir(&self.layout.video_dir)?;
        if self.options.audio {
            create_dir(&self.layout.audio_dir)?;
        }

        let total = inputs.len();
        let mut report = RunReport::default();
        let mut stopped = false;

        for (i, input) in inputs.iter().enumerate() {
            if stopped {
                let outcome = JobOutcome::Skipped {
                    input: input.clone(),
                };
                self.logger.job_finished(&outcome);
                report.outcomes.push(outcome);
                continue;
            }

            self.logger.job_started(i + 1, total, input);
            let job = Job::plan(input, &self.layout, self.options.audio);
            let outcome = match self.run_job(&job) {
                Ok(()) => JobOutcome::Built {
                    input: job.input,
                    container: job.video_path,
                },
                Err(error) => {
                    if self.options.failure_policy == FailurePolicy::FailFast {
                        stopped = true;
                    }
                    JobOutcome::Failed(error)
                }
            };
            self.logger.job_finished(&outcome);
            report.outcomes.push(outcome);
        }

        self.logger.summary();
        Ok(report)
    }

    fn run_job(&mut self, job: &Job) -> Result<(), JobError> {
        let force = self.options.force;

        // An existing container is never replaced without --force; checked
        // before transcoding so no encode is wasted on it.
        let started = self.enter(job, JobStage::Pending);
        if !force && job.video_path.exists() {
            return Err(JobError::OutputExists {
                input: job.input.clone(),
                output: job.video_path.clone(),
            });
        }
        self.leave(JobStage::Pending, started);

        let started = self.enter(job, JobStage::Transcoding);
        self.transcoder
            .encode_video(&job.input, &job.webm_path, &self.options.video, force)
            .map_err(|source| JobError::Transcode {
                input: job.input.clone(),
                source,
            })?;
        self.leave(JobStage::Transcoding, started);

        let started = self.enter(job, JobStage::Wrapping);
        wrap_file(&job.webm_path, &job.video_path, force).map_err(|e| match e {
            ContainerError::OutputExists(output) => JobError::OutputExists {
                input: job.input.clone(),
                output,
            },
            source => JobError::Container {
                input: job.input.clone(),
                output: job.video_path.clone(),
                source,
            },
        })?;
        self.leave(JobStage::Wrapping, started);

        if let Some(audio_path) = &job.audio_path {
            let started = self.enter(job, JobStage::AudioExtracting);
            self.transcoder
                .extract_audio(&job.input, audio_path, &self.options.audio_encoding, force)
                .map_err(|source| JobError::AudioExtraction {
                    input: job.input.clone(),
                    source,
                })?;
            self.leave(JobStage::AudioExtracting, started);
        }

        if !self.options.keep_webm {
            let started = self.enter(job, JobStage::Cleanup);
            self.remove_intermediate(&job.webm_path);
            self.leave(JobStage::Cleanup, started);
        }

        log::debug!("{}: {}", JobStage::Done, job.video_path.display());
        Ok(())
    }

    /// Best-effort: a leftover intermediate is only worth a warning.
    fn remove_intermediate(&mut self, webm_path: &Path) {
        match fs::remove_file(webm_path) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => self.logger.warn(&format!(
                "Could not delete intermediate {}: {e}",
                webm_path.display()
            )),
        }
    }

    fn enter(&self, job: &Job, stage: JobStage) -> Instant {
        log::debug!("{stage}: {}", job.input.display());
        Instant::now()
    }

    fn leave(&mut self, stage: JobStage, started: Instant) {
        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
        self.logger.timing(stage, elapsed_ms);
    }
}

fn create_dir(path: &Path) -> Result<(), ConvertError> {
    fs::create_dir_all(path).map_err(|source| ConvertError::OutputDir {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::infrastructure::container_file_reader::ContainerFileReader;
    use crate::pipeline::pipeline_logger::NullPipelineLogger;
    use crate::transcode::domain::encode_settings::{AudioEncodeSettings, VideoEncodeSettings};
    use crate::transcode::domain::transcoder::TranscodeError;
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    // ─── Stubs ───

    #[derive(Clone, Debug, PartialEq)]
    enum Call {
        Video(PathBuf, PathBuf, bool),
        Audio(PathBuf, PathBuf, u32),
    }

    /// Writes `payload(input)` to the output like ffmpeg would, honoring
    /// `-n`, and fails for inputs whose file name is listed in `fail_on`.
    struct StubTranscoder {
        calls: Arc<Mutex<Vec<Call>>>,
        fail_on: Vec<&'static str>,
        fail_audio: bool,
        /// Swapped for a non-empty directory during audio extraction.
        block_cleanup_of: Option<PathBuf>,
    }

    impl StubTranscoder {
        fn new() -> Self {
            Self {
                calls: Arc::new(Mutex::new(Vec::new())),
                fail_on: Vec::new(),
                fail_audio: false,
                block_cleanup_of: None,
            }
        }

        fn failing_on(names: &[&'static str]) -> Self {
            Self {
                fail_on: names.to_vec(),
                ..Self::new()
            }
        }

        fn fails_for(&self, input: &Path) -> bool {
            let name = input.file_name().and_then(|n| n.to_str()).unwrap_or("");
            self.fail_on.iter().any(|f| *f == name)
        }
    }

    fn stub_failure() -> TranscodeError {
        TranscodeError::Failed {
            program: PathBuf::from("ffmpeg"),
            status: "exit status: 1".to_string(),
            output: "Invalid data found when processing input".to_string(),
        }
    }

    fn payload(input: &Path) -> Vec<u8> {
        format!("webm:{}", input.display()).into_bytes()
    }

    impl Transcoder for StubTranscoder {
        fn encode_video(
            &self,
            input: &Path,
            output: &Path,
            _settings: &VideoEncodeSettings,
            overwrite: bool,
        ) -> Result<(), TranscodeError> {
            self.calls.lock().unwrap().push(Call::Video(
                input.to_path_buf(),
                output.to_path_buf(),
                overwrite,
            ));
            if self.fails_for(input) || (!overwrite && output.exists()) {
                return Err(stub_failure());
            }
            fs::write(output, payload(input)).unwrap();
            Ok(())
        }

        fn extract_audio(
            &self,
            input: &Path,
            output: &Path,
            settings: &AudioEncodeSettings,
            _overwrite: bool,
        ) -> Result<(), TranscodeError> {
            self.calls.lock().unwrap().push(Call::Audio(
                input.to_path_buf(),
                output.to_path_buf(),
                settings.bitrate_kbps,
            ));
            if self.fail_audio {
                return Err(stub_failure());
            }
            if let Some(webm) = &self.block_cleanup_of {
                fs::remove_file(webm).unwrap();
                fs::create_dir(webm).unwrap();
                fs::write(webm.join("pinned"), b"x").unwrap();
            }
            fs::write(output, b"opus").unwrap();
            Ok(())
        }
    }

    /// Records warnings and the stages that reported a timing.
    #[derive(Clone, Default)]
    struct RecordingLogger {
        stages: Arc<Mutex<Vec<JobStage>>>,
        warnings: Arc<Mutex<Vec<String>>>,
    }

    impl PipelineLogger for RecordingLogger {
        fn job_started(&mut self, _index: usize, _total: usize, _input: &Path) {}
        fn timing(&mut self, stage: JobStage, _duration_ms: f64) {
            self.stages.lock().unwrap().push(stage);
        }
        fn job_finished(&mut self, _outcome: &JobOutcome) {}
        fn info(&mut self, _message: &str) {}
        fn warn(&mut self, message: &str) {
            self.warnings.lock().unwrap().push(message.to_string());
        }
    }

    // ─── Helpers ───

    struct Fixture {
        tmp: TempDir,
        inputs: Vec<PathBuf>,
    }

    impl Fixture {
        fn new(names: &[&str]) -> Self {
            let tmp = TempDir::new().unwrap();
            let src = tmp.path().join("src");
            fs::create_dir(&src).unwrap();
            let inputs = names
                .iter()
                .map(|name| {
                    let path = src.join(name);
                    fs::write(&path, b"raw video").unwrap();
                    path
                })
                .collect();
            Self { tmp, inputs }
        }

        fn out(&self) -> PathBuf {
            self.tmp.path().join("out")
        }

        fn layout(&self) -> OutputLayout {
            OutputLayout::new(self.out(), None)
        }

        fn run(
            &self,
            transcoder: StubTranscoder,
            options: ConvertOptions,
        ) -> Result<RunReport, ConvertError> {
            self.run_logged(transcoder, options, Box::new(NullPipelineLogger))
        }

        fn run_logged(
            &self,
            transcoder: StubTranscoder,
            options: ConvertOptions,
            logger: Box<dyn PipelineLogger>,
        ) -> Result<RunReport, ConvertError> {
            let mut use_case =
                ConvertVideosUseCase::new(Box::new(transcoder), logger, options, self.layout());
            use_case.execute(&self.inputs)
        }
    }

    // ─── Tests ───

    #[test]
    fn test_builds_container_for_each_input() {
        let fx = Fixture::new(&["a.mp4", "b.mkv"]);
        let report = fx.run(StubTranscoder::new(), ConvertOptions::default()).unwrap();

        assert!(report.is_success());
        let built: Vec<&Path> = report.built().collect();
        assert_eq!(built, vec![fx.out().join("a.video"), fx.out().join("b.video")]);

        let reader = ContainerFileReader::open(&fx.out().join("a.video")).unwrap();
        assert_eq!(reader.read_payload().unwrap(), payload(&fx.inputs[0]));
    }

    #[test]
    fn test_intermediate_removed_by_default() {
        let fx = Fixture::new(&["a.mp4"]);
        fx.run(StubTranscoder::new(), ConvertOptions::default()).unwrap();

        assert!(fx.out().join("a.video").exists());
        assert!(!fx.out().join("a.webm").exists());
    }

    #[test]
    fn test_stages_timed_in_order() {
        let fx = Fixture::new(&["a.mp4"]);
        let logger = RecordingLogger::default();
        let stages = logger.stages.clone();

        fx.run_logged(StubTranscoder::new(), ConvertOptions::default(), Box::new(logger))
            .unwrap();

        assert_eq!(
            *stages.lock().unwrap(),
            vec![
                JobStage::Pending,
                JobStage::Transcoding,
                JobStage::Wrapping,
                JobStage::Cleanup,
            ]
        );
    }

    #[test]
    fn test_cleanup_failure_is_only_a_warning() {
        let fx = Fixture::new(&["a.mp4"]);
        let webm = fx.out().join("a.webm");
        let mut transcoder = StubTranscoder::new();
        transcoder.block_cleanup_of = Some(webm.clone());
        let logger = RecordingLogger::default();
        let warnings = logger.warnings.clone();
        let options = ConvertOptions {
            audio: true,
            ..ConvertOptions::default()
        };

        let report = fx.run_logged(transcoder, options, Box::new(logger)).unwrap();

        assert!(report.is_success());
        assert_eq!(report.built().count(), 1);
        assert!(fx.out().join("a.video").exists());
        assert!(webm.is_dir());
        let warnings = warnings.lock().unwrap();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("a.webm"));
    }

    #[test]
    fn test_keep_webm_retains_transcoder_output() {
        let fx = Fixture::new(&["a.mp4"]);
        let options = ConvertOptions {
            keep_webm: true,
            ..ConvertOptions::default()
        };
        fx.run(StubTranscoder::new(), options).unwrap();

        let webm = fs::read(fx.out().join("a.webm")).unwrap();
        assert_eq!(webm, payload(&fx.inputs[0]));
    }

    #[test]
    fn test_fail_fast_stops_after_failed_job() {
        let fx = Fixture::new(&["a.mp4", "b.mp4", "c.mp4"]);
        let transcoder = StubTranscoder::failing_on(&["b.mp4"]);
        let calls = transcoder.calls.clone();

        let report = fx.run(transcoder, ConvertOptions::default()).unwrap();

        assert!(fx.out().join("a.video").exists());
        assert!(!fx.out().join("b.video").exists());
        assert!(!fx.out().join("c.video").exists());

        let failure = report.first_failure().unwrap();
        assert_eq!(failure.input(), fx.inputs[1].as_path());
        assert!(matches!(failure, JobError::Transcode { .. }));
        assert!(failure.to_string().contains("b.mp4"));

        let skipped: Vec<&Path> = report.skipped().collect();
        assert_eq!(skipped, vec![fx.inputs[2].as_path()]);

        // c.mp4 never reached the transcoder
        let calls = calls.lock().unwrap();
        assert_eq!(calls.len(), 2);
        assert!(calls
            .iter()
            .all(|c| !matches!(c, Call::Video(input, _, _) if input == &fx.inputs[2])));
    }

    #[test]
    fn test_keep_going_attempts_every_input() {
        let fx = Fixture::new(&["a.mp4", "b.mp4", "c.mp4"]);
        let options = ConvertOptions {
            failure_policy: FailurePolicy::KeepGoing,
            ..ConvertOptions::default()
        };

        let report = fx.run(StubTranscoder::failing_on(&["b.mp4"]), options).unwrap();

        assert!(!report.is_success());
        assert_eq!(report.built().count(), 2);
        assert_eq!(report.failures().count(), 1);
        assert_eq!(report.skipped().count(), 0);
        assert!(fx.out().join("c.video").exists());
    }

    #[test]
    fn test_second_run_without_force_fails_and_preserves_outputs() {
        let fx = Fixture::new(&["a.mp4", "b.mp4"]);
        fx.run(StubTranscoder::new(), ConvertOptions::default()).unwrap();
        let first_a = fs::read(fx.out().join("a.video")).unwrap();
        let first_b = fs::read(fx.out().join("b.video")).unwrap();

        let transcoder = StubTranscoder::new();
        let calls = transcoder.calls.clone();
        let report = fx.run(transcoder, ConvertOptions::default()).unwrap();

        match report.first_failure() {
            Some(JobError::OutputExists { input, output }) => {
                assert_eq!(input, &fx.inputs[0]);
                assert_eq!(output, &fx.out().join("a.video"));
            }
            other => panic!("expected OutputExists, got {other:?}"),
        }
        assert_eq!(report.skipped().count(), 1);
        assert!(calls.lock().unwrap().is_empty());
        assert_eq!(fs::read(fx.out().join("a.video")).unwrap(), first_a);
        assert_eq!(fs::read(fx.out().join("b.video")).unwrap(), first_b);
    }

    #[test]
    fn test_force_rebuilds_existing_outputs() {
        let fx = Fixture::new(&["a.mp4"]);
        fs::create_dir_all(fx.out()).unwrap();
        fs::write(fx.out().join("a.video"), b"stale").unwrap();
        let transcoder = StubTranscoder::new();
        let calls = transcoder.calls.clone();
        let options = ConvertOptions {
            force: true,
            ..ConvertOptions::default()
        };

        let report = fx.run(transcoder, options).unwrap();

        assert!(report.is_success());
        let reader = ContainerFileReader::open(&fx.out().join("a.video")).unwrap();
        assert_eq!(reader.read_payload().unwrap(), payload(&fx.inputs[0]));
        assert!(matches!(calls.lock().unwrap()[0], Call::Video(_, _, true)));
    }

    #[test]
    fn test_audio_extracted_into_audio_dir() {
        let fx = Fixture::new(&["a.mp4"]);
        let transcoder = StubTranscoder::new();
        let calls = transcoder.calls.clone();
        let options = ConvertOptions {
            audio: true,
            audio_encoding: AudioEncodeSettings { bitrate_kbps: 64 },
            ..ConvertOptions::default()
        };

        fx.run(transcoder, options).unwrap();

        let audio_path = fx.tmp.path().join("out_audio").join("a.opus");
        assert!(audio_path.exists());
        let calls = calls.lock().unwrap();
        assert_eq!(
            calls[1],
            Call::Audio(fx.inputs[0].clone(), audio_path, 64)
        );
    }

    #[test]
    fn test_audio_failure_stops_run() {
        let fx = Fixture::new(&["a.mp4", "b.mp4"]);
        let mut transcoder = StubTranscoder::new();
        transcoder.fail_audio = true;
        let options = ConvertOptions {
            audio: true,
            ..ConvertOptions::default()
        };

        let report = fx.run(transcoder, options).unwrap();

        let failure = report.first_failure().unwrap();
        assert!(matches!(failure, JobError::AudioExtraction { .. }));
        assert_eq!(failure.stage(), JobStage::AudioExtracting);
        assert_eq!(failure.input(), fx.inputs[0].as_path());
        assert_eq!(report.skipped().count(), 1);
    }

    #[test]
    fn test_no_audio_dir_without_audio() {
        let fx = Fixture::new(&["a.mp4"]);
        fx.run(StubTranscoder::new(), ConvertOptions::default()).unwrap();
        assert!(!fx.tmp.path().join("out_audio").exists());
    }

    #[test]
    fn test_empty_input_list_creates_output_dir() {
        let fx = Fixture::new(&[]);
        let report = fx.run(StubTranscoder::new(), ConvertOptions::default()).unwrap();
        assert!(report.outcomes.is_empty());
        assert!(report.is_success());
        assert!(fx.out().is_dir());
    }

    #[test]
    fn test_output_dir_blocked_by_file() {
        let fx = Fixture::new(&["a.mp4"]);
        fs::write(fx.out(), b"not a directory").unwrap();
        let result = fx.run(StubTranscoder::new(), ConvertOptions::default());
        assert!(matches!(result, Err(ConvertError::OutputDir { .. })));
    }
}
