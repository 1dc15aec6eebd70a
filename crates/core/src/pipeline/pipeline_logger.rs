use std::collections::HashMap;
use std::path::Path;
use std::time::Instant;

use crate::pipeline::job::{JobOutcome, JobStage};

/// Cross-cutting logger for batch orchestration events.
///
/// Decouples the use case from specific output mechanisms (stdout, log
/// crate) so each caller can observe a run without changing the
/// orchestration code.
pub trait PipelineLogger: Send {
    /// A job is about to start. `index` is 1-based.
    fn job_started(&mut self, index: usize, total: usize, input: &Path);

    /// Record how long a stage took for one job.
    fn timing(&mut self, stage: JobStage, duration_ms: f64);

    /// A job reached a terminal state.
    fn job_finished(&mut self, outcome: &JobOutcome);

    /// Log a human-readable status message.
    fn info(&mut self, message: &str);

    /// Report a problem that does not fail the job.
    fn warn(&mut self, message: &str);

    /// Emit an end-of-run summary. Default: no-op.
    fn summary(&self) {}
}

/// Silent logger that discards all events. Used by tests.
pub struct NullPipelineLogger;

impl PipelineLogger for NullPipelineLogger {
    fn job_started(&mut self, _index: usize, _total: usize, _input: &Path) {}
    fn timing(&mut self, _stage: JobStage, _duration_ms: f64) {}
    fn job_finished(&mut self, _outcome: &JobOutcome) {}
    fn info(&mut self, _message: &str) {}
    fn warn(&mut self, _message: &str) {}
}

/// CLI-oriented logger: prints progress lines to stdout, tracks per-stage
/// timing and outcome counts, and provides a summary at the end of the run.
pub struct StdoutPipelineLogger {
    timings: HashMap<JobStage, Vec<f64>>,
    start_time: Instant,
    built: usize,
    failed: usize,
    skipped: usize,
    warnings: Vec<String>,
}

impl StdoutPipelineLogger {
    pub fn new() -> Self {
        Self {
            timings: HashMap::new(),
            start_time: Instant::now(),
            built: 0,
            failed: 0,
            skipped: 0,
            warnings: Vec::new(),
        }
    }

    /// Returns the formatted summary string, or `None` if no job finished.
    pub fn summary_string(&self) -> Option<String> {
        let jobs = self.built + self.failed + self.skipped;
        if jobs == 0 {
            return None;
        }

        let elapsed_ms = self.start_time.elapsed().as_secs_f64() * 1000.0;
        let mut lines = Vec::new();

        lines.push(format!(
            "Run summary ({jobs} inputs, {:.1}s total):",
            elapsed_ms / 1000.0
        ));

        let mut stages: Vec<_> = self.timings.keys().collect();
        stages.sort_by_key(|stage| stage.as_str());
        for stage in stages {
            let durations = &self.timings[stage];
            let total_ms: f64 = durations.iter().sum();
            let avg_ms = if durations.is_empty() {
                0.0
            } else {
                total_ms / durations.len() as f64
            };
            let pct = if elapsed_ms > 0.0 {
                total_ms / elapsed_ms * 100.0
            } else {
                0.0
            };
            lines.push(format!(
                "  {:10}: avg {avg_ms:8.1}ms  total {total_ms:9.0}ms  ({pct:4.1}%)",
                stage.as_str()
            ));
        }

        lines.push(format!(
            "  Built: {}  Failed: {}  Skipped: {}",
            self.built, self.failed, self.skipped
        ));
        if !self.warnings.is_empty() {
            lines.push(format!("  Warnings: {}", self.warnings.len()));
        }

        Some(lines.join("\n"))
    }

    /// Returns the timing data for a given stage.
    pub fn timings_for(&self, stage: JobStage) -> Option<&[f64]> {
        self.timings.get(&stage).map(|v| v.as_slice())
    }
}

impl Default for StdoutPipelineLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineLogger for StdoutPipelineLogger {
    fn job_started(&mut self, index: usize, total: usize, input: &Path) {
        println!("[{index}/{total}] {}", input.display());
    }

    fn timing(&mut self, stage: JobStage, duration_ms: f64) {
        self.timings.entry(stage).or_default().push(duration_ms);
    }

    fn job_finished(&mut self, outcome: &JobOutcome) {
        match outcome {
            JobOutcome::Built { container, .. } => {
                self.built += 1;
                println!("Built {}", container.display());
            }
            JobOutcome::Failed(error) => {
                self.failed += 1;
                log::debug!("Job failed during {}: {error}", error.stage());
            }
            JobOutcome::Skipped { input } => {
                self.skipped += 1;
                log::debug!("Not attempted: {}", input.display());
            }
        }
    }

    fn info(&mut self, message: &str) {
        println!("{message}");
    }

    fn warn(&mut self, message: &str) {
        self.warnings.push(message.to_string());
        log::warn!("{message}");
    }

    fn summary(&self) {
        if let Some(text) = self.summary_string() {
            println!("\n{text}");
        }
    }
}
