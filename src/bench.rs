//! Benchmark orchestration: discovers a corpus, streams every recording
//! through one pipeline, records predictions and scores them.

use std::path::{Path, PathBuf};

use indicatif::{ProgressBar, ProgressStyle};

use crate::corpus;
use crate::defaults;
use crate::engine::{PipelineBuilder, PipelineConfig};
use crate::error::{DiabenchError, Result};
use crate::metrics::{self, MissingReference, Report};
use crate::runner;
use crate::sink::PredictionSink;

/// Where a benchmark reads from and what it does with the results.
///
/// At least one of `reference_dir` (score the run) and `output_dir`
/// (persist the run) must be set; a run with neither would compute
/// predictions and drop them on the floor.
#[derive(Debug, Clone)]
pub struct BenchmarkConfig {
    /// Directory of `.wav` recordings to stream.
    pub audio_dir: PathBuf,
    /// Directory of `<uri>.rttm` ground-truth annotations.
    pub reference_dir: Option<PathBuf>,
    /// Directory receiving prediction files and `report.csv`.
    pub output_dir: Option<PathBuf>,
    /// Reset the pipeline between recordings so speaker state does not
    /// leak across files.
    pub reset_between_files: bool,
    pub missing_reference: MissingReference,
    pub show_progress: bool,
    pub show_report: bool,
}

impl BenchmarkConfig {
    pub fn new(audio_dir: impl Into<PathBuf>) -> Self {
        Self {
            audio_dir: audio_dir.into(),
            reference_dir: None,
            output_dir: None,
            reset_between_files: true,
            missing_reference: MissingReference::default(),
            show_progress: true,
            show_report: true,
        }
    }

    pub fn with_reference_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.reference_dir = Some(dir.into());
        self
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    pub fn with_reset_between_files(mut self, reset: bool) -> Self {
        self.reset_between_files = reset;
        self
    }

    pub fn with_missing_reference(mut self, policy: MissingReference) -> Self {
        self.missing_reference = policy;
        self
    }

    pub fn with_show_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    pub fn with_show_report(mut self, show: bool) -> Self {
        self.show_report = show;
        self
    }
}

/// What a benchmark run produced.
#[derive(Debug)]
pub enum BenchmarkOutcome {
    /// Scored against ground truth.
    Report(Report),
    /// No reference configured; predictions were only recorded.
    Predictions(Vec<PathBuf>),
}

impl BenchmarkOutcome {
    /// Corpus-level error rate, when the run was scored.
    pub fn error_rate(&self) -> Option<f64> {
        match self {
            Self::Report(report) => Some(report.error_rate()),
            Self::Predictions(_) => None,
        }
    }

    pub fn report(&self) -> Option<&Report> {
        match self {
            Self::Report(report) => Some(report),
            Self::Predictions(_) => None,
        }
    }
}

/// A validated benchmark over one corpus.
///
/// Construction checks every directory up front so a sweep fails
/// before its first run rather than mid-grid.
pub struct Benchmark {
    config: BenchmarkConfig,
    sink: Option<PredictionSink>,
}

impl Benchmark {
    pub fn new(config: BenchmarkConfig) -> Result<Self> {
        if !config.audio_dir.is_dir() {
            return Err(DiabenchError::CorpusDirNotFound {
                path: config.audio_dir.display().to_string(),
            });
        }
        if config.reference_dir.is_none() && config.output_dir.is_none() {
            return Err(DiabenchError::BenchmarkTargetMissing);
        }
        if let Some(dir) = &config.reference_dir
            && !dir.is_dir()
        {
            return Err(DiabenchError::ConfigInvalidValue {
                key: "reference_dir".to_string(),
                message: format!("not a directory: {}", dir.display()),
            });
        }

        let sink = match &config.output_dir {
            Some(dir) => Some(PredictionSink::create(dir)?),
            None => None,
        };

        Ok(Self { config, sink })
    }

    pub fn config(&self) -> &BenchmarkConfig {
        &self.config
    }

    pub fn has_reference(&self) -> bool {
        self.config.reference_dir.is_some()
    }

    /// Runs one pipeline setting over the whole corpus.
    ///
    /// A single pipeline is built and reused for every recording, reset
    /// in between unless configured otherwise. Predictions are appended
    /// under the setting's label before scoring, so the run is on disk
    /// even if evaluation fails afterwards.
    pub fn run(
        &self,
        builder: &dyn PipelineBuilder,
        pipeline_config: &PipelineConfig,
    ) -> Result<BenchmarkOutcome> {
        pipeline_config.validate()?;

        let recordings = corpus::discover(&self.config.audio_dir)?;
        if recordings.is_empty() {
            return Err(DiabenchError::EmptyCorpus {
                path: self.config.audio_dir.display().to_string(),
            });
        }

        let label = pipeline_config.label();
        let mut pipeline = builder.build(pipeline_config)?;
        let mut predictions = Vec::with_capacity(recordings.len());
        let mut recorded_paths = Vec::new();

        for (index, recording) in recordings.iter().enumerate() {
            if index > 0 && self.config.reset_between_files {
                pipeline.reset();
            }

            let progress = self.file_progress(&recording.uri);
            let timeline =
                runner::stream_recording(pipeline.as_mut(), pipeline_config, recording, &progress)?;
            progress.finish_and_clear();

            if let Some(sink) = &self.sink {
                recorded_paths.push(sink.record(&timeline, &label)?);
            }
            predictions.push(timeline);
        }

        match &self.config.reference_dir {
            Some(reference_dir) => {
                let report = metrics::evaluate(
                    &predictions,
                    reference_dir,
                    self.config.missing_reference,
                )?;
                if self.config.show_report {
                    report.print();
                }
                if let Some(output_dir) = &self.config.output_dir {
                    report.append_csv(&output_dir.join(defaults::REPORT_FILE_NAME))?;
                }
                Ok(BenchmarkOutcome::Report(report))
            }
            None => Ok(BenchmarkOutcome::Predictions(recorded_paths)),
        }
    }

    fn file_progress(&self, uri: &str) -> ProgressBar {
        if !self.config.show_progress {
            return ProgressBar::hidden();
        }
        let bar = ProgressBar::new(0);
        #[allow(clippy::expect_used)]
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{msg:<24} [{bar:40.cyan/blue}] {pos}/{len} blocks ({eta})")
                // SAFETY: hardcoded template string is valid
                .expect("hardcoded progress bar template")
                .progress_chars("#>-"),
        );
        bar.set_message(uri.to_string());
        bar
    }
}

/// Report path for an output directory.
pub fn report_path(output_dir: &Path) -> PathBuf {
    output_dir.join(defaults::REPORT_FILE_NAME)
}
