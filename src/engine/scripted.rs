//! Scripted pipeline used by the harness's own tests.
//!
//! Emits predetermined segments instead of analyzing audio, and counts
//! the calls it receives so tests can assert on runner behavior.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::engine::{PipelineBuilder, PipelineConfig, SpeakerPipeline};
use crate::error::{DiabenchError, Result};
use crate::timeline::SpeakerSegment;

/// Test double that replays scripted segments.
///
/// Scripts are authored on the pipeline's input clock; `finish` applies
/// the configured timestamp shift, mirroring a real engine that only
/// ever sees padded audio. One script is consumed per `finish`, so a
/// multi-recording run scripts one entry per file via
/// [`with_run`](ScriptedPipeline::with_run).
#[derive(Debug, Clone, Default)]
pub struct ScriptedPipeline {
    scripts: VecDeque<Vec<SpeakerSegment>>,
    feed_failure: Option<String>,
    shift: f64,
    blocks_fed: usize,
    samples_fed: usize,
    resets: Arc<AtomicUsize>,
    finishes: Arc<AtomicUsize>,
}

impl ScriptedPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one segment to the first run's script.
    pub fn with_segment(mut self, speaker: &str, start: f64, duration: f64) -> Self {
        if self.scripts.is_empty() {
            self.scripts.push_back(Vec::new());
        }
        if let Some(script) = self.scripts.front_mut() {
            script.push(SpeakerSegment::new(speaker, start, duration));
        }
        self
    }

    /// Appends a whole script, consumed by the next unclaimed `finish`.
    pub fn with_run(mut self, segments: Vec<SpeakerSegment>) -> Self {
        self.scripts.push_back(segments);
        self
    }

    /// Makes every subsequent `feed` fail with an engine error.
    pub fn with_feed_failure(mut self, message: &str) -> Self {
        self.feed_failure = Some(message.to_string());
        self
    }

    pub fn blocks_fed(&self) -> usize {
        self.blocks_fed
    }

    pub fn samples_fed(&self) -> usize {
        self.samples_fed
    }

    /// Resets observed across every clone of this pipeline.
    pub fn reset_count(&self) -> usize {
        self.resets.load(Ordering::SeqCst)
    }

    /// Finishes observed across every clone of this pipeline.
    pub fn finish_count(&self) -> usize {
        self.finishes.load(Ordering::SeqCst)
    }
}

impl SpeakerPipeline for ScriptedPipeline {
    fn set_timestamp_shift(&mut self, shift: f64) {
        self.shift = shift;
    }

    fn feed(&mut self, block: &[i16]) -> Result<()> {
        if let Some(message) = &self.feed_failure {
            return Err(DiabenchError::Engine {
                message: message.clone(),
            });
        }
        self.blocks_fed += 1;
        self.samples_fed += block.len();
        Ok(())
    }

    fn finish(&mut self) -> Result<Vec<SpeakerSegment>> {
        self.finishes.fetch_add(1, Ordering::SeqCst);
        let script = self.scripts.pop_front().unwrap_or_default();
        Ok(script
            .into_iter()
            .map(|segment| {
                SpeakerSegment::new(segment.speaker, segment.start + self.shift, segment.duration)
            })
            .collect())
    }

    fn reset(&mut self) {
        self.resets.fetch_add(1, Ordering::SeqCst);
        self.shift = 0.0;
        self.blocks_fed = 0;
        self.samples_fed = 0;
    }
}

/// Builds clones of a scripted template.
///
/// Clones share the template's reset/finish counters, so a test can
/// hand the builder to a benchmark and still observe every pipeline it
/// constructed.
#[derive(Debug, Clone, Default)]
pub struct ScriptedBuilder {
    template: ScriptedPipeline,
}

impl ScriptedBuilder {
    pub fn new(template: ScriptedPipeline) -> Self {
        Self { template }
    }

    pub fn reset_count(&self) -> usize {
        self.template.reset_count()
    }

    pub fn finish_count(&self) -> usize {
        self.template.finish_count()
    }
}

impl PipelineBuilder for ScriptedBuilder {
    fn build(&self, _config: &PipelineConfig) -> Result<Box<dyn SpeakerPipeline>> {
        Ok(Box::new(self.template.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replays_scripted_segments() {
        let mut pipeline = ScriptedPipeline::new()
            .with_segment("alice", 0.0, 1.5)
            .with_segment("bob", 1.5, 2.0);

        pipeline.feed(&[0; 8000]).unwrap();
        let segments = pipeline.finish().unwrap();

        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].speaker, "alice");
        assert_eq!(segments[1].start, 1.5);
    }

    #[test]
    fn applies_timestamp_shift_on_finish() {
        let mut pipeline = ScriptedPipeline::new().with_segment("alice", 2.5, 1.0);
        pipeline.set_timestamp_shift(-2.0);

        let segments = pipeline.finish().unwrap();
        assert_eq!(segments[0].start, 0.5);
        assert_eq!(segments[0].duration, 1.0);
    }

    #[test]
    fn consumes_one_script_per_finish() {
        let mut pipeline = ScriptedPipeline::new()
            .with_run(vec![SpeakerSegment::new("alice", 0.0, 1.0)])
            .with_run(vec![SpeakerSegment::new("bob", 0.0, 2.0)]);

        assert_eq!(pipeline.finish().unwrap()[0].speaker, "alice");
        pipeline.reset();
        assert_eq!(pipeline.finish().unwrap()[0].speaker, "bob");
        pipeline.reset();
        assert!(pipeline.finish().unwrap().is_empty());
    }

    #[test]
    fn counts_blocks_and_samples() {
        let mut pipeline = ScriptedPipeline::new();
        pipeline.feed(&[0; 100]).unwrap();
        pipeline.feed(&[0; 100]).unwrap();

        assert_eq!(pipeline.blocks_fed(), 2);
        assert_eq!(pipeline.samples_fed(), 200);
    }

    #[test]
    fn reset_clears_counters_and_shift() {
        let mut pipeline = ScriptedPipeline::new().with_run(vec![SpeakerSegment::new(
            "alice", 1.0, 1.0,
        )]);
        pipeline.set_timestamp_shift(-1.0);
        pipeline.feed(&[0; 10]).unwrap();
        pipeline.reset();

        assert_eq!(pipeline.blocks_fed(), 0);
        assert_eq!(pipeline.samples_fed(), 0);
        assert_eq!(pipeline.reset_count(), 1);
        assert_eq!(pipeline.finish().unwrap()[0].start, 1.0);
    }

    #[test]
    fn feed_failure_surfaces_as_engine_error() {
        let mut pipeline = ScriptedPipeline::new().with_feed_failure("model exploded");
        let err = pipeline.feed(&[0; 10]).unwrap_err();
        assert!(err.to_string().contains("model exploded"));
    }

    #[test]
    fn builder_clones_share_counters() {
        let builder = ScriptedBuilder::new(ScriptedPipeline::new());
        let mut first = builder.build(&PipelineConfig::default()).unwrap();
        let mut second = builder.build(&PipelineConfig::default()).unwrap();

        first.reset();
        second.reset();
        second.finish().unwrap();

        assert_eq!(builder.reset_count(), 2);
        assert_eq!(builder.finish_count(), 1);
    }
}
