//! Energy-gate baseline pipeline.
//!
//! A deliberately simple reference engine: it tracks block RMS against
//! `tau_active` and attributes every active region to a single speaker.
//! Useful for exercising the harness end to end on real audio without
//! a trained diarization model, and as a floor in sweep comparisons.

use crate::engine::{PipelineBuilder, PipelineConfig, SpeakerPipeline};
use crate::error::Result;
use crate::timeline::SpeakerSegment;

const BASELINE_SPEAKER: &str = "speaker0";

/// Single-speaker RMS gate over the streamed blocks.
#[derive(Debug)]
pub struct EnergyPipeline {
    sample_rate: f64,
    threshold: f64,
    shift: f64,
    /// Seconds of audio consumed so far, on the input clock.
    clock: f64,
    /// Start of the currently open active region, if any.
    open_since: Option<f64>,
    segments: Vec<SpeakerSegment>,
}

impl EnergyPipeline {
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            sample_rate: f64::from(config.sample_rate),
            threshold: config.tau_active,
            shift: 0.0,
            clock: 0.0,
            open_since: None,
            segments: Vec::new(),
        }
    }

    fn close_region(&mut self, at: f64) {
        if let Some(start) = self.open_since.take() {
            self.segments
                .push(SpeakerSegment::new(BASELINE_SPEAKER, start, at - start));
        }
    }
}

impl SpeakerPipeline for EnergyPipeline {
    fn set_timestamp_shift(&mut self, shift: f64) {
        self.shift = shift;
    }

    fn feed(&mut self, block: &[i16]) -> Result<()> {
        let active = calculate_rms(block) >= self.threshold;
        if active && self.open_since.is_none() {
            self.open_since = Some(self.clock);
        } else if !active {
            let at = self.clock;
            self.close_region(at);
        }
        self.clock += block.len() as f64 / self.sample_rate;
        Ok(())
    }

    fn finish(&mut self) -> Result<Vec<SpeakerSegment>> {
        let at = self.clock;
        self.close_region(at);
        let shift = self.shift;
        Ok(std::mem::take(&mut self.segments)
            .into_iter()
            .map(|segment| {
                SpeakerSegment::new(segment.speaker, segment.start + shift, segment.duration)
            })
            .collect())
    }

    fn reset(&mut self) {
        self.shift = 0.0;
        self.clock = 0.0;
        self.open_since = None;
        self.segments.clear();
    }
}

/// Builds [`EnergyPipeline`] instances.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnergyBuilder;

impl PipelineBuilder for EnergyBuilder {
    fn build(&self, config: &PipelineConfig) -> Result<Box<dyn SpeakerPipeline>> {
        Ok(Box::new(EnergyPipeline::new(config)))
    }
}

/// Root mean square of the samples, normalized to [0, 1].
pub fn calculate_rms(samples: &[i16]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }

    let sum_squares: f64 = samples
        .iter()
        .map(|&sample| {
            let normalized = f64::from(sample) / f64::from(i16::MAX);
            normalized * normalized
        })
        .sum();

    (sum_squares / samples.len() as f64).sqrt()
}
