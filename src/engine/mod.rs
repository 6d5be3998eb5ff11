//! Diarization engine seam.
//!
//! The harness never implements diarization itself; it drives anything
//! that can consume fixed-size sample blocks and emit speaker segments.
//! [`SpeakerPipeline`] is the per-run streaming surface, and
//! [`PipelineBuilder`] constructs fresh pipelines from a
//! [`PipelineConfig`] so a sweep can instantiate one per setting.

mod config;
mod energy;
mod scripted;

pub use config::{KNOB_NAMES, Padding, PipelineConfig};
pub use energy::{EnergyBuilder, EnergyPipeline};
pub use scripted::{ScriptedBuilder, ScriptedPipeline};

use crate::error::Result;
use crate::timeline::SpeakerSegment;

/// A streaming diarization engine under test.
///
/// The runner feeds equally sized blocks in file order, then calls
/// [`finish`](SpeakerPipeline::finish) exactly once to collect the
/// run's segments. [`reset`](SpeakerPipeline::reset) returns the
/// pipeline to its initial state so internal speaker identities do not
/// leak across recordings.
pub trait SpeakerPipeline: Send {
    /// Offset added to every emitted timestamp, in seconds.
    ///
    /// The runner sets this to the negated lead padding so output
    /// timestamps land on the original file's clock.
    fn set_timestamp_shift(&mut self, shift: f64);

    /// Consumes one block of mono samples.
    fn feed(&mut self, block: &[i16]) -> Result<()>;

    /// Flushes internal state and returns all segments for the run.
    fn finish(&mut self) -> Result<Vec<SpeakerSegment>>;

    /// Clears accumulated state, keeping the configuration.
    fn reset(&mut self);
}

/// Constructs pipelines for a given setting.
pub trait PipelineBuilder: Send + Sync {
    fn build(&self, config: &PipelineConfig) -> Result<Box<dyn SpeakerPipeline>>;
}

impl<F> PipelineBuilder for F
where
    F: Fn(&PipelineConfig) -> Result<Box<dyn SpeakerPipeline>> + Send + Sync,
{
    fn build(&self, config: &PipelineConfig) -> Result<Box<dyn SpeakerPipeline>> {
        self(config)
    }
}
