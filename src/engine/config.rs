//! Pipeline configuration: structural stream settings plus the named
//! numeric knobs a hyperparameter search assigns.

use crate::defaults;
use crate::error::{DiabenchError, Result};
use serde::{Deserialize, Serialize};

/// Names of the searchable knobs, in their canonical order.
pub const KNOB_NAMES: [&str; 4] = ["step", "tau_active", "rho_update", "delta_new"];

/// Lead/trail audio margin in seconds required around one recording.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Padding {
    /// Zeros prepended so the first emitted step has a full window behind it.
    pub lead: f64,
    /// Zeros appended so the final samples can be committed at the
    /// configured latency.
    pub trail: f64,
}

/// One hyperparameter setting under test.
///
/// Immutable during a run; a search loop derives new settings with
/// [`PipelineConfig::with_knob`] rather than mutating a live one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Input sample rate in Hz.
    pub sample_rate: u32,
    /// Rolling analysis window in seconds.
    pub window: f64,
    /// Streaming step in seconds; one block per step.
    pub step: f64,
    /// Output latency in seconds; `step <= latency <= window`.
    pub latency: f64,
    /// Speech-activity threshold.
    pub tau_active: f64,
    /// Centroid-update threshold.
    pub rho_update: f64,
    /// New-speaker distance threshold.
    pub delta_new: f64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            sample_rate: defaults::SAMPLE_RATE,
            window: defaults::WINDOW_SECS,
            step: defaults::STEP_SECS,
            latency: defaults::LATENCY_SECS,
            tau_active: defaults::TAU_ACTIVE,
            rho_update: defaults::RHO_UPDATE,
            delta_new: defaults::DELTA_NEW,
        }
    }
}

impl PipelineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sample_rate(mut self, sample_rate: u32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    pub fn with_window(mut self, window: f64) -> Self {
        self.window = window;
        self
    }

    pub fn with_step(mut self, step: f64) -> Self {
        self.step = step;
        self
    }

    pub fn with_latency(mut self, latency: f64) -> Self {
        self.latency = latency;
        self
    }

    pub fn with_tau_active(mut self, tau_active: f64) -> Self {
        self.tau_active = tau_active;
        self
    }

    pub fn with_rho_update(mut self, rho_update: f64) -> Self {
        self.rho_update = rho_update;
        self
    }

    pub fn with_delta_new(mut self, delta_new: f64) -> Self {
        self.delta_new = delta_new;
        self
    }

    /// Checks that the setting is fully usable before a run starts.
    pub fn validate(&self) -> Result<()> {
        if self.sample_rate == 0 {
            return Err(invalid("sample_rate", "must be positive"));
        }
        if !(self.step > 0.0) {
            return Err(invalid("step", "must be positive"));
        }
        if self.window < self.step {
            return Err(invalid("window", "must be at least one step long"));
        }
        if self.latency < self.step || self.latency > self.window {
            return Err(invalid(
                "latency",
                "must lie between step and window (inclusive)",
            ));
        }
        if !(0.0..=1.0).contains(&self.tau_active) {
            return Err(invalid("tau_active", "must lie in [0, 1]"));
        }
        if !(0.0..=1.0).contains(&self.rho_update) {
            return Err(invalid("rho_update", "must lie in [0, 1]"));
        }
        if !(self.delta_new >= 0.0) {
            return Err(invalid("delta_new", "must be non-negative"));
        }
        Ok(())
    }

    /// The searchable knobs as an ordered name/value mapping.
    pub fn knobs(&self) -> [(&'static str, f64); 4] {
        [
            ("step", self.step),
            ("tau_active", self.tau_active),
            ("rho_update", self.rho_update),
            ("delta_new", self.delta_new),
        ]
    }

    /// Returns a copy with the named knob assigned.
    ///
    /// Unknown names are a configuration error listing the valid knobs.
    pub fn with_knob(&self, name: &str, value: f64) -> Result<Self> {
        let mut config = self.clone();
        match name {
            "step" => config.step = value,
            "tau_active" => config.tau_active = value,
            "rho_update" => config.rho_update = value,
            "delta_new" => config.delta_new = value,
            other => {
                return Err(DiabenchError::ConfigInvalidValue {
                    key: other.to_string(),
                    message: format!("unknown knob, expected one of {}", KNOB_NAMES.join(", ")),
                });
            }
        }
        Ok(config)
    }

    /// Human-readable label identifying this setting, used to tag
    /// prediction-file run blocks.
    pub fn label(&self) -> String {
        self.knobs()
            .iter()
            .map(|(name, value)| format!("{name} = {value}"))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Samples per streaming block.
    pub fn optimal_block_size(&self) -> usize {
        (self.step * self.sample_rate as f64).round() as usize
    }

    /// Padding required around a recording of the given duration.
    ///
    /// The trail flushes the engine's lookahead (`latency - step`); the
    /// lead fills recordings shorter than one analysis window.
    pub fn file_padding(&self, file_duration: f64) -> Padding {
        let trail = self.latency - self.step;
        let covered = file_duration + trail;
        let lead = if covered < self.window {
            self.window - covered
        } else {
            0.0
        };
        Padding { lead, trail }
    }
}

fn invalid(key: &str, message: &str) -> DiabenchError {
    DiabenchError::ConfigInvalidValue {
        key: key.to_string(),
        message: message.to_string(),
    }
}
