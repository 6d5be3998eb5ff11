//! Default configuration constants for diabench.
//!
//! This module provides shared constants used across different configuration types
//! to ensure consistency and eliminate duplication.

/// Default audio sample rate in Hz.
///
/// 16kHz is the standard for speech processing and is what the online
/// diarization engines this harness targets consume natively.
pub const SAMPLE_RATE: u32 = 16000;

/// Default analysis window duration in seconds.
///
/// The engine scores speakers over a rolling window of this length; a
/// recording shorter than one window is padded up to it.
pub const WINDOW_SECS: f64 = 5.0;

/// Default streaming step in seconds.
///
/// One block of `STEP_SECS * SAMPLE_RATE` samples is fed to the engine per
/// iteration. Smaller steps give finer boundaries at a higher compute cost.
pub const STEP_SECS: f64 = 0.5;

/// Default output latency in seconds.
///
/// Must satisfy `step <= latency <= window`. At the minimum (equal to the
/// step) the engine commits each block as soon as it is processed and no
/// trailing padding is required.
pub const LATENCY_SECS: f64 = 0.5;

/// Default speech-activity threshold (`tau_active`).
///
/// A speaker is considered active when its score exceeds this value.
/// For the built-in energy baseline this is the normalized RMS threshold.
pub const TAU_ACTIVE: f64 = 0.6;

/// Default centroid-update threshold (`rho_update`).
///
/// A speaker's centroid is only updated from regions with at least this
/// much attributed speech, keeping noisy frames out of the running state.
pub const RHO_UPDATE: f64 = 0.3;

/// Default new-speaker distance threshold (`delta_new`).
///
/// An embedding farther than this from every known centroid opens a new
/// speaker.
pub const DELTA_NEW: f64 = 1.0;

/// Decimal places used for start/duration fields in RTTM output.
///
/// Three decimals (millisecond resolution) is what reference tooling
/// emits; round-tripping through the text format is exact at this
/// precision.
pub const RTTM_TIME_DECIMALS: usize = 3;

/// File name of the accumulated report table under the output directory.
pub const REPORT_FILE_NAME: &str = "report.csv";

/// Default timeout in seconds for external tool invocations.
pub const TOOL_TIMEOUT_SECS: u64 = 120;

/// Grace period in seconds added on top of a capture's own duration
/// before the recording tool is considered hung.
pub const RECORD_GRACE_SECS: u64 = 10;
