//! diabench - Benchmark and tuning harness for online speaker diarization
//!
//! Streams a corpus of recordings through a streaming diarization engine
//! and scores the predictions against ground-truth annotations.

// Library code propagates errors; panicking is reserved for tests
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::let_underscore_must_use)]

pub mod audio;
pub mod bench;
pub mod cli;
pub mod config;
pub mod corpus;
pub mod defaults;
pub mod engine;
pub mod error;
pub mod metrics;
pub mod rttm;
pub mod runner;
pub mod sink;
pub mod timeline;
pub mod tools;
pub mod tune;

// Core seams (engine → runner → sink → metrics)
pub use engine::{PipelineBuilder, PipelineConfig, SpeakerPipeline};
pub use timeline::{SpeakerSegment, Timeline};

// Orchestration
pub use bench::{Benchmark, BenchmarkConfig, BenchmarkOutcome};
pub use metrics::{MissingReference, Report, ReportRow};

// Error handling
pub use error::{DiabenchError, Result};

// Config
pub use config::Config;

/// Build version string with optional git commit hash.
///
/// Returns `"0.1.0+abc1234"` when git hash is available, `"0.1.0"` otherwise.
pub fn version_string() -> String {
    let version = env!("CARGO_PKG_VERSION");
    match option_env!("GIT_HASH") {
        Some(hash) if !hash.is_empty() => format!("{}+{}", version, hash),
        _ => version.to_string(),
    }
}
