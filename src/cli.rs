//! Command-line interface for diabench
//!
//! Provides argument parsing using clap derive macros.

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

use crate::metrics::MissingReference;

/// Benchmark harness for online speaker diarization
#[derive(Parser, Debug)]
#[command(
    name = "diabench",
    version,
    about = "Benchmark harness for online speaker diarization"
)]
pub struct Cli {
    /// Subcommand to execute (default: run)
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Path to configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Suppress progress output (quiet mode)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose output (-v: per-file detail, -vv: full diagnostics)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Directory of .wav recordings to stream
    #[arg(long, global = true, value_name = "DIR")]
    pub audio: Option<PathBuf>,

    /// Directory of ground-truth .rttm files
    #[arg(long, global = true, value_name = "DIR")]
    pub reference: Option<PathBuf>,

    /// Directory for prediction files and report.csv
    #[arg(long, global = true, value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Streaming step in seconds
    #[arg(long, global = true, value_name = "SECONDS")]
    pub step: Option<f64>,

    /// Rolling window span in seconds
    #[arg(long, global = true, value_name = "SECONDS")]
    pub window: Option<f64>,

    /// End-of-window latency in seconds
    #[arg(long, global = true, value_name = "SECONDS")]
    pub latency: Option<f64>,

    /// Expected corpus sample rate in Hz
    #[arg(long, global = true, value_name = "HZ")]
    pub sample_rate: Option<u32>,

    /// Speech activation threshold
    #[arg(long, global = true, value_name = "VALUE")]
    pub tau_active: Option<f64>,

    /// Speaker embedding update rate
    #[arg(long, global = true, value_name = "VALUE")]
    pub rho_update: Option<f64>,

    /// New-speaker distance threshold
    #[arg(long, global = true, value_name = "VALUE")]
    pub delta_new: Option<f64>,

    /// Keep engine state across files (default: reset between files)
    #[arg(long, global = true)]
    pub keep_state: bool,

    /// Policy for recordings without ground truth (skip, fail)
    #[arg(long, global = true, value_name = "POLICY")]
    pub on_missing_reference: Option<MissingReference>,

    /// Print results as JSON instead of tables
    #[arg(long, global = true)]
    pub json: bool,
}

/// Parse a duration string into seconds.
///
/// Supports any duration format accepted by `humantime`: bare numbers (seconds),
/// single-unit (`30s`, `5m`, `2h`), and compound (`1h30m`, `2m30s`).
fn parse_duration_secs(s: &str) -> Result<u64, String> {
    let s = s.trim();
    // Bare number → seconds
    if let Ok(secs) = s.parse::<u64>() {
        return Ok(secs);
    }
    humantime::parse_duration(s)
        .map(|d| d.as_secs())
        .map_err(|e| e.to_string())
}

/// Parse a comma-separated list of knob values.
pub fn parse_value_list(s: &str) -> Result<Vec<f64>, String> {
    let values: Result<Vec<f64>, _> = s
        .split(',')
        .map(|part| part.trim().parse::<f64>())
        .collect();
    values.map_err(|e| format!("invalid value list '{s}': {e}"))
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Stream the corpus through the baseline engine and score it
    Run,

    /// Sweep one pipeline knob across a value grid and rank the results
    Sweep {
        /// Knob to sweep (step, tau_active, rho_update, delta_new)
        #[arg(long, value_name = "NAME")]
        knob: String,

        /// Grid start value
        #[arg(long, value_name = "VALUE")]
        from: Option<f64>,

        /// Grid end value
        #[arg(long, value_name = "VALUE")]
        to: Option<f64>,

        /// Number of grid points, endpoints included
        #[arg(long, value_name = "N", default_value = "5")]
        steps: usize,

        /// Explicit values to try (comma-separated, overrides the grid)
        #[arg(long, value_name = "VALUES")]
        values: Option<String>,
    },

    /// Summarize the run blocks of an appended prediction file
    Stats {
        /// Prediction file to inspect
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Record a WAV file from the microphone via arecord
    Record {
        /// Output WAV path
        #[arg(long, short = 'o', value_name = "PATH")]
        out: PathBuf,

        /// Recording duration. Examples: 90s, 5m, 1h30m
        #[arg(long, short = 'd', value_name = "DURATION", default_value = "90s", value_parser = parse_duration_secs)]
        duration: u64,

        /// ALSA capture device (e.g., hw:1,0)
        #[arg(long, value_name = "DEVICE")]
        device: Option<String>,
    },

    /// Cut per-speaker clips from a recording using an RTTM timeline
    Clips {
        /// Source recording
        #[arg(value_name = "AUDIO")]
        audio: PathBuf,

        /// RTTM file describing the segments
        #[arg(value_name = "RTTM")]
        rttm: PathBuf,

        /// Directory for the extracted clips
        #[arg(long, short = 'o', value_name = "DIR")]
        out: PathBuf,

        /// Also concatenate each speaker's clips into one file
        #[arg(long)]
        concat: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}
