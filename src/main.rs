use anyhow::{Result, bail};
use clap::{CommandFactory, Parser};
use owo_colors::OwoColorize;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use diabench::bench::{Benchmark, BenchmarkConfig, BenchmarkOutcome};
use diabench::cli::{Cli, Commands, parse_value_list};
use diabench::config::Config;
use diabench::engine::{EnergyBuilder, PipelineConfig};
use diabench::metrics::print_json_report;
use diabench::rttm::load_rttm;
use diabench::sink::read_runs;
use diabench::timeline::Timeline;
use diabench::tools::capture::MicRecorder;
use diabench::tools::clips::ClipCutter;
use diabench::tune;

fn main() -> Result<()> {
    let cli = Cli::parse();

    match &cli.command {
        None | Some(Commands::Run) => {
            handle_run_command(&cli)?;
        }
        Some(Commands::Sweep {
            knob,
            from,
            to,
            steps,
            values,
        }) => {
            handle_sweep_command(&cli, knob, *from, *to, *steps, values.as_deref())?;
        }
        Some(Commands::Stats { file }) => {
            handle_stats_command(file)?;
        }
        Some(Commands::Record {
            out,
            duration,
            device,
        }) => {
            handle_record_command(&cli, out, *duration, device.clone())?;
        }
        Some(Commands::Clips {
            audio,
            rttm,
            out,
            concat,
        }) => {
            handle_clips_command(&cli, audio, rttm, out, *concat)?;
        }
        Some(Commands::Completions { shell }) => {
            clap_complete::generate(
                *shell,
                &mut Cli::command(),
                "diabench",
                &mut std::io::stdout(),
            );
        }
    }

    Ok(())
}

/// Load configuration from file or use defaults.
///
/// Priority order:
/// 1. Custom config path from CLI (--config)
/// 2. Default config path (~/.config/diabench/config.toml)
/// 3. Built-in defaults
fn load_config(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        Config::load(path)
    } else {
        Ok(Config::load_or_default(&Config::default_path()))
    }
}

/// Apply CLI pipeline overrides on top of the config file values.
fn pipeline_config(cli: &Cli, config: &Config) -> PipelineConfig {
    let mut pipeline = config.pipeline.clone();
    if let Some(sample_rate) = cli.sample_rate {
        pipeline.sample_rate = sample_rate;
    }
    if let Some(window) = cli.window {
        pipeline.window = window;
    }
    if let Some(step) = cli.step {
        pipeline.step = step;
    }
    if let Some(latency) = cli.latency {
        pipeline.latency = latency;
    }
    if let Some(tau_active) = cli.tau_active {
        pipeline.tau_active = tau_active;
    }
    if let Some(rho_update) = cli.rho_update {
        pipeline.rho_update = rho_update;
    }
    if let Some(delta_new) = cli.delta_new {
        pipeline.delta_new = delta_new;
    }
    pipeline
}

/// Resolve the corpus directories and run policy from CLI and config file.
fn benchmark_config(cli: &Cli, config: &Config) -> Result<BenchmarkConfig> {
    let audio_dir = cli.audio.clone().or_else(|| config.paths.audio.clone());
    let Some(audio_dir) = audio_dir else {
        bail!("no audio directory configured; pass --audio or set paths.audio in the config file");
    };

    let mut bench = BenchmarkConfig::new(audio_dir);
    bench.reference_dir = cli
        .reference
        .clone()
        .or_else(|| config.paths.reference.clone());
    bench.output_dir = cli.output.clone().or_else(|| config.paths.output.clone());
    bench.reset_between_files = if cli.keep_state {
        false
    } else {
        config.run.reset_between_files
    };
    bench.missing_reference = cli
        .on_missing_reference
        .unwrap_or(config.run.missing_reference);
    bench.show_progress = config.run.show_progress && !cli.quiet;
    bench.show_report = config.run.show_report && !cli.quiet && !cli.json;
    Ok(bench)
}

/// Stream the corpus through the baseline engine and report the outcome.
fn handle_run_command(cli: &Cli) -> Result<()> {
    let config = load_config(cli.config.as_deref())?;
    let pipeline = pipeline_config(cli, &config);
    let bench_config = benchmark_config(cli, &config)?;

    if cli.verbose >= 1 {
        eprintln!("diabench: pipeline {}", pipeline.label());
        eprintln!("diabench: corpus {}", bench_config.audio_dir.display());
    }

    let benchmark = Benchmark::new(bench_config)?;
    let started = Instant::now();
    let outcome = benchmark.run(&EnergyBuilder, &pipeline)?;
    let elapsed = Duration::from_millis(started.elapsed().as_millis() as u64);

    match outcome {
        BenchmarkOutcome::Report(report) => {
            if cli.json {
                print_json_report(&report);
            } else if !cli.quiet {
                println!();
                println!(
                    "Scored {} recordings in {}",
                    report.rows().len(),
                    humantime::format_duration(elapsed)
                );
            }
        }
        BenchmarkOutcome::Predictions(paths) => {
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&paths)?);
            } else if !cli.quiet {
                for path in &paths {
                    println!("{} {}", "Wrote".green(), path.display());
                }
                println!(
                    "Streamed {} recordings in {}",
                    paths.len(),
                    humantime::format_duration(elapsed)
                );
            }
        }
    }

    Ok(())
}

/// Sweep one knob over a value grid and print the ranked outcome.
fn handle_sweep_command(
    cli: &Cli,
    knob: &str,
    from: Option<f64>,
    to: Option<f64>,
    steps: usize,
    values: Option<&str>,
) -> Result<()> {
    let config = load_config(cli.config.as_deref())?;
    let pipeline = pipeline_config(cli, &config);
    let mut bench_config = benchmark_config(cli, &config)?;
    // Per-run tables drown the sweep summary; show them only on -v
    bench_config.show_report = bench_config.show_report && cli.verbose >= 1;

    let grid = if let Some(list) = values {
        parse_value_list(list).map_err(|message| anyhow::anyhow!(message))?
    } else if let (Some(from), Some(to)) = (from, to) {
        tune::linear_values(from, to, steps)
    } else {
        bail!("sweep needs --values or both --from and --to");
    };

    let benchmark = Benchmark::new(bench_config)?;
    let started = Instant::now();
    let outcome = tune::sweep(&benchmark, &EnergyBuilder, &pipeline, knob, &grid)?;
    let elapsed = Duration::from_millis(started.elapsed().as_millis() as u64);

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        outcome.print();
        if !cli.quiet {
            println!(
                "Swept {} values in {}",
                grid.len(),
                humantime::format_duration(elapsed)
            );
        }
    }

    Ok(())
}

/// Summarize the run blocks of an appended prediction file.
fn handle_stats_command(file: &Path) -> Result<()> {
    let runs = read_runs(file)?;

    if runs.is_empty() {
        println!("No runs recorded in {}", file.display());
        return Ok(());
    }

    println!("{}", "=".repeat(90));
    println!("RUN HISTORY  {}", file.display());
    println!("{}", "=".repeat(90));
    println!(
        "{:<60} {:>8} {:>9} {:>8}",
        "CONFIGURATION", "SEGMENTS", "SPEAKERS", "TURNS"
    );
    println!("{}", "-".repeat(90));

    for run in &runs {
        let timeline = Timeline::with_segments("history", run.segments.clone());
        let label = if run.label.is_empty() {
            "(unlabeled)"
        } else {
            &run.label
        };
        println!(
            "{:<60} {:>8} {:>9} {:>8}",
            label,
            timeline.len(),
            timeline.speakers().len(),
            timeline.turn_count()
        );
    }

    println!("{}", "=".repeat(90));

    Ok(())
}

/// Capture a mono WAV take from the microphone.
fn handle_record_command(
    cli: &Cli,
    out: &Path,
    duration_secs: u64,
    device: Option<String>,
) -> Result<()> {
    let config = load_config(cli.config.as_deref())?;
    let pipeline = pipeline_config(cli, &config);

    let mut recorder = MicRecorder::system().with_sample_rate(pipeline.sample_rate);
    if let Some(device) = device.or(config.tools.device) {
        recorder = recorder.with_device(device);
    }

    let duration = Duration::from_secs(duration_secs);
    if !cli.quiet {
        println!(
            "Recording {} at {} Hz to {}...",
            humantime::format_duration(duration),
            pipeline.sample_rate,
            out.display()
        );
    }
    recorder.record(duration, out)?;
    println!("{} {}", "Saved".green(), out.display());

    Ok(())
}

/// Cut per-speaker clips from a recording, optionally joining them per speaker.
fn handle_clips_command(
    cli: &Cli,
    audio: &Path,
    rttm: &Path,
    out: &Path,
    concat: bool,
) -> Result<()> {
    let config = load_config(cli.config.as_deref())?;
    let segments = load_rttm(rttm)?;
    if segments.is_empty() {
        bail!("no segments found in {}", rttm.display());
    }
    let timeline = Timeline::with_segments("clips", segments);

    let cutter =
        ClipCutter::system().with_timeout(Duration::from_secs(config.tools.timeout_secs));
    let clips = cutter.cut(audio, &timeline.segments, out)?;
    println!(
        "{} {} clips across {} speakers under {}",
        "Cut".green(),
        clips.len(),
        timeline.speakers().len(),
        out.display()
    );

    if concat {
        for speaker in timeline.speakers() {
            let speaker_clips: Vec<PathBuf> = clips
                .iter()
                .filter(|clip| {
                    clip.parent()
                        .and_then(Path::file_name)
                        .and_then(std::ffi::OsStr::to_str)
                        == Some(speaker)
                })
                .cloned()
                .collect();
            if speaker_clips.is_empty() {
                continue;
            }
            let joined = out.join(format!("{speaker}.wav"));
            cutter.concatenate(&speaker_clips, &joined)?;
            println!("{} {}", "Joined".green(), joined.display());
        }
    }

    Ok(())
}
