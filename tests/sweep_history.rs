// tests/sweep_history.rs
//! Sweeps and the on-disk run history they leave behind
//!
//! This file tests:
//! 1. A tau_active sweep over the energy baseline finds the threshold
//!    that separates speech from background
//! 2. Every sweep run appends a labeled block to the prediction history
//! 3. report.csv accumulates rows across runs with a single header
//! 4. Recorded history can be read back and summarized per run

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use diabench::bench::{self, Benchmark, BenchmarkConfig};
use diabench::engine::{EnergyBuilder, PipelineConfig, ScriptedBuilder, ScriptedPipeline};
use diabench::rttm::write_rttm;
use diabench::sink::read_runs;
use diabench::timeline::{SpeakerSegment, Timeline};
use diabench::tune;
use tempfile::TempDir;

fn write_wav(path: &Path, samples: &[i16]) {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 16_000,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).expect("create wav");
    for &sample in samples {
        writer.write_sample(sample).expect("write sample");
    }
    writer.finalize().expect("finalize wav");
}

/// 5 s of loud samples followed by 5 s of near-silence.
fn loud_quiet_samples() -> Vec<i16> {
    let mut samples = vec![8_000i16; 5 * 16_000];
    samples.extend(vec![100i16; 5 * 16_000]);
    samples
}

fn write_reference(dir: &Path, uri: &str, segments: &[(&str, f64, f64)]) {
    let segments: Vec<SpeakerSegment> = segments
        .iter()
        .map(|(speaker, start, duration)| SpeakerSegment::new(*speaker, *start, *duration))
        .collect();
    let mut file = File::create(dir.join(format!("{uri}.rttm"))).expect("create reference file");
    write_rttm(&mut file, uri, &segments).expect("write reference");
}

fn corpus_dirs(temp: &TempDir) -> (PathBuf, PathBuf, PathBuf) {
    let audio = temp.path().join("audio");
    let reference = temp.path().join("reference");
    let output = temp.path().join("output");
    fs::create_dir_all(&audio).expect("create audio dir");
    fs::create_dir_all(&reference).expect("create reference dir");
    (audio, reference, output)
}

fn quiet_config(audio: &Path) -> BenchmarkConfig {
    BenchmarkConfig::new(audio)
        .with_show_progress(false)
        .with_show_report(false)
}

/// One-second blocks with no lookahead, so detection boundaries land
/// exactly on block edges.
fn block_config() -> PipelineConfig {
    PipelineConfig::default()
        .with_window(1.0)
        .with_step(1.0)
        .with_latency(1.0)
}

#[test]
fn sweep_finds_the_separating_threshold() {
    let temp = TempDir::new().expect("temp dir");
    let (audio, reference, _) = corpus_dirs(&temp);
    write_wav(&audio.join("meeting.wav"), &loud_quiet_samples());
    write_reference(&reference, "meeting", &[("alice", 0.0, 5.0)]);

    let benchmark = Benchmark::new(quiet_config(&audio).with_reference_dir(&reference))
        .expect("benchmark construction");

    // The loud half sits near RMS 0.24: a 0.1 threshold catches it,
    // a 0.5 threshold hears nothing at all.
    let outcome = tune::sweep(
        &benchmark,
        &EnergyBuilder,
        &block_config(),
        "tau_active",
        &[0.1, 0.5],
    )
    .expect("sweep");

    assert_eq!(outcome.knob, "tau_active");
    assert_eq!(outcome.points.len(), 2);
    assert_eq!(outcome.points[0].value, 0.1);
    assert_eq!(outcome.points[0].error_rate, 0.0);
    assert_eq!(outcome.points[1].value, 0.5);
    assert_eq!(outcome.points[1].error_rate, 1.0);
    assert_eq!(outcome.best().expect("best point").value, 0.1);
}

#[test]
fn sweep_appends_one_labeled_block_per_value() {
    let temp = TempDir::new().expect("temp dir");
    let (audio, reference, output) = corpus_dirs(&temp);
    write_wav(&audio.join("meeting.wav"), &loud_quiet_samples());
    write_reference(&reference, "meeting", &[("alice", 0.0, 5.0)]);

    let benchmark = Benchmark::new(
        quiet_config(&audio)
            .with_reference_dir(&reference)
            .with_output_dir(&output),
    )
    .expect("benchmark construction");

    tune::sweep(
        &benchmark,
        &EnergyBuilder,
        &block_config(),
        "tau_active",
        &[0.1, 0.5],
    )
    .expect("sweep");

    let runs = read_runs(&output.join("meeting.rttm")).expect("read prediction history");
    assert_eq!(runs.len(), 2, "one block per swept value");
    assert!(runs[0].label.contains("tau_active = 0.1"));
    assert!(runs[1].label.contains("tau_active = 0.5"));
    assert_eq!(runs[0].segments.len(), 1);
    assert_eq!(runs[0].segments[0].start, 0.0);
    assert_eq!(runs[0].segments[0].duration, 5.0);
    assert!(
        runs[1].segments.is_empty(),
        "the over-strict threshold leaves an empty block, not a missing one"
    );
}

#[test]
fn report_csv_accumulates_rows_with_one_header() {
    let temp = TempDir::new().expect("temp dir");
    let (audio, reference, output) = corpus_dirs(&temp);
    let silence = vec![0i16; 10 * 16_000];
    write_wav(&audio.join("meeting.wav"), &silence);
    write_reference(&reference, "meeting", &[("alice", 0.0, 10.0)]);

    let builder =
        ScriptedBuilder::new(ScriptedPipeline::new().with_segment("alice", 0.0, 10.0));
    let benchmark = Benchmark::new(
        quiet_config(&audio)
            .with_reference_dir(&reference)
            .with_output_dir(&output),
    )
    .expect("benchmark construction");

    benchmark
        .run(&builder, &PipelineConfig::default())
        .expect("first run");
    benchmark
        .run(&builder, &PipelineConfig::default().with_tau_active(0.7))
        .expect("second run");

    let csv = fs::read_to_string(bench::report_path(&output)).expect("read report.csv");
    let lines: Vec<&str> = csv.lines().collect();
    assert!(lines[0].starts_with("uri,"));
    assert_eq!(
        lines.iter().filter(|line| line.starts_with("uri,")).count(),
        1,
        "header must appear exactly once across appends"
    );
    assert_eq!(
        lines.iter().filter(|line| line.starts_with("meeting,")).count(),
        2
    );
    assert_eq!(
        lines.iter().filter(|line| line.starts_with("TOTAL,")).count(),
        2
    );
}

#[test]
fn recorded_history_reads_back_per_run() {
    let temp = TempDir::new().expect("temp dir");
    let (audio, _, output) = corpus_dirs(&temp);
    let silence = vec![0i16; 10 * 16_000];
    write_wav(&audio.join("meeting.wav"), &silence);

    let builder = ScriptedBuilder::new(
        ScriptedPipeline::new()
            .with_segment("alice", 0.0, 1.0)
            .with_segment("bob", 1.0, 1.0)
            .with_segment("alice", 2.0, 1.0),
    );
    let benchmark =
        Benchmark::new(quiet_config(&audio).with_output_dir(&output)).expect("benchmark");

    benchmark
        .run(&builder, &PipelineConfig::default())
        .expect("benchmark run");

    // The same view the stats command prints: one summary per block.
    let runs = read_runs(&output.join("meeting.rttm")).expect("read prediction history");
    assert_eq!(runs.len(), 1);
    let timeline = Timeline::with_segments("history", runs[0].segments.clone());
    assert_eq!(timeline.len(), 3);
    assert_eq!(timeline.speakers(), ["alice", "bob"]);
    assert_eq!(timeline.turn_count(), 3);
}
