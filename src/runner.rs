//! Streams one recording through a pipeline and collects its timeline.

use indicatif::ProgressBar;

use crate::audio::FileAudioSource;
use crate::corpus::Recording;
use crate::engine::{PipelineConfig, SpeakerPipeline};
use crate::error::Result;
use crate::timeline::{SpeakerSegment, Timeline};

/// Replays a recording block by block and returns the hypothesis.
///
/// The source is padded so short files still fill one analysis window
/// and the engine's lookahead drains at the end. Emitted timestamps are
/// shifted back by the lead so they refer to the original file, then
/// cropped to the file's true extent.
pub fn stream_recording(
    pipeline: &mut dyn SpeakerPipeline,
    config: &PipelineConfig,
    recording: &Recording,
    progress: &ProgressBar,
) -> Result<Timeline> {
    let mut source = FileAudioSource::open(
        &recording.path,
        config.sample_rate,
        config.optimal_block_size(),
    )?;
    let duration = source.duration();
    let padding = config.file_padding(duration);
    source.set_padding(padding);
    progress.set_length(source.total_blocks());

    pipeline.set_timestamp_shift(-padding.lead);
    loop {
        let block = source.read_block();
        if block.is_empty() {
            break;
        }
        pipeline.feed(&block)?;
        progress.inc(1);
    }

    let mut segments = pipeline.finish()?;
    crop_to_duration(&mut segments, duration);
    Ok(Timeline::with_segments(recording.uri.clone(), segments))
}

/// Clamps segments to `[0, duration]`, dropping any that end up empty.
fn crop_to_duration(segments: &mut Vec<SpeakerSegment>, duration: f64) {
    segments.retain_mut(|segment| {
        let start = segment.start.max(0.0);
        let end = segment.end().min(duration);
        if end <= start {
            return false;
        }
        segment.start = start;
        segment.duration = end - start;
        true
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::ScriptedPipeline;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn write_wav(dir: &TempDir, name: &str, secs: f64) -> PathBuf {
        let path = dir.path().join(name);
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 16000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        for _ in 0..(secs * 16000.0) as usize {
            writer.write_sample(0i16).unwrap();
        }
        writer.finalize().unwrap();
        path
    }

    fn recording(path: PathBuf) -> Recording {
        Recording::from_path(path).unwrap()
    }

    #[test]
    fn feeds_one_block_per_step() {
        let dir = TempDir::new().unwrap();
        let rec = recording(write_wav(&dir, "long.wav", 10.0));
        let config = PipelineConfig::default();
        let mut pipeline = ScriptedPipeline::new();

        let progress = ProgressBar::hidden();
        let timeline = stream_recording(&mut pipeline, &config, &rec, &progress).unwrap();

        // 10s at step 0.5 with no padding needed: 20 blocks of 8000.
        assert_eq!(pipeline.blocks_fed(), 20);
        assert_eq!(pipeline.samples_fed(), 160_000);
        assert_eq!(timeline.uri, "long");
        assert_eq!(progress.length(), Some(20));
    }

    #[test]
    fn shifts_timestamps_back_by_lead_padding() {
        let dir = TempDir::new().unwrap();
        let rec = recording(write_wav(&dir, "short.wav", 3.0));
        // 3s file, 5s window, latency == step: lead is 2s.
        let config = PipelineConfig::default();
        let mut pipeline = ScriptedPipeline::new().with_segment("alice", 2.5, 1.0);

        let timeline =
            stream_recording(&mut pipeline, &config, &rec, &ProgressBar::hidden()).unwrap();

        assert_eq!(timeline.segments.len(), 1);
        assert_eq!(timeline.segments[0].start, 0.5);
        assert_eq!(timeline.segments[0].duration, 1.0);
    }

    #[test]
    fn pads_short_recording_to_one_window() {
        let dir = TempDir::new().unwrap();
        let rec = recording(write_wav(&dir, "short.wav", 3.0));
        let config = PipelineConfig::default();
        let mut pipeline = ScriptedPipeline::new();

        stream_recording(&mut pipeline, &config, &rec, &ProgressBar::hidden()).unwrap();

        // 2s lead + 3s audio at step 0.5: 10 blocks.
        assert_eq!(pipeline.blocks_fed(), 10);
        assert_eq!(pipeline.samples_fed(), 80_000);
    }

    #[test]
    fn crops_segments_to_file_extent() {
        let dir = TempDir::new().unwrap();
        let rec = recording(write_wav(&dir, "clip.wav", 3.0));
        let config = PipelineConfig::default();
        // On the padded clock: starts in the lead, runs past the end,
        // and one segment entirely inside the lead.
        let mut pipeline = ScriptedPipeline::new()
            .with_segment("alice", 1.0, 5.0)
            .with_segment("bob", 0.0, 1.5);

        let timeline =
            stream_recording(&mut pipeline, &config, &rec, &ProgressBar::hidden()).unwrap();

        assert_eq!(timeline.segments.len(), 1);
        let segment = &timeline.segments[0];
        assert_eq!(segment.speaker, "alice");
        assert_eq!(segment.start, 0.0);
        assert_eq!(segment.duration, 3.0);
    }

    #[test]
    fn engine_failure_propagates() {
        let dir = TempDir::new().unwrap();
        let rec = recording(write_wav(&dir, "clip.wav", 2.0));
        let config = PipelineConfig::default();
        let mut pipeline = ScriptedPipeline::new().with_feed_failure("ran out of centroids");

        let err = stream_recording(&mut pipeline, &config, &rec, &ProgressBar::hidden())
            .unwrap_err();
        assert!(err.to_string().contains("ran out of centroids"));
    }

    #[test]
    fn missing_file_is_reported_with_path() {
        let rec = Recording {
            path: PathBuf::from("/nonexistent/gone.wav"),
            uri: "gone".to_string(),
        };
        let config = PipelineConfig::default();
        let mut pipeline = ScriptedPipeline::new();

        let err = stream_recording(&mut pipeline, &config, &rec, &ProgressBar::hidden())
            .unwrap_err();
        assert!(err.to_string().contains("gone.wav"));
    }
}
