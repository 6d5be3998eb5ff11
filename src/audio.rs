//! WAV file audio source for benchmark streaming.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use crate::engine::Padding;
use crate::error::{DiabenchError, Result};

/// Audio source that streams a decoded WAV file in fixed-size blocks.
///
/// The whole file is decoded up front; a benchmark replays it as fast
/// as the engine consumes it, so there is no live capture path here.
/// Lead and trail padding are synthesized as zero samples around the
/// decoded audio without copying it.
pub struct FileAudioSource {
    samples: Vec<i16>,
    /// Position on the padded timeline, in samples.
    cursor: usize,
    sample_rate: u32,
    block_size: usize,
    lead_samples: usize,
    trail_samples: usize,
}

impl FileAudioSource {
    /// Opens and fully decodes a WAV file.
    ///
    /// Mono is taken as-is and stereo is downmixed by averaging; more
    /// channels are rejected. The file's sample rate must match
    /// `expected_rate` exactly, since resampling would desynchronize
    /// the emitted timestamps from the ground truth.
    pub fn open(path: &Path, expected_rate: u32, block_size: usize) -> Result<Self> {
        let file = File::open(path).map_err(|e| DiabenchError::AudioRead {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_reader(BufReader::new(file), path, expected_rate, block_size)
    }

    /// Create from any reader (for testing/flexibility).
    pub fn from_reader<R: Read>(
        reader: R,
        source: &Path,
        expected_rate: u32,
        block_size: usize,
    ) -> Result<Self> {
        let audio_err = |message: String| DiabenchError::AudioRead {
            path: source.display().to_string(),
            message,
        };

        let mut wav_reader = hound::WavReader::new(reader)
            .map_err(|e| audio_err(format!("failed to parse WAV file: {e}")))?;

        let spec = wav_reader.spec();
        if spec.channels == 0 || spec.channels > 2 {
            return Err(DiabenchError::UnsupportedChannelCount {
                path: source.display().to_string(),
                channels: spec.channels,
            });
        }
        if spec.sample_rate != expected_rate {
            return Err(DiabenchError::SampleRateMismatch {
                path: source.display().to_string(),
                expected: expected_rate,
                actual: spec.sample_rate,
            });
        }

        let raw_samples: Vec<i16> = match (spec.sample_format, spec.bits_per_sample) {
            (hound::SampleFormat::Int, 16) => wav_reader
                .samples::<i16>()
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(|e| audio_err(format!("failed to read WAV samples: {e}")))?,
            (hound::SampleFormat::Float, 32) => wav_reader
                .samples::<f32>()
                .map(|sample| {
                    sample.map(|s| (s.clamp(-1.0, 1.0) * f32::from(i16::MAX)) as i16)
                })
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(|e| audio_err(format!("failed to read WAV samples: {e}")))?,
            (format, bits) => {
                return Err(audio_err(format!(
                    "unsupported sample format {format:?} at {bits} bits"
                )));
            }
        };

        // Convert to mono if stereo
        let samples = if spec.channels == 2 {
            raw_samples
                .chunks_exact(2)
                .map(|chunk| {
                    let left = i32::from(chunk[0]);
                    let right = i32::from(chunk[1]);
                    ((left + right) / 2) as i16
                })
                .collect()
        } else {
            raw_samples
        };

        Ok(Self {
            samples,
            cursor: 0,
            sample_rate: expected_rate,
            block_size,
            lead_samples: 0,
            trail_samples: 0,
        })
    }

    /// Sets the zero padding emitted before and after the file's audio.
    pub fn set_padding(&mut self, padding: Padding) {
        let rate = f64::from(self.sample_rate);
        self.lead_samples = (padding.lead * rate).round() as usize;
        self.trail_samples = (padding.trail * rate).round() as usize;
    }

    /// Duration of the decoded audio in seconds, excluding padding.
    pub fn duration(&self) -> f64 {
        self.samples.len() as f64 / f64::from(self.sample_rate)
    }

    /// Number of blocks a full read pass will produce.
    pub fn total_blocks(&self) -> u64 {
        let total = self.lead_samples + self.samples.len() + self.trail_samples;
        total.div_ceil(self.block_size) as u64
    }

    /// Next block on the padded timeline.
    ///
    /// The final block may be shorter than the block size; an empty
    /// vector signals the end of the stream.
    pub fn read_block(&mut self) -> Vec<i16> {
        let total = self.lead_samples + self.samples.len() + self.trail_samples;
        if self.cursor >= total {
            return Vec::new();
        }

        let end = std::cmp::min(self.cursor + self.block_size, total);
        let block = (self.cursor..end)
            .map(|index| {
                index
                    .checked_sub(self.lead_samples)
                    .and_then(|i| self.samples.get(i).copied())
                    .unwrap_or(0)
            })
            .collect();
        self.cursor = end;

        block
    }
}
