//! Speaker timeline types shared by predictions and ground truth.

use serde::{Deserialize, Serialize};

/// One contiguous stretch of speech attributed to a single speaker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeakerSegment {
    pub speaker: String,
    /// Start time in seconds from the beginning of the recording.
    pub start: f64,
    /// Length of the segment in seconds.
    pub duration: f64,
}

impl SpeakerSegment {
    pub fn new(speaker: impl Into<String>, start: f64, duration: f64) -> Self {
        Self {
            speaker: speaker.into(),
            start,
            duration,
        }
    }

    /// End time in seconds.
    pub fn end(&self) -> f64 {
        self.start + self.duration
    }
}

/// A complete speaker timeline for one recording.
///
/// Used both for engine predictions and for loaded ground truth. Segments
/// are kept in the order they were produced, which for streaming engines
/// and well-formed reference files means ascending start time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Timeline {
    /// Recording identifier (file stem of the source audio).
    pub uri: String,
    pub segments: Vec<SpeakerSegment>,
}

impl Timeline {
    /// Creates an empty timeline for the given recording.
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            segments: Vec::new(),
        }
    }

    /// Creates a timeline from pre-built segments.
    pub fn with_segments(uri: impl Into<String>, segments: Vec<SpeakerSegment>) -> Self {
        Self {
            uri: uri.into(),
            segments,
        }
    }

    pub fn push(&mut self, speaker: impl Into<String>, start: f64, duration: f64) {
        self.segments.push(SpeakerSegment::new(speaker, start, duration));
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Distinct speaker labels in order of first appearance.
    pub fn speakers(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for segment in &self.segments {
            if !seen.contains(&segment.speaker.as_str()) {
                seen.push(&segment.speaker);
            }
        }
        seen
    }

    /// Total attributed speech time in seconds.
    ///
    /// Overlapping speakers count separately, matching how the error
    /// metric normalizes.
    pub fn speech_total(&self) -> f64 {
        self.segments.iter().map(|s| s.duration).sum()
    }

    /// Number of speaker turns: maximal runs of consecutive segments
    /// attributed to the same speaker.
    pub fn turn_count(&self) -> usize {
        let mut turns = 0;
        let mut current: Option<&str> = None;
        for segment in &self.segments {
            if current != Some(segment.speaker.as_str()) {
                turns += 1;
                current = Some(&segment.speaker);
            }
        }
        turns
    }
}
