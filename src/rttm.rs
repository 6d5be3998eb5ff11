//! Reading and writing the RTTM speaker-segment text format.
//!
//! One segment per line, ten whitespace-separated positional fields:
//!
//! ```text
//! SPEAKER <recording_id> 1 <start_time> <duration> <NA> <NA> <speaker_label> <NA> <NA>
//! ```
//!
//! Lines not starting with `SPEAKER` (run headers, blanks) are ignored by
//! the file-level parser, so plain ground-truth files and the append-style
//! prediction history share one reader.

use crate::defaults;
use crate::error::{DiabenchError, Result};
use crate::timeline::SpeakerSegment;
use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

/// Formats one segment as an RTTM line (no trailing newline).
pub fn format_segment(uri: &str, segment: &SpeakerSegment) -> String {
    format!(
        "SPEAKER {} 1 {:.prec$} {:.prec$} <NA> <NA> {} <NA> <NA>",
        uri,
        segment.start,
        segment.duration,
        segment.speaker,
        prec = defaults::RTTM_TIME_DECIMALS,
    )
}

/// Writes segments as RTTM lines.
pub fn write_rttm<W: Write>(writer: &mut W, uri: &str, segments: &[SpeakerSegment]) -> Result<()> {
    for segment in segments {
        writeln!(writer, "{}", format_segment(uri, segment))?;
    }
    Ok(())
}

/// Parses one line known to start with `SPEAKER`.
///
/// Returns a plain message on failure; callers attach file/line context.
pub fn parse_segment(line: &str) -> std::result::Result<SpeakerSegment, String> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() < 10 {
        return Err(format!("expected 10 fields, found {}", fields.len()));
    }
    let start: f64 = fields[3]
        .parse()
        .map_err(|_| format!("invalid start time '{}'", fields[3]))?;
    let duration: f64 = fields[4]
        .parse()
        .map_err(|_| format!("invalid duration '{}'", fields[4]))?;
    Ok(SpeakerSegment::new(fields[7], start, duration))
}

/// Parses every `SPEAKER` line from a reader, skipping everything else.
///
/// `source` names the input in parse errors.
pub fn parse_rttm<R: BufRead>(reader: R, source: &str) -> Result<Vec<SpeakerSegment>> {
    let mut segments = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        if !line.starts_with("SPEAKER") {
            continue;
        }
        let segment = parse_segment(&line).map_err(|message| DiabenchError::RttmParse {
            path: source.to_string(),
            line: idx + 1,
            message,
        })?;
        segments.push(segment);
    }
    Ok(segments)
}

/// Loads all segments from an RTTM file.
pub fn load_rttm(path: &Path) -> Result<Vec<SpeakerSegment>> {
    let file = File::open(path)?;
    parse_rttm(BufReader::new(file), &path.display().to_string())
}
