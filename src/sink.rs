//! Persists hypothesis timelines as per-recording RTTM run files.
//!
//! Each benchmark run appends one block per recording to
//! `<uri>.rttm` in the destination directory: a header line carrying
//! the configuration label, the RTTM segment lines, then a blank
//! separator. Appending keeps the history of every setting tried
//! against the same corpus, which is what a sweep reads back.

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::{DiabenchError, Result};
use crate::rttm;
use crate::timeline::{SpeakerSegment, Timeline};

/// Append-only store of prediction run blocks.
#[derive(Debug, Clone)]
pub struct PredictionSink {
    dir: PathBuf,
}

impl PredictionSink {
    /// Opens the destination directory, creating it if needed.
    pub fn create(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir)?;
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Prediction file path for a recording.
    pub fn path_for(&self, uri: &str) -> PathBuf {
        self.dir.join(format!("{uri}.rttm"))
    }

    /// Appends one labeled run block for the timeline's recording.
    ///
    /// A run that produced no segments still appends its header, so the
    /// file keeps one block per run regardless of engine output.
    pub fn record(&self, timeline: &Timeline, label: &str) -> Result<PathBuf> {
        let path = self.path_for(&timeline.uri);
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let mut writer = BufWriter::new(file);

        writeln!(writer, "{label}:")?;
        rttm::write_rttm(&mut writer, &timeline.uri, &timeline.segments)?;
        writeln!(writer)?;
        writer.flush()?;

        Ok(path)
    }
}

/// One recorded run block read back from a prediction file.
#[derive(Debug, Clone, PartialEq)]
pub struct RunRecord {
    pub label: String,
    pub segments: Vec<SpeakerSegment>,
}

/// Reads every run block from a prediction file, oldest first.
pub fn read_runs(path: &Path) -> Result<Vec<RunRecord>> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);

    let mut runs: Vec<RunRecord> = Vec::new();
    let mut in_block = false;
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();

        if trimmed.is_empty() {
            in_block = false;
        } else if trimmed.starts_with("SPEAKER ") {
            let segment =
                rttm::parse_segment(trimmed).map_err(|message| DiabenchError::RttmParse {
                    path: path.display().to_string(),
                    line: index + 1,
                    message,
                })?;
            if !in_block {
                // Headerless block, tolerated for hand-edited files.
                runs.push(RunRecord {
                    label: String::new(),
                    segments: Vec::new(),
                });
                in_block = true;
            }
            if let Some(run) = runs.last_mut() {
                run.segments.push(segment);
            }
        } else {
            runs.push(RunRecord {
                label: trimmed.trim_end_matches(':').to_string(),
                segments: Vec::new(),
            });
            in_block = true;
        }
    }

    Ok(runs)
}
