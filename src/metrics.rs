//! Diarization error rate scoring and report generation.
//!
//! Scores follow the NIST formulation with no forgiveness collar and
//! overlapping speech counted in full: the union of reference and
//! hypothesis boundaries partitions the timeline, each interval is
//! charged for missed speech, false alarm and speaker confusion, and
//! speaker labels are aligned beforehand with an optimal one-to-one
//! mapping so an engine is never penalized for its choice of names.

use std::fs::{self, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{DiabenchError, Result};
use crate::rttm;
use crate::timeline::{SpeakerSegment, Timeline};

/// Scored components for one recording, all in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DerScore {
    /// Total reference speech, overlap counted per speaker.
    pub speech_total: f64,
    /// Speech attributed to the correctly mapped speaker.
    pub correct: f64,
    /// Reference speech no hypothesis speaker covers.
    pub missed: f64,
    /// Hypothesis speech no reference speaker covers.
    pub false_alarm: f64,
    /// Speech covered but attributed to the wrong speaker.
    pub confusion: f64,
}

impl DerScore {
    pub fn errors(&self) -> f64 {
        self.missed + self.false_alarm + self.confusion
    }

    /// Error rate normalized by total reference speech.
    ///
    /// With no reference speech the rate is zero for a silent
    /// hypothesis and infinite otherwise, so a degenerate file can
    /// never look better than a scored one.
    pub fn rate(&self) -> f64 {
        if self.speech_total > 0.0 {
            self.errors() / self.speech_total
        } else if self.errors() > 0.0 {
            f64::INFINITY
        } else {
            0.0
        }
    }
}

/// Scores a hypothesis against its reference annotation.
pub fn der(reference: &[SpeakerSegment], hypothesis: &[SpeakerSegment]) -> DerScore {
    let (ref_spans, ref_count) = index_spans(reference);
    let (hyp_spans, hyp_count) = index_spans(hypothesis);

    let mut boundaries: Vec<f64> = Vec::with_capacity(2 * (reference.len() + hypothesis.len()));
    for &(start, end, _) in ref_spans.iter().chain(hyp_spans.iter()) {
        boundaries.push(start);
        boundaries.push(end);
    }
    boundaries.sort_by(f64::total_cmp);
    boundaries.dedup();

    let mut speech_total = 0.0;
    let mut missed = 0.0;
    let mut false_alarm = 0.0;
    let mut overlap_floor = 0.0;
    let mut cooccurrence = vec![vec![0.0f64; hyp_count]; ref_count];

    let mut ref_active = vec![false; ref_count];
    let mut hyp_active = vec![false; hyp_count];
    for window in boundaries.windows(2) {
        let (t0, t1) = (window[0], window[1]);
        let dt = t1 - t0;
        if dt <= 0.0 {
            continue;
        }
        let mid = 0.5 * (t0 + t1);

        ref_active.fill(false);
        for &(start, end, idx) in &ref_spans {
            if start <= mid && mid < end {
                ref_active[idx] = true;
            }
        }
        hyp_active.fill(false);
        for &(start, end, idx) in &hyp_spans {
            if start <= mid && mid < end {
                hyp_active[idx] = true;
            }
        }

        let n_ref = ref_active.iter().filter(|a| **a).count() as f64;
        let n_hyp = hyp_active.iter().filter(|a| **a).count() as f64;

        speech_total += dt * n_ref;
        missed += dt * (n_ref - n_hyp).max(0.0);
        false_alarm += dt * (n_hyp - n_ref).max(0.0);
        overlap_floor += dt * n_ref.min(n_hyp);

        for (ri, active) in ref_active.iter().enumerate() {
            if !active {
                continue;
            }
            for (hi, active) in hyp_active.iter().enumerate() {
                if *active {
                    cooccurrence[ri][hi] += dt;
                }
            }
        }
    }

    let correct = best_mapping_overlap(&cooccurrence, ref_count, hyp_count);

    DerScore {
        speech_total,
        correct,
        missed,
        false_alarm,
        confusion: overlap_floor - correct,
    }
}

/// Flattens segments to `(start, end, speaker index)` spans, indexing
/// speakers in order of first appearance.
fn index_spans(segments: &[SpeakerSegment]) -> (Vec<(f64, f64, usize)>, usize) {
    let mut names: Vec<&str> = Vec::new();
    let mut spans = Vec::with_capacity(segments.len());
    for segment in segments {
        let idx = match names.iter().position(|name| *name == segment.speaker) {
            Some(idx) => idx,
            None => {
                names.push(segment.speaker.as_str());
                names.len() - 1
            }
        };
        spans.push((segment.start, segment.end(), idx));
    }
    (spans, names.len())
}

/// Total co-occurrence under the best one-to-one speaker mapping.
fn best_mapping_overlap(cooccurrence: &[Vec<f64>], ref_count: usize, hyp_count: usize) -> f64 {
    if ref_count == 0 || hyp_count == 0 {
        return 0.0;
    }

    // The assignment solver wants rows <= columns; maximize overlap by
    // minimizing its negation.
    let transposed = ref_count > hyp_count;
    let (rows, cols) = if transposed {
        (hyp_count, ref_count)
    } else {
        (ref_count, hyp_count)
    };
    let cost: Vec<Vec<f64>> = (0..rows)
        .map(|r| {
            (0..cols)
                .map(|c| {
                    let (ri, hi) = if transposed { (c, r) } else { (r, c) };
                    -cooccurrence[ri][hi]
                })
                .collect()
        })
        .collect();

    min_cost_assignment(&cost)
        .into_iter()
        .enumerate()
        .map(|(r, c)| {
            let (ri, hi) = if transposed { (c, r) } else { (r, c) };
            cooccurrence[ri][hi]
        })
        .sum()
}

/// Hungarian assignment over a dense cost matrix with `rows <= cols`,
/// returning the assigned column for each row.
fn min_cost_assignment(cost: &[Vec<f64>]) -> Vec<usize> {
    let n = cost.len();
    let m = cost.first().map_or(0, Vec::len);
    debug_assert!(n <= m);

    // Potentials over a virtual 0th row/column.
    let mut u = vec![0.0f64; n + 1];
    let mut v = vec![0.0f64; m + 1];
    let mut assigned_row = vec![0usize; m + 1];
    let mut way = vec![0usize; m + 1];

    for i in 1..=n {
        assigned_row[0] = i;
        let mut j0 = 0usize;
        let mut minv = vec![f64::INFINITY; m + 1];
        let mut used = vec![false; m + 1];

        loop {
            used[j0] = true;
            let i0 = assigned_row[j0];
            let mut delta = f64::INFINITY;
            let mut j1 = 0usize;
            for j in 1..=m {
                if used[j] {
                    continue;
                }
                let reduced = cost[i0 - 1][j - 1] - u[i0] - v[j];
                if reduced < minv[j] {
                    minv[j] = reduced;
                    way[j] = j0;
                }
                if minv[j] < delta {
                    delta = minv[j];
                    j1 = j;
                }
            }
            for j in 0..=m {
                if used[j] {
                    u[assigned_row[j]] += delta;
                    v[j] -= delta;
                } else {
                    minv[j] -= delta;
                }
            }
            j0 = j1;
            if assigned_row[j0] == 0 {
                break;
            }
        }

        // Augment along the found path.
        loop {
            let j1 = way[j0];
            assigned_row[j0] = assigned_row[j1];
            j0 = j1;
            if j0 == 0 {
                break;
            }
        }
    }

    let mut assignment = vec![0usize; n];
    for j in 1..=m {
        if assigned_row[j] != 0 {
            assignment[assigned_row[j] - 1] = j - 1;
        }
    }
    assignment
}

// ── Reports ─────────────────────────────────────────────────────────

/// What to do when a predicted recording has no reference annotation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingReference {
    /// Warn and leave the recording out of the report.
    #[default]
    Skip,
    /// Abort the evaluation.
    Fail,
}

impl FromStr for MissingReference {
    type Err = DiabenchError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "skip" => Ok(Self::Skip),
            "fail" => Ok(Self::Fail),
            other => Err(DiabenchError::ConfigInvalidValue {
                key: "missing_reference".to_string(),
                message: format!("unknown policy '{other}', expected skip or fail"),
            }),
        }
    }
}

/// One scored recording in a report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportRow {
    pub uri: String,
    pub speech_total: f64,
    pub correct: f64,
    pub missed_detection: f64,
    pub false_alarm: f64,
    pub confusion: f64,
    pub error_rate: f64,
}

impl ReportRow {
    pub fn new(uri: impl Into<String>, score: &DerScore) -> Self {
        Self {
            uri: uri.into(),
            speech_total: score.speech_total,
            correct: score.correct,
            missed_detection: score.missed,
            false_alarm: score.false_alarm,
            confusion: score.confusion,
            error_rate: score.rate(),
        }
    }

    fn csv_line(&self) -> String {
        format!(
            "{},{:.3},{:.3},{:.3},{:.3},{:.3},{:.4}",
            self.uri,
            self.speech_total,
            self.correct,
            self.missed_detection,
            self.false_alarm,
            self.confusion,
            self.error_rate
        )
    }
}

const CSV_HEADER: &str = "uri,speech_total,correct,missed_detection,false_alarm,confusion,error_rate";

/// Per-recording scores plus the corpus-level aggregate.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Report {
    rows: Vec<ReportRow>,
}

impl Report {
    pub fn from_rows(rows: Vec<ReportRow>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[ReportRow] {
        &self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Corpus-level totals; the rate is recomputed from the summed
    /// components, not averaged over rows.
    pub fn aggregate(&self) -> ReportRow {
        let mut total = DerScore {
            speech_total: 0.0,
            correct: 0.0,
            missed: 0.0,
            false_alarm: 0.0,
            confusion: 0.0,
        };
        for row in &self.rows {
            total.speech_total += row.speech_total;
            total.correct += row.correct;
            total.missed += row.missed_detection;
            total.false_alarm += row.false_alarm;
            total.confusion += row.confusion;
        }
        ReportRow::new("TOTAL", &total)
    }

    /// Corpus-level error rate, the sweep's objective.
    pub fn error_rate(&self) -> f64 {
        self.aggregate().error_rate
    }

    /// Appends all rows plus the aggregate to a CSV file, writing the
    /// header only when the file is new or empty.
    pub fn append_csv(&self, path: &Path) -> Result<()> {
        let needs_header = match fs::metadata(path) {
            Ok(metadata) => metadata.len() == 0,
            Err(_) => true,
        };

        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let mut writer = BufWriter::new(file);
        if needs_header {
            writeln!(writer, "{CSV_HEADER}")?;
        }
        for row in &self.rows {
            writeln!(writer, "{}", row.csv_line())?;
        }
        writeln!(writer, "{}", self.aggregate().csv_line())?;
        writer.flush()?;

        Ok(())
    }

    pub fn print(&self) {
        println!("\n{}", "=".repeat(120));
        println!("DIARIZATION ERROR RATE");
        println!("{}", "=".repeat(120));

        println!(
            "\n{:<28} {:>12} {:>12} {:>12} {:>12} {:>12} {:>10}",
            "Recording", "Speech (s)", "Correct (s)", "Missed (s)", "FA (s)", "Conf (s)", "DER"
        );
        println!("{}", "-".repeat(120));

        for row in &self.rows {
            print_row(row);
        }

        println!("{}", "-".repeat(120));
        print_row(&self.aggregate());
        println!("{}", "=".repeat(120));
    }
}

fn print_row(row: &ReportRow) {
    println!(
        "{:<28} {:>12.3} {:>12.3} {:>12.3} {:>12.3} {:>12.3} {:>9.2}%",
        row.uri,
        row.speech_total,
        row.correct,
        row.missed_detection,
        row.false_alarm,
        row.confusion,
        row.error_rate * 100.0
    );
}

pub fn print_json_report(report: &Report) {
    #[derive(Serialize)]
    struct JsonReport<'a> {
        rows: &'a [ReportRow],
        total: ReportRow,
    }

    let view = JsonReport {
        rows: report.rows(),
        total: report.aggregate(),
    };
    match serde_json::to_string_pretty(&view) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Error serializing to JSON: {}", e),
    }
}

/// Scores every prediction against `<reference_dir>/<uri>.rttm`.
///
/// Missing annotations are handled per the policy; a non-empty batch
/// where nothing at all could be scored is an error either way, since
/// a silently empty report would read as a perfect run.
pub fn evaluate(
    predictions: &[Timeline],
    reference_dir: &Path,
    missing: MissingReference,
) -> Result<Report> {
    let mut rows = Vec::with_capacity(predictions.len());
    for timeline in predictions {
        let path = reference_dir.join(format!("{}.rttm", timeline.uri));
        if !path.is_file() {
            match missing {
                MissingReference::Skip => {
                    eprintln!("diabench: no ground truth for '{}', skipping", timeline.uri);
                    continue;
                }
                MissingReference::Fail => {
                    return Err(DiabenchError::GroundTruthNotFound {
                        uri: timeline.uri.clone(),
                        path: path.display().to_string(),
                    });
                }
            }
        }

        let reference = rttm::load_rttm(&path)?;
        let score = der(&reference, &timeline.segments);
        rows.push(ReportRow::new(timeline.uri.clone(), &score));
    }

    if rows.is_empty() && !predictions.is_empty() {
        return Err(DiabenchError::Other(format!(
            "no ground truth matched any of the {} predicted recordings under {}",
            predictions.len(),
            reference_dir.display()
        )));
    }

    Ok(Report::from_rows(rows))
}
