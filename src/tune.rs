//! Single-knob sweeps: rerun one benchmark across a grid of values and
//! track the best-scoring setting.

use serde::Serialize;

use crate::bench::Benchmark;
use crate::engine::{PipelineBuilder, PipelineConfig};
use crate::error::{DiabenchError, Result};

/// One scored grid point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SweepPoint {
    pub value: f64,
    pub error_rate: f64,
}

/// All scored points of one sweep, in the order they were tried.
#[derive(Debug, Clone, Serialize)]
pub struct SweepOutcome {
    pub knob: String,
    pub points: Vec<SweepPoint>,
}

impl SweepOutcome {
    /// Lowest-error point; earlier values win ties.
    pub fn best(&self) -> Option<&SweepPoint> {
        self.points.iter().fold(None, |best: Option<&SweepPoint>, point| {
            match best {
                Some(current) if current.error_rate <= point.error_rate => Some(current),
                _ => Some(point),
            }
        })
    }

    pub fn print(&self) {
        println!("\n{}", "=".repeat(120));
        println!("SWEEP RESULTS: {}", self.knob);
        println!("{}", "=".repeat(120));

        println!("\n{:>12} {:>10}", self.knob, "DER");
        println!("{}", "-".repeat(120));
        for point in &self.points {
            println!("{:>12} {:>9.2}%", point.value, point.error_rate * 100.0);
        }

        if let Some(best) = self.best() {
            println!(
                "\nBest: {} = {} ({:.2}% DER)",
                self.knob,
                best.value,
                best.error_rate * 100.0
            );
        }
        println!("{}", "=".repeat(120));
    }
}

/// Runs the benchmark once per value of a single knob.
///
/// Every run appends to the same prediction history and report, so the
/// sweep's full trail survives on disk. Ground truth is required; an
/// unscored sweep has no objective to compare by.
pub fn sweep(
    benchmark: &Benchmark,
    builder: &dyn PipelineBuilder,
    base: &PipelineConfig,
    knob: &str,
    values: &[f64],
) -> Result<SweepOutcome> {
    if !benchmark.has_reference() {
        return Err(DiabenchError::ConfigInvalidValue {
            key: "reference_dir".to_string(),
            message: "a sweep needs ground truth to score against".to_string(),
        });
    }
    if values.is_empty() {
        return Err(DiabenchError::ConfigInvalidValue {
            key: "values".to_string(),
            message: "a sweep needs at least one value to try".to_string(),
        });
    }

    let mut points = Vec::with_capacity(values.len());
    for &value in values {
        let config = base.with_knob(knob, value)?;
        let outcome = benchmark.run(builder, &config)?;
        let error_rate = outcome.error_rate().ok_or_else(|| {
            DiabenchError::Other("benchmark run produced no report to score".to_string())
        })?;
        points.push(SweepPoint { value, error_rate });
    }

    Ok(SweepOutcome {
        knob: knob.to_string(),
        points,
    })
}

/// Inclusive linear grid from `from` to `to`.
pub fn linear_values(from: f64, to: f64, steps: usize) -> Vec<f64> {
    match steps {
        0 => Vec::new(),
        1 => vec![from],
        _ => {
            let pitch = (to - from) / (steps - 1) as f64;
            (0..steps).map(|i| from + pitch * i as f64).collect()
        }
    }
}
