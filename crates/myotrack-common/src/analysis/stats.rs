//! Per-channel summary statistics

use serde::{Deserialize, Serialize};

use super::peaks::PeakDetector;
use crate::error::{MyotrackError, Result};
use crate::types::{ChannelValues, Column, Sample};

/// Summary of one dataset's series as served by the report endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesStats {
    /// Arithmetic mean per channel
    pub mean: ChannelValues<f64>,
    /// Maximum per channel
    pub max: ChannelValues<i64>,
    /// Angle peaks found by the detector
    pub peaks: usize,
}

/// Compute mean/max for every channel and count angle peaks.
///
/// # Errors
///
/// Returns [`MyotrackError::EmptySeries`] when `samples` is empty, since
/// neither a mean nor a maximum is defined.
pub fn summarize(samples: &[Sample], detector: &PeakDetector) -> Result<SeriesStats> {
    if samples.is_empty() {
        return Err(MyotrackError::EmptySeries);
    }

    let len = samples.len() as f64;
    let mean = ChannelValues::from_fn(|column| {
        // i128 sum cannot overflow for any realistic row count.
        let sum: i128 = samples.iter().map(|s| i128::from(s.get(column))).sum();
        sum as f64 / len
    });
    let max = ChannelValues::from_fn(|column| channel_max(samples, column));
    let peaks = detector.count(samples.iter().map(|s| s.angle));

    Ok(SeriesStats { mean, max, peaks })
}

fn channel_max(samples: &[Sample], column: Column) -> i64 {
    samples
        .iter()
        .map(|s| s.get(column))
        .max()
        .unwrap_or(i64::MIN)
}
