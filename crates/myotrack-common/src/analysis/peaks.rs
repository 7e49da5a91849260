//! Angle peak detection
//!
//! The detector tracks the running minimum since the last detected peak and
//! fires when the signal rises strictly more than `threshold` above it. After
//! a peak the baseline resets to the peak value, so a monotone ramp produces
//! one peak per `threshold` units of rise.

/// Rise (in angle units) above the running minimum that counts as a peak
pub const DEFAULT_PEAK_THRESHOLD: i64 = 20;

/// Single-pass peak counter over an ordered angle sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeakDetector {
    threshold: i64,
}

impl Default for PeakDetector {
    fn default() -> Self {
        Self::new(DEFAULT_PEAK_THRESHOLD)
    }
}

impl PeakDetector {
    pub fn new(threshold: i64) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> i64 {
        self.threshold
    }

    /// Count peaks in `angles`, visited in iteration order.
    pub fn count<I>(&self, angles: I) -> usize
    where
        I: IntoIterator<Item = i64>,
    {
        let mut peaks = 0;
        // None stands in for +infinity before the first reading.
        let mut baseline: Option<i64> = None;

        for angle in angles {
            let min_angle = match baseline {
                Some(min) if min <= angle => min,
                _ => angle,
            };

            // i128 keeps `min + threshold` exact at the i64 extremes.
            if i128::from(angle) > i128::from(min_angle) + i128::from(self.threshold) {
                peaks += 1;
                baseline = Some(angle);
            } else {
                baseline = Some(min_angle);
            }
        }

        peaks
    }
}
