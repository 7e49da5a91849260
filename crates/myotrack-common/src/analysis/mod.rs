//! Signal analysis over stored sample series
//!
//! - [`peaks`]: threshold-crossing peak counter for the angle channel
//! - [`stats`]: per-channel mean/max plus the peak count

pub mod peaks;
pub mod stats;

pub use peaks::{PeakDetector, DEFAULT_PEAK_THRESHOLD};
pub use stats::{summarize, SeriesStats};
