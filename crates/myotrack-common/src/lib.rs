//! Myotrack Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared domain types, signal analysis, and logging for the Myotrack workspace.
//!
//! # Overview
//!
//! - **Types**: [`Sample`](types::Sample) rows and the [`Column`](types::Column) schema
//! - **Analysis**: the angle [`PeakDetector`](analysis::PeakDetector) and per-channel
//!   summary statistics
//! - **Logging**: tracing subscriber setup shared by every binary
//!
//! # Example
//!
//! ```
//! use myotrack_common::analysis::{summarize, PeakDetector};
//! use myotrack_common::types::Sample;
//!
//! let samples = vec![
//!     Sample::new(0, 10, 11, 12, 13, 0),
//!     Sample::new(1, 20, 21, 22, 23, 35),
//! ];
//! let stats = summarize(&samples, &PeakDetector::default()).unwrap();
//! assert_eq!(stats.peaks, 1);
//! assert_eq!(stats.max.angle, 35);
//! ```

pub mod analysis;
pub mod error;
pub mod logging;
pub mod types;

// Re-export commonly used types
pub use error::{MyotrackError, Result};
