//! Dataset write operations

pub mod create;
pub mod replace;

pub use create::{CreateDatasetCommand, CreateDatasetError, CreateDatasetResponse};
pub use replace::{ReplaceDatasetCommand, ReplaceDatasetError, ReplaceDatasetResponse};
