//! Dataset read operations

pub mod get;
pub mod list;

pub use get::{GetDatasetError, GetDatasetQuery, GetDatasetResponse};
pub use list::{DatasetSummary, ListDatasetsError, ListDatasetsQuery};
