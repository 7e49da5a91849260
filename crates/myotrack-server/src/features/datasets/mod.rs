//! Datasets feature
//!
//! Upload, replace, list and report on EMG/angle recordings.

pub mod commands;
pub mod queries;
pub mod routes;

pub use routes::datasets_routes;
