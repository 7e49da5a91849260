//! Myotrack Server Library
//!
//! HTTP service that ingests EMG/angle recordings from spreadsheets, stores
//! them in SQLite and serves per-channel statistics and angle peak counts.
//!
//! # Architecture
//!
//! - **ingest**: spreadsheet reading, header checks and numeric coercion
//! - **db**: connection pool, migrations and sample-row storage
//! - **storage**: local directory for uploaded files
//! - **features**: command/query slices wired to axum routes
//! - **api**: router assembly, health check and graceful shutdown
//!
//! Write operations (create, replace) run in a single transaction each, so a
//! rejected spreadsheet never leaves partial data behind.
//!
//! # Example
//!
//! ```no_run
//! use myotrack_server::{api, config::Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load()?;
//!     api::serve(config).await?;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod features;
pub mod ingest;
pub mod middleware;
pub mod storage;

pub use error::AppError;
