//! Feature modules implementing the Myotrack API
//!
//! Each feature is a vertical slice:
//! - `commands/` - write operations (create, replace)
//! - `queries/` - read operations (get, list)
//! - `routes.rs` - HTTP handlers and error mapping
//!
//! # Features
//!
//! - **datasets**: spreadsheet upload, replacement, listing and reports

pub mod datasets;
pub mod shared;

use axum::Router;
use myotrack_common::analysis::PeakDetector;
use sqlx::SqlitePool;
use std::sync::Arc;

use crate::ingest::IngestSettings;
use crate::storage::UploadStore;

/// Shared state for all feature routes
#[derive(Clone)]
pub struct FeatureState {
    /// SQLite connection pool
    pub db: SqlitePool,
    /// Where uploaded spreadsheets are kept
    pub uploads: UploadStore,
    /// Header names and row policies for ingestion
    pub ingest: Arc<IngestSettings>,
    /// Peak detector used by the report endpoint
    pub peaks: PeakDetector,
}

/// Creates the API router with all feature routes mounted at its root
///
/// The caller nests the result under `/api`.
pub fn router(state: FeatureState, max_upload_bytes: usize) -> Router<()> {
    Router::new().merge(datasets::datasets_routes(max_upload_bytes).with_state(state))
}
