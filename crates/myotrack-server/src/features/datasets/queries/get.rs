//! Get dataset query
//!
//! Reads a dataset's samples back in insertion order and summarizes them.
//! Nothing is cached; every call recomputes from the store.

use myotrack_common::analysis::{summarize, PeakDetector, SeriesStats};
use myotrack_common::types::Sample;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::db::samples;

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GetDatasetQuery {
    pub id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetDatasetResponse {
    pub id: i64,
    pub name: String,
    pub stats: SeriesStats,
    pub series: Vec<Sample>,
}

#[derive(Debug, thiserror::Error)]
pub enum GetDatasetError {
    #[error("Dataset {0} not found")]
    NotFound(i64),

    #[error("Dataset {0} has no readable samples")]
    DataIntegrity(i64),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[tracing::instrument(skip(pool, detector), fields(dataset_id = query.id))]
pub async fn handle(
    pool: SqlitePool,
    detector: &PeakDetector,
    query: GetDatasetQuery,
) -> Result<GetDatasetResponse, GetDatasetError> {
    // One transaction so the row and its samples come from the same snapshot.
    let mut tx = pool.begin().await?;

    let name: String = sqlx::query_scalar("SELECT name FROM datasets WHERE id = ?")
        .bind(query.id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(GetDatasetError::NotFound(query.id))?;

    let series = samples::fetch_samples(&mut tx, query.id).await?;
    let stored = samples::count_samples(&mut tx, query.id).await?;

    tx.commit().await?;

    let skipped = usize::try_from(stored).unwrap_or_default().saturating_sub(series.len());
    if skipped > 0 {
        tracing::warn!(skipped, stored, "Skipped stored rows with non-numeric values");
    }

    let stats = summarize(&series, detector).map_err(|e| {
        tracing::error!(error = %e, stored, "Dataset has no readable samples");
        GetDatasetError::DataIntegrity(query.id)
    })?;

    tracing::debug!(rows = series.len(), peaks = stats.peaks, "Dataset summarized");

    Ok(GetDatasetResponse {
        id: query.id,
        name,
        stats,
        series,
    })
}
