//! List datasets query

use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListDatasetsQuery;

/// One entry of the dataset index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct DatasetSummary {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ListDatasetsError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// All datasets ordered by id
#[tracing::instrument(skip(pool, _query))]
pub async fn handle(
    pool: SqlitePool,
    _query: ListDatasetsQuery,
) -> Result<Vec<DatasetSummary>, ListDatasetsError> {
    let datasets = sqlx::query_as::<_, DatasetSummary>("SELECT id, name FROM datasets ORDER BY id")
        .fetch_all(&pool)
        .await?;

    tracing::debug!(count = datasets.len(), "Datasets listed");

    Ok(datasets)
}
