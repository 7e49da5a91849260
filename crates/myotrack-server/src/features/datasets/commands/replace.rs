//! Replace dataset command
//!
//! Swaps a dataset's name, file reference and every sample row in one
//! transaction. A rejected spreadsheet rolls everything back, so the dataset
//! reads exactly as it did before the request.

use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use std::path::PathBuf;

use crate::db::{self, samples};
use crate::features::shared::validation::{
    validate_name, NameValidationError, MAX_DATASET_NAME_LENGTH,
};
use crate::ingest::{self, IngestError, IngestSettings};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplaceDatasetCommand {
    pub id: i64,
    pub name: String,
    pub file_path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplaceDatasetResponse {
    pub id: i64,
    pub message: String,
    pub rows_inserted: u64,
    pub rows_dropped: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum ReplaceDatasetError {
    #[error("Name validation failed: {0}")]
    NameValidation(#[from] NameValidationError),

    #[error("Dataset {0} not found")]
    NotFound(i64),

    #[error(transparent)]
    Ingest(#[from] IngestError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl ReplaceDatasetCommand {
    /// Validates the command and returns the trimmed name
    pub fn validate(&self) -> Result<String, ReplaceDatasetError> {
        Ok(validate_name(&self.name, MAX_DATASET_NAME_LENGTH)?)
    }
}

#[tracing::instrument(
    skip(pool, settings, command),
    fields(dataset_id = command.id, name = %command.name)
)]
pub async fn handle(
    pool: SqlitePool,
    settings: &IngestSettings,
    command: ReplaceDatasetCommand,
) -> Result<ReplaceDatasetResponse, ReplaceDatasetError> {
    let name = command.validate()?;

    let mut tx = db::begin_write(&pool).await?;

    let existing: Option<i64> = sqlx::query_scalar("SELECT id FROM datasets WHERE id = ?")
        .bind(command.id)
        .fetch_optional(&mut *tx)
        .await?;
    if existing.is_none() {
        return Err(ReplaceDatasetError::NotFound(command.id));
    }

    let rows_deleted = samples::delete_samples(&mut tx, command.id).await?;

    sqlx::query("UPDATE datasets SET name = ?, file_path = ? WHERE id = ?")
        .bind(&name)
        .bind(command.file_path.to_string_lossy().into_owned())
        .bind(command.id)
        .execute(&mut *tx)
        .await?;

    let report = ingest::spawn_load_samples(
        command.file_path.clone(),
        settings.columns.clone(),
        settings.replace_policy,
    )
    .await?;

    let rows_inserted = samples::insert_samples(&mut tx, command.id, &report.samples).await?;

    tx.commit().await?;

    tracing::info!(
        rows_deleted,
        rows_inserted,
        rows_dropped = report.dropped_rows,
        "Dataset replaced"
    );

    Ok(ReplaceDatasetResponse {
        id: command.id,
        message: "updated".to_string(),
        rows_inserted,
        rows_dropped: report.dropped_rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::shared::test_helpers::{dataset_row, write_csv, TestDataset};
    use crate::ingest::RowPolicy;
    use myotrack_common::types::Sample;
    use tempfile::TempDir;

    fn initial_samples() -> Vec<Sample> {
        vec![Sample::new(0, 1, 1, 1, 1, 0), Sample::new(1, 2, 2, 2, 2, 50)]
    }

    async fn stored_samples(pool: &SqlitePool, id: i64) -> Vec<Sample> {
        let mut conn = pool.acquire().await.unwrap();
        samples::fetch_samples(&mut conn, id).await.unwrap()
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_replace_swaps_metadata_and_rows(pool: SqlitePool) {
        let dataset = TestDataset::new("Before")
            .with_samples(initial_samples())
            .insert(&pool)
            .await
            .unwrap();
        let dir = TempDir::new().unwrap();
        let path = write_csv(&dir, "after.csv", &["10,5,5,5,5,5", "11,6,6,6,6,40", "12,7,7,7,7,80"]);

        let response = handle(
            pool.clone(),
            &IngestSettings::default(),
            ReplaceDatasetCommand {
                id: dataset.id,
                name: "After".to_string(),
                file_path: path.clone(),
            },
        )
        .await
        .unwrap();

        assert_eq!(response.id, dataset.id);
        assert_eq!(response.message, "updated");
        assert_eq!(response.rows_inserted, 3);

        let (name, file_path) = dataset_row(&pool, dataset.id).await.unwrap();
        assert_eq!(name, "After");
        assert_eq!(file_path, path.to_string_lossy());
        let timestamps: Vec<i64> = stored_samples(&pool, dataset.id)
            .await
            .iter()
            .map(|s| s.timestamp)
            .collect();
        assert_eq!(timestamps, [10, 11, 12]);
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_failed_replace_leaves_dataset_unchanged(pool: SqlitePool) {
        let dataset = TestDataset::new("Before")
            .with_file_path("uploads/before.csv")
            .with_samples(initial_samples())
            .insert(&pool)
            .await
            .unwrap();
        let dir = TempDir::new().unwrap();
        let path = write_csv(&dir, "after.csv", &["x,y,z,a,b,c", "q,w,e,r,t,y"]);

        let result = handle(
            pool.clone(),
            &IngestSettings::default(),
            ReplaceDatasetCommand {
                id: dataset.id,
                name: "After".to_string(),
                file_path: path,
            },
        )
        .await;

        assert!(matches!(
            result,
            Err(ReplaceDatasetError::Ingest(IngestError::DataValidation(_)))
        ));
        let (name, file_path) = dataset_row(&pool, dataset.id).await.unwrap();
        assert_eq!(name, "Before");
        assert_eq!(file_path, "uploads/before.csv");
        assert_eq!(stored_samples(&pool, dataset.id).await, initial_samples());
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_failed_schema_leaves_dataset_unchanged(pool: SqlitePool) {
        let dataset = TestDataset::new("Before")
            .with_samples(initial_samples())
            .insert(&pool)
            .await
            .unwrap();
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("after.csv");
        std::fs::write(&path, "timestamp,emg1\n0,1\n").unwrap();

        let result = handle(
            pool.clone(),
            &IngestSettings::default(),
            ReplaceDatasetCommand {
                id: dataset.id,
                name: "After".to_string(),
                file_path: path,
            },
        )
        .await;

        assert!(matches!(
            result,
            Err(ReplaceDatasetError::Ingest(IngestError::SchemaValidation { .. }))
        ));
        assert_eq!(stored_samples(&pool, dataset.id).await, initial_samples());
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_replace_default_policy_drops_invalid_rows(pool: SqlitePool) {
        let dataset = TestDataset::new("Before")
            .with_samples(initial_samples())
            .insert(&pool)
            .await
            .unwrap();
        let dir = TempDir::new().unwrap();
        let path = write_csv(&dir, "after.csv", &["0,1,2,3,4,5", "1,1,abc,3,4,5", "2,1,2,3,4,5"]);

        let response = handle(
            pool.clone(),
            &IngestSettings::default(),
            ReplaceDatasetCommand {
                id: dataset.id,
                name: "After".to_string(),
                file_path: path,
            },
        )
        .await
        .unwrap();

        assert_eq!(response.rows_inserted, 2);
        assert_eq!(response.rows_dropped, 1);
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_strict_replace_policy_rejects_invalid_rows(pool: SqlitePool) {
        let dataset = TestDataset::new("Before")
            .with_samples(initial_samples())
            .insert(&pool)
            .await
            .unwrap();
        let dir = TempDir::new().unwrap();
        let path = write_csv(&dir, "after.csv", &["0,1,2,3,4,5", "1,1,abc,3,4,5"]);
        let settings = IngestSettings {
            replace_policy: RowPolicy::Strict,
            ..IngestSettings::default()
        };

        let result = handle(
            pool.clone(),
            &settings,
            ReplaceDatasetCommand {
                id: dataset.id,
                name: "After".to_string(),
                file_path: path,
            },
        )
        .await;

        assert!(matches!(
            result,
            Err(ReplaceDatasetError::Ingest(IngestError::DataValidation(_)))
        ));
        assert_eq!(stored_samples(&pool, dataset.id).await, initial_samples());
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_replace_unknown_id_is_not_found(pool: SqlitePool) {
        // The file is never read for an unknown id.
        let result = handle(
            pool.clone(),
            &IngestSettings::default(),
            ReplaceDatasetCommand {
                id: 42,
                name: "After".to_string(),
                file_path: PathBuf::from("/nonexistent/after.csv"),
            },
        )
        .await;

        assert!(matches!(result, Err(ReplaceDatasetError::NotFound(42))));
    }

    #[tokio::test]
    async fn test_concurrent_replaces_both_commit() {
        let dir = TempDir::new().unwrap();
        let mut config = crate::config::Config::default().database;
        config.url = format!("sqlite://{}", dir.path().join("myotrack.db").display());
        config.busy_timeout_secs = 30;
        let pool = db::create_pool(&config).await.unwrap();
        db::run_migrations(&pool).await.unwrap();

        let dataset = TestDataset::new("Before")
            .with_samples(initial_samples())
            .insert(&pool)
            .await
            .unwrap();

        let rows_a: Vec<String> = (0..20_000).map(|i| format!("{},1,1,1,1,{}", i, i % 90)).collect();
        let rows_b: Vec<String> = (0..20_000).map(|i| format!("{},2,2,2,2,{}", i, i % 45)).collect();
        let rows_a: Vec<&str> = rows_a.iter().map(String::as_str).collect();
        let rows_b: Vec<&str> = rows_b.iter().map(String::as_str).collect();
        let path_a = write_csv(&dir, "a.csv", &rows_a);
        let path_b = write_csv(&dir, "b.csv", &rows_b);

        let settings = IngestSettings::default();
        let (a, b) = tokio::join!(
            handle(
                pool.clone(),
                &settings,
                ReplaceDatasetCommand {
                    id: dataset.id,
                    name: "A".to_string(),
                    file_path: path_a,
                },
            ),
            handle(
                pool.clone(),
                &settings,
                ReplaceDatasetCommand {
                    id: dataset.id,
                    name: "B".to_string(),
                    file_path: path_b,
                },
            ),
        );

        assert_eq!(a.unwrap().rows_inserted, 20_000);
        assert_eq!(b.unwrap().rows_inserted, 20_000);

        let (name, _) = dataset_row(&pool, dataset.id).await.unwrap();
        assert!(name == "A" || name == "B", "{}", name);

        let stored = stored_samples(&pool, dataset.id).await;
        assert_eq!(stored.len(), 20_000);
        let expected_emg1 = if name == "A" { 1 } else { 2 };
        assert!(stored.iter().all(|s| s.emg1 == expected_emg1));
    }
}
