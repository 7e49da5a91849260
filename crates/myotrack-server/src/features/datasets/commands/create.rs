//! Create dataset command
//!
//! The dataset row is inserted first so the samples can reference its id.
//! Parsing, validation and the bulk insert all happen inside the same
//! transaction, so a rejected spreadsheet leaves no dataset behind.

use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use std::path::PathBuf;

use crate::db::{self, samples};
use crate::features::shared::validation::{
    validate_name, NameValidationError, MAX_DATASET_NAME_LENGTH,
};
use crate::ingest::{self, IngestError, IngestSettings};

/// Command to ingest a stored spreadsheet as a new dataset
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDatasetCommand {
    /// Display name
    pub name: String,

    /// Stored upload to ingest; recorded as the dataset's `file_path`
    pub file_path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDatasetResponse {
    pub id: i64,
    pub message: String,
    pub rows_inserted: u64,
    pub rows_dropped: usize,
}

/// Errors that can occur when creating a dataset
#[derive(Debug, thiserror::Error)]
pub enum CreateDatasetError {
    #[error("Name validation failed: {0}")]
    NameValidation(#[from] NameValidationError),

    #[error(transparent)]
    Ingest(#[from] IngestError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl CreateDatasetCommand {
    /// Validates the command and returns the trimmed name
    pub fn validate(&self) -> Result<String, CreateDatasetError> {
        Ok(validate_name(&self.name, MAX_DATASET_NAME_LENGTH)?)
    }
}

#[tracing::instrument(
    skip(pool, settings, command),
    fields(name = %command.name, file = %command.file_path.display())
)]
pub async fn handle(
    pool: SqlitePool,
    settings: &IngestSettings,
    command: CreateDatasetCommand,
) -> Result<CreateDatasetResponse, CreateDatasetError> {
    let name = command.validate()?;

    let mut tx = db::begin_write(&pool).await?;

    let dataset_id = sqlx::query("INSERT INTO datasets (name, file_path) VALUES (?, ?)")
        .bind(&name)
        .bind(command.file_path.to_string_lossy().into_owned())
        .execute(&mut *tx)
        .await?
        .last_insert_rowid();

    let report = ingest::spawn_load_samples(
        command.file_path.clone(),
        settings.columns.clone(),
        settings.create_policy,
    )
    .await?;

    let rows_inserted = samples::insert_samples(&mut tx, dataset_id, &report.samples).await?;

    tx.commit().await?;

    tracing::info!(
        dataset_id,
        rows_inserted,
        rows_dropped = report.dropped_rows,
        "Dataset created"
    );

    Ok(CreateDatasetResponse {
        id: dataset_id,
        message: "created".to_string(),
        rows_inserted,
        rows_dropped: report.dropped_rows,
    })
}
