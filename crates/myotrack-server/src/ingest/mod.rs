//! Spreadsheet ingestion
//!
//! Reads an uploaded `.xlsx` or `.csv` file, checks the required headers and
//! coerces every required cell to an integer. The result is an ordered list of
//! samples ready for insertion; nothing here touches the database.
//!
//! ```text
//! file ──read_sheet──▶ Sheet ──validate_sheet──▶ ValidationReport
//! ```

pub mod config;
pub mod spreadsheet;
pub mod validation;

pub use config::{ColumnNames, IngestSettings, RowPolicy};
pub use spreadsheet::{read_sheet, Cell, Sheet, SpreadsheetFormat};
pub use validation::{coerce, validate_sheet, ValidationReport};

use std::path::{Path, PathBuf};

/// Errors raised while turning a file into samples
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("Missing required columns: {}", .missing.join(", "))]
    SchemaValidation { missing: Vec<String> },

    #[error("{0}")]
    DataValidation(String),

    #[error("{0}")]
    IngestionFailure(String),

    #[error("Ingestion worker failed: {0}")]
    Worker(String),
}

/// Read and validate a spreadsheet on the current thread
pub fn load_samples(
    path: &Path,
    columns: &ColumnNames,
    policy: RowPolicy,
) -> Result<ValidationReport, IngestError> {
    let sheet = read_sheet(path)?;
    validate_sheet(&sheet, columns, policy)
}

/// Run [`load_samples`] on the blocking pool
#[tracing::instrument(skip(columns), fields(path = %path.display(), policy = %policy))]
pub async fn spawn_load_samples(
    path: PathBuf,
    columns: ColumnNames,
    policy: RowPolicy,
) -> Result<ValidationReport, IngestError> {
    let report = tokio::task::spawn_blocking(move || load_samples(&path, &columns, policy))
        .await
        .map_err(|e| IngestError::Worker(e.to_string()))??;

    tracing::debug!(
        rows = report.samples.len(),
        dropped_rows = report.dropped_rows,
        "Spreadsheet validated"
    );

    Ok(report)
}
