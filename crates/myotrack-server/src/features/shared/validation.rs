//! Shared validation utilities
//!
//! ```rust,ignore
//! use myotrack_server::features::shared::validation::{validate_name, validate_upload_filename};
//!
//! let name = validate_name("  Knee flexion 3  ", MAX_DATASET_NAME_LENGTH)?;
//! let format = validate_upload_filename("session.xlsx")?;
//! ```

use thiserror::Error;

use crate::ingest::SpreadsheetFormat;

/// Longest accepted dataset name, in characters
pub const MAX_DATASET_NAME_LENGTH: usize = 256;

/// Errors that can occur during name validation
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NameValidationError {
    #[error("Name is required and cannot be empty")]
    Required,

    #[error("Name must be between 1 and {max_length} characters")]
    TooLong { max_length: usize },
}

/// Errors that can occur when checking an uploaded file's name
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UploadValidationError {
    #[error("Uploaded file must have a filename")]
    MissingFilename,

    #[error("Unsupported file type '{0}': expected .xlsx or .csv")]
    UnsupportedFormat(String),
}

/// Trim `name` and check it is non-empty and at most `max_length` characters.
///
/// Returns the trimmed name.
pub fn validate_name(name: &str, max_length: usize) -> Result<String, NameValidationError> {
    let trimmed = name.trim();

    if trimmed.is_empty() {
        return Err(NameValidationError::Required);
    }

    if trimmed.chars().count() > max_length {
        return Err(NameValidationError::TooLong { max_length });
    }

    Ok(trimmed.to_string())
}

/// Detect the spreadsheet format of an uploaded file from its name
pub fn validate_upload_filename(filename: &str) -> Result<SpreadsheetFormat, UploadValidationError> {
    if filename.trim().is_empty() {
        return Err(UploadValidationError::MissingFilename);
    }

    SpreadsheetFormat::from_path(filename)
        .ok_or_else(|| UploadValidationError::UnsupportedFormat(filename.to_string()))
}
