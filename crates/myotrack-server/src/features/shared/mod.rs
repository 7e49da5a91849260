//! Shared utilities for feature modules
//!
//! - **validation**: form field validation
//! - **test_helpers**: fixtures for database tests (test-only)

pub mod validation;

#[cfg(test)]
pub mod test_helpers;

pub use validation::{
    validate_name, validate_upload_filename, NameValidationError, UploadValidationError,
    MAX_DATASET_NAME_LENGTH,
};
