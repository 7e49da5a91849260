//! Sheet validation and numeric coercion
//!
//! Turns a raw [`Sheet`] into ordered [`Sample`]s. Row numbers in error
//! messages are 1-based spreadsheet rows, with the header on row 1.

use myotrack_common::types::{Column, Sample};

use super::config::{ColumnNames, RowPolicy};
use super::spreadsheet::{Cell, Sheet};
use super::IngestError;

static EMPTY_CELL: Cell = Cell::Empty;

/// Samples accepted from a sheet plus the number of rows the policy dropped
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    pub samples: Vec<Sample>,
    pub dropped_rows: usize,
}

/// Coerce a cell to the stored integer representation.
///
/// Floats are truncated toward zero. Non-finite or out-of-range values,
/// empty cells and unparsable text yield `None`.
pub fn coerce(cell: &Cell) -> Option<i64> {
    match cell {
        Cell::Empty => None,
        Cell::Integer(value) => Some(*value),
        Cell::Float(value) => float_to_i64(*value),
        Cell::Bool(value) => Some(i64::from(*value)),
        Cell::Text(text) => {
            let text = text.trim();
            text.parse::<i64>()
                .ok()
                .or_else(|| text.parse::<f64>().ok().and_then(float_to_i64))
        },
    }
}

fn float_to_i64(value: f64) -> Option<i64> {
    if !value.is_finite() {
        return None;
    }
    let truncated = value.trunc();
    // i64::MAX as f64 rounds up to 2^63, which is itself out of range.
    if truncated >= i64::MIN as f64 && truncated < i64::MAX as f64 {
        Some(truncated as i64)
    } else {
        None
    }
}

/// Header position of each required column, in [`Column::ALL`] order
fn locate_columns(headers: &[String], columns: &ColumnNames) -> Result<[usize; 6], IngestError> {
    let mut positions = [0usize; 6];
    let mut missing = Vec::new();

    for (column, header) in columns.iter() {
        match headers.iter().position(|h| h == header) {
            Some(position) => positions[column.index()] = position,
            None => missing.push(header.to_string()),
        }
    }

    if missing.is_empty() {
        Ok(positions)
    } else {
        Err(IngestError::SchemaValidation { missing })
    }
}

fn describe(cell: &Cell) -> String {
    match cell {
        Cell::Empty => "an empty cell".to_string(),
        Cell::Text(text) => format!("'{}'", text),
        Cell::Integer(value) => value.to_string(),
        Cell::Float(value) => value.to_string(),
        Cell::Bool(value) => value.to_string(),
    }
}

/// Validate `sheet` against the required columns and apply `policy`.
///
/// # Errors
///
/// - [`IngestError::SchemaValidation`] if any required header is absent
/// - [`IngestError::DataValidation`] if the sheet has no data rows, if a
///   strict sheet holds a non-numeric required cell, or if dropping invalid
///   rows leaves a column without numbers or the sheet without rows
pub fn validate_sheet(
    sheet: &Sheet,
    columns: &ColumnNames,
    policy: RowPolicy,
) -> Result<ValidationReport, IngestError> {
    let positions = locate_columns(&sheet.headers, columns)?;

    let mut samples = Vec::with_capacity(sheet.rows.len());
    let mut dropped_rows = 0;
    let mut data_rows = 0;
    let mut numeric_seen = [false; 6];

    for (index, row) in sheet.rows.iter().enumerate() {
        if row.iter().all(Cell::is_empty) {
            continue;
        }
        data_rows += 1;
        let row_number = index + 2;

        let mut values = [0i64; 6];
        let mut invalid: Option<(Column, &Cell)> = None;

        for column in Column::ALL {
            let cell = row.get(positions[column.index()]).unwrap_or(&EMPTY_CELL);
            match coerce(cell) {
                Some(value) => {
                    values[column.index()] = value;
                    numeric_seen[column.index()] = true;
                },
                None if invalid.is_none() => invalid = Some((column, cell)),
                None => {},
            }
        }

        match (invalid, policy) {
            (None, _) => samples.push(Sample::from_values(values)),
            (Some((column, cell)), RowPolicy::Strict) => {
                return Err(IngestError::DataValidation(format!(
                    "Non-numeric value in column '{}' at row {}: {}",
                    columns.get(column),
                    row_number,
                    describe(cell)
                )));
            },
            (Some((column, _)), RowPolicy::DropInvalidRows) => {
                tracing::debug!(row = row_number, column = %column, "Dropping row with non-numeric value");
                dropped_rows += 1;
            },
        }
    }

    if data_rows == 0 {
        return Err(IngestError::DataValidation(
            "Spreadsheet contains no data rows".to_string(),
        ));
    }

    if let Some(column) = Column::ALL.into_iter().find(|c| !numeric_seen[c.index()]) {
        return Err(IngestError::DataValidation(format!(
            "Column '{}' contains no numeric values",
            columns.get(column)
        )));
    }

    if samples.is_empty() {
        return Err(IngestError::DataValidation(format!(
            "No valid rows remain after dropping {} rows with non-numeric values",
            dropped_rows
        )));
    }

    Ok(ValidationReport {
        samples,
        dropped_rows,
    })
}
