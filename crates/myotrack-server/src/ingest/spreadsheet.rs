//! Spreadsheet readers
//!
//! Both formats are flattened into a [`Sheet`]: the first row becomes the
//! header, every following row a vector of [`Cell`]s. No type coercion happens
//! here; see [`super::validation`].

use calamine::{open_workbook, Data, Reader, Xlsx};
use std::path::Path;

use super::IngestError;

/// Supported upload formats, chosen by file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpreadsheetFormat {
    Xlsx,
    Csv,
}

impl SpreadsheetFormat {
    /// Detect the format from a file name or path (case-insensitive)
    pub fn from_path(path: impl AsRef<Path>) -> Option<Self> {
        let extension = path.as_ref().extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "xlsx" => Some(SpreadsheetFormat::Xlsx),
            "csv" => Some(SpreadsheetFormat::Csv),
            _ => None,
        }
    }
}

/// A raw cell value as read from the file
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Integer(i64),
    Float(f64),
    Bool(bool),
    Text(String),
}

impl Cell {
    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }
}

impl From<&Data> for Cell {
    fn from(data: &Data) -> Self {
        match data {
            Data::Empty => Cell::Empty,
            Data::Int(value) => Cell::Integer(*value),
            Data::Float(value) => Cell::Float(*value),
            Data::Bool(value) => Cell::Bool(*value),
            Data::DateTime(value) => Cell::Float(value.as_f64()),
            Data::String(value) | Data::DateTimeIso(value) | Data::DurationIso(value) => {
                Cell::Text(value.clone())
            },
            Data::Error(error) => Cell::Text(error.to_string()),
        }
    }
}

/// First worksheet (or CSV body) split into header and data rows
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sheet {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

/// Read a spreadsheet from disk.
///
/// # Errors
///
/// Returns [`IngestError::IngestionFailure`] if the extension is unsupported
/// or the file cannot be opened or parsed.
#[tracing::instrument(fields(path = %path.display()))]
pub fn read_sheet(path: &Path) -> Result<Sheet, IngestError> {
    let format = SpreadsheetFormat::from_path(path).ok_or_else(|| {
        read_failure(path, "unsupported format, expected .xlsx or .csv")
    })?;

    let sheet = match format {
        SpreadsheetFormat::Xlsx => read_xlsx(path),
        SpreadsheetFormat::Csv => read_csv(path),
    }?;

    tracing::debug!(
        headers = ?sheet.headers,
        rows = sheet.rows.len(),
        "Spreadsheet read"
    );

    Ok(sheet)
}

/// Only the file name is reported; the upload directory stays private.
fn read_failure(path: &Path, error: impl std::fmt::Display) -> IngestError {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    IngestError::IngestionFailure(format!("Failed to read spreadsheet '{}': {}", name, error))
}

fn read_xlsx(path: &Path) -> Result<Sheet, IngestError> {
    let mut workbook: Xlsx<_> = open_workbook(path).map_err(|e| read_failure(path, e))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| read_failure(path, "workbook has no worksheets"))?
        .map_err(|e| read_failure(path, e))?;

    let mut rows = range.rows();
    let headers = match rows.next() {
        Some(header) => header.iter().map(|cell| cell.to_string()).collect(),
        None => return Ok(Sheet::default()),
    };
    let rows = rows
        .map(|row| row.iter().map(Cell::from).collect())
        .collect();

    Ok(Sheet { headers, rows })
}

fn read_csv(path: &Path) -> Result<Sheet, IngestError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .map_err(|e| read_failure(path, e))?;

    let headers = reader
        .headers()
        .map_err(|e| read_failure(path, e))?
        .iter()
        .map(str::to_string)
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| read_failure(path, e))?;
        rows.push(
            record
                .iter()
                .map(|field| {
                    if field.trim().is_empty() {
                        Cell::Empty
                    } else {
                        Cell::Text(field.to_string())
                    }
                })
                .collect(),
        );
    }

    Ok(Sheet { headers, rows })
}
