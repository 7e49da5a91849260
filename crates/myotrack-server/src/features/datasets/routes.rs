//! Dataset API routes
//!
//! - `GET /api/datasets` - List datasets
//! - `GET /api/dataset/:id` - Statistics and series for one dataset
//! - `POST /api/dataset` - Upload a spreadsheet as a new dataset
//! - `PUT /api/dataset/:id` - Replace a dataset's name and samples
//!
//! Uploads are `multipart/form-data` with a `file` part and a `dataset_name`
//! text part.

use axum::{
    body::Bytes,
    extract::{
        multipart::{MultipartError, MultipartRejection},
        DefaultBodyLimit, Multipart, Path, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;

use super::{
    commands::{
        CreateDatasetCommand, CreateDatasetError, ReplaceDatasetCommand, ReplaceDatasetError,
    },
    queries::{GetDatasetError, GetDatasetQuery, ListDatasetsError, ListDatasetsQuery},
};
use crate::api::response::ErrorResponse;
use crate::features::shared::validation::{
    validate_name, validate_upload_filename, NameValidationError, UploadValidationError,
    MAX_DATASET_NAME_LENGTH,
};
use crate::features::FeatureState;
use crate::ingest::IngestError;
use crate::storage::{StorageError, StoredUpload};

// ============================================================================
// Router Configuration
// ============================================================================

/// Dataset routes; request bodies are capped at `max_upload_bytes`
pub fn datasets_routes(max_upload_bytes: usize) -> Router<FeatureState> {
    Router::new()
        .route("/datasets", get(list_datasets))
        .route("/dataset", post(create_dataset))
        .route("/dataset/:id", get(get_dataset).put(replace_dataset))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
}

// ============================================================================
// Upload Form
// ============================================================================

/// Validated multipart form
#[derive(Debug)]
struct DatasetUpload {
    name: String,
    filename: String,
    data: Bytes,
}

async fn read_upload(
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<DatasetUpload, DatasetApiError> {
    let mut multipart = multipart.map_err(|e| DatasetApiError::Form(e.body_text()))?;
    let mut name = None;
    let mut file = None;

    while let Some(field) = multipart.next_field().await? {
        let field_name = field.name().unwrap_or_default().to_string();
        match field_name.as_str() {
            "dataset_name" => name = Some(field.text().await?),
            "file" => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let data = field.bytes().await?;
                file = Some((filename, data));
            },
            other => tracing::debug!(field = other, "Ignoring unknown form field"),
        }
    }

    let name = name.ok_or_else(|| DatasetApiError::Form("dataset_name is required".to_string()))?;
    let name = validate_name(&name, MAX_DATASET_NAME_LENGTH)?;

    let (filename, data) =
        file.ok_or_else(|| DatasetApiError::Form("file is required".to_string()))?;
    validate_upload_filename(&filename)?;
    if data.is_empty() {
        return Err(DatasetApiError::Form("Uploaded file is empty".to_string()));
    }

    Ok(DatasetUpload {
        name,
        filename,
        data,
    })
}

fn parse_id(raw: &str) -> Result<i64, DatasetApiError> {
    raw.parse()
        .map_err(|_| DatasetApiError::InvalidId(raw.to_string()))
}

// ============================================================================
// Command Handlers (Write Operations)
// ============================================================================

/// Create a dataset from an uploaded spreadsheet
///
/// - `201 Created` - `{id, message: "created", rows_inserted, rows_dropped}`
/// - `400 Bad Request` - Invalid form, schema or data
#[tracing::instrument(skip_all)]
async fn create_dataset(
    State(state): State<FeatureState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, DatasetApiError> {
    let upload = read_upload(multipart).await?;
    let stored = StoredUpload::new(state.uploads.save(&upload.filename, &upload.data).await?);

    let command = CreateDatasetCommand {
        name: upload.name,
        file_path: stored.path().to_path_buf(),
    };

    let response = super::commands::create::handle(state.db.clone(), &state.ingest, command).await?;
    stored.keep();
    tracing::info!(dataset_id = response.id, "Dataset created via API");
    Ok((StatusCode::CREATED, Json(response)).into_response())
}

/// Replace a dataset's name, file and samples
///
/// - `200 OK` - `{id, message: "updated", rows_inserted, rows_dropped}`
/// - `400 Bad Request` - Invalid form, schema or data
/// - `404 Not Found` - Unknown dataset id
#[tracing::instrument(skip_all, fields(id = %id))]
async fn replace_dataset(
    State(state): State<FeatureState>,
    Path(id): Path<String>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, DatasetApiError> {
    let id = parse_id(&id)?;
    let upload = read_upload(multipart).await?;
    let stored = StoredUpload::new(state.uploads.save(&upload.filename, &upload.data).await?);

    let command = ReplaceDatasetCommand {
        id,
        name: upload.name,
        file_path: stored.path().to_path_buf(),
    };

    let response = super::commands::replace::handle(state.db.clone(), &state.ingest, command).await?;
    stored.keep();
    tracing::info!(dataset_id = response.id, "Dataset replaced via API");
    Ok((StatusCode::OK, Json(response)).into_response())
}

// ============================================================================
// Query Handlers (Read Operations)
// ============================================================================

/// `{id, name, stats: {mean, max, peaks}, series}` for one dataset
#[tracing::instrument(skip_all, fields(id = %id))]
async fn get_dataset(
    State(state): State<FeatureState>,
    Path(id): Path<String>,
) -> Result<Response, DatasetApiError> {
    let query = GetDatasetQuery { id: parse_id(&id)? };
    let response = super::queries::get::handle(state.db.clone(), &state.peaks, query).await?;
    Ok((StatusCode::OK, Json(response)).into_response())
}

/// `[{id, name}, ...]` ordered by id
#[tracing::instrument(skip_all)]
async fn list_datasets(State(state): State<FeatureState>) -> Result<Response, DatasetApiError> {
    let response = super::queries::list::handle(state.db.clone(), ListDatasetsQuery).await?;
    Ok((StatusCode::OK, Json(response)).into_response())
}

// ============================================================================
// Error Handling
// ============================================================================

/// Unified error type for dataset API endpoints
#[derive(Debug, thiserror::Error)]
enum DatasetApiError {
    #[error("{0}")]
    Form(String),

    #[error(transparent)]
    Multipart(#[from] MultipartError),

    #[error(transparent)]
    Name(#[from] NameValidationError),

    #[error(transparent)]
    Upload(#[from] UploadValidationError),

    #[error("Dataset '{0}' not found")]
    InvalidId(String),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Create(#[from] CreateDatasetError),

    #[error(transparent)]
    Replace(#[from] ReplaceDatasetError),

    #[error(transparent)]
    Get(#[from] GetDatasetError),

    #[error(transparent)]
    List(#[from] ListDatasetsError),
}

fn error_response(status: StatusCode, error: ErrorResponse) -> Response {
    (status, Json(error)).into_response()
}

fn bad_request(message: impl Into<String>) -> Response {
    error_response(StatusCode::BAD_REQUEST, ErrorResponse::new("VALIDATION_ERROR", message))
}

fn internal_error(context: &str, error: &dyn std::fmt::Display) -> Response {
    tracing::error!("{}: {}", context, error);
    error_response(
        StatusCode::INTERNAL_SERVER_ERROR,
        ErrorResponse::new("INTERNAL_ERROR", "An internal error occurred"),
    )
}

fn ingest_error_response(error: IngestError) -> Response {
    match error {
        IngestError::SchemaValidation { ref missing } => error_response(
            StatusCode::BAD_REQUEST,
            ErrorResponse::with_details(
                "SCHEMA_VALIDATION",
                error.to_string(),
                json!({ "missing_columns": missing }),
            ),
        ),
        IngestError::DataValidation(message) => error_response(
            StatusCode::BAD_REQUEST,
            ErrorResponse::new("DATA_VALIDATION", message),
        ),
        IngestError::IngestionFailure(message) => error_response(
            StatusCode::BAD_REQUEST,
            ErrorResponse::new("INGESTION_FAILURE", message),
        ),
        IngestError::Worker(_) => internal_error("Ingestion worker failed", &error),
    }
}

fn not_found(id: impl std::fmt::Display) -> Response {
    error_response(
        StatusCode::NOT_FOUND,
        ErrorResponse::new("NOT_FOUND", format!("Dataset {} not found", id)),
    )
}

impl IntoResponse for DatasetApiError {
    fn into_response(self) -> Response {
        match self {
            DatasetApiError::Form(message) => bad_request(message),
            DatasetApiError::Multipart(e) => {
                let status = e.status();
                if status.is_server_error() {
                    internal_error("Multipart read failed", &e)
                } else {
                    error_response(status, ErrorResponse::new("VALIDATION_ERROR", e.body_text()))
                }
            },
            DatasetApiError::Name(e) => bad_request(e.to_string()),
            DatasetApiError::Upload(e) => bad_request(e.to_string()),
            DatasetApiError::InvalidId(raw) => not_found(format!("'{}'", raw)),
            DatasetApiError::Storage(StorageError::InvalidFilename(name)) => {
                bad_request(format!("Invalid upload filename: '{}'", name))
            },
            DatasetApiError::Storage(e) => internal_error("Failed to store upload", &e),

            DatasetApiError::Create(CreateDatasetError::NameValidation(e))
            | DatasetApiError::Replace(ReplaceDatasetError::NameValidation(e)) => {
                bad_request(e.to_string())
            },
            DatasetApiError::Create(CreateDatasetError::Ingest(e))
            | DatasetApiError::Replace(ReplaceDatasetError::Ingest(e)) => ingest_error_response(e),
            DatasetApiError::Replace(ReplaceDatasetError::NotFound(id))
            | DatasetApiError::Get(GetDatasetError::NotFound(id)) => not_found(id),
            DatasetApiError::Create(CreateDatasetError::Database(e))
            | DatasetApiError::Replace(ReplaceDatasetError::Database(e))
            | DatasetApiError::Get(GetDatasetError::Database(e))
            | DatasetApiError::List(ListDatasetsError::Database(e)) => {
                internal_error("Database error in dataset API", &e)
            },

            DatasetApiError::Get(GetDatasetError::DataIntegrity(id)) => {
                tracing::error!(dataset_id = id, "Stored samples are unreadable");
                error_response(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::new(
                        "DATA_INTEGRITY",
                        format!("Dataset {} has no readable samples", id),
                    ),
                )
            },
        }
    }
}
