//! Test helpers for Myotrack server integration tests
//!
//! - building the full router over a per-test SQLite pool
//! - multipart request bodies
//! - CSV and XLSX spreadsheet fixtures

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use myotrack_common::analysis::PeakDetector;
use myotrack_server::{
    api,
    config::Config,
    features::FeatureState,
    storage::UploadStore,
};
use rust_xlsxwriter::Workbook;
use sqlx::SqlitePool;
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

pub const BOUNDARY: &str = "----myotrack-test-boundary";

/// Router plus the resources it owns
pub struct TestApp {
    pub router: Router,
    pub pool: SqlitePool,
    pub uploads: TempDir,
}

impl TestApp {
    pub async fn new(pool: SqlitePool) -> Self {
        Self::with_config(pool, Config::default()).await
    }

    pub async fn with_config(pool: SqlitePool, config: Config) -> Self {
        let uploads = TempDir::new().expect("create upload dir");
        let state = FeatureState {
            db: pool.clone(),
            uploads: UploadStore::open(uploads.path()).await.expect("open upload store"),
            ingest: Arc::new(config.ingest.clone()),
            peaks: PeakDetector::new(config.analysis.peak_threshold),
        };

        Self {
            router: api::create_router(state, &config),
            pool,
            uploads,
        }
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, serde_json::Value) {
        let request = Request::builder()
            .uri(uri)
            .body(Body::empty())
            .expect("build request");
        self.send(request).await
    }

    pub async fn upload(
        &self,
        method: Method,
        uri: &str,
        form: MultipartForm,
    ) -> (StatusCode, serde_json::Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(form.into_body()))
            .expect("build request");
        self.send(request).await
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read body");
        let body = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                serde_json::Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };

        (status, body)
    }

    /// Number of files currently in the upload directory
    pub fn stored_upload_count(&self) -> usize {
        std::fs::read_dir(self.uploads.path())
            .expect("read upload dir")
            .count()
    }

    pub async fn dataset_count(&self) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM datasets")
            .fetch_one(&self.pool)
            .await
            .expect("count datasets")
    }
}

/// Builder for `multipart/form-data` bodies
#[derive(Debug, Default)]
pub struct MultipartForm {
    parts: Vec<u8>,
}

impl MultipartForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.parts.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                BOUNDARY, name, value
            )
            .as_bytes(),
        );
        self
    }

    pub fn file(mut self, name: &str, filename: &str, data: &[u8]) -> Self {
        self.parts.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
                BOUNDARY, name, filename
            )
            .as_bytes(),
        );
        self.parts.extend_from_slice(data);
        self.parts.extend_from_slice(b"\r\n");
        self
    }

    /// Standard upload form: `dataset_name` plus `file`
    pub fn dataset(name: &str, filename: &str, data: &[u8]) -> Self {
        Self::new().text("dataset_name", name).file("file", filename, data)
    }

    pub fn into_body(mut self) -> Vec<u8> {
        self.parts
            .extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
        self.parts
    }
}

/// CSV with the required header followed by `rows`
pub fn csv(rows: &[&str]) -> Vec<u8> {
    let mut contents = String::from("timestamp,emg1,emg2,emg3,emg4,angle\n");
    for row in rows {
        contents.push_str(row);
        contents.push('\n');
    }
    contents.into_bytes()
}

/// CSV built from `(timestamp, angle)` pairs with constant EMG channels
pub fn csv_from_angles(angles: &[i64]) -> Vec<u8> {
    let rows: Vec<String> = angles
        .iter()
        .enumerate()
        .map(|(i, angle)| format!("{},10,20,30,40,{}", i, angle))
        .collect();
    let rows: Vec<&str> = rows.iter().map(String::as_str).collect();
    csv(&rows)
}

/// XLSX workbook with `headers` in row 1 and numeric `rows` below
pub fn xlsx(headers: &[&str], rows: &[Vec<f64>]) -> Vec<u8> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();

    for (col, header) in headers.iter().enumerate() {
        worksheet
            .write_string(0, col as u16, *header)
            .expect("write header");
    }
    for (row_index, row) in rows.iter().enumerate() {
        for (col, value) in row.iter().enumerate() {
            worksheet
                .write_number(row_index as u32 + 1, col as u16, *value)
                .expect("write cell");
        }
    }

    workbook.save_to_buffer().expect("serialize workbook")
}
