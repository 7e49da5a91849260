//! Test helpers and fixtures for database tests
//!
//! ```rust,ignore
//! #[sqlx::test(migrations = "../../migrations")]
//! async fn test_something(pool: SqlitePool) -> sqlx::Result<()> {
//!     let dataset = TestDataset::new("Run 1")
//!         .with_samples(vec![Sample::new(0, 1, 2, 3, 4, 5)])
//!         .insert(&pool)
//!         .await?;
//!     // ... test logic ...
//!     Ok(())
//! }
//! ```

use myotrack_common::types::Sample;
use sqlx::SqlitePool;
use std::path::PathBuf;
use tempfile::TempDir;

use crate::db::samples;

/// Header line with the six required columns
pub const CSV_HEADER: &str = "timestamp,emg1,emg2,emg3,emg4,angle";

/// Write `{CSV_HEADER}\n{rows...}` to `dir/name`
pub fn write_csv(dir: &TempDir, name: &str, rows: &[&str]) -> PathBuf {
    let path = dir.path().join(name);
    let mut contents = String::from(CSV_HEADER);
    for row in rows {
        contents.push('\n');
        contents.push_str(row);
    }
    contents.push('\n');
    std::fs::write(&path, contents).expect("write csv fixture");
    path
}

/// Builder for datasets inserted directly into the store
#[derive(Debug, Clone)]
pub struct TestDataset {
    pub id: i64,
    pub name: String,
    pub file_path: String,
    pub samples: Vec<Sample>,
}

impl TestDataset {
    pub fn new(name: &str) -> Self {
        Self {
            id: 0,
            name: name.to_string(),
            file_path: format!("uploads/{}.csv", name.replace(' ', "_")),
            samples: Vec::new(),
        }
    }

    pub fn with_file_path(mut self, file_path: &str) -> Self {
        self.file_path = file_path.to_string();
        self
    }

    pub fn with_samples(mut self, samples: Vec<Sample>) -> Self {
        self.samples = samples;
        self
    }

    /// Insert the dataset and its samples; `id` is filled in on return
    pub async fn insert(mut self, pool: &SqlitePool) -> sqlx::Result<Self> {
        let mut tx = pool.begin().await?;
        self.id = sqlx::query("INSERT INTO datasets (name, file_path) VALUES (?, ?)")
            .bind(&self.name)
            .bind(&self.file_path)
            .execute(&mut *tx)
            .await?
            .last_insert_rowid();
        samples::insert_samples(&mut tx, self.id, &self.samples).await?;
        tx.commit().await?;
        Ok(self)
    }
}

/// Fetch `(name, file_path)` for a dataset
pub async fn dataset_row(pool: &SqlitePool, id: i64) -> Option<(String, String)> {
    sqlx::query_as("SELECT name, file_path FROM datasets WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
        .expect("query dataset row")
}
