//! Local storage for uploaded spreadsheets
//!
//! Every upload is written under the configured directory with a timestamp
//! appended to its stem, e.g. `session.xlsx` becomes
//! `session_2024-03-01_14-05-09.xlsx`. The stored path is what the dataset's
//! `file_path` records.

use chrono::{DateTime, Local};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, instrument, warn};

/// Collision suffixes tried before giving up
const MAX_NAME_ATTEMPTS: u32 = 1000;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Invalid upload filename: '{0}'")]
    InvalidFilename(String),

    #[error("Upload storage IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone)]
pub struct UploadStore {
    root: PathBuf,
}

impl UploadStore {
    /// Open (and create if needed) the upload directory
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let root = root.into();
        tokio::fs::create_dir_all(&root).await?;
        info!(dir = %root.display(), "Upload store ready");
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Last path component of a client-supplied filename.
    ///
    /// Both `/` and `\` are treated as separators so that names sent by
    /// Windows browsers cannot escape the upload directory either.
    pub fn client_file_name(client_name: &str) -> Result<&str, StorageError> {
        let name = client_name
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or_default()
            .trim();

        if name.is_empty() || name == "." || name == ".." {
            return Err(StorageError::InvalidFilename(client_name.to_string()));
        }

        Ok(name)
    }

    /// `{stem}_{YYYY-mm-dd_HH-MM-SS}{.ext}` for `client_name` at `now`
    pub fn stored_name(client_name: &str, now: DateTime<Local>) -> Result<String, StorageError> {
        let name = Path::new(Self::client_file_name(client_name)?);
        let stem = name
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| StorageError::InvalidFilename(client_name.to_string()))?;
        let extension = name
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{}", e))
            .unwrap_or_default();

        Ok(format!("{}_{}{}", stem, now.format("%Y-%m-%d_%H-%M-%S"), extension))
    }

    /// Write `data` under a fresh name derived from `client_name`
    #[instrument(skip(self, data), fields(bytes = data.len()))]
    pub async fn save(&self, client_name: &str, data: &[u8]) -> Result<PathBuf, StorageError> {
        let base = PathBuf::from(Self::stored_name(client_name, Local::now())?);
        let stem = base
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_string();
        let extension = base
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{}", e))
            .unwrap_or_default();

        for attempt in 0..MAX_NAME_ATTEMPTS {
            let file_name = if attempt == 0 {
                format!("{}{}", stem, extension)
            } else {
                format!("{}_{}{}", stem, attempt, extension)
            };
            let path = self.root.join(file_name);

            let mut file = match tokio::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await
            {
                Ok(file) => file,
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e.into()),
            };

            if let Err(e) = write_all(&mut file, data).await {
                self.remove(&path).await;
                return Err(e.into());
            }

            debug!(path = %path.display(), "Upload stored");
            return Ok(path);
        }

        Err(StorageError::Io(std::io::Error::new(
            ErrorKind::AlreadyExists,
            format!("no free name for upload '{}'", client_name),
        )))
    }

    /// Best-effort removal of a stored upload
    pub async fn remove(&self, path: &Path) {
        match tokio::fs::remove_file(path).await {
            Ok(()) => debug!(path = %path.display(), "Upload removed"),
            Err(e) if e.kind() == ErrorKind::NotFound => {},
            Err(e) => warn!(path = %path.display(), error = %e, "Failed to remove upload"),
        }
    }
}

/// Removes a stored upload when dropped unless [`StoredUpload::keep`] was
/// called. Covers handlers that fail or whose request future is dropped
/// mid-flight.
#[derive(Debug)]
pub struct StoredUpload {
    path: PathBuf,
    keep: bool,
}

impl StoredUpload {
    pub fn new(path: PathBuf) -> Self {
        Self { path, keep: false }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Disarm the guard; the file stays on disk
    pub fn keep(mut self) -> PathBuf {
        self.keep = true;
        std::mem::take(&mut self.path)
    }
}

impl Drop for StoredUpload {
    fn drop(&mut self) {
        if self.keep {
            return;
        }
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "Upload removed"),
            Err(e) if e.kind() == ErrorKind::NotFound => {},
            Err(e) => warn!(path = %self.path.display(), error = %e, "Failed to remove upload"),
        }
    }
}

async fn write_all(file: &mut tokio::fs::File, data: &[u8]) -> std::io::Result<()> {
    file.write_all(data).await?;
    file.flush().await
}
