//! Configuration management

use anyhow::Context;
use myotrack_common::analysis::DEFAULT_PEAK_THRESHOLD;
use myotrack_common::types::Column;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

use crate::ingest::{ColumnNames, IngestSettings, RowPolicy};

// ============================================================================
// Server Configuration Constants
// ============================================================================

/// Default server host binding.
pub const DEFAULT_SERVER_HOST: &str = "127.0.0.1";

/// Default server port.
pub const DEFAULT_SERVER_PORT: u16 = 5000;

/// Default database URL for local development.
pub const DEFAULT_DATABASE_URL: &str = "sqlite://data.db";

/// Default maximum database connections in the pool.
pub const DEFAULT_DATABASE_MAX_CONNECTIONS: u32 = 5;

/// Default minimum database connections in the pool.
pub const DEFAULT_DATABASE_MIN_CONNECTIONS: u32 = 1;

/// Default database connection timeout in seconds.
pub const DEFAULT_DATABASE_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Default database idle timeout in seconds (10 minutes).
pub const DEFAULT_DATABASE_IDLE_TIMEOUT_SECS: u64 = 600;

/// Default time a writer waits on a locked SQLite database.
pub const DEFAULT_DATABASE_BUSY_TIMEOUT_SECS: u64 = 5;

/// Default CORS allowed origin.
pub const DEFAULT_CORS_ALLOWED_ORIGIN: &str = "*";

/// Default directory for uploaded spreadsheets.
pub const DEFAULT_UPLOAD_DIR: &str = "uploads";

/// Default request body cap for uploads (16 MiB).
pub const DEFAULT_UPLOAD_MAX_BYTES: usize = 16 * 1024 * 1024;

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub cors: CorsConfig,
    pub uploads: UploadConfig,
    pub ingest: IngestSettings,
    pub analysis: AnalysisConfig,
}

/// Server-specific configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout_secs: u64,
    pub idle_timeout_secs: u64,
    pub busy_timeout_secs: u64,
}

/// CORS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
    pub allow_credentials: bool,
}

/// Upload storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    pub dir: PathBuf,
    pub max_bytes: usize,
}

/// Report-layer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    pub peak_threshold: i64,
}

/// Parse `key` if present, falling back to `default` when unset.
fn parse_var<T, F>(lookup: &F, key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid value '{}' for {}: {}", raw, key, e)),
        None => Ok(default),
    }
}

fn column_env_key(column: Column) -> String {
    format!("INGEST_COLUMN_{}", column.name().to_uppercase())
}

impl Config {
    /// Load configuration from `.env`, the environment and defaults
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build and validate configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut columns = ColumnNames::default();
        for column in Column::ALL {
            if let Some(header) = lookup(&column_env_key(column)) {
                columns = columns.with(column, header);
            }
        }

        let config = Config {
            server: ServerConfig {
                host: lookup("MYOTRACK_HOST").unwrap_or_else(|| DEFAULT_SERVER_HOST.to_string()),
                port: parse_var(&lookup, "MYOTRACK_PORT", DEFAULT_SERVER_PORT)?,
            },
            database: DatabaseConfig {
                url: lookup("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
                max_connections: parse_var(
                    &lookup,
                    "DATABASE_MAX_CONNECTIONS",
                    DEFAULT_DATABASE_MAX_CONNECTIONS,
                )?,
                min_connections: parse_var(
                    &lookup,
                    "DATABASE_MIN_CONNECTIONS",
                    DEFAULT_DATABASE_MIN_CONNECTIONS,
                )?,
                connect_timeout_secs: parse_var(
                    &lookup,
                    "DATABASE_CONNECT_TIMEOUT",
                    DEFAULT_DATABASE_CONNECT_TIMEOUT_SECS,
                )?,
                idle_timeout_secs: parse_var(
                    &lookup,
                    "DATABASE_IDLE_TIMEOUT",
                    DEFAULT_DATABASE_IDLE_TIMEOUT_SECS,
                )?,
                busy_timeout_secs: parse_var(
                    &lookup,
                    "DATABASE_BUSY_TIMEOUT",
                    DEFAULT_DATABASE_BUSY_TIMEOUT_SECS,
                )?,
            },
            cors: CorsConfig {
                allowed_origins: lookup("CORS_ALLOWED_ORIGINS")
                    .unwrap_or_else(|| DEFAULT_CORS_ALLOWED_ORIGIN.to_string())
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
                allow_credentials: parse_var(&lookup, "CORS_ALLOW_CREDENTIALS", false)?,
            },
            uploads: UploadConfig {
                dir: lookup("UPLOAD_DIR")
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_UPLOAD_DIR)),
                max_bytes: parse_var(&lookup, "UPLOAD_MAX_BYTES", DEFAULT_UPLOAD_MAX_BYTES)?,
            },
            ingest: IngestSettings {
                columns,
                create_policy: parse_var(&lookup, "INGEST_CREATE_POLICY", RowPolicy::Strict)?,
                replace_policy: parse_var(
                    &lookup,
                    "INGEST_REPLACE_POLICY",
                    RowPolicy::DropInvalidRows,
                )?,
            },
            analysis: AnalysisConfig {
                peak_threshold: parse_var(&lookup, "PEAK_THRESHOLD", DEFAULT_PEAK_THRESHOLD)?,
            },
        };

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.server.port == 0 {
            anyhow::bail!("Server port must be greater than 0");
        }

        if self.database.url.is_empty() {
            anyhow::bail!("Database URL cannot be empty");
        }

        if self.database.max_connections == 0 {
            anyhow::bail!("Database max_connections must be greater than 0");
        }

        if self.database.min_connections > self.database.max_connections {
            anyhow::bail!(
                "Database min_connections ({}) cannot be greater than max_connections ({})",
                self.database.min_connections,
                self.database.max_connections
            );
        }

        // tower-http refuses a wildcard origin combined with credentials.
        if self.cors.allow_credentials
            && (self.cors.allowed_origins.is_empty()
                || self.cors.allowed_origins.iter().any(|o| o == "*"))
        {
            anyhow::bail!("CORS_ALLOW_CREDENTIALS requires explicit CORS_ALLOWED_ORIGINS, not '*'");
        }

        if self.uploads.max_bytes == 0 {
            anyhow::bail!("Upload max_bytes must be greater than 0");
        }

        self.ingest
            .columns
            .validate()
            .context("Invalid ingest column configuration")?;

        if self.analysis.peak_threshold < 0 {
            anyhow::bail!(
                "Peak threshold must be non-negative, got {}",
                self.analysis.peak_threshold
            );
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: DEFAULT_SERVER_HOST.to_string(),
                port: DEFAULT_SERVER_PORT,
            },
            database: DatabaseConfig {
                url: DEFAULT_DATABASE_URL.to_string(),
                max_connections: DEFAULT_DATABASE_MAX_CONNECTIONS,
                min_connections: DEFAULT_DATABASE_MIN_CONNECTIONS,
                connect_timeout_secs: DEFAULT_DATABASE_CONNECT_TIMEOUT_SECS,
                idle_timeout_secs: DEFAULT_DATABASE_IDLE_TIMEOUT_SECS,
                busy_timeout_secs: DEFAULT_DATABASE_BUSY_TIMEOUT_SECS,
            },
            cors: CorsConfig {
                allowed_origins: vec![DEFAULT_CORS_ALLOWED_ORIGIN.to_string()],
                allow_credentials: false,
            },
            uploads: UploadConfig {
                dir: PathBuf::from(DEFAULT_UPLOAD_DIR),
                max_bytes: DEFAULT_UPLOAD_MAX_BYTES,
            },
            ingest: IngestSettings::default(),
            analysis: AnalysisConfig {
                peak_threshold: DEFAULT_PEAK_THRESHOLD,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[])).unwrap();

        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.database.url, "sqlite://data.db");
        assert_eq!(config.database.max_connections, 5);
        assert_eq!(config.database.busy_timeout_secs, 5);
        assert_eq!(config.cors.allowed_origins, ["*"]);
        assert!(!config.cors.allow_credentials);
        assert_eq!(config.uploads.dir, PathBuf::from("uploads"));
        assert_eq!(config.uploads.max_bytes, 16 * 1024 * 1024);
        assert_eq!(config.ingest, IngestSettings::default());
        assert_eq!(config.analysis.peak_threshold, 20);
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("MYOTRACK_PORT", "8080"),
            ("DATABASE_URL", "sqlite::memory:"),
            ("CORS_ALLOWED_ORIGINS", "http://localhost:3000, https://lab.example.org"),
            ("CORS_ALLOW_CREDENTIALS", "true"),
            ("UPLOAD_DIR", "/srv/myotrack/uploads"),
            ("INGEST_COLUMN_ANGLE", "knee_angle"),
            ("INGEST_CREATE_POLICY", "drop-invalid"),
            ("INGEST_REPLACE_POLICY", "strict"),
            ("PEAK_THRESHOLD", "35"),
        ]))
        .unwrap();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.database.url, "sqlite::memory:");
        assert_eq!(
            config.cors.allowed_origins,
            ["http://localhost:3000", "https://lab.example.org"]
        );
        assert!(config.cors.allow_credentials);
        assert_eq!(config.uploads.dir, PathBuf::from("/srv/myotrack/uploads"));
        assert_eq!(config.ingest.columns.get(Column::Angle), "knee_angle");
        assert_eq!(config.ingest.create_policy, RowPolicy::DropInvalidRows);
        assert_eq!(config.ingest.replace_policy, RowPolicy::Strict);
        assert_eq!(config.analysis.peak_threshold, 35);
    }

    #[test]
    fn test_malformed_values_are_errors() {
        assert!(Config::from_lookup(lookup(&[("MYOTRACK_PORT", "http")])).is_err());
        assert!(Config::from_lookup(lookup(&[("PEAK_THRESHOLD", "twenty")])).is_err());
        assert!(Config::from_lookup(lookup(&[("INGEST_CREATE_POLICY", "lenient")])).is_err());
        assert!(Config::from_lookup(lookup(&[("CORS_ALLOW_CREDENTIALS", "yes please")])).is_err());
    }

    #[test]
    fn test_negative_peak_threshold_rejected() {
        assert!(Config::from_lookup(lookup(&[("PEAK_THRESHOLD", "-1")])).is_err());
    }

    #[test]
    fn test_wildcard_origin_with_credentials_rejected() {
        let result = Config::from_lookup(lookup(&[("CORS_ALLOW_CREDENTIALS", "true")]));
        assert!(result.is_err());
    }

    #[test]
    fn test_min_connections_above_max_rejected() {
        let result = Config::from_lookup(lookup(&[
            ("DATABASE_MAX_CONNECTIONS", "2"),
            ("DATABASE_MIN_CONNECTIONS", "3"),
        ]));
        assert!(result.is_err());
    }

    #[test]
    fn test_duplicate_column_headers_rejected() {
        let result = Config::from_lookup(lookup(&[("INGEST_COLUMN_EMG2", "emg1")]));
        assert!(result.is_err());
    }
}
