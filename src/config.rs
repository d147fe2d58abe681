//! Configuration for the fees loader.
//!
//! Everything the job reads from the environment is resolved once, at process
//! entry, into a [`LoaderConfig`] that is then passed down explicitly.

use std::path::PathBuf;
use std::time::Duration;

use crate::warehouse::TableRef;

// ============================================================================
// Environment variables
// ============================================================================

pub const ENV_PROJECT_ID: &str = "GCP_PROJECT_ID";
pub const ENV_BUCKET: &str = "GCS_BUCKET";
pub const ENV_DATASET: &str = "BQ_DATASET";
pub const ENV_CREDENTIALS: &str = "GOOGLE_APPLICATION_CREDENTIALS";
pub const ENV_API_URL: &str = "BIGQUERY_API_URL";

// ============================================================================
// Defaults
// ============================================================================

pub const DEFAULT_PROJECT_ID: &str = "fundment-test-486411";
pub const DEFAULT_BUCKET: &str = "fundment-test-486411-data-lake";
pub const DEFAULT_DATASET: &str = "raw";
/// Service root; the client appends `/bigquery/v2`.
pub const DEFAULT_API_URL: &str = "https://bigquery.googleapis.com";

// ============================================================================
// Fixed values
// ============================================================================

/// Destination table inside the configured dataset.
pub const TABLE_NAME: &str = "fees";

/// Object pattern under the configured bucket holding the raw fee exports.
pub const SOURCE_OBJECT_PATTERN: &str = "raw/fees/*.csv";

/// How often the client re-reads job status while a load is running.
pub const JOB_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Per-request timeout for warehouse REST calls.
pub const HTTP_TIMEOUT: Duration = Duration::from_secs(60);

/// Port the trigger service binds when `PORT` is unset (Cloud Run default).
pub const DEFAULT_PORT: u16 = 8080;

/// Process-wide configuration for a single ingestion run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoaderConfig {
    pub project_id: String,
    pub bucket: String,
    pub dataset: String,
    /// Explicit service-account key file. `None` means the default credential chain.
    pub credentials_path: Option<PathBuf>,
    pub api_url: String,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

impl LoaderConfig {
    /// Read the configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let or_default = |key: &str, default: &str| value(key).unwrap_or_else(|| default.into());

        Self {
            project_id: or_default(ENV_PROJECT_ID, DEFAULT_PROJECT_ID),
            bucket: or_default(ENV_BUCKET, DEFAULT_BUCKET),
            dataset: or_default(ENV_DATASET, DEFAULT_DATASET),
            credentials_path: value(ENV_CREDENTIALS).map(PathBuf::from),
            api_url: or_default(ENV_API_URL, DEFAULT_API_URL),
        }
    }

    /// Wildcard URI matching every source CSV, e.g. `gs://bucket/raw/fees/*.csv`.
    pub fn source_uri(&self) -> String {
        format!("gs://{}/{}", self.bucket, SOURCE_OBJECT_PATTERN)
    }

    pub fn table_ref(&self) -> TableRef {
        TableRef::new(&self.project_id, &self.dataset, TABLE_NAME)
    }
}
