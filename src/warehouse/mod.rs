//! Warehouse seam.
//!
//! The loader only ever needs three things from the warehouse: submit a load
//! job, wait for it to finish, and read a table's metadata. [`Warehouse`]
//! captures exactly that; [`bigquery::BigQueryClient`] is the production
//! implementation on top of the `google-cloud-bigquery` HTTP clients.

pub mod bigquery;
#[cfg(test)]
pub(crate) mod testing;

use std::fmt;

use async_trait::async_trait;
use google_cloud_bigquery::http::error::Error as HttpError;
use google_cloud_bigquery::http::job::JobConfigurationLoad;
use google_cloud_bigquery::http::table::{TableReference, TimePartitioning};

/// Fully-qualified table identity, displayed as `project.dataset.table`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableRef {
    pub project_id: String,
    pub dataset_id: String,
    pub table_id: String,
}

impl TableRef {
    pub fn new(project_id: &str, dataset_id: &str, table_id: &str) -> Self {
        Self {
            project_id: project_id.to_string(),
            dataset_id: dataset_id.to_string(),
            table_id: table_id.to_string(),
        }
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.project_id, self.dataset_id, self.table_id)
    }
}

impl From<&TableRef> for TableReference {
    fn from(table: &TableRef) -> Self {
        TableReference {
            project_id: table.project_id.clone(),
            dataset_id: table.dataset_id.clone(),
            table_id: table.table_id.clone(),
        }
    }
}

/// Reference to a submitted job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobHandle {
    pub project_id: String,
    pub job_id: String,
    pub location: Option<String>,
}

/// Statistics of a load job that finished without error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedLoad {
    pub handle: JobHandle,
    pub input_files: u64,
    pub output_rows: u64,
    pub output_bytes: u64,
    pub bad_records: u64,
}

/// What the warehouse reports about a table.
#[derive(Debug, Clone, PartialEq)]
pub struct TableMetadata {
    pub num_rows: u64,
    pub time_partitioning: Option<TimePartitioning>,
}

#[derive(Debug, thiserror::Error)]
pub enum WarehouseError {
    #[error("cannot build HTTP client: {0}")]
    Setup(#[source] reqwest::Error),

    #[error("warehouse request failed: {0}")]
    Http(#[from] HttpError),

    #[error("job {job_id} failed ({reason}): {message}")]
    JobFailed {
        job_id: String,
        reason: String,
        message: String,
        /// Per-row or per-file messages attached to the failed job.
        errors: Vec<String>,
    },
}

#[async_trait]
pub trait Warehouse: Send + Sync {
    /// Submit a load job under the caller-chosen `job_id`.
    async fn submit_load(
        &self,
        job_id: &str,
        load: &JobConfigurationLoad,
    ) -> Result<JobHandle, WarehouseError>;

    /// Suspend until the job reaches a terminal state.
    ///
    /// Returns the load statistics on success; a job that finished with an
    /// error result surfaces as [`WarehouseError::JobFailed`].
    async fn wait_for_completion(&self, job: &JobHandle) -> Result<CompletedLoad, WarehouseError>;

    async fn table_metadata(&self, table: &TableRef) -> Result<TableMetadata, WarehouseError>;
}
