use serde::Serialize;
use std::fmt;

use crate::auth::CredentialsError;
use crate::warehouse::WarehouseError;

/// Coarse failure class, reported by both entry points.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Credentials or client settings; nothing was submitted.
    Configuration,
    /// The warehouse rejected or failed the load.
    LoadExecution,
    /// The load succeeded but its result is unacceptable.
    Validation,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Configuration => "configuration",
            ErrorKind::LoadExecution => "load_execution",
            ErrorKind::Validation => "validation",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("failed to acquire warehouse client: {0}")]
    Credentials(#[from] CredentialsError),

    #[error("invalid warehouse client settings: {0}")]
    Client(#[source] WarehouseError),

    #[error("failed to submit load job {job_id}: {source}")]
    Submit {
        job_id: String,
        #[source]
        source: WarehouseError,
    },

    #[error("load job did not complete: {source}")]
    LoadFailed {
        job_id: String,
        #[source]
        source: WarehouseError,
    },

    #[error("failed to read metadata for {table}: {source}")]
    Metadata {
        table: String,
        #[source]
        source: WarehouseError,
    },

    /// The warehouse reported success but the feed is never legitimately empty.
    #[error("Table {table} has 0 rows after load")]
    EmptyTable { table: String },
}

impl IngestError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            IngestError::Credentials(_) | IngestError::Client(_) => ErrorKind::Configuration,
            IngestError::Submit { .. }
            | IngestError::LoadFailed { .. }
            | IngestError::Metadata { .. } => ErrorKind::LoadExecution,
            IngestError::EmptyTable { .. } => ErrorKind::Validation,
        }
    }
}
