//! The fees load sequence.
//!
//! start → client acquired → job submitted → job complete → validated → done.
//! Any failing step ends the run; nothing is retried. Rerunning is always safe
//! because every load truncates and replaces the destination.

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tracing::{error, info, warn};

use crate::auth;
use crate::config::LoaderConfig;
use crate::error::IngestError;
use crate::schema;
use crate::warehouse::{bigquery::BigQueryClient, TableRef, Warehouse};

/// Outcome of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestReport {
    pub table: TableRef,
    pub job_id: String,
    /// Rows in the destination after the load, read back from table metadata.
    pub row_count: u64,
    pub output_rows: u64,
    pub output_bytes: u64,
    pub elapsed: Duration,
}

/// Client-chosen job id, e.g. `fees_load_20261019T063000_000000042`.
pub fn new_job_id(now: DateTime<Utc>) -> String {
    format!(
        "fees_load_{}_{:09}",
        now.format("%Y%m%dT%H%M%S"),
        now.timestamp_subsec_nanos()
    )
}

/// Build an authenticated BigQuery client from the configured credentials.
pub async fn connect(config: &LoaderConfig) -> Result<BigQueryClient, IngestError> {
    let provider = auth::token_provider(config.credentials_path.as_deref()).await?;
    BigQueryClient::new(&config.api_url, provider).map_err(IngestError::Client)
}

/// Run one ingestion against BigQuery.
pub async fn run(config: &LoaderConfig) -> Result<IngestReport, IngestError> {
    announce(config);
    let client = connect(config).await.map_err(log_failure)?;
    info!(api = %config.api_url, "warehouse client ready");
    load_and_validate(config, &client).await.map_err(log_failure)
}

/// Run one ingestion against an already-constructed warehouse client.
pub async fn run_with<W>(config: &LoaderConfig, warehouse: &W) -> Result<IngestReport, IngestError>
where
    W: Warehouse + ?Sized,
{
    announce(config);
    load_and_validate(config, warehouse)
        .await
        .map_err(log_failure)
}

fn announce(config: &LoaderConfig) {
    info!("Starting fees ingestion pipeline");
    info!("Project: {}", config.project_id);
    info!("Source: {}", config.source_uri());
    info!("Destination: {}", config.table_ref());
}

fn log_failure(err: IngestError) -> IngestError {
    error!(kind = %err.kind(), "Ingestion failed: {}", err);
    err
}

async fn load_and_validate<W>(
    config: &LoaderConfig,
    warehouse: &W,
) -> Result<IngestReport, IngestError>
where
    W: Warehouse + ?Sized,
{
    let started = Instant::now();
    let table = config.table_ref();
    let load = schema::load_configuration(config);
    let job_id = new_job_id(Utc::now());

    info!("Loading data from {} to {}", config.source_uri(), table);
    let handle = warehouse
        .submit_load(&job_id, &load)
        .await
        .map_err(|source| IngestError::Submit {
            job_id: job_id.clone(),
            source,
        })?;
    info!(job_id = %handle.job_id, location = ?handle.location, "load job submitted");

    let done = warehouse
        .wait_for_completion(&handle)
        .await
        .map_err(|source| IngestError::LoadFailed {
            job_id: handle.job_id.clone(),
            source,
        })?;
    info!("Load job completed: {}", done.handle.job_id);
    if done.bad_records > 0 {
        warn!(bad_records = done.bad_records, "load job skipped bad records");
    }

    let row_count = validate_load(warehouse, &table).await?;
    info!(
        rows = row_count,
        "Successfully loaded {} rows to {}",
        group_thousands(row_count),
        table
    );
    info!(
        bytes = done.output_bytes,
        input_files = done.input_files,
        "Bytes processed: {}",
        group_thousands(done.output_bytes)
    );

    Ok(IngestReport {
        table,
        job_id: done.handle.job_id,
        row_count,
        output_rows: done.output_rows,
        output_bytes: done.output_bytes,
        elapsed: started.elapsed(),
    })
}

/// Re-read the destination and require at least one row.
pub async fn validate_load<W>(warehouse: &W, table: &TableRef) -> Result<u64, IngestError>
where
    W: Warehouse + ?Sized,
{
    let meta = warehouse
        .table_metadata(table)
        .await
        .map_err(|source| IngestError::Metadata {
            table: table.to_string(),
            source,
        })?;

    if meta.num_rows == 0 {
        return Err(IngestError::EmptyTable {
            table: table.to_string(),
        });
    }
    info!(
        "Partitioning: {}",
        schema::describe_partitioning(meta.time_partitioning.as_ref())
    );
    Ok(meta.num_rows)
}

/// `1234567` → `"1,234,567"`.
fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}
