use std::time::Duration;

use async_trait::async_trait;
use google_cloud_bigquery::client::HttpClientConfig;
use google_cloud_bigquery::http::bigquery_job_client::BigqueryJobClient;
use google_cloud_bigquery::http::bigquery_table_client::BigqueryTableClient;
use google_cloud_bigquery::http::job::get::GetJobRequest;
use google_cloud_bigquery::http::job::{
    Job, JobConfiguration, JobConfigurationLoad, JobReference, JobState, JobType,
};
use google_cloud_bigquery::http::types::ErrorProto;
use google_cloud_token::TokenSourceProvider;
use tracing::{debug, instrument};

use super::{CompletedLoad, JobHandle, TableMetadata, TableRef, Warehouse, WarehouseError};
use crate::config::{HTTP_TIMEOUT, JOB_POLL_INTERVAL};

/// BigQuery client for the three calls the loader makes.
///
/// `endpoint` is the service root (`https://bigquery.googleapis.com`); the
/// `/bigquery/v2` prefix is added by the underlying client.
#[derive(Debug, Clone)]
pub struct BigQueryClient {
    jobs: BigqueryJobClient,
    tables: BigqueryTableClient,
    poll_interval: Duration,
}

impl BigQueryClient {
    pub fn new(
        endpoint: &str,
        token_provider: Box<dyn TokenSourceProvider>,
    ) -> Result<Self, WarehouseError> {
        let http = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(WarehouseError::Setup)?;

        let inner = HttpClientConfig::new(token_provider)
            .with_endpoint(endpoint.trim_end_matches('/').to_string())
            .with_http_client(reqwest_middleware::ClientBuilder::new(http).build())
            .create_client();

        Ok(Self {
            jobs: BigqueryJobClient::new(inner.clone()),
            tables: BigqueryTableClient::new(inner),
            poll_interval: JOB_POLL_INTERVAL,
        })
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }
}

/// Statistics arrive as int64 strings; absent or negative means zero.
fn count(value: Option<i64>) -> u64 {
    value.and_then(|v| u64::try_from(v).ok()).unwrap_or(0)
}

fn describe(error: ErrorProto) -> String {
    let message = error.message.unwrap_or_default();
    match error.location.filter(|l| !l.is_empty()) {
        Some(location) => format!("{location}: {message}"),
        None => message,
    }
}

fn completed(handle: &JobHandle, job: Job) -> Result<CompletedLoad, WarehouseError> {
    let status = job.status;
    if let Some(error) = status.error_result {
        return Err(WarehouseError::JobFailed {
            job_id: handle.job_id.clone(),
            reason: error.reason.unwrap_or_default(),
            message: error.message.unwrap_or_default(),
            errors: status
                .errors
                .unwrap_or_default()
                .into_iter()
                .map(describe)
                .collect(),
        });
    }

    let stats = job.statistics.and_then(|s| s.load).unwrap_or_default();
    Ok(CompletedLoad {
        handle: handle.clone(),
        input_files: count(stats.input_files),
        output_rows: count(stats.output_rows),
        output_bytes: count(stats.output_bytes),
        bad_records: count(stats.bad_records),
    })
}

#[async_trait]
impl Warehouse for BigQueryClient {
    #[instrument(level = "debug", skip(self, load), fields(table = %load.destination_table.table_id))]
    async fn submit_load(
        &self,
        job_id: &str,
        load: &JobConfigurationLoad,
    ) -> Result<JobHandle, WarehouseError> {
        let job = Job {
            job_reference: JobReference {
                project_id: load.destination_table.project_id.clone(),
                job_id: job_id.to_string(),
                location: None,
            },
            configuration: JobConfiguration {
                job_type: "LOAD".to_string(),
                job: JobType::Load(load.clone()),
                ..Default::default()
            },
            ..Default::default()
        };

        let created = self.jobs.create(&job).await?;
        debug!(job_id = %created.job_reference.job_id, state = ?created.status.state, "load job accepted");

        let reference = created.job_reference;
        Ok(JobHandle {
            project_id: reference.project_id,
            job_id: reference.job_id,
            location: reference.location,
        })
    }

    #[instrument(level = "debug", skip(self), fields(job_id = %job.job_id))]
    async fn wait_for_completion(&self, job: &JobHandle) -> Result<CompletedLoad, WarehouseError> {
        let request = GetJobRequest {
            location: job.location.clone(),
        };

        loop {
            let current = self
                .jobs
                .get(&job.project_id, &job.job_id, &request)
                .await?;
            if current.status.state == JobState::Done {
                return completed(job, current);
            }

            debug!(state = ?current.status.state, "load job not finished yet");
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    #[instrument(level = "debug", skip(self), fields(table = %table))]
    async fn table_metadata(&self, table: &TableRef) -> Result<TableMetadata, WarehouseError> {
        let resource = self
            .tables
            .get(&table.project_id, &table.dataset_id, &table.table_id)
            .await?;

        Ok(TableMetadata {
            num_rows: resource.num_rows,
            time_partitioning: resource.time_partitioning,
        })
    }
}
