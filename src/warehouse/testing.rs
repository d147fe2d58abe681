//! Test doubles for the warehouse seam.

use std::io::Write;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use google_cloud_bigquery::http::error::{Error as HttpError, ErrorResponse};
use google_cloud_bigquery::http::job::{JobConfigurationLoad, WriteDisposition};
use google_cloud_bigquery::http::table::TimePartitioning;
use google_cloud_token::{TokenSource, TokenSourceProvider};
use serde_json::{json, Value};
use tempfile::NamedTempFile;

use super::{CompletedLoad, JobHandle, TableMetadata, TableRef, Warehouse, WarehouseError};

pub const REVOKED: &str = "invalid_grant: account has been deleted";

#[derive(Debug)]
struct StaticToken {
    revoked: bool,
}

#[async_trait]
impl TokenSource for StaticToken {
    async fn token(&self) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
        if self.revoked {
            return Err(REVOKED.into());
        }
        Ok("Bearer test-token".to_string())
    }
}

/// Hands out `Bearer test-token`, or fails every token request once revoked.
#[derive(Debug, Default)]
pub struct StaticTokenProvider {
    revoked: bool,
}

impl StaticTokenProvider {
    pub fn revoked() -> Self {
        Self { revoked: true }
    }
}

impl TokenSourceProvider for StaticTokenProvider {
    fn token_source(&self) -> Arc<dyn TokenSource> {
        Arc::new(StaticToken {
            revoked: self.revoked,
        })
    }
}

const TEST_KEY: &str = include_str!("../../testdata/service_account_key.pem");

/// A well-formed service account key file whose token endpoint is `token_uri`.
pub fn signed_key_file(token_uri: &str) -> NamedTempFile {
    let key = json!({
        "type": "service_account",
        "project_id": "p1",
        "private_key_id": "k1",
        "private_key": TEST_KEY,
        "client_email": "loader@p1.iam.gserviceaccount.com",
        "client_id": "1",
        "token_uri": token_uri
    });
    let mut tmp = NamedTempFile::new().unwrap();
    tmp.write_all(key.to_string().as_bytes()).unwrap();
    tmp
}

/// A jobs resource for project `p1` as the service returns it.
pub fn job_body(job_id: &str, status: Value, statistics: Option<Value>) -> String {
    let mut body = json!({
        "kind": "bigquery#job",
        "etag": "e1",
        "id": format!("p1:EU.{job_id}"),
        "selfLink": format!("https://bigquery.googleapis.com/bigquery/v2/projects/p1/jobs/{job_id}"),
        "jobReference": {"projectId": "p1", "jobId": job_id, "location": "EU"},
        "configuration": {
            "jobType": "LOAD",
            "load": {
                "sourceUris": ["gs://lake/raw/fees/*.csv"],
                "destinationTable": {"projectId": "p1", "datasetId": "raw", "tableId": "fees"}
            }
        },
        "status": status
    });
    if let Some(statistics) = statistics {
        body["statistics"] = statistics;
    }
    body.to_string()
}

/// A tables resource for `p1.raw.fees` holding `num_rows` rows.
pub fn table_body(num_rows: u64) -> String {
    json!({
        "kind": "bigquery#table",
        "etag": "t1",
        "id": "p1:raw.fees",
        "selfLink": "https://bigquery.googleapis.com/bigquery/v2/projects/p1/datasets/raw/tables/fees",
        "tableReference": {"projectId": "p1", "datasetId": "raw", "tableId": "fees"},
        "numRows": num_rows.to_string(),
        "numBytes": "61000",
        "creationTime": "1760850000000",
        "lastModifiedTime": "1760850060000",
        "type": "TABLE",
        "timePartitioning": {"type": "DAY", "field": "fee_date"}
    })
    .to_string()
}

fn error_response(code: u16, message: String) -> WarehouseError {
    WarehouseError::Http(HttpError::Response(ErrorResponse {
        code,
        errors: None,
        message,
    }))
}

/// In-memory warehouse holding a single destination table.
///
/// The source side is described by `source_rows` / `jagged`; loads apply the
/// configuration's write disposition to the stored row count.
#[derive(Debug, Default)]
pub struct FakeWarehouse {
    pub source_rows: u64,
    pub source_bytes: u64,
    pub jagged: bool,
    pub fail_submit: bool,
    pub fail_metadata: bool,
    pub table_rows: Mutex<u64>,
    pub partitioning: Mutex<Option<TimePartitioning>>,
    pub calls: Mutex<Vec<&'static str>>,
    pub submitted: Mutex<Vec<JobConfigurationLoad>>,
}

impl FakeWarehouse {
    pub fn with_source_rows(rows: u64) -> Self {
        Self {
            source_rows: rows,
            source_bytes: rows * 61,
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    pub fn rows(&self) -> u64 {
        *self.table_rows.lock().unwrap()
    }
}

#[async_trait]
impl Warehouse for FakeWarehouse {
    async fn submit_load(
        &self,
        job_id: &str,
        load: &JobConfigurationLoad,
    ) -> Result<JobHandle, WarehouseError> {
        self.calls.lock().unwrap().push("submit");
        if self.fail_submit {
            return Err(error_response(
                404,
                format!("Not found: Dataset {}", load.destination_table.dataset_id),
            ));
        }
        self.submitted.lock().unwrap().push(load.clone());
        Ok(JobHandle {
            project_id: load.destination_table.project_id.clone(),
            job_id: job_id.to_string(),
            location: Some("EU".to_string()),
        })
    }

    async fn wait_for_completion(&self, job: &JobHandle) -> Result<CompletedLoad, WarehouseError> {
        self.calls.lock().unwrap().push("wait");
        let load = self
            .submitted
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("wait called before submit");

        if self.jagged && !load.allow_jagged_rows.unwrap_or(false) {
            return Err(WarehouseError::JobFailed {
                job_id: job.job_id.clone(),
                reason: "invalid".into(),
                message: "Error while reading data, error message: CSV table references column position 4, but line contains only 4 columns.".into(),
                errors: vec!["gs://lake/raw/fees/b.csv: row 17 has 4 columns".into()],
            });
        }

        let mut rows = self.table_rows.lock().unwrap();
        match load.write_disposition.unwrap_or_default() {
            WriteDisposition::WriteTruncate => *rows = self.source_rows,
            WriteDisposition::WriteAppend => *rows += self.source_rows,
            WriteDisposition::WriteEmpty if *rows == 0 => *rows = self.source_rows,
            WriteDisposition::WriteEmpty => {}
        }
        *self.partitioning.lock().unwrap() = load.time_partitioning.clone();

        Ok(CompletedLoad {
            handle: job.clone(),
            input_files: 2,
            output_rows: self.source_rows,
            output_bytes: self.source_bytes,
            bad_records: 0,
        })
    }

    async fn table_metadata(&self, _table: &TableRef) -> Result<TableMetadata, WarehouseError> {
        self.calls.lock().unwrap().push("metadata");
        if self.fail_metadata {
            return Err(error_response(503, "Service unavailable".into()));
        }
        Ok(TableMetadata {
            num_rows: self.rows(),
            time_partitioning: self.partitioning.lock().unwrap().clone(),
        })
    }
}
