//! Request-triggered entry point.
//!
//! A scheduler or storage-upload event POSTs to `/`; the payload is not
//! inspected. The run's outcome becomes the HTTP status so the trigger's own
//! failure handling sees it.

use std::future::Future;
use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};
use warp::{http::StatusCode, reject::Rejection, reply::Reply, Filter};

use crate::config::{LoaderConfig, DEFAULT_PORT};
use crate::error::{ErrorKind, IngestError};
use crate::job::IngestReport;

pub const ENV_PORT: &str = "PORT";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TriggerResponse {
    pub status: &'static str,
    /// Fully-qualified destination table.
    pub table: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<ErrorKind>,
}

impl TriggerResponse {
    pub fn success(table: String) -> Self {
        Self {
            status: "success",
            table,
            error: None,
            kind: None,
        }
    }

    pub fn failure(table: String, err: &IngestError) -> Self {
        Self {
            status: "error",
            table,
            error: Some(err.to_string()),
            kind: Some(err.kind()),
        }
    }
}

/// Port to listen on; falls back to 8080 when `PORT` is unset or not a number.
pub fn listen_port(value: Option<&str>) -> u16 {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => DEFAULT_PORT,
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            warn!(value = raw, "invalid {}, using {}", ENV_PORT, DEFAULT_PORT);
            DEFAULT_PORT
        }),
    }
}

async fn health_check() -> Result<impl Reply, Rejection> {
    Ok(warp::reply::json(&serde_json::json!({
        "status": "healthy",
        "service": "fees-ingest"
    })))
}

async fn handle_trigger<F, Fut>(config: Arc<LoaderConfig>, job: F) -> Result<impl Reply, Rejection>
where
    F: Fn(Arc<LoaderConfig>) -> Fut,
    Fut: Future<Output = Result<IngestReport, IngestError>>,
{
    let table = config.table_ref().to_string();
    info!(table = %table, "ingestion triggered");

    let (body, status) = match job(config).await {
        Ok(report) => {
            info!(
                table = %report.table,
                rows = report.row_count,
                elapsed = ?report.elapsed,
                "triggered ingestion succeeded"
            );
            (TriggerResponse::success(report.table.to_string()), StatusCode::OK)
        }
        Err(err) => (
            TriggerResponse::failure(table, &err),
            StatusCode::INTERNAL_SERVER_ERROR,
        ),
    };

    Ok(warp::reply::with_status(warp::reply::json(&body), status))
}

/// `GET /health` and `POST /`, with `job` performing one ingestion run.
pub fn routes<F, Fut>(
    config: Arc<LoaderConfig>,
    job: F,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone
where
    F: Fn(Arc<LoaderConfig>) -> Fut + Clone + Send + Sync + 'static,
    Fut: Future<Output = Result<IngestReport, IngestError>> + Send + 'static,
{
    let health = warp::path("health")
        .and(warp::path::end())
        .and(warp::get())
        .and_then(health_check);

    let ingest = warp::path::end()
        .and(warp::post())
        .and(warp::any().map(move || config.clone()))
        .and_then(move |config: Arc<LoaderConfig>| handle_trigger(config, job.clone()));

    health.or(ingest)
}
