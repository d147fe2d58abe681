use anyhow::{Context, Result};
use fees_ingest::{config::LoaderConfig, job, telemetry};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    telemetry::init();

    // ─── 2) resolve configuration once ───────────────────────────────
    let config = LoaderConfig::from_env();

    // ─── 3) load + validate ──────────────────────────────────────────
    let report = job::run(&config)
        .await
        .with_context(|| format!("ingesting {}", config.table_ref()))?;

    info!(
        table = %report.table,
        job_id = %report.job_id,
        rows = report.row_count,
        elapsed = ?report.elapsed,
        "all done"
    );
    Ok(())
}
