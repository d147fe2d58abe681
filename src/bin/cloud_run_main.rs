use anyhow::Result;
use fees_ingest::{config::LoaderConfig, job, telemetry, trigger};
use std::{env, sync::Arc};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    telemetry::init();

    info!("Starting fees ingestion trigger service");

    let config = Arc::new(LoaderConfig::from_env());
    info!(
        project = %config.project_id,
        source = %config.source_uri(),
        destination = %config.table_ref(),
        "Configuration"
    );

    let routes = trigger::routes(config, |config: Arc<LoaderConfig>| async move {
        job::run(&config).await
    });

    // Cloud Run injects PORT
    let port = trigger::listen_port(env::var(trigger::ENV_PORT).ok().as_deref());

    info!("Server starting on port {}", port);
    info!("Health check: http://localhost:{}/health", port);
    info!("Trigger endpoint: POST http://localhost:{}/", port);

    warp::serve(routes).run(([0, 0, 0, 0], port)).await;

    Ok(())
}
