use tracing_subscriber::{fmt, EnvFilter};

pub const ENV_LOG_LEVEL: &str = "LOG_LEVEL";

/// Build the log filter: `RUST_LOG` wins, then `LOG_LEVEL`, then `info`.
pub fn env_filter(log_level: Option<&str>) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        log_level
            .and_then(|level| EnvFilter::try_new(level).ok())
            .unwrap_or_else(|| EnvFilter::new("info"))
    })
}

/// Install the global fmt subscriber. Call once, at process start.
pub fn init() {
    let log_level = std::env::var(ENV_LOG_LEVEL).ok();
    fmt::Subscriber::builder()
        .with_env_filter(env_filter(log_level.as_deref()))
        .with_target(false)
        .init();
}
