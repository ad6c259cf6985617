use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_FILTER: &str = "info,wxagg=debug";

/// Initialize logging for a wxagg binary.
/// - JSON logs, one object per line
/// - RUST_LOG respected; default to "info,wxagg=debug"
pub fn init(service_name: &str) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    // A second init (e.g. from tests) keeps the first subscriber
    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().json())
        .try_init();

    tracing::info!(service = %service_name, "Observability initialized");
}
