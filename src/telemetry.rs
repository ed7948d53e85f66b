use tracing_bunyan_formatter::{BunyanFormattingLayer, JsonStorageLayer};
use tracing_subscriber::prelude::*;
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{EnvFilter, Registry};

/// Installs the global subscriber: bunyan JSON lines on stdout, filtered by
/// `RUST_LOG` (default `INFO`). Records emitted through `log`, such as actix's
/// access log, are forwarded into it.
pub fn init_tracing(app_name: &str) -> Result<(), TryInitError> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("INFO"));
    let formatting_layer = BunyanFormattingLayer::new(app_name.to_string(), std::io::stdout);
    Registry::default()
        .with(env_filter)
        .with(JsonStorageLayer)
        .with(formatting_layer)
        .try_init()
}
