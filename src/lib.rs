pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod models;
pub mod pricing;
pub mod server;
pub mod session;
pub mod signals;
pub mod static_files;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize tracing/logging with the default level and text output
pub fn init_tracing() {
    init_tracing_with("info", "text");
}

/// Initialize tracing/logging
///
/// `RUST_LOG` takes precedence over `default_level`. `format` is `json` for
/// structured output, anything else selects the human-readable formatter.
/// Can only be called once per process.
pub fn init_tracing_with(default_level: &str, format: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    let registry = tracing_subscriber::registry().with(filter);

    if format == "json" {
        registry
            .with(fmt::layer().json().with_target(true))
            .init();
    } else {
        registry.with(fmt::layer().with_target(true)).init();
    }
}
