use anyhow::Result;
use colored::Colorize;
use ns_costing::{config, init_tracing_with, server};
use std::path::Path;
use tracing::info;

/// Execute the start command
///
/// Loads configuration first so that logging honours `server.log_level`
/// and `server.log_format`, then runs the server until shutdown.
pub async fn execute(config_path: &Path) -> Result<()> {
    println!("{}", "Starting ns-costing in foreground mode...".green());

    let cfg = config::load_config(config_path)?;

    init_tracing_with(&cfg.server.log_level, &cfg.server.log_format);
    info!(config = %config_path.display(), "Configuration loaded");

    server::start_server(cfg).await?;

    Ok(())
}
