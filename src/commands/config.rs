use anyhow::Result;
use colored::Colorize;
use ns_costing::config;
use std::path::Path;
use tracing::info;

/// Execute the config show command
///
/// Prints the effective configuration (file merged with environment overrides)
pub fn show(config_path: &Path) -> Result<()> {
    println!("{}", "Loading configuration...".yellow());
    info!(config = %config_path.display(), "Loading configuration for display");

    let cfg = config::load_config(config_path)?;

    println!("{}", "Current Configuration:".green().bold());
    println!();

    let toml_string = toml::to_string_pretty(&cfg)?;
    println!("{}", toml_string);

    Ok(())
}
