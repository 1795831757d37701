/*
[INPUT]:  Interactive user input via CLI
[OUTPUT]: Generated YAML configuration file
[POS]:    CLI initialization layer
[UPDATE]: When CliConfig schema changes
*/

use anyhow::{Context, Result, anyhow};
use console::style;
use dialoguer::{Confirm, Input, theme::ColorfulTheme};
use std::path::PathBuf;

use crate::config::{CliConfig, default_config_path};

pub fn run_init(output: Option<PathBuf>) -> Result<()> {
    let output = match output {
        Some(path) => path,
        None => default_config_path()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?,
    };

    println!("{}", style("Welcome to MotoMarket").bold().cyan());
    println!(
        "{}",
        style("This will guide you through creating a client configuration.").dim()
    );

    let theme = ColorfulTheme::default();
    let defaults = CliConfig::default();

    if output.exists()
        && !Confirm::with_theme(&theme)
            .with_prompt(format!("{} exists. Overwrite?", output.display()))
            .default(false)
            .interact()?
    {
        return Ok(());
    }

    let base_url: String = Input::with_theme(&theme)
        .with_prompt("Server URL")
        .default(defaults.base_url.clone())
        .interact_text()?;

    let timeout_secs: u64 = Input::with_theme(&theme)
        .with_prompt("Request timeout (seconds)")
        .default(defaults.timeout_secs)
        .interact_text()?;

    let token_path: String = Input::with_theme(&theme)
        .with_prompt("Token file (empty for default)")
        .allow_empty(true)
        .interact_text()?;

    let config = CliConfig {
        base_url,
        timeout_secs,
        token_path: (!token_path.trim().is_empty()).then(|| PathBuf::from(token_path.trim())),
    };
    config.validate()?;

    let yaml = serde_yaml::to_string(&config).context("failed to serialize config to YAML")?;

    if let Some(parent) = output.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    std::fs::write(&output, yaml)
        .with_context(|| format!("failed to write config to {}", output.display()))?;

    println!("\n{}", style("SUCCESS!").bold().green());
    println!(
        "Configuration written to: {}",
        style(output.display()).cyan()
    );

    Ok(())
}
