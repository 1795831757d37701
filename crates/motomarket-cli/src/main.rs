/*
[INPUT]:  CLI arguments, YAML configuration file, persisted session token
[OUTPUT]: Marketplace commands executed against the REST API
[POS]:    Binary entry point
[UPDATE]: When changing CLI flags or startup flow
*/

use anyhow::{Context, Result, anyhow};
use clap::{CommandFactory, Parser};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use motomarket_adapter::{FileTokenStorage, MarketClient, Marketplace};
use motomarket_cli::cli::{Cli, Command, commands, init};
use motomarket_cli::CliConfig;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();
    init_tracing(&args.log_level)?;

    if let Some(Command::Init { output }) = args.command {
        return init::run_init(output);
    }

    let mut config = CliConfig::load(args.config_path.as_deref()).context("load config")?;
    if let Some(base_url) = args.base_url {
        config.base_url = base_url;
    }
    config.validate().context("invalid configuration")?;
    let token_path = config.resolved_token_path()?;
    info!(
        base_url = %config.base_url,
        token_path = %token_path.display(),
        dry_run = args.dry_run,
        "configuration loaded"
    );

    if args.dry_run {
        info!("dry-run requested; configuration validated");
        return Ok(());
    }

    let Some(command) = args.command else {
        Cli::command().print_help()?;
        return Ok(());
    };

    let client = MarketClient::with_config(config.client_config()).context("build HTTP client")?;
    let market = Marketplace::new(client, Arc::new(FileTokenStorage::new(&token_path)));
    if let Some(user) = market.start().await {
        info!(user_id = %user.id, "session restored");
    }

    commands::run(command, &market).await
}

fn init_tracing(log_level: &str) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(log_level).context("invalid log level")?,
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| anyhow!(err))
        .context("initialize tracing subscriber")?;
    Ok(())
}
