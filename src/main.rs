// src/main.rs

mod cli;
mod commands;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use cli::{Cli, Commands};
use mspm::config::MspmConfig;
use mspm::Client;
use tracing::debug;

/// Build the client from config values and CLI overrides
fn client(cli: &Cli, config: &MspmConfig) -> Result<Client> {
    let catalog = cli.catalog.as_deref().unwrap_or(config.client.catalog.as_str());
    let root = cli.root.clone().unwrap_or_else(|| config.client.root.clone());
    debug!("Using catalog {} with install root {}", catalog, root.display());
    Client::connect(catalog, root).context("Failed to create catalog client")
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = MspmConfig::load(&cli.config)
        .with_context(|| format!("Failed to load config {}", cli.config.display()))?;

    // Initialize tracing subscriber for logging
    let default_level = if cli.debug || config.server.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .init();

    match &cli.command {
        Commands::Serve {
            listen,
            playground,
            store,
        } => commands::cmd_serve(&config, listen.clone(), playground.clone(), store.clone()),

        Commands::Upload {
            package,
            dir,
            labels,
        } => commands::cmd_upload(&client(&cli, &config)?, package, dir, labels),
        Commands::Info { package } => commands::cmd_info(&client(&cli, &config)?, package),
        Commands::Label {
            package,
            designator,
            labels,
        } => commands::cmd_label(&client(&cli, &config)?, package, designator, labels),
        Commands::Show {
            package,
            designator,
        } => commands::cmd_show(&client(&cli, &config)?, package, designator),

        Commands::Fetch {
            package,
            designator,
            activate,
        } => commands::cmd_fetch(&client(&cli, &config)?, package, designator, *activate),
        Commands::Activate {
            package,
            designator,
        } => commands::cmd_activate(&client(&cli, &config)?, package, designator),
        Commands::Deactivate {
            package,
            designator,
        } => commands::cmd_deactivate(&client(&cli, &config)?, package, designator),
        Commands::Start { package } => commands::cmd_start(&client(&cli, &config)?, package),
        Commands::Stop { package } => commands::cmd_stop(&client(&cli, &config)?, package),
        Commands::Purge { package, labels } => {
            commands::cmd_purge(&client(&cli, &config)?, package, labels)
        }
        Commands::Status { package } => commands::cmd_status(&client(&cli, &config)?, package),

        Commands::Completions { shell } => {
            clap_complete::generate(*shell, &mut Cli::command(), "mspm", &mut std::io::stdout());
            Ok(())
        }
    }
}
