//! registra - command-line entry point

use clap::Parser;
use std::path::Path;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use registra_cli::{cli::Cli, commands, config::CliConfig};

const DEFAULT_CONFIG: &str = "registra.yaml";

fn main() {
    let cli = Cli::parse();

    let loaded = CliConfig::resolve(cli.config.as_deref(), Path::new(DEFAULT_CONFIG));
    let level = loaded
        .as_ref()
        .map(|(c, _)| c.log.level.clone())
        .unwrap_or_else(|_| "info".to_string());

    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&level)),
        )
        .init();

    let config = match loaded {
        Ok((config, None)) => config,
        Ok((config, Some(e))) => {
            tracing::warn!("Failed to load {}, using defaults: {}", DEFAULT_CONFIG, e);
            config
        }
        Err(e) => {
            tracing::error!("Failed to load config: {}", e);
            std::process::exit(1);
        }
    };

    let output = commands::run(cli.command, &config).unwrap_or_else(|e| {
        tracing::error!("Command failed: {}", e);
        std::process::exit(1);
    });

    match serde_json::to_string_pretty(&output) {
        Ok(text) => println!("{}", text),
        Err(e) => {
            tracing::error!("Failed to render output: {}", e);
            std::process::exit(1);
        }
    }
}
