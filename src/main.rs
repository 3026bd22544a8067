// Account Sweep - Dataverse account export
// Copyright (c) 2025 Account Sweep Contributors
// Licensed under the MIT License

use account_sweep::cli::{Cli, Commands};
use account_sweep::config::{load_config, LoggingConfig, SweepConfig};
use account_sweep::domain::Result;
use account_sweep::logging::init_logging;
use clap::Parser;
use std::process;
use std::sync::Arc;
use tokio::sync::watch;

#[tokio::main]
async fn main() {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let config_path = cli.config_path();

    // Loaded once per process and never mutated afterwards
    let loaded = load_config(config_path.as_deref()).map(Arc::new);

    let (log_level, logging_config) = match &loaded {
        Ok(config) => (
            cli.log_level
                .clone()
                .unwrap_or_else(|| config.application.log_level.clone()),
            config.logging.clone(),
        ),
        Err(_) => (
            cli.log_level.clone().unwrap_or_else(|| "info".to_string()),
            LoggingConfig {
                local_enabled: false,
                ..Default::default()
            },
        ),
    };

    let _guard = match init_logging(&log_level, &logging_config) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {e}");
            process::exit(1);
        }
    };

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        "Account Sweep - Dataverse account export"
    );

    // Create shutdown signal channel for graceful shutdown
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    tokio::spawn(async move {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};
            let mut sigterm = match signal(SignalKind::terminate()) {
                Ok(s) => s,
                Err(e) => {
                    tracing::error!(error = %e, "Failed to install SIGTERM handler");
                    return;
                }
            };

            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Received SIGINT (Ctrl+C), initiating graceful shutdown");
                }
                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM, initiating graceful shutdown");
                }
            }
        }

        #[cfg(not(unix))]
        {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for Ctrl+C");
                return;
            }
            tracing::info!("Received SIGINT (Ctrl+C), initiating graceful shutdown");
        }

        println!("\nShutdown signal received, letting the current sweep finish...");
        let _ = shutdown_tx.send(true);
    });

    let exit_code = match execute_command(&cli, loaded, shutdown_rx).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, "Command execution failed");
            eprintln!("Error: {e}");
            1
        }
    };

    drop(_guard);
    process::exit(exit_code);
}

/// Execute the CLI command
async fn execute_command(
    cli: &Cli,
    loaded: Result<Arc<SweepConfig>>,
    shutdown_signal: watch::Receiver<bool>,
) -> anyhow::Result<i32> {
    if let Commands::ValidateConfig(args) = &cli.command {
        return Ok(args.execute(cli.config_path().as_deref(), loaded.as_deref()));
    }

    let config = match loaded {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Failed to load configuration");
            eprintln!("{e}");
            return Ok(2);
        }
    };

    match &cli.command {
        Commands::Run(args) => args.execute(&config).await,
        Commands::Serve(args) => args.execute(&config, shutdown_signal).await,
        Commands::ValidateConfig(_) => Ok(0),
    }
}
