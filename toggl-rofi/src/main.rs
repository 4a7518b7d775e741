mod backend;
mod bootstrap;
mod cli;
mod config;
mod grammar;
mod picker;
mod render;
mod runtime;
mod time_utils;
mod views;

use anyhow::{Context, Result};
use clap::Parser;
use std::path::Path;

use backend::DevBackend;
use cli::{Cli, Commands};
use config::TogglRofiConfig;
use views::Outcome;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    match cli.command() {
        Commands::ConfigPath => {
            let path = TogglRofiConfig::config_path()?;
            if !path.exists() {
                TogglRofiConfig::default().save()?;
            }
            println!("{}", path.display());
            Ok(())
        }
        command => {
            init_file_logging(&TogglRofiConfig::log_path()?)?;
            let result = dispatch(command).await;
            if let Err(e) = &result {
                tracing::error!("{:#}", e);
            }
            result
        }
    }
}

async fn dispatch(command: Commands) -> Result<()> {
    let config = TogglRofiConfig::load()?;
    let mut picker = bootstrap::picker_from_config(&config);

    let outcome = match command {
        Commands::Dev => {
            tracing::info!("running against in-memory data");
            runtime::run_session(&mut picker, &mut DevBackend::new(), &config).await?
        }
        _ => {
            let mut backend = match bootstrap::connect_toggl(&config).await {
                Ok(backend) => backend,
                Err(err) => {
                    bootstrap::report_startup_error(&mut picker, &err).await;
                    return Err(err);
                }
            };
            runtime::run_session(&mut picker, &mut backend, &config).await?
        }
    };

    match outcome {
        Outcome::Started(entry) => {
            tracing::info!(id = entry.id, "session finished with a running entry");
        }
        Outcome::Cancelled => tracing::debug!("session cancelled"),
    }
    Ok(())
}

/// The picker owns the screen, so logs go to a file.
fn init_file_logging(log_path: &Path) -> Result<()> {
    if let Some(parent) = log_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create log directory {}", parent.display()))?;
    }
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
        .with_context(|| format!("Failed to open log file {}", log_path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with_ansi(false)
        .with_writer(std::sync::Mutex::new(log_file))
        .init();
    Ok(())
}
