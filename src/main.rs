mod app;
mod assets;
mod commands;
mod community;
mod config;
mod event;
mod planner;
mod query;
mod session;
mod ui;

use clap::Parser;
use color_eyre::{eyre::eyre, Result};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "wayfarer")]
#[command(about = "A terminal client for the Travelers Community")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/wayfarer/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Community service URL override
  #[arg(short, long)]
  url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();

  // Load configuration
  let mut config = config::Config::load(args.config.as_deref())?;

  // Override the service URL if specified on the command line
  if let Some(url) = args.url {
    config.community.url = url;
  }

  // Log to a file; stdout belongs to the TUI
  let _log_guard = init_logging()?;

  // Initialize and run the app
  let mut app = app::App::new(config).await?;
  app.run().await?;

  Ok(())
}

fn init_logging() -> Result<tracing_appender::non_blocking::WorkerGuard> {
  let log_dir = dirs::state_dir()
    .or_else(dirs::data_dir)
    .map(|p| p.join("wayfarer"))
    .ok_or_else(|| eyre!("Could not determine state directory"))?;

  std::fs::create_dir_all(&log_dir)
    .map_err(|e| eyre!("Failed to create log directory {}: {}", log_dir.display(), e))?;

  let appender = tracing_appender::rolling::daily(&log_dir, "wayfarer.log");
  let (writer, guard) = tracing_appender::non_blocking(appender);

  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("wayfarer=info")),
    )
    .with_writer(writer)
    .with_ansi(false)
    .init();

  Ok(guard)
}
