use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::process::ExitCode;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{ExecutableCommand, cursor};
use mc_server_pinger::config::{Cli, Settings};
use mc_server_pinger::renderer::Renderer;
use mc_server_pinger::source::NetworkSource;
use mc_server_pinger::state::AggregatedState;
use mc_server_pinger::watcher::{WatchExit, Watcher};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const STARTUP_FAULT: u8 = 3;

fn init_logging(path: &Path) -> Result<()> {
    let file = open_append(path).with_context(|| format!("failed to open log file {}", path.display()))?;
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
        .init();
    Ok(())
}

/// Opens for appending, creating the file if needed.
fn open_append(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

async fn run(settings: Settings) -> Result<WatchExit> {
    open_append(&settings.servers)
        .with_context(|| format!("failed to open server list {}", settings.servers.display()))?;

    let source = Arc::new(NetworkSource::new(settings.timeout, settings.protocol_version));
    let state = Arc::new(AggregatedState::new());
    let shutdown = CancellationToken::new();

    let renderer = Renderer::new(io::stdout(), state.clone(), settings.display, settings.render_interval);
    let renderer = tokio::spawn(renderer.run(shutdown.clone()));

    let watcher = Watcher::new(source, state, settings.clone(), shutdown.clone());
    let exit = watcher.run().await;
    shutdown.cancel();
    if let Err(err) = renderer.await {
        tracing::warn!(error = %err, "renderer task failed");
    }
    exit.with_context(|| format!("failed to read server list {}", settings.servers.display()))
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(err) = init_logging(&cli.log_file) {
        eprintln!("{err:#}");
        return ExitCode::from(STARTUP_FAULT);
    }
    let settings = Settings::from(&cli);
    tracing::info!(?settings, "starting");

    let mut stdout = io::stdout();
    if let Err(err) = stdout.execute(cursor::Hide) {
        tracing::debug!(error = %err, "failed to hide cursor");
    }
    let result = run(settings.clone()).await;
    if let Err(err) = stdout.execute(cursor::Show).and_then(|out| out.flush()) {
        tracing::debug!(error = %err, "failed to restore cursor");
    }

    match result {
        Ok(WatchExit::Empty) => {
            println!("{} is empty", settings.servers.display());
            ExitCode::SUCCESS
        }
        Ok(WatchExit::Shutdown) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %format!("{err:#}"), "startup failed");
            eprintln!("{err:#}");
            ExitCode::from(STARTUP_FAULT)
        }
    }
}
