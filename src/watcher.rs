use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use tokio_util::sync::CancellationToken;

use crate::config::Settings;
use crate::poller::Poller;
use crate::source::StatusSource;
use crate::state::AggregatedState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchExit {
    /// The server list has no usable lines.
    Empty,
    /// Ctrl-C or the shutdown token.
    Shutdown,
}

/// Reloads the server list whenever its modification time changes.
pub struct Watcher<S> {
    path: PathBuf,
    source: Arc<S>,
    state: Arc<AggregatedState>,
    settings: Settings,
    shutdown: CancellationToken,
    pollers: CancellationToken,
    modified: Option<SystemTime>,
}

/// Non-blank lines of the server list, trimmed.
pub async fn read_server_lines(path: &Path) -> io::Result<Vec<String>> {
    let text = tokio::fs::read_to_string(path).await?;
    Ok(text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

impl<S: StatusSource> Watcher<S> {
    pub fn new(source: Arc<S>, state: Arc<AggregatedState>, settings: Settings, shutdown: CancellationToken) -> Self {
        Watcher {
            path: settings.servers.clone(),
            pollers: shutdown.child_token(),
            source,
            state,
            settings,
            shutdown,
            modified: None,
        }
    }

    /// Replaces every running poller with one per line. Returns the new generation.
    pub fn apply(&mut self, lines: Vec<String>) -> u64 {
        self.pollers.cancel();
        self.pollers = self.shutdown.child_token();
        let generation = self.state.reset();

        for (slot, line) in lines.into_iter().enumerate() {
            let poller = Poller::new(
                slot,
                line,
                generation,
                self.source.clone(),
                self.state.clone(),
                &self.settings,
                self.pollers.clone(),
            );
            tokio::spawn(async move {
                let exit = poller.run().await;
                tracing::debug!(slot, generation, ?exit, "poller stopped");
            });
        }
        generation
    }

    /// Reloads if the file changed. Returns the number of servers loaded, if any reload happened.
    pub async fn check(&mut self) -> io::Result<Option<usize>> {
        let modified = tokio::fs::metadata(&self.path).await?.modified()?;
        if self.modified == Some(modified) {
            return Ok(None);
        }
        let lines = read_server_lines(&self.path).await?;
        self.modified = Some(modified);
        let count = lines.len();
        if count > 0 {
            let generation = self.apply(lines);
            tracing::info!(path = %self.path.display(), servers = count, generation, "loaded server list");
        } else {
            self.pollers.cancel();
        }
        Ok(Some(count))
    }

    /// Watches until the list becomes empty or shutdown is requested.
    ///
    /// Failing to read the list on the first check is returned as an error;
    /// later read failures keep the current pollers running.
    pub async fn run(mut self) -> io::Result<WatchExit> {
        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);
        let mut first = true;
        loop {
            match self.check().await {
                Ok(Some(0)) => return Ok(WatchExit::Empty),
                Ok(_) => {}
                Err(err) if first => return Err(err),
                Err(err) => {
                    tracing::warn!(path = %self.path.display(), error = %err, "failed to read server list");
                }
            }
            first = false;

            tokio::select! {
                _ = self.shutdown.cancelled() => break,
                _ = &mut ctrl_c => {
                    tracing::info!("interrupted");
                    break;
                }
                _ = tokio::time::sleep(self.settings.watch_interval) => {}
            }
        }
        self.shutdown.cancel();
        Ok(WatchExit::Shutdown)
    }
}
