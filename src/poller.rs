//! One task per configured server line.
//!
//! A poller pings its server, folds the result into its presence cache and
//! publishes a display record, then sleeps and repeats. Transport failures
//! leave the previous record on screen. A server that does not resolve shows
//! an error and keeps being polled. Anything else is a fault: the error is
//! shown and logged and the poller stops until the next reload.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::address::ServerAddress;
use crate::config::Settings;
use crate::display::DisplayRecord;
use crate::error::PingError;
use crate::presence::PresenceCache;
use crate::source::StatusSource;
use crate::state::AggregatedState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollerExit {
    Cancelled,
    Faulted,
}

pub struct Poller<S> {
    slot: usize,
    line: String,
    generation: u64,
    source: Arc<S>,
    state: Arc<AggregatedState>,
    presence: PresenceCache,
    cached: Option<SocketAddr>,
    interval: Duration,
    token: CancellationToken,
}

impl<S: StatusSource> Poller<S> {
    pub fn new(
        slot: usize,
        line: String,
        generation: u64,
        source: Arc<S>,
        state: Arc<AggregatedState>,
        settings: &Settings,
        token: CancellationToken,
    ) -> Self {
        Poller {
            slot,
            line,
            generation,
            source,
            state,
            presence: PresenceCache::new(settings.presence),
            cached: None,
            interval: settings.poll_interval,
            token,
        }
    }

    fn publish(&self, record: DisplayRecord) {
        self.state.publish(self.generation, self.slot, Some(record));
    }

    pub async fn run(mut self) -> PollerExit {
        let address = match ServerAddress::parse(&self.line) {
            Ok(address) => address,
            Err(err) => {
                tracing::error!(slot = self.slot, line = %self.line, error = %err, "invalid server address");
                self.publish(DisplayRecord::failed(self.line.clone(), err.kind()));
                return PollerExit::Faulted;
            }
        };

        loop {
            if self.token.is_cancelled() {
                return PollerExit::Cancelled;
            }
            let result = self.source.fetch(&address, self.cached).await;
            if self.token.is_cancelled() {
                return PollerExit::Cancelled;
            }

            match result {
                Ok(fetched) => {
                    self.cached = Some(fetched.connected);
                    let status = fetched.status;
                    let presence = self.presence.observe(
                        &status.sample_names(),
                        status.players.online,
                        status.players.max,
                    );
                    self.publish(DisplayRecord::from_status(&address, &status, presence));
                }
                Err(err) if err.is_transport() => {
                    self.cached = None;
                    tracing::debug!(slot = self.slot, %address, error = %err, "ping failed");
                }
                Err(err @ PingError::UnknownHost { .. }) => {
                    self.cached = None;
                    tracing::debug!(slot = self.slot, %address, error = %err, "unknown host");
                    self.publish(DisplayRecord::failed(address.to_string(), err.kind()));
                }
                Err(err) => {
                    self.publish(DisplayRecord::failed(address.to_string(), err.kind()));
                    let err = anyhow::Error::from(err);
                    tracing::error!(slot = self.slot, %address, error = %format!("{err:#}"), "poller faulted");
                    return PollerExit::Faulted;
                }
            }

            tokio::select! {
                _ = self.token.cancelled() => return PollerExit::Cancelled,
                _ = tokio::time::sleep(self.interval) => {}
            }
        }
    }
}
