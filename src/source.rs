use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;

use crate::address::ServerAddress;
use crate::connection::Connection;
use crate::error::PingError;
use crate::resolve::Resolver;
use crate::status::StatusResponse;

/// A successful ping and the address that answered it.
#[derive(Debug, Clone)]
pub struct Fetched {
    pub status: StatusResponse,
    pub connected: SocketAddr,
}

/// Where pollers get server status from.
pub trait StatusSource: Send + Sync + 'static {
    /// One resolve + ping attempt. `cached` is tried first when given.
    fn fetch(
        &self,
        address: &ServerAddress,
        cached: Option<SocketAddr>,
    ) -> impl Future<Output = Result<Fetched, PingError>> + Send;
}

pub struct NetworkSource {
    resolver: Resolver,
    timeout: Duration,
    protocol_version: i32,
}

impl NetworkSource {
    pub fn new(timeout: Duration, protocol_version: i32) -> Self {
        NetworkSource {
            resolver: Resolver::new(timeout),
            timeout,
            protocol_version,
        }
    }
}

impl StatusSource for NetworkSource {
    async fn fetch(&self, address: &ServerAddress, cached: Option<SocketAddr>) -> Result<Fetched, PingError> {
        let candidates = self.resolver.candidates(address, cached).await?;
        let mut last_err = None;
        for addr in candidates.addrs {
            let host = candidates.host.clone();
            let port = candidates.port;
            let timeout = self.timeout;
            let protocol_version = self.protocol_version;
            let attempt = tokio::task::spawn_blocking(move || {
                Connection::connect(addr, timeout)?.ping(&host, port, protocol_version)
            })
            .await
            .map_err(|err| PingError::Io(std::io::Error::other(err)))?;

            match attempt {
                Ok(status) => return Ok(Fetched { status, connected: addr }),
                Err(err) if err.is_transport() => {
                    tracing::debug!(%address, %addr, error = %err, "candidate failed");
                    last_err = Some(err);
                }
                Err(err) => return Err(err),
            }
        }
        Err(last_err.unwrap_or_else(|| PingError::UnknownHost {
            host: address.host().to_string(),
        }))
    }
}
