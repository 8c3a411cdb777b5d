//! Turning a [`ServerAddress`] into an ordered list of socket addresses to try.
//!
//! Default-port names are first checked for a `_minecraft._tcp` SRV record,
//! which may redirect to another host and port. The effective host is then
//! resolved to A/AAAA records. Loopback and unspecified addresses only count
//! when the user typed them as a literal.

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use hickory_resolver::{
    TokioAsyncResolver,
    config::{ResolverConfig, ResolverOpts},
    system_conf::read_system_conf,
};

use crate::address::{DEFAULT_PORT, ServerAddress};
use crate::error::PingError;

/// Where a ping should go: the host and port announced in the handshake and
/// the socket addresses to dial, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidates {
    pub host: String,
    pub port: u16,
    pub addrs: Vec<SocketAddr>,
}

pub struct Resolver {
    inner: TokioAsyncResolver,
}

impl Resolver {
    /// Uses the system resolver configuration, falling back to the library defaults.
    pub fn new(timeout: Duration) -> Self {
        let (config, mut opts) = match read_system_conf() {
            Ok(conf) => conf,
            Err(err) => {
                tracing::warn!(error = %err, "failed to read system DNS config, using defaults");
                (ResolverConfig::default(), ResolverOpts::default())
            }
        };
        opts.timeout = timeout;
        opts.attempts = 1;
        Resolver {
            inner: TokioAsyncResolver::tokio(config, opts),
        }
    }

    /// SRV target for a default-port name, if one is published.
    async fn srv_redirect(&self, host: &str) -> Option<(String, u16)> {
        let name = format!("_minecraft._tcp.{host}");
        match self.inner.srv_lookup(name.as_str()).await {
            Ok(lookup) => {
                let records = lookup
                    .iter()
                    .map(|srv| (srv.priority(), srv.weight(), srv.target().to_ascii(), srv.port()));
                let redirect = pick_srv(records);
                if let Some((target, port)) = &redirect {
                    tracing::debug!(%host, %target, port, "following SRV record");
                }
                redirect
            }
            Err(err) => {
                tracing::debug!(%host, error = %err, "no SRV redirect");
                None
            }
        }
    }

    async fn lookup(&self, host: &str, port: u16) -> Option<Vec<SocketAddr>> {
        match self.inner.lookup_ip(host).await {
            Ok(lookup) => Some(lookup.iter().map(|ip| SocketAddr::new(ip, port)).collect()),
            Err(err) => {
                tracing::debug!(%host, error = %err, "DNS lookup failed");
                None
            }
        }
    }

    /// Resolves `address`, putting `cached` (the last address that answered) first.
    pub async fn candidates(
        &self,
        address: &ServerAddress,
        cached: Option<SocketAddr>,
    ) -> Result<Candidates, PingError> {
        if let Some(ip) = address.ip_literal() {
            let addr = SocketAddr::new(ip, address.port());
            return Ok(Candidates {
                host: address.host().to_string(),
                port: address.port(),
                addrs: order_candidates(cached, vec![addr], true),
            });
        }

        let (host, port) = match address.port() {
            DEFAULT_PORT => self
                .srv_redirect(address.host())
                .await
                .unwrap_or_else(|| (address.host().to_string(), address.port())),
            port => (address.host().to_string(), port),
        };

        let unknown = || PingError::UnknownHost {
            host: address.host().to_string(),
        };
        let resolved = self.lookup(&host, port).await.ok_or_else(unknown)?;
        let addrs = order_candidates(cached, resolved, false);
        if addrs.is_empty() {
            return Err(unknown());
        }
        Ok(Candidates { host, port, addrs })
    }
}

/// Lowest priority wins, then highest weight. The trailing root dot is dropped.
pub fn pick_srv(records: impl IntoIterator<Item = (u16, u16, String, u16)>) -> Option<(String, u16)> {
    records
        .into_iter()
        .min_by(|a, b| a.0.cmp(&b.0).then(b.1.cmp(&a.1)))
        .map(|(_, _, target, port)| (target.trim_end_matches('.').to_string(), port))
        .filter(|(target, _)| !target.is_empty())
}

/// `[cached?] + resolved`, dropping the duplicate of `cached` and any address not worth dialling.
pub fn order_candidates(
    cached: Option<SocketAddr>,
    resolved: Vec<SocketAddr>,
    allow_local: bool,
) -> Vec<SocketAddr> {
    cached
        .into_iter()
        .chain(
            resolved
                .into_iter()
                .filter(|addr| Some(*addr) != cached && (allow_local || is_routable(addr.ip()))),
        )
        .collect()
}

fn is_routable(ip: IpAddr) -> bool {
    let ip = ip.to_canonical();
    !ip.is_loopback() && !ip.is_unspecified()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sa(s: &str) -> SocketAddr {
        s.parse().unwrap()
    }

    #[test]
    fn cached_goes_first_without_duplicate() {
        let resolved = vec![sa("10.0.0.1:25565"), sa("10.0.0.2:25565"), sa("10.0.0.3:25565")];
        assert_eq!(
            order_candidates(Some(sa("10.0.0.2:25565")), resolved.clone(), false),
            vec![sa("10.0.0.2:25565"), sa("10.0.0.1:25565"), sa("10.0.0.3:25565")]
        );
        assert_eq!(order_candidates(None, resolved.clone(), false), resolved);
    }

    #[test]
    fn cached_survives_when_no_longer_resolved() {
        assert_eq!(
            order_candidates(Some(sa("10.0.0.9:25565")), vec![sa("10.0.0.1:25565")], false),
            vec![sa("10.0.0.9:25565"), sa("10.0.0.1:25565")]
        );
    }

    #[test]
    fn local_addresses_are_skipped_unless_typed() {
        let resolved = vec![
            sa("127.0.0.1:25565"),
            sa("0.0.0.0:25565"),
            sa("[::1]:25565"),
            sa("[::ffff:127.0.0.1]:25565"),
            sa("203.0.113.5:25565"),
        ];
        assert_eq!(order_candidates(None, resolved.clone(), false), vec![sa("203.0.113.5:25565")]);
        assert_eq!(order_candidates(None, resolved.clone(), true), resolved);
    }

    #[test]
    fn srv_selection() {
        let records = vec![
            (10, 5, "backup.example.com.".to_string(), 25570),
            (0, 1, "light.example.com.".to_string(), 25566),
            (0, 50, "heavy.example.com.".to_string(), 25567),
        ];
        assert_eq!(pick_srv(records), Some(("heavy.example.com".to_string(), 25567)));
        assert_eq!(pick_srv(Vec::new()), None);
        assert_eq!(pick_srv(vec![(0, 0, ".".to_string(), 25565)]), None);
    }

    #[tokio::test]
    async fn literal_ip_skips_dns() {
        let resolver = Resolver::new(Duration::from_millis(200));
        let address = ServerAddress::parse("127.0.0.1:25570").unwrap();
        let candidates = resolver.candidates(&address, None).await.unwrap();
        assert_eq!(candidates.addrs, vec![sa("127.0.0.1:25570")]);
        assert_eq!(candidates.host, "127.0.0.1");
        assert_eq!(candidates.port, 25570);
    }

    #[tokio::test]
    async fn failed_lookup_is_unknown_host_even_with_cached_address() {
        let resolver = Resolver::new(Duration::from_millis(500));
        let address = ServerAddress::parse("does-not-exist.invalid:25566").unwrap();
        let err = resolver
            .candidates(&address, Some(sa("203.0.113.7:25566")))
            .await
            .unwrap_err();
        assert!(
            matches!(err, PingError::UnknownHost { ref host } if host == "does-not-exist.invalid"),
            "{err:?}"
        );
    }
}
