//! `host[:port]` server addresses.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::net::{IpAddr, Ipv6Addr};

use hickory_resolver::Name;

use crate::error::PingError;

pub const DEFAULT_PORT: u16 = 25565;

/// A parsed server address.
///
/// `host` is the IDN-normalized ASCII form used on the wire and for
/// equality; `raw_host` is what the user typed and is kept for display.
#[derive(Debug, Clone)]
pub struct ServerAddress {
    raw_host: String,
    host: String,
    port: u16,
}

impl ServerAddress {
    /// Builds an address from already separated parts, normalizing the host.
    pub fn new(host: &str, port: u16) -> Result<ServerAddress, PingError> {
        let raw_host = host.to_string();
        if raw_host.is_empty() {
            return Err(parse_error(host, "host is empty"));
        }
        let host = to_ascii_host(&raw_host).ok_or_else(|| parse_error(&raw_host, "host is not a valid domain"))?;
        Ok(ServerAddress { raw_host, host, port })
    }

    pub fn parse(input: &str) -> Result<ServerAddress, PingError> {
        if input.chars().any(char::is_whitespace) {
            return Err(parse_error(input, "address contains blank"));
        }
        if let Some(rest) = input.strip_prefix('[') {
            let (host, tail) = rest
                .split_once(']')
                .ok_or_else(|| parse_error(input, "unclosed bracket"))?;
            let port = match tail {
                "" => DEFAULT_PORT,
                _ => match tail.strip_prefix(':') {
                    Some(port) if is_numeric(port) => parse_port(input, port)?,
                    _ => return Err(parse_error(input, "unexpected text after bracketed host")),
                },
            };
            return ServerAddress::new(host, port);
        }
        if input.parse::<Ipv6Addr>().is_ok() {
            return ServerAddress::new(input, DEFAULT_PORT);
        }
        let (host, port) = match input.rsplit_once(':') {
            Some((host, port)) if is_numeric(port) => (host, parse_port(input, port)?),
            _ => (input, DEFAULT_PORT),
        };
        if host.is_empty() {
            return Err(parse_error(input, "host is empty"));
        }
        ServerAddress::new(host, port)
    }

    /// Normalized ASCII host used for DNS and the handshake.
    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn raw_host(&self) -> &str {
        &self.raw_host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// The host when it is an IP literal rather than a name.
    pub fn ip_literal(&self) -> Option<IpAddr> {
        self.host.parse().ok()
    }
}

impl PartialEq for ServerAddress {
    fn eq(&self, other: &Self) -> bool {
        self.host == other.host && self.port == other.port
    }
}

impl Eq for ServerAddress {}

impl Hash for ServerAddress {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.host.hash(state);
        self.port.hash(state);
    }
}

impl fmt::Display for ServerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.raw_host.contains(':') {
            write!(f, "[{}]:{}", self.raw_host, self.port)
        } else {
            write!(f, "{}:{}", self.raw_host, self.port)
        }
    }
}

fn parse_error(input: &str, reason: &'static str) -> PingError {
    PingError::AddressParse { input: input.to_string(), reason }
}

fn is_numeric(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

fn parse_port(input: &str, port: &str) -> Result<u16, PingError> {
    port.parse().map_err(|_| parse_error(input, "port out of range"))
}

fn to_ascii_host(host: &str) -> Option<String> {
    if let Ok(ip) = host.parse::<IpAddr>() {
        return Some(ip.to_string());
    }
    let name = Name::from_utf8(host).ok()?;
    let ascii = name.to_ascii().to_ascii_lowercase();
    if ascii.is_empty() || ascii == "." { None } else { Some(ascii) }
}
