//! Errors raised while resolving and pinging a server.

use std::fmt;

/// Failure of one resolve + ping attempt.
#[derive(Debug, thiserror::Error)]
pub enum PingError {
    /// The configured server line is not a usable `host[:port]`.
    #[error("failed to parse address {input:?}: {reason}")]
    AddressParse { input: String, reason: &'static str },

    /// DNS produced no usable address for the host.
    #[error("unknown host {host}")]
    UnknownHost { host: String },

    /// TCP connect was refused or otherwise failed.
    #[error("connect to {addr} failed: {source}")]
    Connect { addr: std::net::SocketAddr, source: std::io::Error },

    /// Connect, read or write exceeded the configured timeout.
    #[error("timed out talking to {addr}")]
    Timeout { addr: std::net::SocketAddr },

    /// The stream failed after the connection was established.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// The server violated the status protocol framing.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The status body was not usable JSON.
    #[error("invalid response {body:?}")]
    ResponseParse {
        body: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl PingError {
    pub fn protocol(message: impl Into<String>) -> Self {
        PingError::Protocol(message.into())
    }

    /// Transport failures are retried on the next candidate and the next poll.
    pub fn is_transport(&self) -> bool {
        matches!(self, PingError::Connect { .. } | PingError::Timeout { .. } | PingError::Io(_))
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            PingError::AddressParse { .. } => ErrorKind::AddressParse,
            PingError::UnknownHost { .. } => ErrorKind::UnknownHost,
            PingError::Connect { .. } => ErrorKind::Connect,
            PingError::Timeout { .. } => ErrorKind::Timeout,
            PingError::Io(_) => ErrorKind::Io,
            PingError::Protocol(_) => ErrorKind::Protocol,
            PingError::ResponseParse { .. } => ErrorKind::ResponseParse,
        }
    }
}

/// The error category shown on screen in place of a server's status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    AddressParse,
    UnknownHost,
    Connect,
    Timeout,
    Io,
    Protocol,
    ResponseParse,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::AddressParse => "AddressParseError",
            ErrorKind::UnknownHost => "UnknownHostError",
            ErrorKind::Connect => "ConnectError",
            ErrorKind::Timeout => "IoTimeoutError",
            ErrorKind::Io => "IoError",
            ErrorKind::Protocol => "ProtocolError",
            ErrorKind::ResponseParse => "ResponseParseError",
        };
        f.write_str(name)
    }
}
