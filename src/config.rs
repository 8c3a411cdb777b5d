use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::display::DisplayConfig;
use crate::packet::DEFAULT_PROTOCOL_VERSION;
use crate::presence::PresenceConfig;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Live status board for a list of Minecraft servers")]
pub struct Cli {
    #[arg(long, default_value = "servers.txt", help = "Server list, one host[:port] per line")]
    pub servers: PathBuf,
    #[arg(long, default_value_t = 8000, help = "Connect, read and DNS timeout in milliseconds")]
    pub timeout_ms: u64,
    #[arg(long, default_value_t = 8000, help = "Delay between pings of one server in milliseconds")]
    pub interval_ms: u64,
    #[arg(long, default_value_t = 500)]
    pub render_ms: u64,
    #[arg(long, default_value_t = 500, help = "How often the server list is checked for changes")]
    pub watch_ms: u64,
    #[arg(long, default_value = "mc-server-pinger.log")]
    pub log_file: PathBuf,
    #[arg(long, default_value_t = DEFAULT_PROTOCOL_VERSION, help = "Protocol version sent in the handshake")]
    pub protocol_version: i32,
}

/// Runtime configuration handed to every task.
#[derive(Debug, Clone)]
pub struct Settings {
    pub servers: PathBuf,
    pub timeout: Duration,
    pub poll_interval: Duration,
    pub render_interval: Duration,
    pub watch_interval: Duration,
    pub protocol_version: i32,
    pub presence: PresenceConfig,
    pub display: DisplayConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            servers: PathBuf::from("servers.txt"),
            timeout: Duration::from_millis(8000),
            poll_interval: Duration::from_millis(8000),
            render_interval: Duration::from_millis(500),
            watch_interval: Duration::from_millis(500),
            protocol_version: DEFAULT_PROTOCOL_VERSION,
            presence: PresenceConfig::default(),
            display: DisplayConfig::default(),
        }
    }
}

impl From<&Cli> for Settings {
    fn from(cli: &Cli) -> Self {
        Settings {
            servers: cli.servers.clone(),
            timeout: Duration::from_millis(cli.timeout_ms),
            poll_interval: Duration::from_millis(cli.interval_ms),
            render_interval: Duration::from_millis(cli.render_ms),
            watch_interval: Duration::from_millis(cli.watch_ms),
            protocol_version: cli.protocol_version,
            ..Settings::default()
        }
    }
}
