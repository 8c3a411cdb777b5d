//! What one server contributes to the screen.

use crossterm::style::Color;

use crate::address::ServerAddress;
use crate::description::collapse_whitespace;
use crate::error::ErrorKind;
use crate::presence::Presence;
use crate::status::StatusResponse;

const UNKNOWN: &str = "???";

/// Online-count cutoffs for line colours. Cosmetic only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayConfig {
    pub mid_tier: i32,
    pub high_tier: i32,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self { mid_tier: 2, high_tier: 30 }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlayerSummary {
    pub max: Option<i32>,
    pub online: Option<i32>,
    pub online_is_assumed: bool,
    pub names: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayRecord {
    pub address: String,
    pub players: PlayerSummary,
    pub version: Option<String>,
    pub motd: Option<String>,
    pub error: Option<ErrorKind>,
}

/// One screen line and its foreground colour.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub color: Color,
    pub text: String,
}

impl DisplayRecord {
    pub fn from_status(address: &ServerAddress, status: &StatusResponse, presence: Presence) -> Self {
        DisplayRecord {
            address: address.to_string(),
            players: PlayerSummary {
                max: status.players.max,
                online: presence.online,
                online_is_assumed: presence.online_is_assumed,
                names: presence.names,
            },
            version: status.version.name.clone(),
            motd: status
                .description
                .as_ref()
                .map(|description| collapse_whitespace(&description.plain_text())),
            error: None,
        }
    }

    /// A record standing in for a server that could not be shown.
    pub fn failed(address: impl Into<String>, kind: ErrorKind) -> Self {
        DisplayRecord {
            address: address.into(),
            players: PlayerSummary::default(),
            version: None,
            motd: None,
            error: Some(kind),
        }
    }

    pub fn lines(&self, config: &DisplayConfig) -> Vec<Line> {
        if let Some(kind) = self.error {
            return vec![Line {
                color: Color::Red,
                text: format!("{} {}", self.address, kind),
            }];
        }

        let players = &self.players;
        let mut text = format!(
            "{} ({}{}/{})",
            self.address,
            count(players.online),
            if players.online_is_assumed { "*" } else { "" },
            count(players.max),
        );
        if let Some(version) = &self.version {
            text.push_str(&format!(" [{version}]"));
        }
        if let Some(motd) = &self.motd {
            text.push_str(&format!(" \"{motd}\""));
        }

        let color = tier_color(players.online, config);
        let mut lines = vec![Line { color, text }];
        if !players.names.is_empty() {
            let mut names = format!(" └ {}", players.names.join(", "));
            if let Some(online) = players.online {
                let missing = online as i64 - players.names.len() as i64;
                if missing != 0 {
                    names.push_str(&format!(" {missing:+}"));
                }
            }
            lines.push(Line { color, text: names });
        }
        lines
    }
}

fn count(value: Option<i32>) -> String {
    value.map_or_else(|| UNKNOWN.to_string(), |v| v.to_string())
}

pub fn tier_color(online: Option<i32>, config: &DisplayConfig) -> Color {
    match online {
        Some(online) if online >= config.high_tier => Color::Cyan,
        Some(online) if online >= config.mid_tier => Color::Green,
        _ => Color::White,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::description::Description;
    use crate::presence::PresenceCache;
    use crate::status::{PlayerRef, Players, Version};

    fn record(online: Option<i32>, names: &[&str]) -> DisplayRecord {
        DisplayRecord {
            address: "mc.example.com:25565".into(),
            players: PlayerSummary {
                max: Some(100),
                online,
                online_is_assumed: false,
                names: names.iter().map(|n| n.to_string()).collect(),
            },
            version: Some("Paper 1.21.1".into()),
            motd: Some("A Minecraft Server".into()),
            error: None,
        }
    }

    #[test]
    fn full_line() {
        let lines = record(Some(5), &["Alice", "Bob"]).lines(&DisplayConfig::default());
        assert_eq!(
            lines[0].text,
            "mc.example.com:25565 (5/100) [Paper 1.21.1] \"A Minecraft Server\""
        );
        assert_eq!(lines[1].text, " └ Alice, Bob +3");
        assert_eq!(lines[0].color, Color::Green);
    }

    #[test]
    fn names_line_counts_both_ways() {
        let config = DisplayConfig::default();
        assert_eq!(record(Some(2), &["Alice", "Bob"]).lines(&config)[1].text, " └ Alice, Bob");
        assert_eq!(record(Some(1), &["Alice", "Bob"]).lines(&config)[1].text, " └ Alice, Bob -1");
        assert_eq!(record(None, &["Alice"]).lines(&config)[1].text, " └ Alice");
        assert_eq!(record(Some(3), &[]).lines(&config).len(), 1);
    }

    #[test]
    fn unknown_fields() {
        let mut rec = record(None, &[]);
        rec.players.max = None;
        rec.version = None;
        rec.motd = None;
        let lines = rec.lines(&DisplayConfig::default());
        assert_eq!(lines[0].text, "mc.example.com:25565 (???/???)");
        assert_eq!(lines[0].color, Color::White);
    }

    #[test]
    fn assumed_count_is_flagged() {
        let mut rec = record(Some(18), &[]);
        rec.players.online_is_assumed = true;
        assert!(rec.lines(&DisplayConfig::default())[0].text.contains("(18*/100)"));
    }

    #[test]
    fn error_line() {
        let lines = DisplayRecord::failed("nowhere.example:25565", ErrorKind::UnknownHost)
            .lines(&DisplayConfig::default());
        assert_eq!(lines, vec![Line {
            color: Color::Red,
            text: "nowhere.example:25565 UnknownHostError".into()
        }]);
    }

    #[test]
    fn colour_tiers() {
        let config = DisplayConfig::default();
        assert_eq!(tier_color(None, &config), Color::White);
        assert_eq!(tier_color(Some(1), &config), Color::White);
        assert_eq!(tier_color(Some(2), &config), Color::Green);
        assert_eq!(tier_color(Some(29), &config), Color::Green);
        assert_eq!(tier_color(Some(30), &config), Color::Cyan);
    }

    #[test]
    fn record_from_status_collapses_motd() {
        let status = StatusResponse {
            description: Some(Description::Legacy("§aWelcome\n\n  to   §lthe server".into())),
            players: Players { max: Some(20), online: Some(2), sample: Vec::new() },
            version: Version { name: Some("1.21".into()), protocol: Some(767) },
            favicon: None,
        };
        let presence = Presence {
            names: vec!["Alice".into()],
            online: Some(2),
            online_is_assumed: false,
        };
        let address = ServerAddress::parse("mc.example.com").unwrap();
        let rec = DisplayRecord::from_status(&address, &status, presence);
        assert_eq!(rec.motd.as_deref(), Some("Welcome to the server"));
        assert_eq!(rec.players.names, vec!["Alice"]);
        assert_eq!(rec.address, "mc.example.com:25565");
    }

    #[test]
    fn corrected_count_from_capped_server() {
        let sample = |names: &[&str]| {
            names
                .iter()
                .map(|name| PlayerRef { id: "0".into(), name: name.to_string() })
                .collect::<Vec<_>>()
        };
        let status = |players: &[&str]| StatusResponse {
            description: None,
            players: Players { max: Some(40), online: Some(12), sample: sample(players) },
            version: Version::default(),
            favicon: None,
        };
        let address = ServerAddress::parse("mc.example.com").unwrap();
        let mut cache = PresenceCache::default();

        let first: Vec<String> = (1..=12).map(|i| format!("Alpha{i:02}")).collect();
        let first: Vec<&str> = first.iter().map(String::as_str).collect();
        let first = status(&first);
        let presence = cache.observe(&first.sample_names(), Some(12), Some(40));
        let rec = DisplayRecord::from_status(&address, &first, presence);
        assert_eq!(rec.players.online, Some(12));
        assert!(!rec.players.online_is_assumed);

        let second = status(&["Alpha01", "Bravo01", "Bravo02"]);
        let presence = cache.observe(&second.sample_names(), Some(12), Some(40));
        let rec = DisplayRecord::from_status(&address, &second, presence);
        assert_eq!(rec.players.online, Some(14));
        assert!(rec.players.online_is_assumed);
        assert_eq!(rec.players.names.len(), 14);
        assert!(rec.lines(&DisplayConfig::default())[0].text.starts_with("mc.example.com:25565 (14*/40)"));
    }
}
