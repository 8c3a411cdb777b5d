//! Status response payload and its lenient JSON decoding.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};

use crate::description::Description;
use crate::error::PingError;

/// A member whose value is missing right before a closing brace, e.g. `"modinfo": }`.
static DANGLING_MEMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""[a-zA-Z0-9]*": *}"#).expect("static regex"));

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusResponse {
    pub description: Option<Description>,
    pub players: Players,
    pub version: Version,
    pub favicon: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Players {
    pub max: Option<i32>,
    pub online: Option<i32>,
    pub sample: Vec<PlayerRef>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerRef {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Version {
    pub name: Option<String>,
    pub protocol: Option<i32>,
}

impl StatusResponse {
    /// Parses a status body. Fields of the wrong shape become empty rather than failing.
    pub fn parse(body: &str) -> Result<StatusResponse, PingError> {
        let value = parse_lenient(body).map_err(|source| PingError::ResponseParse {
            body: body.to_string(),
            source,
        })?;
        let Value::Object(root) = value else {
            return Ok(StatusResponse::default());
        };
        Ok(StatusResponse {
            description: Description::from_json(root.get("description")),
            players: root.get("players").and_then(Value::as_object).map(Players::from_json).unwrap_or_default(),
            version: root.get("version").and_then(Value::as_object).map(Version::from_json).unwrap_or_default(),
            favicon: root.get("favicon").and_then(Value::as_str).map(str::to_string),
        })
    }

    /// Sampled player names in server order.
    pub fn sample_names(&self) -> Vec<String> {
        self.players.sample.iter().map(|p| p.name.clone()).collect()
    }
}

impl Players {
    fn from_json(map: &Map<String, Value>) -> Players {
        let sample = match map.get("sample") {
            Some(Value::Array(entries)) => entries.iter().filter_map(PlayerRef::from_json).collect(),
            _ => Vec::new(),
        };
        Players {
            max: map.get("max").and_then(as_i32),
            online: map.get("online").and_then(as_i32),
            sample,
        }
    }
}

impl PlayerRef {
    fn from_json(value: &Value) -> Option<PlayerRef> {
        let entry = value.as_object()?;
        Some(PlayerRef {
            id: entry.get("id")?.as_str()?.to_string(),
            name: entry.get("name")?.as_str()?.to_string(),
        })
    }
}

impl Version {
    fn from_json(map: &Map<String, Value>) -> Version {
        Version {
            name: map.get("name").and_then(|v| match v {
                Value::String(s) => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            }),
            protocol: map.get("protocol").and_then(as_i32),
        }
    }
}

fn as_i32(value: &Value) -> Option<i32> {
    if let Some(n) = value.as_i64() {
        return i32::try_from(n).ok();
    }
    let f = value.as_f64()?;
    if f.fract() == 0.0 && f >= i32::MIN as f64 && f <= i32::MAX as f64 {
        Some(f as i32)
    } else {
        None
    }
}

/// Strict JSON first, then JSON5 for trailing commas, comments and unquoted keys.
fn parse_lenient(body: &str) -> Result<Value, Box<dyn std::error::Error + Send + Sync>> {
    let filtered = DANGLING_MEMBER.replace_all(body, "}");
    match serde_json::from_str(&filtered) {
        Ok(value) => Ok(value),
        Err(_) => Ok(json5::from_str::<Value>(&filtered)?),
    }
}
