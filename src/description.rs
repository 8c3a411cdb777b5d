//! Server description (MOTD) decoding.
//!
//! Servers send the description either as a legacy string carrying `§`
//! formatting codes, as `{"text": "..."}` wrapping such a string, or as a
//! full chat component tree. Only the flattened text survives decoding.

use serde_json::{Map, Value};

/// Marker that introduces a two-character legacy formatting code.
pub const LEGACY_MARKER: char = '§';

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Description {
    Legacy(String),
    Structured(Component),
}

/// A chat component reduced to what flattening needs: its own text and its children.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Component {
    pub text: String,
    pub extra: Vec<Component>,
}

impl Description {
    /// Classifies the raw `description` value; `None` when absent or unusable.
    pub fn from_json(value: Option<&Value>) -> Option<Description> {
        match value? {
            Value::Null => None,
            Value::Object(map) if map.len() == 1 => {
                map.get("text").and_then(primitive_text).map(Description::Legacy)
            }
            Value::Object(map) if map.is_empty() => None,
            value @ (Value::Object(_) | Value::Array(_)) => {
                Some(Description::Structured(Component::from_json(value)))
            }
            value => primitive_text(value).map(Description::Legacy),
        }
    }

    /// Flattened text without formatting codes or control characters.
    pub fn plain_text(&self) -> String {
        match self {
            Description::Legacy(text) => strip_legacy(text),
            Description::Structured(component) => {
                let mut out = String::new();
                component.flatten_into(&mut out);
                out
            }
        }
    }
}

impl Component {
    pub fn from_json(value: &Value) -> Component {
        match value {
            Value::Object(map) => Component::from_object(map),
            Value::Array(items) => Component {
                text: String::new(),
                extra: items.iter().map(Component::from_json).collect(),
            },
            value => Component {
                text: primitive_text(value).unwrap_or_default(),
                extra: Vec::new(),
            },
        }
    }

    fn from_object(map: &Map<String, Value>) -> Component {
        let text = match map.get("text").and_then(primitive_text) {
            Some(text) => text,
            None => map
                .get("fallback")
                .or_else(|| map.get("translate"))
                .and_then(primitive_text)
                .unwrap_or_default(),
        };
        let extra = match map.get("extra") {
            Some(Value::Array(children)) => children.iter().map(Component::from_json).collect(),
            Some(child @ Value::Object(_)) => vec![Component::from_json(child)],
            _ => Vec::new(),
        };
        Component { text, extra }
    }

    /// Appends leaf text in document order.
    fn flatten_into(&self, out: &mut String) {
        out.push_str(&strip_legacy(&self.text));
        for child in &self.extra {
            child.flatten_into(out);
        }
    }
}

fn primitive_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Removes `§x` formatting codes. Whitespace controls become spaces, other controls are dropped.
pub fn strip_legacy(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c == LEGACY_MARKER {
            chars.next();
        } else if c.is_control() {
            if c.is_whitespace() {
                out.push(' ');
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// Collapses whitespace runs to single spaces and trims the ends.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
