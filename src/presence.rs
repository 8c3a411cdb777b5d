//! Player roster estimation from the capped status sample.
//!
//! Servers only list a handful of players in the status sample, and some
//! report exactly [`PresenceConfig::capped_online`] players online no matter
//! how many are connected. The cache remembers every sampled name with a
//! score that is refreshed when the name is sampled again and decays
//! otherwise, so the union of recent samples approximates the full roster.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

static DISPLAY_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(§[0-9a-fk-o])*[A-Za-z0-9_]{3,16}(§[0-9a-fk-o])*$").expect("static regex")
});

/// Sample placeholder used by servers that hide player names.
pub const ANONYMOUS_PLAYER: &str = "Anonymous Player";

/// Empirically tuned thresholds; none of these come from the protocol.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PresenceConfig {
    /// Online count some servers report regardless of the real number.
    pub capped_online: i32,
    /// Polls a fully unsampled name survives when the sample covers the whole roster.
    pub decay_polls: f64,
    /// Assumed maximum when a capped server does not report one.
    pub default_max: i32,
    /// Upper clamp for the decay denominator on capped servers.
    pub max_clamp: i32,
}

impl Default for PresenceConfig {
    fn default() -> Self {
        Self {
            capped_online: 12,
            decay_polls: 30.0,
            default_max: 20,
            max_clamp: 30,
        }
    }
}

/// Result of one observation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Presence {
    /// Surviving names, sorted.
    pub names: Vec<String>,
    /// Online count to display; `None` when the server did not report one.
    pub online: Option<i32>,
    /// True when `online` was corrected up to the cache size.
    pub online_is_assumed: bool,
}

#[derive(Debug, Default)]
pub struct PresenceCache {
    scores: BTreeMap<String, f64>,
    config: PresenceConfig,
}

impl PresenceCache {
    pub fn new(config: PresenceConfig) -> Self {
        Self { scores: BTreeMap::new(), config }
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    pub fn score(&self, name: &str) -> Option<f64> {
        self.scores.get(name).copied()
    }

    /// Folds one successful ping into the cache.
    pub fn observe(&mut self, sample: &[String], online: Option<i32>, max: Option<i32>) -> Presence {
        let capped = self.config.capped_online;
        let is_capped = online == Some(capped);

        let untrusted = match online {
            _ if sample.is_empty() => true,
            Some(online) if online == capped => false,
            Some(online) => online <= capped || self.scores.len() as i64 > online as i64,
            None => true,
        };
        if untrusted {
            self.scores.clear();
        }

        for name in sample {
            if !name.trim().is_empty() && name != ANONYMOUS_PLAYER {
                self.scores.insert(name.clone(), 1.0);
            }
        }

        let (online, online_is_assumed) = match online {
            Some(online) if is_capped => {
                let diff = online as i64 - self.scores.len() as i64;
                if diff < 0 {
                    (Some((online as i64 - diff) as i32), true)
                } else {
                    (Some(online), false)
                }
            }
            online => (online, false),
        };

        self.decay(sample.len(), online, max, is_capped);

        Presence {
            names: self.scores.keys().cloned().collect(),
            online,
            online_is_assumed,
        }
    }

    fn decay(&mut self, sampled: usize, online: Option<i32>, max: Option<i32>, is_capped: bool) {
        let step = if sampled > 0 {
            let denominator = if is_capped {
                max.unwrap_or(self.config.default_max)
                    .clamp(self.config.capped_online, self.config.max_clamp)
            } else {
                online.unwrap_or(sampled as i32)
            };
            let denominator = if denominator > 0 { denominator as f64 } else { sampled as f64 };
            sampled as f64 / denominator / self.config.decay_polls
        } else {
            0.0
        };

        self.scores.retain(|name, score| {
            if !DISPLAY_NAME.is_match(name) {
                return false;
            }
            *score -= step;
            *score > 0.0
        });
    }
}
