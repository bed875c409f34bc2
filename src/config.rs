use std::env;
use std::time::Duration;

use log::warn;

use crate::blockchain::{DEFAULT_DIFFICULTY, DIFF_MAX};

/// Node settings, read from the environment (and `.env`).
#[derive(Debug, Clone, PartialEq)]
pub struct NodeConfig {
    pub host: String,
    pub port: u16,
    /// Leading hex zeros a proof must produce.
    pub difficulty: u32,
    pub peer_timeout: Duration,
    /// `None` when `MINE_TIMEOUT_SECS=0`.
    pub mine_timeout: Option<Duration>,
    /// Peers registered at start-up.
    pub peers: Vec<String>,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
            difficulty: DEFAULT_DIFFICULTY,
            peer_timeout: Duration::from_secs(5),
            mine_timeout: Some(Duration::from_secs(60)),
            peers: Vec::new(),
        }
    }
}

impl NodeConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let difficulty = match parsed::<u32>(&lookup, "DIFFICULTY") {
            Some(d) if d <= DIFF_MAX => d,
            Some(d) => {
                warn!("DIFFICULTY={d} exceeds {DIFF_MAX}; using {DEFAULT_DIFFICULTY}");
                DEFAULT_DIFFICULTY
            }
            None => defaults.difficulty,
        };

        let mine_timeout = match parsed::<u64>(&lookup, "MINE_TIMEOUT_SECS") {
            Some(0) => None,
            Some(secs) => Some(Duration::from_secs(secs)),
            None => defaults.mine_timeout,
        };

        let peers = lookup("PEERS")
            .map(|v| {
                v.split(',')
                    .map(str::trim)
                    .filter(|p| !p.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();

        Self {
            host: lookup("HOST").unwrap_or(defaults.host),
            port: parsed(&lookup, "PORT").unwrap_or(defaults.port),
            difficulty,
            peer_timeout: parsed(&lookup, "PEER_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.peer_timeout),
            mine_timeout,
            peers,
        }
    }
}

fn parsed<T: std::str::FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(v) => Some(v),
        Err(_) => {
            warn!("ignoring unparsable {key}={raw}");
            None
        }
    }
}
