//! Per-session connection configuration.
//!
//! One [`IrcConfig`] is built at startup and never mutated afterwards: the
//! connection holds it behind an `Arc` and exposes no setters. Compiled
//! defaults cover local testing; real deployments load a JSON file (the
//! binary does the loading).

use std::time::Duration;

use serde::Deserialize;

/// Frozen connection settings for one bot session.
#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IrcConfig {
    /// Server hosts to choose from; one is picked uniformly at random.
    pub servers: Vec<String>,
    /// Server port.
    pub port: u16,
    /// Connection password (`PASS`), if the server requires one.
    pub server_password: Option<String>,
    /// Nickname to register with.
    pub nickname: String,
    /// Username for the `USER` registration.
    pub username: String,
    /// Realname for the `USER` registration.
    pub realname: String,
    /// Account (services) password, if any. Only used by collaborators;
    /// the core knows it solely to redact it from logs.
    pub user_password: Option<String>,
    /// Channels collaborators should join after login.
    pub channels: Vec<String>,
    /// Watchdog interval in seconds; `None` disables the watchdog.
    pub watchdog_seconds: Option<u64>,
}

impl Default for IrcConfig {
    fn default() -> Self {
        Self {
            servers: vec!["localhost".to_owned()],
            port: 6667,
            server_password: None,
            nickname: "bot".to_owned(),
            username: "bot".to_owned(),
            realname: "Bot".to_owned(),
            user_password: None,
            channels: Vec::new(),
            watchdog_seconds: None,
        }
    }
}

impl IrcConfig {
    /// Watchdog interval as a [`Duration`], `None` when disabled.
    pub fn watchdog_interval(&self) -> Option<Duration> {
        self.watchdog_seconds.map(Duration::from_secs)
    }
}
