use std::collections::HashMap;
use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;

/// Runtime configuration, loaded from a YAML file.
///
/// Every field has a default so the proxy can start with no file at all,
/// which is mainly useful for tests and local experiments.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Address the listen socket binds to.
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Upper bound on establishing an origin connection, in milliseconds.
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,

    /// Maximum number of outbound connects in flight at once.
    #[serde(default = "default_max_connects")]
    pub max_connects: usize,

    /// Route table: request Host header to origin URL.
    #[serde(default)]
    pub routes: HashMap<String, String>,
}

fn default_listen_addr() -> String {
    "127.0.0.1:8080".to_string()
}

fn default_connect_timeout_ms() -> u64 {
    3_000
}

fn default_max_connects() -> usize {
    64
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            connect_timeout_ms: default_connect_timeout_ms(),
            max_connects: default_max_connects(),
            routes: HashMap::new(),
        }
    }
}

impl Config {
    /// Loads configuration from the file named by `GANGWAY_CONFIG`
    /// (default `gangway.yaml`). A missing file yields the defaults.
    pub fn load() -> anyhow::Result<Self> {
        let path =
            std::env::var("GANGWAY_CONFIG").unwrap_or_else(|_| "gangway.yaml".to_string());

        match std::fs::read_to_string(&path) {
            Ok(text) => Self::from_yaml(&text)
                .with_context(|| format!("invalid configuration in {path}")),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %path, "no configuration file, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(e).with_context(|| format!("failed to read {path}")),
        }
    }

    /// Parses configuration from YAML text.
    pub fn from_yaml(text: &str) -> anyhow::Result<Self> {
        serde_yaml::from_str(text).context("failed to parse configuration")
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}
