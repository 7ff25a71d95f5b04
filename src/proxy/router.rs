use std::collections::HashMap;
use std::fmt;

use anyhow::{Context, Result};

use crate::http::frame::Frame;

/// A resolved origin destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub host: String,
    pub port: u16,
}

impl Target {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Dial string for the TCP connect.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Maps an inbound request to an origin destination.
///
/// Absence of a target is itself a fault (404) at the call site; the
/// resolver only answers the lookup.
pub trait Resolve: Send + Sync {
    fn resolve(&self, frame: &Frame) -> Option<Target>;
}

/// Route table keyed by the request's Host header.
///
/// Lookup tries the exact Host value first, then the value with any
/// `:port` suffix stripped, so `example.com:8080` still matches a route
/// for `example.com`.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: HashMap<String, Target>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the table from configuration, where each route value is an
    /// origin URL such as `http://127.0.0.1:9000`.
    pub fn from_config(routes: &HashMap<String, String>) -> Result<Self> {
        let mut table = Self::new();
        for (host, value) in routes {
            let target = parse_target(value)
                .with_context(|| format!("invalid route target for {host}: {value}"))?;
            table.insert(host.clone(), target);
        }
        Ok(table)
    }

    pub fn insert(&mut self, host: impl Into<String>, target: Target) {
        self.routes.insert(host.into(), target);
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

impl Resolve for RouteTable {
    fn resolve(&self, frame: &Frame) -> Option<Target> {
        if !frame.is_request() {
            return None;
        }
        let host = frame.headers.get("Host")?;
        if let Some(target) = self.routes.get(host) {
            return Some(target.clone());
        }
        let (bare, _port) = host.rsplit_once(':')?;
        self.routes.get(bare).cloned()
    }
}

fn parse_target(value: &str) -> Result<Target> {
    let url = url::Url::parse(value).context("not a URL")?;
    let host = url.host_str().context("URL missing host")?;
    let port = url.port().unwrap_or(match url.scheme() {
        "https" => 443,
        _ => 80,
    });
    Ok(Target::new(host, port))
}
