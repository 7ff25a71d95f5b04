//! Gangway - HTTP/1.x reverse proxy data plane.
//!
//! Core library for incremental HTTP framing and byte relay between
//! client and origin connections.

pub mod config;
pub mod http;
pub mod proxy;
pub mod server;
