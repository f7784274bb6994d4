use crate::common::version::Version;
use crate::transfer;

/// The config for an HTTP client.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Prefixed to every request path, like "http://localhost:3000". Without it, request paths
    /// must be full URIs.
    pub base_url: Option<String>,
    /// The protocol version requested for every request.
    pub version: Version,
    /// Settings for the transfer driver created per request.
    pub transfer: transfer::Config,
}

impl Config {
    pub fn with_base_url(base_url: impl Into<String>) -> Config {
        Config { base_url: Some(base_url.into()), ..Config::default() }
    }
}
